//! Run results
//!
//! A [`Report`] is assembled by the runner once every scenario has finished
//! (or the run was cut short) and is read-only afterwards.

mod render;

pub use render::{render_console, render_json};

use serde::Serialize;

use crate::common::FailureClass;

/// Outcome of one step
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    /// Expectation not met or response unusable
    Failed { class: FailureClass, message: String },
    /// Backend unreachable; the run stopped here
    Errored { message: String },
    /// Never sent because an earlier step failed or the run stopped
    Skipped { reason: String },
}

impl StepStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, StepStatus::Passed)
    }
}

/// Result of one step, including every `for_each` iteration
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    /// Request lines actually sent, e.g. `POST /api/games/start`
    pub requests: Vec<String>,
    pub status: StepStatus,
    /// Status of the last response received
    pub actual_status: Option<u16>,
    pub duration_ms: u64,
}

impl StepReport {
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requests: Vec::new(),
            status: StepStatus::Skipped {
                reason: reason.into(),
            },
            actual_status: None,
            duration_ms: 0,
        }
    }
}

/// Scenario life cycle: `NotStarted -> Running -> {Completed | Aborted}`
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    NotStarted,
    Running,
    /// Every step ran and passed
    Completed,
    /// A step failed or errored; later steps were skipped
    Aborted,
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub description: Option<String>,
    pub state: ScenarioState,
    pub steps: Vec<StepReport>,
    pub duration_ms: u64,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.state == ScenarioState::Completed && self.steps.iter().all(|s| s.status.is_passed())
    }

    /// The step that stopped this scenario, if any
    pub fn failure(&self) -> Option<&StepReport> {
        self.steps
            .iter()
            .find(|s| matches!(s.status, StepStatus::Failed { .. } | StepStatus::Errored { .. }))
    }
}

/// Counts over the whole run
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Summary {
    pub scenarios: usize,
    pub scenarios_passed: usize,
    pub scenarios_failed: usize,
    pub scenarios_not_started: usize,
    pub steps_passed: usize,
    pub steps_failed: usize,
    pub steps_errored: usize,
    pub steps_skipped: usize,
}

impl Summary {
    fn tally(scenarios: &[ScenarioReport]) -> Self {
        let mut summary = Summary {
            scenarios: scenarios.len(),
            ..Self::default()
        };
        for scenario in scenarios {
            match scenario.state {
                ScenarioState::NotStarted => summary.scenarios_not_started += 1,
                _ if scenario.passed() => summary.scenarios_passed += 1,
                _ => summary.scenarios_failed += 1,
            }
            for step in &scenario.steps {
                match step.status {
                    StepStatus::Passed => summary.steps_passed += 1,
                    StepStatus::Failed { .. } => summary.steps_failed += 1,
                    StepStatus::Errored { .. } => summary.steps_errored += 1,
                    StepStatus::Skipped { .. } => summary.steps_skipped += 1,
                }
            }
        }
        summary
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    base_url: String,
    scenarios: Vec<ScenarioReport>,
    summary: Summary,
    /// Why the run stopped early
    aborted: Option<String>,
    duration_ms: u64,
}

impl Report {
    pub fn new(
        base_url: impl Into<String>,
        scenarios: Vec<ScenarioReport>,
        aborted: Option<String>,
        duration_ms: u64,
    ) -> Self {
        let summary = Summary::tally(&scenarios);
        Self {
            base_url: base_url.into(),
            scenarios,
            summary,
            aborted,
            duration_ms,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn scenarios(&self) -> &[ScenarioReport] {
        &self.scenarios
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn aborted(&self) -> Option<&str> {
        self.aborted.as_deref()
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// True when the run finished and every scenario passed
    pub fn passed(&self) -> bool {
        self.aborted.is_none() && self.scenarios.iter().all(ScenarioReport::passed)
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}
