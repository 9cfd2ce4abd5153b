//! Scenario runner
//!
//! Executes scenarios in order against one backend, one request at a time,
//! and turns the outcome of every step into a [`Report`].
//!
//! Failure reach:
//! - connection failure: the step errors, no further request is sent and
//!   every later scenario stays `NotStarted`
//! - assertion failure or malformed response: the rest of the scenario is
//!   skipped, the next scenario runs

mod assertions;

pub use assertions::{check, text_contains};

use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::common::config::{Config, Timeouts};
use crate::common::{Error, Result};
use crate::http::protocol::preview;
use crate::http::{ApiClient, ApiRequest, ApiResponse, Transport};
use crate::report::{Report, ScenarioReport, ScenarioState, StepReport, StepStatus};
use crate::scenario::context::ITEM_KEY;
use crate::scenario::{JsonPath, Scenario, SessionContext, Step};

/// Everything the runner needs to know about the target
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: String,
    pub timeouts: Timeouts,
    /// Log every response body
    pub verbose: bool,
}

impl RunConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeouts: Timeouts::default(),
            verbose: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.target.base_url.clone(),
            timeouts: config.timeouts.clone(),
            verbose: config.output.verbose,
        }
    }
}

/// Request lines and last status seen while executing one step
#[derive(Debug, Default)]
struct StepTrace {
    requests: Vec<String>,
    actual_status: Option<u16>,
}

/// Runs scenarios over a [`Transport`]
pub struct Runner<T: Transport = ApiClient> {
    transport: T,
    verbose: bool,
}

impl Runner<ApiClient> {
    /// Create a runner talking HTTP to `config.base_url`
    pub fn new(config: RunConfig) -> Result<Self> {
        let transport = ApiClient::new(&config.base_url, &config.timeouts)?;
        Ok(Self {
            transport,
            verbose: config.verbose,
        })
    }
}

impl<T: Transport> Runner<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute `scenarios` in order and report on every one of them
    ///
    /// Scenarios are validated up front; an invalid one fails the whole call
    /// before any request is sent.
    pub async fn run(&self, scenarios: &[Scenario]) -> Result<Report> {
        if scenarios.is_empty() {
            return Err(Error::Usage("No scenarios to run".to_string()));
        }
        for scenario in scenarios {
            scenario.validate()?;
        }

        let started = Instant::now();
        let mut reports = Vec::with_capacity(scenarios.len());
        let mut aborted: Option<String> = None;

        info!(
            base_url = self.transport.base_url(),
            scenarios = scenarios.len(),
            "starting conformance run"
        );

        for scenario in scenarios {
            if aborted.is_some() {
                reports.push(not_started(scenario));
                continue;
            }

            let (report, abort) = self.run_scenario(scenario).await;
            if let Some(reason) = abort {
                warn!(scenario = %scenario.name, %reason, "run aborted");
                aborted = Some(reason);
            }
            reports.push(report);
        }

        Ok(Report::new(
            self.transport.base_url(),
            reports,
            aborted,
            started.elapsed().as_millis() as u64,
        ))
    }

    /// Run one scenario with a fresh context
    ///
    /// Returns the abort reason when the failure reaches past the scenario.
    async fn run_scenario(&self, scenario: &Scenario) -> (ScenarioReport, Option<String>) {
        info!(scenario = %scenario.name, steps = scenario.steps.len(), "starting scenario");

        let started = Instant::now();
        let mut context = SessionContext::new();
        let mut state = ScenarioState::Running;
        let mut steps = Vec::with_capacity(scenario.steps.len());
        let mut abort: Option<String> = None;

        for (i, step) in scenario.steps.iter().enumerate() {
            if state != ScenarioState::Running {
                let reason = if abort.is_some() {
                    "run aborted"
                } else {
                    "an earlier step failed"
                };
                steps.push(StepReport::skipped(&step.name, reason));
                continue;
            }

            let step_started = Instant::now();
            let mut trace = StepTrace::default();
            let outcome = self.execute_step(step, &mut context, &mut trace).await;

            let status = match outcome {
                Ok(()) => {
                    debug!(step = i + 1, name = %step.name, "step passed");
                    StepStatus::Passed
                }
                Err(e) => {
                    state = ScenarioState::Aborted;
                    let message = e.to_string();
                    warn!(step = i + 1, name = %step.name, error = %message, "step failed");
                    match e.class() {
                        class if class.aborts_run() => {
                            abort = Some(message.clone());
                            StepStatus::Errored { message }
                        }
                        class => StepStatus::Failed { class, message },
                    }
                }
            };

            steps.push(StepReport {
                name: step.name.clone(),
                requests: trace.requests,
                status,
                actual_status: trace.actual_status,
                duration_ms: step_started.elapsed().as_millis() as u64,
            });
        }

        if state == ScenarioState::Running {
            state = ScenarioState::Completed;
        }
        info!(scenario = %scenario.name, state = ?state, "finished scenario");

        let report = ScenarioReport {
            name: scenario.name.clone(),
            description: scenario.description.clone(),
            state,
            steps,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        (report, abort)
    }

    /// Execute a step, once or once per `for_each` element
    ///
    /// Captures are applied only after every check of every iteration held.
    async fn execute_step(
        &self,
        step: &Step,
        context: &mut SessionContext,
        trace: &mut StepTrace,
    ) -> Result<()> {
        let Some(key) = &step.for_each else {
            let body = self.send_and_check(step, context, trace).await?;
            return apply_captures(step, body.as_ref(), context);
        };

        let items = match context.lookup(key)? {
            Value::Array(items) => items,
            other => {
                return Err(Error::Assertion(format!(
                    "for_each '{}' is not an array: {}",
                    key,
                    preview(&other.to_string())
                )))
            }
        };

        let mut last = None;
        for item in items {
            context.set(ITEM_KEY, item);
            let result = self.send_and_check(step, context, trace).await;
            context.remove(ITEM_KEY);
            last = result?;
        }
        apply_captures(step, last.as_ref(), context)
    }

    /// Send one request and run the status and predicate checks
    ///
    /// Returns the decoded body when there was one.
    async fn send_and_check(
        &self,
        step: &Step,
        context: &SessionContext,
        trace: &mut StepTrace,
    ) -> Result<Option<Value>> {
        let request = build_request(step, context)?;
        trace.requests.push(request.to_string());
        debug!(request = %request, "step request");

        let response = self.transport.send(&request).await?;
        trace.actual_status = Some(response.status);
        if self.verbose {
            info!(status = response.status, body = %preview(&response.body), "response");
        }

        if !step.expect_status.contains(response.status) {
            return Err(status_failure(step, &response));
        }

        // Unchecked non-JSON bodies (framework error pages) are left alone.
        if !step.needs_json()
            && (response.body.trim().is_empty() || response.declares_non_json())
        {
            return Ok(None);
        }
        let body = response.json()?;

        for predicate in &step.expect {
            let mut resolved = predicate.clone();
            for slot in [
                &mut resolved.equals,
                &mut resolved.not_equals,
                &mut resolved.contains,
            ] {
                if let Some(value) = slot.as_mut() {
                    *value = context.substitute_value(value)?;
                }
            }
            check(&resolved, &body)?;
        }
        Ok(Some(body))
    }
}

/// Run with default timeouts against `base_url`
pub async fn run(scenarios: &[Scenario], base_url: &str) -> Result<Report> {
    Runner::new(RunConfig::new(base_url))?.run(scenarios).await
}

fn build_request(step: &Step, context: &SessionContext) -> Result<ApiRequest> {
    let path = context.substitute_str(&step.path)?;
    let mut request = ApiRequest::new(step.method, path);
    if let Some(body) = &step.body {
        request = request.with_body(context.substitute_value(body)?);
    }
    if let Some(raw) = &step.raw_body {
        request = request.with_raw_body(context.substitute_str(raw)?);
    }
    Ok(request)
}

fn status_failure(step: &Step, response: &ApiResponse) -> Error {
    let mismatch = Error::status_mismatch(step.expect_status.as_slice(), response.status);
    match response.error_text() {
        Some(text) => Error::Assertion(format!("{} (backend error: {})", mismatch, text)),
        None => mismatch,
    }
}

fn apply_captures(step: &Step, body: Option<&Value>, context: &mut SessionContext) -> Result<()> {
    if step.capture.is_empty() {
        return Ok(());
    }
    let body = body.ok_or_else(|| {
        Error::Assertion("no response body to capture from".to_string())
    })?;

    let mut captured = Vec::with_capacity(step.capture.len());
    for capture in &step.capture {
        let path = JsonPath::parse(&capture.path)?;
        let value = path.select(body).ok_or_else(|| {
            Error::Assertion(format!(
                "capture '{}': '{}' missing from response",
                capture.key, path
            ))
        })?;
        captured.push((capture.key.clone(), value));
    }

    for (key, value) in captured {
        debug!(key = %key, value = %preview(&value.to_string()), "captured");
        context.set(key, value);
    }
    Ok(())
}

fn not_started(scenario: &Scenario) -> ScenarioReport {
    ScenarioReport {
        name: scenario.name.clone(),
        description: scenario.description.clone(),
        state: ScenarioState::NotStarted,
        steps: scenario
            .steps
            .iter()
            .map(|s| StepReport::skipped(&s.name, "run aborted"))
            .collect(),
        duration_ms: 0,
    }
}
