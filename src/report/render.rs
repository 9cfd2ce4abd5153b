//! Console and JSON rendering

use colored::Colorize;
use std::fmt::Write;

use super::{Report, ScenarioState, StepStatus};
use crate::common::Result;

/// Human-readable report: one line per step, then the summary
pub fn render_console(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "\n{} {}",
        "Conformance run against".blue().bold(),
        report.base_url().white().bold()
    );

    for scenario in report.scenarios() {
        let marker = match scenario.state {
            ScenarioState::Completed if scenario.passed() => "✓".green().bold(),
            ScenarioState::NotStarted | ScenarioState::Running => "-".dimmed(),
            _ => "✗".red().bold(),
        };
        let _ = writeln!(out, "\n{} {}", marker, scenario.name.white().bold());
        if let Some(desc) = &scenario.description {
            let _ = writeln!(out, "  {}", desc.dimmed());
        }

        if scenario.state == ScenarioState::NotStarted {
            let _ = writeln!(out, "  {}", "not started".dimmed());
            continue;
        }

        for (i, step) in scenario.steps.iter().enumerate() {
            let request = step.requests.last().map(String::as_str).unwrap_or("");
            let repeat = if step.requests.len() > 1 {
                format!(" (x{})", step.requests.len())
            } else {
                String::new()
            };

            match &step.status {
                StepStatus::Passed => {
                    let _ = writeln!(
                        out,
                        "  {} Step {}: {} {}{}",
                        "✓".green(),
                        i + 1,
                        step.name,
                        request.dimmed(),
                        repeat.dimmed()
                    );
                }
                StepStatus::Failed { message, .. } | StepStatus::Errored { message } => {
                    let _ = writeln!(
                        out,
                        "  {} Step {}: {} {}{}",
                        "✗".red(),
                        i + 1,
                        step.name,
                        request.dimmed(),
                        repeat.dimmed()
                    );
                    let _ = writeln!(out, "      {}", message.red());
                }
                StepStatus::Skipped { .. } => {
                    let _ = writeln!(
                        out,
                        "  {} Step {}: {} {}",
                        "-".dimmed(),
                        i + 1,
                        step.name.dimmed(),
                        "(skipped)".dimmed()
                    );
                }
            }
        }
    }

    let summary = report.summary();
    let _ = writeln!(out, "\n{}", "Summary:".cyan());
    let _ = writeln!(
        out,
        "  Scenarios: {} total, {} passed, {} failed, {} not started",
        summary.scenarios,
        summary.scenarios_passed.to_string().green(),
        summary.scenarios_failed.to_string().red(),
        summary.scenarios_not_started
    );
    let _ = writeln!(
        out,
        "  Steps:     {} passed, {} failed, {} errored, {} skipped",
        summary.steps_passed,
        summary.steps_failed,
        summary.steps_errored,
        summary.steps_skipped
    );
    let _ = writeln!(out, "  Duration:  {} ms", report.duration_ms());

    if let Some(reason) = report.aborted() {
        let _ = writeln!(out, "\n{} {}", "Run aborted:".red().bold(), reason);
    }

    let verdict = if report.passed() {
        format!("{} {}", "✓".green().bold(), "All scenarios passed".green().bold())
    } else {
        format!("{} {}", "✗".red().bold(), "Conformance run failed".red().bold())
    };
    let _ = writeln!(out, "\n{}", verdict);

    out
}

/// The report as pretty-printed JSON
pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
