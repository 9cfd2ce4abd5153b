//! CLI command handling
//!
//! Resolves settings, runs scenarios and prints the report.

use colored::Colorize;
use std::path::PathBuf;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::Result;
use crate::report::{render_console, render_json};
use crate::runner::{RunConfig, Runner};
use crate::scenario::{catalog, filter_scenarios, loader, Scenario};

/// Dispatch a CLI command
///
/// Returns whether the command succeeded; a completed run with failing
/// scenarios is `Ok(false)`.
pub async fn dispatch(command: Commands, config: Config) -> Result<bool> {
    match command {
        Commands::Run {
            base_url,
            scenarios: filters,
            files,
            timeout,
            json,
            verbose,
        } => {
            let mut run_config = RunConfig::from_config(&config);
            if let Some(base_url) = base_url {
                run_config.base_url = base_url;
            }
            if let Some(timeout) = timeout {
                run_config.timeouts.request_secs = timeout;
            }
            run_config.verbose |= verbose;

            let scenarios = filter_scenarios(select_scenarios(&files)?, &filters)?;
            let runner = Runner::new(run_config)?;
            let report = runner.run(&scenarios).await?;

            if json || config.output.json {
                println!("{}", render_json(&report)?);
            } else {
                print!("{}", render_console(&report));
            }
            Ok(report.passed())
        }

        Commands::List { files } => {
            let scenarios = select_scenarios(&files)?;
            for scenario in &scenarios {
                println!(
                    "{} {}",
                    scenario.name.white().bold(),
                    format!("({} steps)", scenario.steps.len()).dimmed()
                );
                if let Some(desc) = &scenario.description {
                    println!("    {}", desc.dimmed());
                }
            }
            Ok(true)
        }
    }
}

fn select_scenarios(files: &[PathBuf]) -> Result<Vec<Scenario>> {
    if files.is_empty() {
        Ok(catalog::builtin())
    } else {
        loader::load_files(files)
    }
}
