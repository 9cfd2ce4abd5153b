//! YAML scenario files
//!
//! ```yaml
//! name: unlock_twice
//! description: Unlocking the same evidence twice is rejected
//! steps:
//!   - action: fixture
//!     name: started_game
//!   - action: request
//!     name: List case evidence
//!     method: GET
//!     path: /api/evidence/case/${case_id}
//!     capture:
//!       - key: evidence_id
//!         path: evidence.0.evidence_id
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::fixtures::Fixture;
use super::model::{Scenario, Step};
use crate::common::{Error, Result};

/// A scenario as written in a YAML file
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<ScenarioStep>,
}

/// One entry of a scenario file's `steps` list
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// A single HTTP request with its expectations
    Request(Step),
    /// A named fixture, expanded in place
    Fixture { name: Fixture },
}

impl ScenarioFile {
    /// Expand fixtures and validate
    pub fn into_scenario(self) -> Result<Scenario> {
        let mut scenario = Scenario::new(self.name);
        scenario.description = self.description;
        for step in self.steps {
            match step {
                ScenarioStep::Request(step) => scenario.steps.push(step),
                ScenarioStep::Fixture { name } => scenario.push_fixture(name),
            }
        }
        scenario.validate()?;
        Ok(scenario)
    }
}

/// Parse one scenario from YAML text
pub fn parse_scenario(content: &str) -> Result<Scenario> {
    let file: ScenarioFile = serde_yaml::from_str(content)?;
    file.into_scenario()
}

/// Load one scenario file
pub fn load_file(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    parse_scenario(&content).map_err(|e| match e {
        Error::Yaml(inner) => Error::Usage(format!("{}: {}", path.display(), inner)),
        other => other,
    })
}

/// Load several files, keeping command-line order
pub fn load_files(paths: &[PathBuf]) -> Result<Vec<Scenario>> {
    let scenarios = paths
        .iter()
        .map(|p| load_file(p))
        .collect::<Result<Vec<_>>>()?;

    for (i, scenario) in scenarios.iter().enumerate() {
        if scenarios[..i].iter().any(|s| s.name == scenario.name) {
            return Err(Error::Usage(format!(
                "Scenario '{}' is defined more than once",
                scenario.name
            )));
        }
    }
    Ok(scenarios)
}
