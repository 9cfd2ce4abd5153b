//! Scenarios: what to send, what to expect, and what to remember

pub mod catalog;
pub mod context;
pub mod fixtures;
pub mod jsonpath;
pub mod loader;
pub mod model;

pub use context::SessionContext;
pub use fixtures::Fixture;
pub use jsonpath::JsonPath;
pub use model::{Capture, JsonType, Predicate, Scenario, StatusSet, Step};

use crate::common::{Error, Result};

/// Keep the scenarios selected by `filters`, in their original order
///
/// A filter selects the scenario with exactly that name, or failing that,
/// every scenario whose name contains it. A filter selecting nothing is a
/// usage error. No filters keeps everything.
pub fn filter_scenarios(scenarios: Vec<Scenario>, filters: &[String]) -> Result<Vec<Scenario>> {
    if filters.is_empty() {
        return Ok(scenarios);
    }

    let mut keep = vec![false; scenarios.len()];
    for filter in filters {
        let exact = scenarios.iter().position(|s| s.name == *filter);
        let matched: Vec<usize> = match exact {
            Some(i) => vec![i],
            None => scenarios
                .iter()
                .enumerate()
                .filter(|(_, s)| s.name.contains(filter.as_str()))
                .map(|(i, _)| i)
                .collect(),
        };

        if matched.is_empty() {
            let available: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
            return Err(Error::Usage(format!(
                "No scenario matches '{}'. Available: {}",
                filter,
                available.join(", ")
            )));
        }
        for i in matched {
            keep[i] = true;
        }
    }

    Ok(scenarios
        .into_iter()
        .zip(keep)
        .filter_map(|(s, k)| k.then_some(s))
        .collect())
}
