//! Case conformance - REST API conformance harness
//!
//! This library runs ordered scenarios of HTTP requests against the
//! detective game backend, threading captured values from one step into the
//! next, and reports which expectations held.

pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod report;
pub mod runner;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use report::Report;
pub use runner::{run, RunConfig, Runner};
pub use scenario::{Fixture, Predicate, Scenario, Step};
