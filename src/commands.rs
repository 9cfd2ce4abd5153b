//! CLI command definitions
//!
//! Defines the clap commands for the conformance CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run conformance scenarios against a backend
    Run {
        /// Backend origin (default: config file, then http://localhost:3000)
        #[arg(long, env = "CONFORMANCE_BASE_URL")]
        base_url: Option<String>,

        /// Run only matching scenarios (exact name or substring)
        /// Can be specified multiple times: --scenario chat --scenario accusation
        #[arg(long = "scenario", short = 's')]
        scenarios: Vec<String>,

        /// Load scenarios from YAML files instead of the built-in catalog
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Log request lines and response bodies
        #[arg(long, short)]
        verbose: bool,
    },

    /// List available scenarios
    #[command(alias = "ls")]
    List {
        /// List scenarios from YAML files instead of the built-in catalog
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,
    },
}
