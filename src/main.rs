//! Conformance CLI - scenario-driven checks for the detective game REST API
//!
//! Drives a live backend through the case, game, chat, evidence and
//! accusation endpoints and reports every step as passed or failed.

use clap::Parser;
use conformance::commands::Commands;
use conformance::common::{config::Config, logging};
use conformance::{cli, Result};

#[derive(Parser)]
#[command(name = "conformance", about = "REST conformance harness for the detective game backend")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

async fn execute(command: Commands) -> Result<bool> {
    let config = Config::load()?;
    cli::dispatch(command, config).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    logging::init_cli(verbose);

    match execute(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
