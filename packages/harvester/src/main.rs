//! `heartland-harvester` binary: crawls configured OAI-PMH feeds.

use std::process::ExitCode;

use heartland_harvester::{cli, HarvesterError};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Logs go to stderr so the crawl summary on stdout stays readable.
    // Set RUST_LOG=heartland_harvester=info to see per-page progress.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if let HarvesterError::InstitutionsFailed(ids) = &e {
                eprintln!("Retry with: heartland-harvester crawl --ignore-time -i {}", ids.join(" "));
            }
            ExitCode::FAILURE
        }
    }
}
