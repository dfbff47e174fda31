//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{HarvestConfig, DEFAULT_INSTITUTIONS_FILE, DEFAULT_RECRAWL_HOURS};
use crate::error::{HarvesterError, Result};
use crate::harvester::{harvest_institution, HarvestOutcome};
use crate::institutions::Institutions;
use crate::mapping::create_default_registry;
use crate::oai::OaiClient;
use crate::output::crawled_recently;
use crate::session::Termination;

/// Heartland Harvester - Harvest OAI-PMH library feeds into aggregation records.
#[derive(Parser)]
#[command(name = "heartland-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl institutions and write one JSON artifact each.
    Crawl {
        /// Institution ids to crawl (default: all configured institutions)
        #[arg(short, long = "institution", num_args = 1..)]
        institutions: Vec<String>,

        /// Institution descriptor file, JSON or YAML (default: files/institutions.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (default: files/institutions/, or HARVEST_OUTPUT_DIR)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Crawl even if the institution was crawled recently
        #[arg(long)]
        ignore_time: bool,

        /// Hours within which a previous crawl counts as recent
        #[arg(long, default_value_t = DEFAULT_RECRAWL_HOURS)]
        crawl_time: u64,
    },

    /// Show an endpoint's Identify response.
    Identify {
        /// OAI-PMH endpoint URL
        url: String,
    },

    /// List the sets an endpoint advertises.
    ListSets {
        /// OAI-PMH endpoint URL
        url: String,
    },

    /// List the metadata formats an endpoint advertises.
    Formats {
        /// OAI-PMH endpoint URL
        url: String,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            institutions,
            config,
            output,
            ignore_time,
            crawl_time,
        } => crawl_command(
            &institutions,
            config.as_deref(),
            output,
            ignore_time,
            crawl_time,
        ),
        Commands::Identify { url } => identify_command(&url),
        Commands::ListSets { url } => list_sets_command(&url),
        Commands::Formats { url } => formats_command(&url),
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Execute the crawl command.
fn crawl_command(
    ids: &[String],
    config_path: Option<&Path>,
    output: Option<PathBuf>,
    ignore_time: bool,
    crawl_time: u64,
) -> Result<()> {
    let config_path = config_path.unwrap_or(Path::new(DEFAULT_INSTITUTIONS_FILE));
    let institutions = Institutions::load(config_path)?;
    let selected = institutions.select(ids)?;

    let mut config = HarvestConfig::from_env();
    if let Some(output) = output {
        config = config.with_output_dir(output);
    }
    let registry = create_default_registry();
    let mut failed = Vec::new();

    for descriptor in selected {
        if !ignore_time && crawled_recently(&config.output_dir, &descriptor.id, crawl_time) {
            println!(
                "{} {} (crawled within {crawl_time}h)",
                style("Skipping").dim(),
                style(&descriptor.id).cyan()
            );
            continue;
        }

        println!("{} {}", style("Crawling").bold(), style(&descriptor.id).cyan());

        let pb = spinner();
        pb.set_message("Starting...");
        let outcome = harvest_institution(descriptor, &registry, &config, |progress| {
            pb.set_message(format!(
                "{} records, {} skipped",
                progress.records, progress.skipped
            ));
        });
        pb.finish_and_clear();

        match outcome {
            Ok(HarvestOutcome::Crawled { report, path }) => {
                println!("  Institution: {}", style(&report.institution_name).green());
                println!("  Records: {}", report.records.len());
                if report.skipped() > 0 {
                    println!("  Skipped: {}", style(report.skipped()).yellow().bold());
                    for (reason, entry) in report.tally.iter() {
                        println!("    {reason}: {}", entry.count);
                    }
                }
                if let Termination::Aborted(reason) = &report.termination {
                    println!(
                        "  {} {reason}, partial results kept",
                        style("Aborted:").red().bold()
                    );
                }
                println!("{} {}", style("Saved to:").green().bold(), path.display());
            }
            Ok(HarvestOutcome::Snapshot { count, path }) => {
                println!("  Snapshot records: {count}");
                println!("{} {}", style("Saved to:").green().bold(), path.display());
            }
            Ok(HarvestOutcome::NoFeed) => {
                println!(
                    "  {} no feed URL configured, keeping last artifact",
                    style("Warning:").yellow().bold()
                );
            }
            Err(HarvesterError::NoUrlStrategy {
                institution,
                candidates,
            }) => {
                println!(
                    "  {} no URL mapping for '{institution}'. Fields that look like URLs:",
                    style("Unmapped:").red().bold()
                );
                for (path, value) in &candidates {
                    println!("    {} {value}", style(path).cyan());
                }
            }
            Err(e) => {
                tracing::error!(institution = %descriptor.id, error = %e, "Institution failed");
                println!("  {} {e}", style("Failed:").red().bold());
                failed.push(descriptor.id.clone());
            }
        }
        println!();
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(HarvesterError::InstitutionsFailed(failed))
    }
}

fn identify_command(url: &str) -> Result<()> {
    let client = OaiClient::new(url)?;
    for (name, value) in client.identify()? {
        println!("{}: {value}", style(name).bold());
    }
    Ok(())
}

fn list_sets_command(url: &str) -> Result<()> {
    let client = OaiClient::new(url)?;
    for set in client.list_sets()? {
        println!("{}\t{}", style(&set.spec).cyan(), set.name);
    }
    Ok(())
}

fn formats_command(url: &str) -> Result<()> {
    let client = OaiClient::new(url)?;
    for prefix in client.list_metadata_formats()? {
        println!("{prefix}");
    }
    Ok(())
}
