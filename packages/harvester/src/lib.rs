//! Heartland Harvester - Harvest OAI-PMH library feeds into aggregation records.
//!
//! This crate crawls the OAI-PMH endpoints of contributing libraries and
//! archives, flattens each record's XML metadata into a field tree, and maps
//! it through a per-institution profile into a DPLA-style aggregation
//! record.
//!
//! # Example
//!
//! ```
//! use heartland_harvester::{config, formatter, language};
//!
//! assert!(config::validate_institution_id("kcpl1").is_ok());
//! assert_eq!(formatter::normalize("Cats;Dogs"), ["Cats", "Dogs"]);
//! assert_eq!(language::resolve(&["French"])[0].code, "fre");
//! ```
//!
//! # Architecture
//!
//! The harvester is organized into several modules:
//!
//! - [`config`]: Configuration constants, runtime settings and validation
//! - [`types`]: Core data types (InstitutionDescriptor, AggregationRecord, etc.)
//! - [`error`]: Error types and Result alias
//! - [`http`]: HTTP client and request classification
//! - [`oai`]: OAI-PMH verbs and response parsing
//! - [`xml`]: XML utilities and the field flattener
//! - [`formatter`]: Field value normalization and shaping
//! - [`language`]: ISO 639 language resolution
//! - [`mapping`]: Per-institution URL strategies, templates and overrides
//! - [`skip`]: Skip reasons and the per-crawl tally
//! - [`session`]: Paginated feed crawl state machine
//! - [`institutions`]: Institution descriptor loading
//! - [`snapshot`]: Pre-downloaded JSON record dumps
//! - [`output`]: Per-institution artifact files
//! - [`cli`]: Command-line interface
//! - [`harvester`]: Main harvester service

pub mod cli;
pub mod config;
pub mod error;
pub mod formatter;
pub mod harvester;
pub mod http;
pub mod institutions;
pub mod language;
pub mod mapping;
pub mod oai;
pub mod output;
pub mod session;
pub mod skip;
pub mod snapshot;
pub mod types;
pub mod xml;

// Re-export main functions
pub use harvester::{crawl, harvest_institution, HarvestOutcome};

// Re-export commonly used items
pub use config::{validate_institution_id, HarvestConfig};
pub use error::{HarvesterError, Result};
pub use mapping::{create_default_registry, InstitutionRegistry, SchemaMapper};
pub use session::{CrawlReport, FeedSession, Progress, SessionState, Termination};
pub use skip::{SkipReason, SkipTally};
pub use types::{AggregationRecord, InstitutionDescriptor, SourceResource};
