//! Configuration constants and validation functions for the harvester.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{HarvesterError, Result};
use crate::types::InstitutionDescriptor;

/// HTTP timeout in seconds.
///
/// Small library feeds can take a long time to render a full page of records.
pub const HTTP_TIMEOUT_SECS: u64 = 120;

/// Delay before retrying a request after a server or connection fault.
pub const RETRY_DELAY_SECS: u64 = 5;

/// Consecutive connection failures after which a session gives up.
pub const MAX_CONNECTION_FAILURES: u32 = 5;

/// Metadata prefix requested when an endpoint offers it.
pub const PREFERRED_METADATA_PREFIX: &str = "oai_dc";

/// Metadata prefix sentinel marking a pre-downloaded JSON snapshot.
pub const DATA_DUMP_SENTINEL: &str = "data_dump";

/// JSON-LD context of every aggregation record.
pub const AGGREGATION_CONTEXT: &str = "http://dp.la/api/items/context";

/// Type of every aggregation record.
pub const AGGREGATION_TYPE: &str = "ore:Aggregation";

/// Pointer from the aggregation to its source resource.
pub const AGGREGATED_CHO: &str = "#sourceResource";

/// Contributing hub identifier.
pub const PROVIDER_ID: &str = "http://dp.la/api/contributor/missouri-hub";

/// Contributing hub display name.
pub const PROVIDER_NAME: &str = "Missouri Hub";

/// Default institution descriptor file.
pub const DEFAULT_INSTITUTIONS_FILE: &str = "files/institutions.json";

/// Default directory for per-institution output artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "files/institutions";

/// Institutions crawled within this many hours are not crawled again.
pub const DEFAULT_RECRAWL_HOURS: u64 = 24;

/// Institution id pattern: lowercase letters, digits, dash and underscore.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INSTITUTION_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("valid regex"));

/// Retry budget for one-off requests (Identify, ListMetadataFormats,
/// snapshots). Server errors and connection failures share the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(RETRY_DELAY_SECS),
            max_attempts: MAX_CONNECTION_FAILURES,
        }
    }
}

/// Runtime settings for a crawl run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub retry_delay: Duration,
    pub max_connection_failures: u32,
    pub output_dir: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(RETRY_DELAY_SECS),
            max_connection_failures: MAX_CONNECTION_FAILURES,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl HarvestConfig {
    /// Build a config from `HARVEST_*` environment variables, falling back
    /// to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let retry_delay_secs: u64 = std::env::var("HARVEST_RETRY_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(RETRY_DELAY_SECS);

        let max_connection_failures = std::env::var("HARVEST_MAX_CONNECTION_FAILURES")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &u32| *n > 0)
            .unwrap_or(MAX_CONNECTION_FAILURES);

        let output_dir = std::env::var("HARVEST_OUTPUT_DIR")
            .unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.into())
            .into();

        Self {
            retry_delay: Duration::from_secs(retry_delay_secs),
            max_connection_failures,
            output_dir,
        }
    }

    /// Retry budget for requests outside the `ListRecords` loop.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            delay: self.retry_delay,
            max_attempts: self.max_connection_failures,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_max_connection_failures(mut self, max_connection_failures: u32) -> Self {
        self.max_connection_failures = max_connection_failures;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}

/// Validate institution id format.
///
/// # Examples
/// ```
/// use heartland_harvester::config::validate_institution_id;
///
/// assert!(validate_institution_id("kcpl1").is_ok());
/// assert!(validate_institution_id("Not Valid").is_err());
/// ```
pub fn validate_institution_id(id: &str) -> Result<()> {
    if INSTITUTION_ID_PATTERN.is_match(id) {
        Ok(())
    } else {
        Err(HarvesterError::InvalidInstitutionId(id.to_string()))
    }
}

/// Validate an institution descriptor before crawling it.
///
/// An empty endpoint URL is allowed: it marks an institution without a live
/// feed.
pub fn validate_descriptor(descriptor: &InstitutionDescriptor) -> Result<()> {
    validate_institution_id(&descriptor.id)?;

    let invalid = |reason: &str| HarvesterError::InvalidDescriptor {
        id: descriptor.id.clone(),
        reason: reason.to_string(),
    };

    if descriptor.id_prefix.trim().is_empty() {
        return Err(invalid("@id_prefix must not be empty"));
    }

    if !descriptor.url.is_empty() {
        let parsed = url::Url::parse(&descriptor.url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("endpoint URL must use http or https"));
        }
    }

    Ok(())
}
