//! Main harvester service that ties all components together.

use std::path::PathBuf;

use crate::config::{validate_descriptor, HarvestConfig};
use crate::error::Result;
use crate::http::create_client;
use crate::mapping::InstitutionRegistry;
use crate::output::{write_report, write_snapshot};
use crate::session::{CrawlReport, FeedSession, Progress};
use crate::snapshot::fetch_snapshot;
use crate::types::InstitutionDescriptor;

/// Crawl one institution's feed.
///
/// # Arguments
/// * `descriptor` - The institution to crawl
/// * `registry` - Mapping profiles, keyed by institution id
/// * `config` - Retry policy and output settings
///
/// # Returns
/// A `CrawlReport` with the mapped records and the skip tally. A session
/// that aborts still returns `Ok` with partial results.
pub fn crawl(
    descriptor: &InstitutionDescriptor,
    registry: &InstitutionRegistry,
    config: HarvestConfig,
) -> Result<CrawlReport> {
    validate_descriptor(descriptor)?;
    FeedSession::new(descriptor, registry, config)?.crawl()
}

/// What happened to one institution.
#[derive(Debug)]
pub enum HarvestOutcome {
    /// Live feed crawled and written.
    Crawled { report: CrawlReport, path: PathBuf },
    /// JSON snapshot downloaded and written as-is.
    Snapshot { count: usize, path: PathBuf },
    /// No endpoint configured; the previous artifact is left in place.
    NoFeed,
}

/// Crawl or download one institution and write its artifact.
///
/// `on_progress` receives running totals after every page of a live crawl.
pub fn harvest_institution<'a>(
    descriptor: &'a InstitutionDescriptor,
    registry: &'a InstitutionRegistry,
    config: &HarvestConfig,
    on_progress: impl FnMut(Progress) + 'a,
) -> Result<HarvestOutcome> {
    validate_descriptor(descriptor)?;

    if !descriptor.has_live_feed() {
        tracing::warn!(
            institution = %descriptor.id,
            "No feed URL configured, keeping last artifact"
        );
        return Ok(HarvestOutcome::NoFeed);
    }

    if descriptor.is_snapshot() {
        let client = create_client()?;
        let records = fetch_snapshot(&client, &descriptor.url, config.retry_policy())?;
        let name = descriptor.configured_name().unwrap_or(&descriptor.id);
        let path = write_snapshot(&config.output_dir, &descriptor.id, name, &records)?;
        tracing::info!(
            institution = %descriptor.id,
            records = records.len(),
            "Snapshot written"
        );
        return Ok(HarvestOutcome::Snapshot {
            count: records.len(),
            path,
        });
    }

    let report = FeedSession::new(descriptor, registry, config.clone())?
        .on_progress(on_progress)
        .crawl()?;
    let path = write_report(&config.output_dir, &report)?;

    Ok(HarvestOutcome::Crawled { report, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvesterError;
    use crate::mapping::create_default_registry;

    fn descriptor(id: &str, url: &str) -> InstitutionDescriptor {
        InstitutionDescriptor {
            name: Some("Test".into()),
            id: id.into(),
            url: url.into(),
            metadata_prefix: Some("oai_dc".into()),
            id_prefix: "missouri--urn:test".into(),
            include: Vec::new(),
            exclude: Vec::new(),
            hub: None,
        }
    }

    #[test]
    fn test_crawl_rejects_invalid_id() {
        let registry = create_default_registry();
        let err = crawl(
            &descriptor("Bad Id", "https://example.org/oai"),
            &registry,
            HarvestConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HarvesterError::InvalidInstitutionId(_)));
    }

    #[test]
    fn test_no_feed_keeps_last_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let registry = create_default_registry();
        let config = HarvestConfig::default().with_output_dir(dir.path());

        let outcome =
            harvest_institution(&descriptor("mhm", ""), &registry, &config, |_| {}).unwrap();

        assert!(matches!(outcome, HarvestOutcome::NoFeed));
        assert!(!dir.path().join("mhm.json").exists());
    }
}
