//! Per-institution JSON artifacts.
//!
//! Each crawl replaces `<output_dir>/<id>.json`. The file's modification
//! time doubles as the last-crawled timestamp for the recrawl guard.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::session::CrawlReport;
use crate::skip::SkipEntry;

/// Serialized shape of an artifact file.
#[derive(Debug, Serialize)]
pub struct Artifact<'a, T: Serialize> {
    pub institution: &'a str,
    pub count: usize,
    pub skipped: usize,
    pub skipped_errors: BTreeMap<&'static str, SkipEntry>,
    pub records: &'a [T],
}

/// Path of an institution's artifact.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use heartland_harvester::output::artifact_path;
///
/// assert_eq!(
///     artifact_path(Path::new("files/institutions"), "kcpl1"),
///     Path::new("files/institutions/kcpl1.json")
/// );
/// ```
#[must_use]
pub fn artifact_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.json"))
}

/// Write an artifact as pretty JSON, creating `dir` if needed.
pub fn write_artifact<T: Serialize>(
    dir: &Path,
    id: &str,
    artifact: &Artifact<'_, T>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = artifact_path(dir, id);
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(&path, json)?;
    tracing::debug!(path = %path.display(), count = artifact.count, "Artifact written");
    Ok(path)
}

/// Write a crawl report's artifact.
pub fn write_report(dir: &Path, report: &CrawlReport) -> Result<PathBuf> {
    write_artifact(
        dir,
        &report.institution_id,
        &Artifact {
            institution: &report.institution_name,
            count: report.records.len(),
            skipped: report.skipped(),
            skipped_errors: report.tally.by_label(),
            records: &report.records,
        },
    )
}

/// Write a downloaded snapshot's records unchanged.
pub fn write_snapshot(
    dir: &Path,
    id: &str,
    institution: &str,
    records: &[serde_json::Value],
) -> Result<PathBuf> {
    write_artifact(
        dir,
        id,
        &Artifact {
            institution,
            count: records.len(),
            skipped: 0,
            skipped_errors: BTreeMap::new(),
            records,
        },
    )
}

/// Whether the institution's artifact was written within the last `hours`.
///
/// A missing or unreadable artifact counts as not crawled.
#[must_use]
pub fn crawled_recently(dir: &Path, id: &str, hours: u64) -> bool {
    let Ok(modified) = fs::metadata(artifact_path(dir, id)).and_then(|m| m.modified()) else {
        return false;
    };
    let window = TimeDelta::try_hours(i64::try_from(hours).unwrap_or(i64::MAX))
        .unwrap_or(TimeDelta::MAX);
    Utc::now() - DateTime::<Utc>::from(modified) < window
}
