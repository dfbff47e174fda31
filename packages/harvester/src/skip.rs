//! Categorized accounting of records that did not produce output.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Sampled record identifiers kept per reason.
pub const MAX_SAMPLES: usize = 10;

/// Why a raw record produced no output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    Deleted,
    ExcludedCollection,
    MissingHeaderOrMetadata,
    NoDerivableUrl,
    MappingError,
}

impl SkipReason {
    /// Label used in logs and output artifacts.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::ExcludedCollection => "excluded collection",
            Self::MissingHeaderOrMetadata => "missing header/metadata",
            Self::NoDerivableUrl => "no derivable URL",
            Self::MappingError => "mapping error",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Count and sampled offenders for one reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipEntry {
    pub count: usize,
    pub records: Vec<String>,
}

/// Per-session skip tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipTally {
    entries: BTreeMap<SkipReason, SkipEntry>,
}

impl SkipTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one skipped record. `record` identifies the offender when known.
    pub fn record(&mut self, reason: SkipReason, record: Option<&str>) {
        let entry = self.entries.entry(reason).or_default();
        entry.count += 1;
        if let Some(id) = record {
            if entry.records.len() < MAX_SAMPLES {
                entry.records.push(id.to_string());
            }
        }
    }

    /// Total skipped records across all reasons.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.values().map(|e| e.count).sum()
    }

    #[must_use]
    pub fn count(&self, reason: SkipReason) -> usize {
        self.entries.get(&reason).map_or(0, |e| e.count)
    }

    #[must_use]
    pub fn get(&self, reason: SkipReason) -> Option<&SkipEntry> {
        self.entries.get(&reason)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkipReason, &SkipEntry)> {
        self.entries.iter().map(|(reason, entry)| (*reason, entry))
    }

    /// Label-keyed view for output artifacts.
    #[must_use]
    pub fn by_label(&self) -> BTreeMap<&'static str, SkipEntry> {
        self.iter()
            .map(|(reason, entry)| (reason.label(), entry.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_and_total() {
        let mut tally = SkipTally::new();
        tally.record(SkipReason::Deleted, Some("oai:x:1"));
        tally.record(SkipReason::Deleted, Some("oai:x:2"));
        tally.record(SkipReason::MissingHeaderOrMetadata, None);

        assert_eq!(tally.total(), 3);
        assert_eq!(tally.count(SkipReason::Deleted), 2);
        assert_eq!(tally.count(SkipReason::NoDerivableUrl), 0);
        assert_eq!(
            tally.get(SkipReason::Deleted).unwrap().records,
            vec!["oai:x:1".to_string(), "oai:x:2".to_string()]
        );
        assert!(tally
            .get(SkipReason::MissingHeaderOrMetadata)
            .unwrap()
            .records
            .is_empty());
    }

    #[test]
    fn test_samples_are_capped() {
        let mut tally = SkipTally::new();
        for i in 0..25 {
            tally.record(SkipReason::MappingError, Some(&format!("oai:x:{i}")));
        }

        let entry = tally.get(SkipReason::MappingError).unwrap();
        assert_eq!(entry.count, 25);
        assert_eq!(entry.records.len(), MAX_SAMPLES);
    }

    #[test]
    fn test_by_label_serializes() {
        let mut tally = SkipTally::new();
        tally.record(SkipReason::ExcludedCollection, Some("oai:x:9"));

        let json = serde_json::to_value(tally.by_label()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"excluded collection": {"count": 1, "records": ["oai:x:9"]}})
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(SkipReason::Deleted.to_string(), "deleted");
        assert_eq!(SkipReason::NoDerivableUrl.label(), "no derivable URL");
        assert_eq!(
            SkipReason::MissingHeaderOrMetadata.label(),
            "missing header/metadata"
        );
    }
}
