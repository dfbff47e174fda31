//! Pre-downloaded JSON snapshots.
//!
//! Some institutions publish a finished record dump instead of an OAI-PMH
//! feed. The dump is a JSON object whose `records` array is passed through
//! without mapping.

use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::RetryPolicy;
use crate::error::{HarvesterError, Result};
use crate::http::{build_url, bytes_to_string, download_bytes};

/// Download a snapshot and return its records.
pub fn fetch_snapshot(client: &Client, url: &str, policy: RetryPolicy) -> Result<Vec<Value>> {
    let url = build_url(url, &[])?;
    tracing::info!(url = %url, "Downloading snapshot");
    let bytes = download_bytes(client, &url, policy)?;
    parse_snapshot(&bytes_to_string(&bytes, "snapshot"))
}

/// Extract the `records` array of a snapshot document.
///
/// # Examples
/// ```
/// use heartland_harvester::snapshot::parse_snapshot;
///
/// let records = parse_snapshot(r#"{"records": [{"@id": "a"}, {"@id": "b"}]}"#).unwrap();
/// assert_eq!(records.len(), 2);
/// assert!(parse_snapshot(r#"{"items": []}"#).is_err());
/// ```
pub fn parse_snapshot(json: &str) -> Result<Vec<Value>> {
    let mut doc: Value = serde_json::from_str(json)?;
    match doc.get_mut("records").map(Value::take) {
        Some(Value::Array(records)) => Ok(records),
        _ => Err(HarvesterError::MissingElement {
            element: "records".to_string(),
            context: "snapshot".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_snapshot_keeps_records_unchanged() {
        let records =
            parse_snapshot(r#"{"count": 1, "records": [{"@id": "x", "extra": [1, 2]}]}"#).unwrap();
        assert_eq!(records, vec![serde_json::json!({"@id": "x", "extra": [1, 2]})]);
    }

    #[test]
    fn test_parse_snapshot_rejects_non_array() {
        assert!(matches!(
            parse_snapshot(r#"{"records": "nope"}"#),
            Err(HarvesterError::MissingElement { .. })
        ));
        assert!(matches!(
            parse_snapshot("not json"),
            Err(HarvesterError::Json(_))
        ));
    }
}
