//! Error types for the harvester.
//!
//! Uses the dual-error pattern: `HarvesterError` for library consumers
//! with detailed error context, and `MappingFailure` (see [`crate::mapping`])
//! for record-level faults that are absorbed as skips and never escape a
//! feed session.

use std::collections::BTreeMap;

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Invalid institution id format.
    #[error("Invalid institution id: '{0}'. Expected lowercase letters, digits, '-' or '_' (e.g., kcpl1)")]
    InvalidInstitutionId(String),

    /// Institution descriptor failed validation.
    #[error("Invalid descriptor for institution '{id}': {reason}")]
    InvalidDescriptor { id: String, reason: String },

    /// No descriptor with the requested id.
    #[error("Institution '{0}' not found in configuration")]
    InstitutionNotFound(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A one-off request kept failing until its retry budget ran out.
    #[error("Request to {url} failed after {attempts} attempt(s): {reason}")]
    Unavailable {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// Some institutions of a multi-institution run failed.
    #[error("{} institution(s) failed: {}", .0.len(), .0.join(", "))]
    InstitutionsFailed(Vec<String>),

    /// Endpoint URL could not be parsed.
    #[error("Invalid endpoint URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// Missing required XML element in an OAI-PMH response.
    #[error("Missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// The endpoint advertises no metadata format we can harvest.
    #[error("No metadata format advertised by {url}")]
    NoMetadataFormat { url: String },

    /// No URL strategy is registered for the institution.
    ///
    /// Carries every metadata field path whose value looks like a URL, so an
    /// operator can decide which field should become the access URL.
    #[error("No URL mapping registered for institution '{institution}' ({} candidate fields found)", .candidates.len())]
    NoUrlStrategy {
        institution: String,
        candidates: BTreeMap<String, String>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error.
    #[error("YAML parsing failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
