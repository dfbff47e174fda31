//! Core data types for the harvester.
//!
//! Institution descriptors come in from configuration; aggregation records
//! go out in the DPLA item shape.

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{
    AGGREGATED_CHO, AGGREGATION_CONTEXT, AGGREGATION_TYPE, DATA_DUMP_SENTINEL, PROVIDER_ID,
    PROVIDER_NAME,
};

/// One institution's feed configuration. Immutable for a crawl run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionDescriptor {
    /// Display name; discovered from the feed's Identify response when absent.
    #[serde(rename = "institution", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Internal id, used to select the institution's mapping profile.
    pub id: String,

    /// OAI-PMH endpoint. Empty when no live feed is available.
    #[serde(default)]
    pub url: String,

    /// Metadata prefix to request, or `data_dump` for a JSON snapshot.
    /// Negotiated with the endpoint when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_prefix: Option<String>,

    /// Prefix of every aggregation id produced for this institution.
    #[serde(rename = "@id_prefix")]
    pub id_prefix: String,

    /// Sets to crawl. Empty means the whole feed.
    #[serde(default, deserialize_with = "one_or_many")]
    pub include: Vec<String>,

    /// Sets whose records are skipped.
    #[serde(default, deserialize_with = "one_or_many")]
    pub exclude: Vec<String>,

    /// Hub the institution contributes through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub: Option<String>,
}

impl InstitutionDescriptor {
    /// Whether the url points at a pre-downloaded JSON snapshot instead of a feed.
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        self.metadata_prefix.as_deref() == Some(DATA_DUMP_SENTINEL)
    }

    /// Whether a live endpoint is configured.
    #[must_use]
    pub fn has_live_feed(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Configured display name, if it is non-blank.
    #[must_use]
    pub fn configured_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// Accept either `"set"` or `["set", ...]` for include/exclude lists.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) if s.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// A subject heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
}

impl Subject {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A resolved language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// ISO 639-2/B code where one exists (`fre`, `ger`), else ISO 639-3.
    /// The artifact key stays `iso639_3` for existing aggregator consumers.
    #[serde(rename = "iso639_3")]
    pub code: String,

    /// English name.
    pub name: String,
}

/// A temporal coverage entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Temporal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,

    #[serde(rename = "displayDate", skip_serializing_if = "Option::is_none")]
    pub display_date: Option<String>,
}

/// Descriptive metadata block of an aggregation record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceResource {
    pub title: Vec<String>,
    pub description: Vec<String>,
    pub subject: Vec<Subject>,
    pub temporal: Vec<Temporal>,
    pub creator: Vec<String>,
    pub language: Vec<Language>,
    pub rights: String,

    /// Local fragment of the source record's OAI identifier.
    #[serde(rename = "@id")]
    pub id: String,

    pub format: String,
    pub identifier: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Vec<String>>,
}

/// Reference to the object's landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResource {
    #[serde(rename = "@id")]
    pub id: String,
}

/// The contributing hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            id: PROVIDER_ID.to_string(),
            name: PROVIDER_NAME.to_string(),
        }
    }
}

/// Canonical output record: one harvested item plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationRecord {
    #[serde(rename = "@context")]
    pub context: String,

    #[serde(rename = "@type")]
    pub record_type: String,

    /// `<institution-prefix>:<local-fragment>`.
    #[serde(rename = "@id")]
    pub id: String,

    pub is_shown_at: String,
    pub has_view: WebResource,
    pub data_provider: String,
    pub provider: Provider,

    /// Thumbnail URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    #[serde(rename = "aggregatedCHO")]
    pub aggregated_cho: String,

    pub source_resource: SourceResource,

    /// Machine-readable rights statement URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights_category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iiif_manifest: Option<String>,
}

impl AggregationRecord {
    /// Populate the aggregation template around a mapped source resource.
    ///
    /// Empty thumbnail and manifest strings are omitted from the output.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        data_provider: impl Into<String>,
        thumbnail: &str,
        manifest: &str,
        source_resource: SourceResource,
    ) -> Self {
        let url = url.into();
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            context: AGGREGATION_CONTEXT.to_string(),
            record_type: AGGREGATION_TYPE.to_string(),
            id: id.into(),
            has_view: WebResource { id: url.clone() },
            is_shown_at: url,
            data_provider: data_provider.into(),
            provider: Provider::default(),
            object: non_empty(thumbnail),
            aggregated_cho: AGGREGATED_CHO.to_string(),
            source_resource,
            rights: None,
            rights_category: None,
            iiif_manifest: non_empty(manifest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_descriptor_from_json() {
        let json = r#"{
            "institution": "Kansas City Public Library",
            "id": "kcpl1",
            "url": "https://example.org/oai",
            "metadata_prefix": "oai_dc",
            "@id_prefix": "missouri--urn:kcpl",
            "include": "collection1",
            "exclude": ["private", "staff"]
        }"#;
        let descriptor: InstitutionDescriptor = serde_json::from_str(json).unwrap();

        assert_eq!(descriptor.configured_name(), Some("Kansas City Public Library"));
        assert_eq!(descriptor.include, vec!["collection1".to_string()]);
        assert_eq!(
            descriptor.exclude,
            vec!["private".to_string(), "staff".to_string()]
        );
        assert!(descriptor.has_live_feed());
        assert!(!descriptor.is_snapshot());
        assert!(descriptor.hub.is_none());
    }

    #[test]
    fn test_descriptor_minimal() {
        let json = r#"{"id": "mhm", "url": "", "@id_prefix": "p", "metadata_prefix": "data_dump", "institution": ""}"#;
        let descriptor: InstitutionDescriptor = serde_json::from_str(json).unwrap();

        assert!(descriptor.include.is_empty());
        assert!(descriptor.exclude.is_empty());
        assert!(!descriptor.has_live_feed());
        assert!(descriptor.is_snapshot());
        assert_eq!(descriptor.configured_name(), None);
    }

    #[test]
    fn test_aggregation_record_shape() {
        let record = AggregationRecord::new(
            "missouri--urn:kcpl:123",
            "https://example.org/item/123",
            "Kansas City Public Library",
            "",
            "",
            SourceResource::default(),
        );
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["@context"], "http://dp.la/api/items/context");
        assert_eq!(value["@type"], "ore:Aggregation");
        assert_eq!(value["isShownAt"], "https://example.org/item/123");
        assert_eq!(value["hasView"]["@id"], "https://example.org/item/123");
        assert_eq!(value["provider"]["name"], "Missouri Hub");
        assert_eq!(value["aggregatedCHO"], "#sourceResource");
        assert!(value.get("object").is_none());
        assert!(value.get("iiifManifest").is_none());
        assert!(value.get("rights").is_none());
        assert!(value["sourceResource"].get("publisher").is_none());
    }

    #[test]
    fn test_language_serializes_with_iso_key() {
        let language = Language {
            code: "eng".to_string(),
            name: "English".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&language).unwrap(),
            r#"{"iso639_3":"eng","name":"English"}"#
        );

        let french = Language {
            code: crate::language::code(isolang::Language::Fra).to_string(),
            name: "French".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&french).unwrap(),
            r#"{"iso639_3":"fre","name":"French"}"#
        );
    }
}
