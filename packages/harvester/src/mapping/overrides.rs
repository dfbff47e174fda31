//! Per-institution rules applied around the source-resource template.
//!
//! Pre-mapping rules rewrite the parsed record, data provider or id prefix
//! before URLs are resolved and the template runs. Post-mapping rules patch
//! the assembled aggregation record.

use crate::formatter::{self, JOIN_SEPARATOR};
use crate::types::AggregationRecord;
use crate::xml::{FieldValue, ParsedRecord};

/// Everything a pre-mapping rule may rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingInput {
    pub record: ParsedRecord,
    pub data_provider: String,
    pub id_prefix: String,
}

/// Rules that run before URL resolution and templating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreOverride {
    /// Data provider becomes the first value of `field` plus `suffix`.
    ProviderFromField {
        field: &'static str,
        suffix: &'static str,
    },
    /// Replace `placeholder` in the id prefix with the record's collection.
    CollectionInIdPrefix { placeholder: &'static str },
    /// Empty `field` for records of one collection.
    ClearFieldForCollection {
        collection: &'static str,
        field: &'static str,
    },
    /// Replace `field` with a fixed value for records of one collection.
    ReplaceFieldForCollection {
        collection: &'static str,
        field: &'static str,
        value: &'static str,
    },
    /// Rename keys like `date_http://purl.org/dc/terms/W3CDTF` to `date`.
    StripNamespacedKeys,
}

impl PreOverride {
    pub fn apply(&self, input: &mut MappingInput) {
        match self {
            Self::ProviderFromField { field, suffix } => {
                if let Some(value) = input.record.metadata_values(field).first() {
                    input.data_provider = format!("{value}{suffix}");
                }
            }
            Self::CollectionInIdPrefix { placeholder } => {
                if let Some(collection) = input.record.collection() {
                    input.id_prefix = input.id_prefix.replace(placeholder, collection);
                }
            }
            Self::ClearFieldForCollection { collection, field } => {
                if input.record.collection() == Some(*collection) {
                    input
                        .record
                        .metadata
                        .insert((*field).to_string(), FieldValue::Leaf(Vec::new()));
                }
            }
            Self::ReplaceFieldForCollection {
                collection,
                field,
                value,
            } => {
                if input.record.collection() == Some(*collection) {
                    input
                        .record
                        .metadata
                        .insert((*field).to_string(), FieldValue::text(*value));
                }
            }
            Self::StripNamespacedKeys => strip_namespaced_keys(&mut input.record),
        }
    }
}

fn strip_namespaced_keys(record: &mut ParsedRecord) {
    let namespaced: Vec<String> = record
        .metadata
        .keys()
        .filter(|key| {
            key.split('_')
                .nth(1)
                .is_some_and(|suffix| suffix.starts_with("http"))
        })
        .cloned()
        .collect();

    for key in namespaced {
        if let Some(value) = record.metadata.shift_remove(&key) {
            let base = key.split('_').next().unwrap_or(&key).to_string();
            record.metadata.insert(base, value);
        }
    }
}

/// Rules that run on the assembled aggregation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOverride {
    /// Attach `field` as the source-resource publisher.
    Publisher { field: &'static str },
    /// Catalog feeds whose items are all public domain: fixed rights text,
    /// format and creator from alternate fields, and an aggregation id of
    /// `id_prefix` + the full header identifier.
    PublicDomainCatalog {
        rights: &'static str,
        format_field: &'static str,
        creator_field: &'static str,
        id_prefix: &'static str,
    },
    /// Move a rights statement URI to the aggregation `rights` field and
    /// derive `rightsCategory` from it.
    RightsUri,
}

impl PostOverride {
    pub fn apply(&self, output: &mut AggregationRecord, record: &ParsedRecord) {
        match self {
            Self::Publisher { field } => {
                output.source_resource.publisher = Some(formatter::list(field, &record.metadata));
            }
            Self::PublicDomainCatalog {
                rights,
                format_field,
                creator_field,
                id_prefix,
            } => {
                output.source_resource.rights = (*rights).to_string();
                output.source_resource.format = formatter::text(format_field, &record.metadata);
                output.source_resource.creator = formatter::list(creator_field, &record.metadata);
                if let Some(identifier) = record.header_identifier() {
                    output.id = format!("{id_prefix}{identifier}");
                }
            }
            Self::RightsUri => move_rights_uri(output),
        }
    }
}

fn is_rights_uri(value: &str) -> bool {
    let Ok(parsed) = url::Url::parse(value) else {
        return false;
    };
    matches!(
        parsed.host_str(),
        Some(
            "rightsstatements.org"
                | "www.rightsstatements.org"
                | "creativecommons.org"
                | "www.creativecommons.org"
        )
    )
}

/// Category label for a rights statement URI.
///
/// # Examples
/// ```
/// use heartland_harvester::mapping::rights_category;
///
/// assert_eq!(rights_category("http://rightsstatements.org/vocab/InC/1.0/"), "In Copyright");
/// assert_eq!(rights_category("http://rightsstatements.org/vocab/NoC-US/1.0/"), "No Copyright");
/// assert_eq!(rights_category("https://creativecommons.org/licenses/by/4.0/"), "Creative Commons");
/// assert_eq!(rights_category("http://rightsstatements.org/vocab/UND/1.0/"), "Other");
/// ```
#[must_use]
pub fn rights_category(uri: &str) -> &'static str {
    let lowered = uri.to_lowercase();
    if lowered.contains("rightsstatements.org") {
        if lowered.contains("/inc") {
            "In Copyright"
        } else if lowered.contains("/noc") || lowered.contains("/nkc") {
            "No Copyright"
        } else {
            "Other"
        }
    } else if lowered.contains("creativecommons.org") {
        if lowered.contains("/publicdomain") {
            "No Copyright"
        } else {
            "Creative Commons"
        }
    } else {
        "Other"
    }
}

fn move_rights_uri(output: &mut AggregationRecord) {
    let statements: Vec<&str> = output.source_resource.rights.split(JOIN_SEPARATOR).collect();
    let Some(position) = statements.iter().position(|s| is_rights_uri(s.trim())) else {
        return;
    };

    let uri = statements[position].trim().to_string();
    let remaining: Vec<&str> = statements
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != position)
        .map(|(_, s)| *s)
        .collect();

    output.rights_category = Some(rights_category(&uri).to_string());
    output.rights = Some(uri);
    output.source_resource.rights = remaining.join(JOIN_SEPARATOR);
}
