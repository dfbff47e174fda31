//! OAI-PMH protocol requests and response parsing.
//!
//! Covers the introspection verbs (`Identify`, `ListSets`,
//! `ListMetadataFormats`) and the pieces of a `ListRecords` page the feed
//! session needs: its records and its resumption token.

use std::collections::BTreeMap;

use reqwest::blocking::Client;
use roxmltree::{Document, Node};
use serde::Serialize;

use crate::config::{RetryPolicy, PREFERRED_METADATA_PREFIX};
use crate::error::{HarvesterError, Result};
use crate::http::{build_url, bytes_to_string, create_client, download_bytes};
use crate::xml::{deep_text, element_children, find_child, find_children, get_tag_name, has_tag};

/// One set advertised by `ListSets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetInfo {
    #[serde(rename = "setSpec")]
    pub spec: String,
    #[serde(rename = "setName")]
    pub name: String,
}

/// Client for one OAI-PMH endpoint.
pub struct OaiClient {
    client: Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl OaiClient {
    /// Create a client with the default HTTP configuration.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_client(create_client()?, endpoint)
    }

    /// Create a client around an existing HTTP client.
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        build_url(&endpoint, &[])?;
        Ok(Self {
            client,
            endpoint,
            retry: RetryPolicy::default(),
        })
    }

    /// Retry budget for the introspection verbs.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Issue a bare verb request and return the body text. Server errors
    /// and connection failures are retried within the client's budget.
    pub fn request(&self, verb: &str) -> Result<String> {
        let url = build_url(&self.endpoint, &[("verb", verb)])?;
        tracing::debug!(url = %url, "OAI request");
        let bytes = download_bytes(&self.client, &url, self.retry)?;
        Ok(bytes_to_string(&bytes, verb))
    }

    /// `Identify` fields: element name → text.
    pub fn identify(&self) -> Result<BTreeMap<String, String>> {
        parse_identify(&self.request("Identify")?)
    }

    /// Repository name from `Identify`.
    pub fn repository_name(&self) -> Result<String> {
        self.identify()?
            .remove("repositoryName")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| HarvesterError::MissingElement {
                element: "repositoryName".to_string(),
                context: "Identify".to_string(),
            })
    }

    /// Sets advertised by `ListSets`.
    pub fn list_sets(&self) -> Result<Vec<SetInfo>> {
        parse_sets(&self.request("ListSets")?)
    }

    /// Metadata prefixes advertised by `ListMetadataFormats`.
    pub fn list_metadata_formats(&self) -> Result<Vec<String>> {
        parse_metadata_formats(&self.request("ListMetadataFormats")?)
    }

    /// Negotiate the metadata prefix to harvest with.
    pub fn get_metadata_prefix(&self) -> Result<String> {
        choose_metadata_prefix(&self.list_metadata_formats()?, &self.endpoint)
    }
}

fn descendants_named<'a, 'input>(
    doc: &'a Document<'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.descendants().filter(move |n| has_tag(*n, tag))
}

/// Parse an `Identify` response.
///
/// # Examples
/// ```
/// use heartland_harvester::oai::parse_identify;
///
/// let xml = r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/"><Identify>
///   <repositoryName>Example Library</repositoryName>
///   <baseURL>https://example.org/oai</baseURL>
/// </Identify></OAI-PMH>"#;
/// let fields = parse_identify(xml).unwrap();
/// assert_eq!(fields["repositoryName"], "Example Library");
/// ```
pub fn parse_identify(xml: &str) -> Result<BTreeMap<String, String>> {
    let doc = Document::parse(xml)?;
    let identify =
        descendants_named(&doc, "Identify")
            .next()
            .ok_or_else(|| HarvesterError::MissingElement {
                element: "Identify".to_string(),
                context: "Identify response".to_string(),
            })?;

    Ok(element_children(identify)
        .map(|child| (get_tag_name(child).to_string(), deep_text(child)))
        .collect())
}

/// Parse a `ListSets` response.
pub fn parse_sets(xml: &str) -> Result<Vec<SetInfo>> {
    let doc = Document::parse(xml)?;
    Ok(descendants_named(&doc, "set")
        .map(|set| SetInfo {
            spec: find_child(set, "setSpec").map(deep_text).unwrap_or_default(),
            name: find_child(set, "setName").map(deep_text).unwrap_or_default(),
        })
        .collect())
}

/// Parse a `ListMetadataFormats` response.
pub fn parse_metadata_formats(xml: &str) -> Result<Vec<String>> {
    let doc = Document::parse(xml)?;
    Ok(descendants_named(&doc, "metadataPrefix")
        .map(deep_text)
        .filter(|prefix| !prefix.is_empty())
        .collect())
}

/// Prefer [`PREFERRED_METADATA_PREFIX`], else the first advertised prefix.
///
/// # Examples
/// ```
/// use heartland_harvester::oai::choose_metadata_prefix;
///
/// let formats = vec!["mods".to_string(), "oai_dc".to_string()];
/// assert_eq!(choose_metadata_prefix(&formats, "https://x").unwrap(), "oai_dc");
/// assert_eq!(choose_metadata_prefix(&formats[..1], "https://x").unwrap(), "mods");
/// assert!(choose_metadata_prefix(&[], "https://x").is_err());
/// ```
pub fn choose_metadata_prefix(formats: &[String], endpoint: &str) -> Result<String> {
    formats
        .iter()
        .find(|f| f.as_str() == PREFERRED_METADATA_PREFIX)
        .or_else(|| formats.first())
        .cloned()
        .ok_or_else(|| HarvesterError::NoMetadataFormat {
            url: endpoint.to_string(),
        })
}

/// The `<record>` children of a page's `<ListRecords>` element.
pub fn page_records<'a, 'input>(
    doc: &'a Document<'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    descendants_named(doc, "ListRecords").flat_map(|list| find_children(list, "record"))
}

/// Resumption token of a page; `None` when absent or empty (last page).
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use heartland_harvester::oai::resumption_token;
///
/// let doc = Document::parse("<ListRecords><resumptionToken cursor=\"0\">abc</resumptionToken></ListRecords>").unwrap();
/// assert_eq!(resumption_token(&doc).as_deref(), Some("abc"));
///
/// let doc = Document::parse("<ListRecords><resumptionToken completeListSize=\"2\"/></ListRecords>").unwrap();
/// assert_eq!(resumption_token(&doc), None);
/// ```
#[must_use]
pub fn resumption_token(doc: &Document<'_>) -> Option<String> {
    descendants_named(doc, "resumptionToken")
        .next()
        .map(deep_text)
        .filter(|token| !token.is_empty())
}

/// Protocol-level error of a response: `(code, message)`.
#[must_use]
pub fn oai_error(doc: &Document<'_>) -> Option<(String, String)> {
    descendants_named(doc, "error").next().map(|error| {
        (
            error.attribute("code").unwrap_or_default().to_string(),
            deep_text(error),
        )
    })
}

/// The schema-specific root under a record's `<metadata>` wrapper.
#[must_use]
pub fn metadata_root<'a, 'input>(record: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    find_child(record, "metadata").and_then(|m| element_children(m).next())
}

/// Whether a record header carries `status="deleted"`.
#[must_use]
pub fn is_deleted(header: Node<'_, '_>) -> bool {
    header.attribute("status") == Some("deleted")
}
