//! URL, thumbnail and manifest resolution strategies.

use url::Url;

use crate::formatter;
use crate::xml::ParsedRecord;

/// Access URL plus optional thumbnail and IIIF manifest.
///
/// Empty strings mean "not available". An empty `url` means the record has
/// no derivable access URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedUrls {
    pub url: String,
    pub thumbnail: String,
    pub manifest: String,
}

impl ResolvedUrls {
    #[must_use]
    pub fn new(url: impl Into<String>, thumbnail: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            thumbnail: thumbnail.into(),
            manifest: String::new(),
        }
    }

    #[must_use]
    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    #[must_use]
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Derives the access URL of a record for one institution's feed.
///
/// Implementations never fail: missing source fields produce empty strings.
pub trait UrlStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn resolve(&self, record: &ParsedRecord) -> ResolvedUrls;
}

fn first(values: &[String]) -> &str {
    values.first().map_or("", String::as_str)
}

/// MODS `location/url`, with the preview variant as thumbnail.
pub struct ModsLocation;

impl UrlStrategy for ModsLocation {
    fn name(&self) -> &'static str {
        "mods-location"
    }

    fn resolve(&self, record: &ParsedRecord) -> ResolvedUrls {
        ResolvedUrls::new(
            formatter::text("location.url", &record.metadata),
            formatter::text("location.url_preview", &record.metadata),
        )
    }
}

/// Parts of a CONTENTdm item URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDmItem {
    pub base: String,
    pub collection: String,
    pub record_id: String,
}

impl ContentDmItem {
    /// Parse `https://host/.../collection/<collection>/.../<id>`.
    ///
    /// # Examples
    /// ```
    /// use heartland_harvester::mapping::ContentDmItem;
    ///
    /// let item = ContentDmItem::parse("https://cdm.example.org/cdm/ref/collection/coll1/id/77").unwrap();
    /// assert_eq!(item.base, "https://cdm.example.org");
    /// assert_eq!(item.collection, "coll1");
    /// assert_eq!(item.record_id, "77");
    /// assert!(ContentDmItem::parse("https://example.org/items/77").is_none());
    /// ```
    #[must_use]
    pub fn parse(item_url: &str) -> Option<Self> {
        let parsed = Url::parse(item_url).ok()?;
        let segments: Vec<&str> = parsed.path_segments()?.collect();
        let position = segments.iter().position(|s| *s == "collection")?;
        let collection = segments.get(position + 1)?;
        let record_id = segments.last()?;

        Some(Self {
            base: parsed.origin().ascii_serialization(),
            collection: (*collection).to_string(),
            record_id: (*record_id).to_string(),
        })
    }

    #[must_use]
    pub fn thumbnail(&self) -> String {
        format!(
            "{}/utils/getthumbnail/collection/{}/id/{}",
            self.base, self.collection, self.record_id
        )
    }

    #[must_use]
    pub fn manifest(&self) -> String {
        format!(
            "{}/iiif/info/{}/{}/manifest.json",
            self.base, self.collection, self.record_id
        )
    }
}

/// CONTENTdm feeds: the last `identifier` is the item page.
pub struct ContentDm;

impl UrlStrategy for ContentDm {
    fn name(&self) -> &'static str {
        "contentdm"
    }

    fn resolve(&self, record: &ParsedRecord) -> ResolvedUrls {
        let url = record
            .metadata_values("identifier")
            .last()
            .map_or("", String::as_str);

        match ContentDmItem::parse(url) {
            Some(item) => ResolvedUrls::new(url, item.thumbnail()).with_manifest(item.manifest()),
            None => ResolvedUrls::new(url, ""),
        }
    }
}

/// First `identifier` is the item page; an optional later one is the thumbnail.
pub struct PositionalIdentifier {
    thumbnail_index: Option<usize>,
}

impl PositionalIdentifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            thumbnail_index: None,
        }
    }

    #[must_use]
    pub fn with_thumbnail_at(mut self, index: usize) -> Self {
        self.thumbnail_index = Some(index);
        self
    }
}

impl Default for PositionalIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlStrategy for PositionalIdentifier {
    fn name(&self) -> &'static str {
        "positional-identifier"
    }

    fn resolve(&self, record: &ParsedRecord) -> ResolvedUrls {
        let identifiers = record.metadata_values("identifier");
        let thumbnail = self
            .thumbnail_index
            .and_then(|i| identifiers.get(i))
            .map_or("", String::as_str);
        ResolvedUrls::new(first(identifiers), thumbnail)
    }
}

/// Picks identifiers by substring: one marker for the item page, one for files.
pub struct IdentifierMatch {
    item_marker: &'static str,
    file_marker: &'static str,
}

impl IdentifierMatch {
    #[must_use]
    pub fn new(item_marker: &'static str, file_marker: &'static str) -> Self {
        Self {
            item_marker,
            file_marker,
        }
    }
}

impl UrlStrategy for IdentifierMatch {
    fn name(&self) -> &'static str {
        "identifier-match"
    }

    fn resolve(&self, record: &ParsedRecord) -> ResolvedUrls {
        let identifiers = record.metadata_values("identifier");
        let find = |marker: &str| {
            identifiers
                .iter()
                .find(|i| i.contains(marker))
                .map_or("", String::as_str)
        };
        ResolvedUrls::new(find(self.item_marker), find(self.file_marker))
    }
}

/// Where an Islandora thumbnail comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IslandoraThumbnail {
    None,
    /// A datastream of the object, e.g. `TN`.
    Datastream(&'static str),
    /// First value of a metadata field.
    Field(&'static str),
}

/// Islandora repositories: `<base>/islandora/object/<pid>` where the pid is
/// the first `identifier`.
pub struct IslandoraObject {
    base: String,
    namespace: Option<&'static str>,
    thumbnail: IslandoraThumbnail,
}

impl IslandoraObject {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            namespace: None,
            thumbnail: IslandoraThumbnail::None,
        }
    }

    /// Only accept pids in this namespace (the part before `:`).
    #[must_use]
    pub fn with_namespace(mut self, namespace: &'static str) -> Self {
        self.namespace = Some(namespace);
        self
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: IslandoraThumbnail) -> Self {
        self.thumbnail = thumbnail;
        self
    }
}

impl UrlStrategy for IslandoraObject {
    fn name(&self) -> &'static str {
        "islandora-object"
    }

    fn resolve(&self, record: &ParsedRecord) -> ResolvedUrls {
        let pid = first(record.metadata_values("identifier"));
        if pid.is_empty() {
            return ResolvedUrls::default();
        }
        if let Some(namespace) = self.namespace {
            if pid.split(':').next() != Some(namespace) {
                return ResolvedUrls::default();
            }
        }

        let url = format!("{}/islandora/object/{pid}", self.base);
        let thumbnail = match self.thumbnail {
            IslandoraThumbnail::None => String::new(),
            IslandoraThumbnail::Datastream(stream) => format!("{url}/datastream/{stream}/view"),
            IslandoraThumbnail::Field(field) => first(record.metadata_values(field)).to_string(),
        };
        ResolvedUrls::new(url, thumbnail)
    }
}

/// First `relation` is the item page; no thumbnail.
pub struct RelationLink;

impl UrlStrategy for RelationLink {
    fn name(&self) -> &'static str {
        "relation-link"
    }

    fn resolve(&self, record: &ParsedRecord) -> ResolvedUrls {
        ResolvedUrls::new(first(record.metadata_values("relation")), "")
    }
}

/// Catalog permalinks built from the header identifier's local fragment.
pub struct HeaderPermalink {
    url_prefix: &'static str,
    thumbnail_prefix: &'static str,
}

impl HeaderPermalink {
    #[must_use]
    pub fn new(url_prefix: &'static str, thumbnail_prefix: &'static str) -> Self {
        Self {
            url_prefix,
            thumbnail_prefix,
        }
    }
}

impl UrlStrategy for HeaderPermalink {
    fn name(&self) -> &'static str {
        "header-permalink"
    }

    fn resolve(&self, record: &ParsedRecord) -> ResolvedUrls {
        match record.local_fragment() {
            Some(fragment) => ResolvedUrls::new(
                format!("{}{fragment}", self.url_prefix),
                format!("{}{fragment}", self.thumbnail_prefix),
            ),
            None => ResolvedUrls::default(),
        }
    }
}

/// First `identifier` is the item page; the thumbnail is the first JPEG link
/// found among the descriptions.
pub struct DescriptionImage;

fn is_jpeg_link(value: &str) -> bool {
    value.starts_with("http")
        && value
            .rsplit('.')
            .next()
            .is_some_and(|ext| ext == "jpg" || ext == "jpeg")
}

impl UrlStrategy for DescriptionImage {
    fn name(&self) -> &'static str {
        "description-image"
    }

    fn resolve(&self, record: &ParsedRecord) -> ResolvedUrls {
        let thumbnail = record
            .metadata_values("description")
            .iter()
            .find(|d| is_jpeg_link(d))
            .map_or("", String::as_str);
        ResolvedUrls::new(first(record.metadata_values("identifier")), thumbnail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::FieldValue;
    use pretty_assertions::assert_eq;

    fn record(header_id: &str, fields: &[(&str, &[&str])]) -> ParsedRecord {
        let mut record = ParsedRecord::default();
        record
            .header
            .insert("identifier".into(), FieldValue::text(header_id));
        for (key, values) in fields {
            record.metadata.insert(
                key.to_string(),
                FieldValue::Leaf(values.iter().map(|v| v.to_string()).collect()),
            );
        }
        record
    }

    fn all_strategies() -> Vec<Box<dyn UrlStrategy>> {
        vec![
            Box::new(ModsLocation),
            Box::new(ContentDm),
            Box::new(PositionalIdentifier::new().with_thumbnail_at(1)),
            Box::new(IdentifierMatch::new("/items/", "/files/")),
            Box::new(
                IslandoraObject::new("https://example.org")
                    .with_namespace("demo")
                    .with_thumbnail(IslandoraThumbnail::Datastream("TN")),
            ),
            Box::new(
                IslandoraObject::new("https://example.org")
                    .with_thumbnail(IslandoraThumbnail::Field("identifier_thumbnail")),
            ),
            Box::new(RelationLink),
            Box::new(HeaderPermalink::new("https://x/p/", "https://x/t/")),
            Box::new(DescriptionImage),
        ]
    }

    #[test]
    fn test_strategies_tolerate_missing_optional_fields() {
        let record = record("oai:example.org:1", &[("identifier", &["demo:1"])]);
        for strategy in all_strategies() {
            let urls = strategy.resolve(&record);
            assert_eq!(urls.manifest, "", "{}", strategy.name());
        }
    }

    #[test]
    fn test_strategies_tolerate_empty_records() {
        let record = ParsedRecord::default();
        for strategy in all_strategies() {
            let urls = strategy.resolve(&record);
            assert!(!urls.has_url(), "{}", strategy.name());
            assert_eq!(urls.thumbnail, "", "{}", strategy.name());
        }
    }

    #[test]
    fn test_contentdm_derives_thumbnail_and_manifest() {
        let record = record(
            "oai:cdm.example.org:coll1/77",
            &[(
                "identifier",
                &["Local-77", "https://cdm.example.org/cdm/ref/collection/coll1/id/77"],
            )],
        );
        let urls = ContentDm.resolve(&record);

        assert_eq!(urls.url, "https://cdm.example.org/cdm/ref/collection/coll1/id/77");
        assert_eq!(
            urls.thumbnail,
            "https://cdm.example.org/utils/getthumbnail/collection/coll1/id/77"
        );
        assert_eq!(
            urls.manifest,
            "https://cdm.example.org/iiif/info/coll1/77/manifest.json"
        );
    }

    #[test]
    fn test_contentdm_non_cdm_identifier() {
        let record = record("oai:x:1", &[("identifier", &["https://example.org/items/1"])]);
        let urls = ContentDm.resolve(&record);
        assert_eq!(urls, ResolvedUrls::new("https://example.org/items/1", ""));
    }

    #[test]
    fn test_mods_location() {
        let mut record = ParsedRecord::default();
        let mut location = crate::xml::FieldMap::new();
        location.insert("url".into(), FieldValue::text("https://fraser.example.org/title/1"));
        location.insert("url_preview".into(), FieldValue::text("https://fraser.example.org/t.png"));
        record
            .metadata
            .insert("location".into(), FieldValue::Group(location));

        let urls = ModsLocation.resolve(&record);
        assert_eq!(urls.url, "https://fraser.example.org/title/1");
        assert_eq!(urls.thumbnail, "https://fraser.example.org/t.png");
    }

    #[test]
    fn test_positional_identifier() {
        let record = record("oai:x:1", &[("identifier", &["https://a/1", "https://a/1.jpg"])]);
        let urls = PositionalIdentifier::new().with_thumbnail_at(1).resolve(&record);
        assert_eq!(urls, ResolvedUrls::new("https://a/1", "https://a/1.jpg"));
    }

    #[test]
    fn test_identifier_match() {
        let record = record(
            "oai:x:1",
            &[(
                "identifier",
                &[
                    "local-1",
                    "https://omeka.wustl.edu/omeka/files/original/1.jpg",
                    "https://omeka.wustl.edu/omeka/items/show/1",
                ],
            )],
        );
        let urls = IdentifierMatch::new("omeka.wustl.edu/omeka/items", "omeka.wustl.edu/omeka/files/")
            .resolve(&record);
        assert_eq!(urls.url, "https://omeka.wustl.edu/omeka/items/show/1");
        assert_eq!(urls.thumbnail, "https://omeka.wustl.edu/omeka/files/original/1.jpg");
    }

    #[test]
    fn test_islandora_namespace_filter() {
        let strategy = IslandoraObject::new("https://digital.example.edu")
            .with_namespace("grinnell")
            .with_thumbnail(IslandoraThumbnail::Datastream("TN"));

        let ok = strategy.resolve(&record("oai:x:1", &[("identifier", &["grinnell:123"])]));
        assert_eq!(ok.url, "https://digital.example.edu/islandora/object/grinnell:123");
        assert_eq!(
            ok.thumbnail,
            "https://digital.example.edu/islandora/object/grinnell:123/datastream/TN/view"
        );

        let foreign = strategy.resolve(&record("oai:x:1", &[("identifier", &["other:123"])]));
        assert!(!foreign.has_url());
    }

    #[test]
    fn test_islandora_thumbnail_field() {
        let record = record(
            "oai:x:1",
            &[
                ("identifier", &["umkc:42"]),
                ("identifier_thumbnail", &["https://dl.example.edu/tn/42.jpg"]),
            ],
        );
        let urls = IslandoraObject::new("https://dl.example.edu/umkc")
            .with_thumbnail(IslandoraThumbnail::Field("identifier_thumbnail"))
            .resolve(&record);
        assert_eq!(urls.url, "https://dl.example.edu/umkc/islandora/object/umkc:42");
        assert_eq!(urls.thumbnail, "https://dl.example.edu/tn/42.jpg");
    }

    #[test]
    fn test_header_permalink() {
        let record = record("oai:alma.example:9912345", &[]);
        let urls = HeaderPermalink::new("https://catalog/alma", "https://catalog/tn/").resolve(&record);
        assert_eq!(urls.url, "https://catalog/alma9912345");
        assert_eq!(urls.thumbnail, "https://catalog/tn/9912345");
    }

    #[test]
    fn test_description_image() {
        let record = record(
            "oai:x:1",
            &[
                ("identifier", &["https://scholarworks.example.edu/1"]),
                (
                    "description",
                    &["A photo.", "thumb.jpg", "https://scholarworks.example.edu/1/thumb.jpeg"],
                ),
            ],
        );
        let urls = DescriptionImage.resolve(&record);
        assert_eq!(urls.thumbnail, "https://scholarworks.example.edu/1/thumb.jpeg");
    }
}
