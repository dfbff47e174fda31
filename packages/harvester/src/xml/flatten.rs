//! Recursive flattening of OAI-PMH record subtrees into field maps.
//!
//! Each header or metadata subtree becomes a map from lowercased local field
//! name to either a sequence of trimmed strings ([`FieldValue::Leaf`]) or a
//! nested map ([`FieldValue::Group`]) for structured schemas such as MODS.
//! Nested groups are addressed with dotted paths by the formatter, e.g.
//! `titleinfo.title` or `location.url_preview`.

use indexmap::map::Entry;
use indexmap::IndexMap;
use roxmltree::Node;

use super::utils::{deep_text, element_children, local_name};

/// Field name → flattened value, in document order of first appearance.
pub type FieldMap = IndexMap<String, FieldValue>;

/// Flattened value of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Terminal values, in document order.
    Leaf(Vec<String>),
    /// Nested fields of a structured element.
    Group(FieldMap),
}

impl FieldValue {
    /// Single-value leaf.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Leaf(vec![value.into()])
    }

    /// Leaf values, or `None` for a group.
    #[must_use]
    pub fn as_leaf(&self) -> Option<&[String]> {
        match self {
            Self::Leaf(values) => Some(values),
            Self::Group(_) => None,
        }
    }

    /// Nested fields, or `None` for a leaf.
    #[must_use]
    pub fn as_group(&self) -> Option<&FieldMap> {
        match self {
            Self::Leaf(_) => None,
            Self::Group(map) => Some(map),
        }
    }

    /// All leaf strings beneath this value, depth-first.
    #[must_use]
    pub fn leaves(&self) -> Vec<String> {
        match self {
            Self::Leaf(values) => values.clone(),
            Self::Group(map) => map.values().flat_map(FieldValue::leaves).collect(),
        }
    }

    /// Coerce into one flat sequence of leaf strings.
    #[must_use]
    pub fn into_leaves(self) -> Vec<String> {
        match self {
            Self::Leaf(values) => values,
            Self::Group(map) => map.into_values().flat_map(FieldValue::into_leaves).collect(),
        }
    }

    /// Merge a same-named sibling into this value.
    fn absorb(&mut self, field: &str, incoming: FieldValue) {
        match (self, incoming) {
            (Self::Leaf(values), Self::Leaf(more)) => values.extend(more),
            (Self::Group(map), Self::Group(mut more)) => {
                if field.starts_with("titleinfo") {
                    // Repeated title groups only contribute their titles
                    if let Some(titles) = more.shift_remove("title") {
                        insert_or_absorb(map, "title".to_string(), titles);
                    }
                } else {
                    for (key, value) in more {
                        insert_or_absorb(map, key, value);
                    }
                }
            }
            (existing, incoming) => {
                let mut values = existing.leaves();
                values.extend(incoming.into_leaves());
                *existing = Self::Leaf(values);
            }
        }
    }
}

fn insert_or_absorb(map: &mut FieldMap, field: String, value: FieldValue) {
    match map.entry(field) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => {
            let field = slot.key().clone();
            slot.get_mut().absorb(&field, value);
        }
    }
}

/// Elements that are never modeled downstream.
fn is_dropped(name: &str) -> bool {
    name.contains("relateditem") || name.contains("tableofcontents")
}

/// Field name for a child element: local name, suffixed with the first
/// attribute's value to keep typed variants apart (`title_alternative`).
fn field_name(node: Node<'_, '_>) -> String {
    let name = local_name(node);
    match node.attributes().next() {
        Some(attr) => format!("{name}_{}", attr.value()),
        None => name,
    }
}

/// Flatten the children of `node` into a field map.
///
/// An element without element children has no fields and yields an empty map.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use heartland_harvester::xml::{flatten, FieldValue};
///
/// let xml = r#"<dc><title>  Main  </title><title type="alternative">Alt</title><coverage>Missouri</coverage></dc>"#;
/// let doc = Document::parse(xml).unwrap();
/// let fields = flatten(doc.root_element());
///
/// assert_eq!(fields["title"], FieldValue::text("Main"));
/// assert_eq!(fields["title_alternative"], FieldValue::text("Alt"));
/// assert_eq!(fields["subject"], FieldValue::text("Missouri"));
/// ```
pub fn flatten(node: Node<'_, '_>) -> FieldMap {
    match flatten_element(node, &local_name(node)) {
        FieldValue::Group(map) => map,
        FieldValue::Leaf(_) => FieldMap::new(),
    }
}

fn flatten_element(node: Node<'_, '_>, name: &str) -> FieldValue {
    let children: Vec<Node<'_, '_>> = element_children(node).collect();
    if children.is_empty() {
        return FieldValue::text(deep_text(node));
    }

    if local_name(node) == "name" {
        if let Some(part) = children.iter().find(|c| local_name(**c) == "namepart") {
            return FieldValue::text(deep_text(*part));
        }
    }

    let mut row = FieldMap::new();
    for child in children {
        if is_dropped(&local_name(child)) {
            continue;
        }

        let mut field = field_name(child);

        // Some feeds nest an element inside a same-named element; the inner
        // text is the value.
        if field == name {
            return FieldValue::text(deep_text(child));
        }

        if field == "coverage" {
            field = "subject".to_string();
        }

        let mut value = flatten_element(child, &field);
        if field == "subject" && matches!(value, FieldValue::Group(_)) {
            value = FieldValue::Leaf(value.into_leaves());
        }

        insert_or_absorb(&mut row, field, value);
    }

    FieldValue::Group(row)
}

/// Header and metadata of one record, flattened independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    pub header: FieldMap,
    pub metadata: FieldMap,
}

impl ParsedRecord {
    /// Flatten a record's `<header>` and its schema-specific metadata root.
    #[must_use]
    pub fn from_nodes(header: Node<'_, '_>, metadata: Node<'_, '_>) -> Self {
        Self {
            header: flatten(header),
            metadata: flatten(metadata),
        }
    }

    /// First OAI identifier from the header.
    #[must_use]
    pub fn header_identifier(&self) -> Option<&str> {
        self.header
            .get("identifier")
            .and_then(FieldValue::as_leaf)
            .and_then(|values| values.first())
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Tail segment of the header identifier after its last colon.
    ///
    /// # Examples
    /// ```
    /// use heartland_harvester::xml::{FieldValue, ParsedRecord};
    ///
    /// let mut record = ParsedRecord::default();
    /// record.header.insert("identifier".into(), FieldValue::text("oai:example.edu:coll/42"));
    /// assert_eq!(record.local_fragment(), Some("coll/42"));
    /// ```
    #[must_use]
    pub fn local_fragment(&self) -> Option<&str> {
        self.header_identifier()
            .map(|id| id.rsplit(':').next().unwrap_or(id))
    }

    /// Collection segment of the local fragment (before its first slash).
    #[must_use]
    pub fn collection(&self) -> Option<&str> {
        self.local_fragment()
            .map(|fragment| fragment.split('/').next().unwrap_or(fragment))
    }

    /// Leaf values of a top-level metadata field.
    #[must_use]
    pub fn metadata_values(&self, field: &str) -> &[String] {
        self.metadata
            .get(field)
            .and_then(FieldValue::as_leaf)
            .unwrap_or(&[])
    }
}
