//! Field access for mapping code.
//!
//! Mapping never reads a [`FieldMap`] directly. It asks for a dotted field
//! path and a requested [`Shape`], and gets back clean values: every raw
//! string is split on `;`, Unicode-normalized (NFC), whitespace-collapsed and
//! trimmed, with empty pieces dropped. `subject` and `language` are special:
//! they come back as structured [`Subject`] and [`Language`] lists whatever
//! shape was requested.

use unicode_normalization::UnicodeNormalization;

use crate::language;
use crate::types::{Language, Subject};
use crate::xml::{FieldMap, FieldValue};

/// Separator used when a list is rendered as a single string.
pub const JOIN_SEPARATOR: &str = "; ";

/// Requested output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    List,
    String,
}

/// A formatted field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatted {
    List(Vec<String>),
    Text(String),
    Subjects(Vec<Subject>),
    Languages(Vec<Language>),
}

impl Formatted {
    /// Coerce to a list of strings.
    #[must_use]
    pub fn into_list(self) -> Vec<String> {
        match self {
            Self::List(values) => values,
            Self::Text(text) if text.is_empty() => Vec::new(),
            Self::Text(text) => vec![text],
            Self::Subjects(subjects) => subjects.into_iter().map(|s| s.name).collect(),
            Self::Languages(languages) => languages.into_iter().map(|l| l.name).collect(),
        }
    }

    /// Coerce to a single string, joining lists with [`JOIN_SEPARATOR`].
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            other => other.into_list().join(JOIN_SEPARATOR),
        }
    }

    #[must_use]
    pub fn into_subjects(self) -> Vec<Subject> {
        match self {
            Self::Subjects(subjects) => subjects,
            other => other.into_list().into_iter().map(Subject::new).collect(),
        }
    }

    #[must_use]
    pub fn into_languages(self) -> Vec<Language> {
        match self {
            Self::Languages(languages) => languages,
            other => language::resolve(&other.into_list()),
        }
    }
}

/// Split one raw value into clean, non-empty segments.
///
/// # Examples
/// ```
/// use heartland_harvester::formatter::normalize;
///
/// assert_eq!(normalize(" Cats;  Dogs\n and\tfoxes ;"), ["Cats", "Dogs and foxes"]);
/// ```
#[must_use]
pub fn normalize(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(|segment| {
            let composed: String = segment.nfc().collect();
            composed.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Walk a dotted path (`titleinfo.title`) to its value.
fn lookup<'a>(path: &str, fields: &'a FieldMap) -> Option<&'a FieldValue> {
    let mut segments = path.split('.');
    let mut value = fields.get(segments.next()?)?;
    for segment in segments {
        value = value.as_group()?.get(segment)?;
    }
    Some(value)
}

/// Normalized values at `path`. Absent paths yield an empty list; a group at
/// the end of the path contributes all of its leaves.
#[must_use]
pub fn values(path: &str, fields: &FieldMap) -> Vec<String> {
    let mut values: Vec<String> = lookup(path, fields)
        .map(FieldValue::leaves)
        .unwrap_or_default()
        .iter()
        .flat_map(|raw| normalize(raw))
        .collect();

    // Records carry one title and one date downstream
    if matches!(path, "title" | "date") {
        values.truncate(1);
    }
    values
}

/// Format the field at `path` in the requested shape.
///
/// # Examples
/// ```
/// use heartland_harvester::formatter::{format, Formatted, Shape};
/// use heartland_harvester::types::Subject;
/// use heartland_harvester::xml::{FieldMap, FieldValue};
///
/// let mut fields = FieldMap::new();
/// fields.insert("subject".into(), FieldValue::text("Cats; Dogs"));
/// fields.insert("creator".into(), FieldValue::Leaf(vec!["Ann".into(), "Bo".into()]));
///
/// assert_eq!(
///     format("subject", &fields, Shape::String),
///     Formatted::Subjects(vec![Subject::new("Cats"), Subject::new("Dogs")])
/// );
/// assert_eq!(
///     format("creator", &fields, Shape::String),
///     Formatted::Text("Ann; Bo".into())
/// );
/// assert_eq!(format("missing", &fields, Shape::List), Formatted::List(vec![]));
/// ```
#[must_use]
pub fn format(path: &str, fields: &FieldMap, shape: Shape) -> Formatted {
    let values = values(path, fields);
    match (path, shape) {
        ("subject", _) => Formatted::Subjects(values.into_iter().map(Subject::new).collect()),
        ("language", _) => Formatted::Languages(language::resolve(&values)),
        (_, Shape::List) => Formatted::List(values),
        (_, Shape::String) => Formatted::Text(values.join(JOIN_SEPARATOR)),
    }
}

/// [`format`] as a list of strings.
#[must_use]
pub fn list(path: &str, fields: &FieldMap) -> Vec<String> {
    format(path, fields, Shape::List).into_list()
}

/// [`format`] as a single string.
#[must_use]
pub fn text(path: &str, fields: &FieldMap) -> String {
    format(path, fields, Shape::String).into_text()
}

#[must_use]
pub fn subjects(path: &str, fields: &FieldMap) -> Vec<Subject> {
    format(path, fields, Shape::List).into_subjects()
}

#[must_use]
pub fn languages(path: &str, fields: &FieldMap) -> Vec<Language> {
    format(path, fields, Shape::List).into_languages()
}
