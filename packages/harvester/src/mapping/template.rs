//! Source-resource templates.

use crate::formatter;
use crate::types::{SourceResource, Temporal};
use crate::xml::ParsedRecord;

/// Which field layout an institution's metadata uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Template {
    /// Dublin Core field names.
    #[default]
    Default,
    /// MODS field names with an explicit issued-date range.
    Mods,
}

impl Template {
    /// Build the source-resource block for a record whose access URL is `url`.
    #[must_use]
    pub fn source_resource(self, record: &ParsedRecord, url: &str) -> SourceResource {
        match self {
            Self::Default => dublin_core(record, url),
            Self::Mods => mods(record, url),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn dublin_core(record: &ParsedRecord, url: &str) -> SourceResource {
    let m = &record.metadata;
    let temporal = non_empty(formatter::text("date", m))
        .map(|display_date| Temporal {
            display_date: Some(display_date),
            ..Temporal::default()
        })
        .into_iter()
        .collect();

    SourceResource {
        title: formatter::list("title", m),
        description: formatter::list("description", m),
        subject: formatter::subjects("subject", m),
        temporal,
        creator: formatter::list("creator", m),
        language: formatter::languages("language", m),
        rights: formatter::text("rights", m),
        id: record.local_fragment().unwrap_or_default().to_string(),
        format: formatter::text("format", m),
        identifier: vec![url.to_string()],
        publisher: None,
    }
}

fn mods(record: &ParsedRecord, url: &str) -> SourceResource {
    let m = &record.metadata;
    let start = formatter::text("origininfo.dateissued_start", m);
    let end = formatter::text("origininfo.dateissued_end", m);
    let issued = formatter::text("origininfo.dateissued", m);

    let display_date = if !issued.is_empty() {
        Some(issued)
    } else if !start.is_empty() || !end.is_empty() {
        Some(format!("{start}/{end}"))
    } else {
        None
    };
    let temporal = Temporal {
        start: non_empty(start),
        end: non_empty(end),
        display_date,
    };

    SourceResource {
        title: formatter::list("titleinfo.title", m),
        description: formatter::list("abstract", m),
        subject: formatter::subjects("subject", m),
        temporal: if temporal == Temporal::default() {
            Vec::new()
        } else {
            vec![temporal]
        },
        creator: formatter::list("name", m),
        language: formatter::languages("language", m),
        rights: formatter::text("accesscondition", m),
        id: record.local_fragment().unwrap_or_default().to_string(),
        format: formatter::text("genre", m),
        identifier: vec![url.to_string()],
        publisher: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Subject;
    use crate::xml::{FieldMap, FieldValue};
    use pretty_assertions::assert_eq;

    fn leaf(values: &[&str]) -> FieldValue {
        FieldValue::Leaf(values.iter().map(|v| v.to_string()).collect())
    }

    fn group(entries: &[(&str, &[&str])]) -> FieldValue {
        FieldValue::Group(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), leaf(v)))
                .collect::<FieldMap>(),
        )
    }

    fn record(fields: Vec<(&str, FieldValue)>) -> ParsedRecord {
        let mut record = ParsedRecord::default();
        record.header.insert(
            "identifier".into(),
            FieldValue::text("oai:cdm.example.org:coll1/77"),
        );
        for (key, value) in fields {
            record.metadata.insert(key.to_string(), value);
        }
        record
    }

    #[test]
    fn test_dublin_core_template() {
        let record = record(vec![
            ("title", leaf(&["Union Station", "Second title"])),
            ("description", leaf(&["A photograph; taken 1914"])),
            ("subject", leaf(&["Railroads; Stations"])),
            ("date", leaf(&["1914-10-30"])),
            ("creator", leaf(&["Smith, J."])),
            ("language", leaf(&["eng"])),
            ("rights", leaf(&["Public domain"])),
            ("format", leaf(&["Image"])),
        ]);
        let source = Template::Default.source_resource(&record, "https://x/77");

        assert_eq!(source.title, vec!["Union Station".to_string()]);
        assert_eq!(source.description.len(), 2);
        assert_eq!(
            source.subject,
            vec![Subject::new("Railroads"), Subject::new("Stations")]
        );
        assert_eq!(source.temporal[0].display_date.as_deref(), Some("1914-10-30"));
        assert!(source.temporal[0].start.is_none());
        assert_eq!(source.language[0].code, "eng");
        assert_eq!(source.rights, "Public domain");
        assert_eq!(source.id, "coll1/77");
        assert_eq!(source.identifier, vec!["https://x/77".to_string()]);
    }

    #[test]
    fn test_dublin_core_without_date_has_no_temporal() {
        let source = Template::Default.source_resource(&record(vec![]), "https://x/77");
        assert!(source.temporal.is_empty());
        assert!(source.title.is_empty());
        assert_eq!(source.rights, "");
    }

    #[test]
    fn test_mods_range_display_date() {
        let record = record(vec![
            ("titleinfo", group(&[("title", &["Annual Report"])])),
            (
                "origininfo",
                group(&[("dateissued_start", &["1914"]), ("dateissued_end", &["1920"])]),
            ),
            ("name", leaf(&["Federal Reserve Bank of St. Louis"])),
            ("genre", leaf(&["report"])),
            ("abstract", leaf(&["Reports."])),
            ("accesscondition", leaf(&["Public domain"])),
        ]);
        let source = Template::Mods.source_resource(&record, "https://fraser.example.org/1");

        assert_eq!(source.title, vec!["Annual Report".to_string()]);
        let temporal = &source.temporal[0];
        assert_eq!(temporal.start.as_deref(), Some("1914"));
        assert_eq!(temporal.end.as_deref(), Some("1920"));
        assert_eq!(temporal.display_date.as_deref(), Some("1914/1920"));
        assert_eq!(source.creator, vec!["Federal Reserve Bank of St. Louis".to_string()]);
        assert_eq!(source.format, "report");
        assert_eq!(source.description, vec!["Reports.".to_string()]);
    }

    #[test]
    fn test_mods_combined_date_wins() {
        let record = record(vec![(
            "origininfo",
            group(&[
                ("dateissued", &["1914-1920"]),
                ("dateissued_start", &["1914"]),
                ("dateissued_end", &["1920"]),
            ]),
        )]);
        let source = Template::Mods.source_resource(&record, "https://x/1");
        assert_eq!(source.temporal[0].display_date.as_deref(), Some("1914-1920"));
    }
}
