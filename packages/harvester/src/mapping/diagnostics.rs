//! Candidate URL discovery for institutions without a URL strategy.

use std::collections::BTreeMap;

use crate::xml::{FieldMap, FieldValue};

/// Candidate field path → sample URL value.
pub type UrlCandidates = BTreeMap<String, String>;

/// Find every leaf value in `metadata` that starts with `http`, keyed by its
/// field path: `identifier[1]`, `location.url[0]`.
///
/// # Examples
/// ```
/// use heartland_harvester::mapping::search_for_urls;
/// use heartland_harvester::xml::{FieldMap, FieldValue};
///
/// let mut metadata = FieldMap::new();
/// metadata.insert(
///     "identifier".into(),
///     FieldValue::Leaf(vec!["local-1".into(), "https://example.org/1".into()]),
/// );
/// let candidates = search_for_urls(&metadata);
/// assert_eq!(candidates["identifier[1]"], "https://example.org/1");
/// assert_eq!(candidates.len(), 1);
/// ```
#[must_use]
pub fn search_for_urls(metadata: &FieldMap) -> UrlCandidates {
    let mut candidates = UrlCandidates::new();
    collect(metadata, "", &mut candidates);
    candidates
}

/// Merge `found` into `candidates`, keeping the first value seen per path.
pub fn merge_candidates(candidates: &mut UrlCandidates, found: UrlCandidates) {
    for (path, url) in found {
        candidates.entry(path).or_insert(url);
    }
}

fn collect(fields: &FieldMap, prefix: &str, candidates: &mut UrlCandidates) {
    for (name, value) in fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match value {
            FieldValue::Leaf(values) => {
                for (i, value) in values.iter().enumerate() {
                    if value.starts_with("http") {
                        candidates
                            .entry(format!("{path}[{i}]"))
                            .or_insert_with(|| value.clone());
                    }
                }
            }
            FieldValue::Group(nested) => collect(nested, &path, candidates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_paths() {
        let mut location = FieldMap::new();
        location.insert(
            "url".into(),
            FieldValue::Leaf(vec!["http://a/1".into(), "ftp://b".into()]),
        );
        let mut metadata = FieldMap::new();
        metadata.insert("location".into(), FieldValue::Group(location));
        metadata.insert("title".into(), FieldValue::text("http is a protocol"));
        metadata.insert("note".into(), FieldValue::text("see https://c/2"));

        let candidates = search_for_urls(&metadata);
        let expected: UrlCandidates = [
            ("location.url[0]".to_string(), "http://a/1".to_string()),
            ("title[0]".to_string(), "http is a protocol".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn test_merge_keeps_first_seen() {
        let mut candidates = UrlCandidates::new();
        candidates.insert("identifier[0]".into(), "https://first".into());

        let mut found = UrlCandidates::new();
        found.insert("identifier[0]".into(), "https://second".into());
        found.insert("relation[0]".into(), "https://rel".into());
        merge_candidates(&mut candidates, found);

        assert_eq!(candidates["identifier[0]"], "https://first");
        assert_eq!(candidates["relation[0]"], "https://rel");
    }

    #[test]
    fn test_no_candidates() {
        let mut metadata = FieldMap::new();
        metadata.insert("title".into(), FieldValue::text("Plain"));
        assert!(search_for_urls(&metadata).is_empty());
    }
}
