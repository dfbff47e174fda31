//! Parsed record → aggregation record.

use thiserror::Error;

use super::overrides::MappingInput;
use super::registry::InstitutionRegistry;
use crate::skip::SkipReason;
use crate::types::{AggregationRecord, InstitutionDescriptor};
use crate::xml::{FieldMap, FieldValue, ParsedRecord};

/// Why a parsed record could not be mapped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingFailure {
    #[error("no derivable URL")]
    NoDerivableUrl,

    #[error("mapping error: {0}")]
    Mapping(String),

    /// No profile for the institution and no fallback applies. A
    /// configuration fault, not a record fault.
    #[error("no URL strategy registered for institution")]
    UnregisteredInstitution,
}

impl MappingFailure {
    #[must_use]
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            Self::NoDerivableUrl | Self::UnregisteredInstitution => SkipReason::NoDerivableUrl,
            Self::Mapping(_) => SkipReason::MappingError,
        }
    }
}

/// Whether any of the header's set specs is in `exclude`.
#[must_use]
pub fn is_excluded(header: &FieldMap, exclude: &[String]) -> bool {
    !exclude.is_empty()
        && header
            .get("setspec")
            .map(FieldValue::leaves)
            .unwrap_or_default()
            .iter()
            .any(|set| exclude.contains(set))
}

/// Maps one institution's parsed records using its registered profile.
pub struct SchemaMapper<'a> {
    registry: &'a InstitutionRegistry,
    institution_id: String,
    data_provider: String,
    id_prefix: String,
    exclude: Vec<String>,
}

impl<'a> SchemaMapper<'a> {
    #[must_use]
    pub fn new(
        registry: &'a InstitutionRegistry,
        descriptor: &InstitutionDescriptor,
        data_provider: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            institution_id: descriptor.id.clone(),
            data_provider: data_provider.into(),
            id_prefix: descriptor.id_prefix.clone(),
            exclude: descriptor.exclude.clone(),
        }
    }

    #[must_use]
    pub fn institution_id(&self) -> &str {
        &self.institution_id
    }

    /// Whether a profile (registered or fallback) applies to this record.
    #[must_use]
    pub fn has_profile(&self, record: &ParsedRecord) -> bool {
        self.registry
            .profile_for(&self.institution_id, record.header_identifier())
            .is_some()
    }

    /// Deletion and exclusion checks, run before any mapping work.
    #[must_use]
    pub fn screen(&self, deleted: bool, header: &FieldMap) -> Option<SkipReason> {
        if deleted {
            Some(SkipReason::Deleted)
        } else if is_excluded(header, &self.exclude) {
            Some(SkipReason::ExcludedCollection)
        } else {
            None
        }
    }

    /// Map one parsed record.
    pub fn map(&self, record: ParsedRecord) -> Result<AggregationRecord, MappingFailure> {
        let profile = self
            .registry
            .profile_for(&self.institution_id, record.header_identifier())
            .ok_or(MappingFailure::UnregisteredInstitution)?;

        let mut input = MappingInput {
            record,
            data_provider: self.data_provider.clone(),
            id_prefix: self.id_prefix.clone(),
        };
        for rule in profile.pre_overrides() {
            rule.apply(&mut input);
        }

        let urls = profile.strategy().resolve(&input.record);
        if !urls.has_url() {
            return Err(MappingFailure::NoDerivableUrl);
        }

        let fragment = input
            .record
            .local_fragment()
            .ok_or_else(|| MappingFailure::Mapping("header identifier missing".to_string()))?;
        let id = format!("{}:{fragment}", input.id_prefix);

        let source = profile.template().source_resource(&input.record, &urls.url);
        let mut output = AggregationRecord::new(
            id,
            urls.url,
            input.data_provider,
            &urls.thumbnail,
            &urls.manifest,
            source,
        );
        for rule in profile.post_overrides() {
            rule.apply(&mut output, &input.record);
        }

        tracing::debug!(
            institution = %self.institution_id,
            id = %output.id,
            strategy = profile.strategy().name(),
            "Mapped record"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::create_default_registry;
    use pretty_assertions::assert_eq;

    fn descriptor(id: &str, prefix: &str, exclude: &[&str]) -> InstitutionDescriptor {
        InstitutionDescriptor {
            name: Some("Test Library".into()),
            id: id.into(),
            url: "https://example.org/oai".into(),
            metadata_prefix: None,
            id_prefix: prefix.into(),
            include: Vec::new(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
            hub: None,
        }
    }

    fn record(header_id: &str, sets: &[&str], fields: &[(&str, &[&str])]) -> ParsedRecord {
        let mut record = ParsedRecord::default();
        record
            .header
            .insert("identifier".into(), FieldValue::text(header_id));
        if !sets.is_empty() {
            record.header.insert(
                "setspec".into(),
                FieldValue::Leaf(sets.iter().map(|s| s.to_string()).collect()),
            );
        }
        for (key, values) in fields {
            record.metadata.insert(
                key.to_string(),
                FieldValue::Leaf(values.iter().map(|v| v.to_string()).collect()),
            );
        }
        record
    }

    #[test]
    fn test_maps_contentdm_record() {
        let registry = create_default_registry();
        let mapper = SchemaMapper::new(
            &registry,
            &descriptor("msu", "missouri--urn:msu", &[]),
            "Missouri State University",
        );
        let parsed = record(
            "oai:cdm.example.org:coll1/77",
            &["coll1"],
            &[
                ("title", &["Bear Hall"]),
                (
                    "identifier",
                    &["https://cdm.example.org/cdm/ref/collection/coll1/id/77"],
                ),
            ],
        );

        let output = mapper.map(parsed).unwrap();
        assert_eq!(output.id, "missouri--urn:msu:coll1/77");
        assert_eq!(output.data_provider, "Missouri State University");
        assert_eq!(
            output.object.as_deref(),
            Some("https://cdm.example.org/utils/getthumbnail/collection/coll1/id/77")
        );
        assert_eq!(
            output.iiif_manifest.as_deref(),
            Some("https://cdm.example.org/iiif/info/coll1/77/manifest.json")
        );
        assert_eq!(output.source_resource.title, vec!["Bear Hall".to_string()]);
    }

    #[test]
    fn test_unregistered_institution() {
        let registry = create_default_registry();
        let mapper = SchemaMapper::new(&registry, &descriptor("newlib", "p", &[]), "New");
        let parsed = record("oai:repo.example.edu:1", &[], &[("identifier", &["https://x/1"])]);

        assert_eq!(
            mapper.map(parsed),
            Err(MappingFailure::UnregisteredInstitution)
        );
    }

    #[test]
    fn test_no_derivable_url() {
        let registry = create_default_registry();
        let mapper = SchemaMapper::new(&registry, &descriptor("kcpl1", "p", &[]), "KCPL");
        let parsed = record("oai:x:1", &[], &[("title", &["No relation"])]);

        let failure = mapper.map(parsed).unwrap_err();
        assert_eq!(failure, MappingFailure::NoDerivableUrl);
        assert_eq!(failure.skip_reason(), SkipReason::NoDerivableUrl);
    }

    #[test]
    fn test_missing_header_identifier_is_mapping_error() {
        let registry = create_default_registry();
        let mapper = SchemaMapper::new(&registry, &descriptor("kcpl1", "p", &[]), "KCPL");
        let mut parsed = record("", &[], &[("relation", &["https://kchistory.example/1"])]);
        parsed.header.clear();

        let failure = mapper.map(parsed).unwrap_err();
        assert_eq!(failure.skip_reason(), SkipReason::MappingError);
    }

    #[test]
    fn test_screen() {
        let registry = create_default_registry();
        let mapper = SchemaMapper::new(&registry, &descriptor("msu", "p", &["private"]), "MSU");

        let public = record("oai:x:1", &["public"], &[]);
        let private = record("oai:x:2", &["public", "private"], &[]);

        assert_eq!(mapper.screen(true, &public.header), Some(SkipReason::Deleted));
        assert_eq!(mapper.screen(false, &public.header), None);
        assert_eq!(
            mapper.screen(false, &private.header),
            Some(SkipReason::ExcludedCollection)
        );
    }

    #[test]
    fn test_pre_override_rewrites_id_prefix() {
        let registry = create_default_registry();
        let mapper = SchemaMapper::new(
            &registry,
            &descriptor("shsm", "missouri--urn:shsm-<collection>", &[]),
            "SHSMO",
        );
        let parsed = record(
            "oai:cdm.shsmo.org:mack/12",
            &[],
            &[("identifier", &["https://cdm.shsmo.org/cdm/ref/collection/mack/id/12"])],
        );

        let output = mapper.map(parsed).unwrap();
        assert_eq!(output.id, "missouri--urn:shsm-mack:mack/12");
    }

    #[test]
    fn test_post_override_rights_uri() {
        let registry = create_default_registry();
        let mapper = SchemaMapper::new(&registry, &descriptor("uni", "iowa--urn:uni", &[]), "UNI");
        let parsed = record(
            "oai:scholarworks.uni.edu:photos-1001",
            &[],
            &[
                ("identifier", &["https://scholarworks.uni.edu/photos/1001"]),
                ("rights", &["http://rightsstatements.org/vocab/NoC-US/1.0/"]),
            ],
        );

        let output = mapper.map(parsed).unwrap();
        assert_eq!(
            output.rights.as_deref(),
            Some("http://rightsstatements.org/vocab/NoC-US/1.0/")
        );
        assert_eq!(output.rights_category.as_deref(), Some("No Copyright"));
        assert_eq!(output.source_resource.rights, "");
    }
}
