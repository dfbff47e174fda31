//! Per-institution schema mapping.
//!
//! Each contributing institution is registered with an
//! [`InstitutionProfile`]: a [`UrlStrategy`] that derives the access URL,
//! thumbnail and manifest, a source-resource [`Template`], and optional
//! pre- and post-mapping override rules. [`SchemaMapper`] drives a parsed
//! record through the profile and yields an aggregation record or a
//! [`MappingFailure`].

mod diagnostics;
mod mapper;
mod overrides;
mod registry;
mod strategy;
mod template;

pub use diagnostics::{merge_candidates, search_for_urls, UrlCandidates};
pub use mapper::{is_excluded, MappingFailure, SchemaMapper};
pub use overrides::{rights_category, MappingInput, PostOverride, PreOverride};
pub use registry::{create_default_registry, InstitutionProfile, InstitutionRegistry};
pub use strategy::{
    ContentDm, ContentDmItem, DescriptionImage, HeaderPermalink, IdentifierMatch,
    IslandoraObject, IslandoraThumbnail, ModsLocation, PositionalIdentifier, RelationLink,
    ResolvedUrls, UrlStrategy,
};
pub use template::Template;
