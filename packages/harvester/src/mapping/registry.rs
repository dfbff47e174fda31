//! Institution registry: id → mapping profile.

use std::collections::{BTreeSet, HashMap};

use super::overrides::{PostOverride, PreOverride};
use super::strategy::{
    ContentDm, DescriptionImage, HeaderPermalink, IdentifierMatch, IslandoraObject,
    IslandoraThumbnail, ModsLocation, PositionalIdentifier, RelationLink, UrlStrategy,
};
use super::template::Template;

/// How one institution's records are mapped.
pub struct InstitutionProfile {
    strategy: Box<dyn UrlStrategy>,
    template: Template,
    pre: Vec<PreOverride>,
    post: Vec<PostOverride>,
}

impl InstitutionProfile {
    /// Profile using the default template and no overrides.
    #[must_use]
    pub fn new(strategy: impl UrlStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
            template: Template::Default,
            pre: Vec::new(),
            post: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    #[must_use]
    pub fn with_pre(mut self, rule: PreOverride) -> Self {
        self.pre.push(rule);
        self
    }

    #[must_use]
    pub fn with_post(mut self, rule: PostOverride) -> Self {
        self.post.push(rule);
        self
    }

    #[must_use]
    pub fn strategy(&self) -> &dyn UrlStrategy {
        self.strategy.as_ref()
    }

    #[must_use]
    pub fn template(&self) -> Template {
        self.template
    }

    #[must_use]
    pub fn pre_overrides(&self) -> &[PreOverride] {
        &self.pre
    }

    #[must_use]
    pub fn post_overrides(&self) -> &[PostOverride] {
        &self.post
    }
}

/// Profile used for unregistered institutions whose header identifiers
/// contain a marker.
struct Fallback {
    marker: String,
    profile: InstitutionProfile,
}

/// Registry mapping institution ids to mapping profiles.
///
/// Onboarding an institution is a `register` call; nothing in the session
/// or mapper changes.
#[derive(Default)]
pub struct InstitutionRegistry {
    profiles: HashMap<String, InstitutionProfile>,
    fallback: Option<Fallback>,
}

impl InstitutionRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile for an institution id.
    pub fn register(&mut self, institution_id: impl Into<String>, profile: InstitutionProfile) {
        self.profiles.insert(institution_id.into(), profile);
    }

    /// Profile for records of unregistered institutions whose header
    /// identifier contains `marker`.
    pub fn set_fallback(&mut self, marker: impl Into<String>, profile: InstitutionProfile) {
        self.fallback = Some(Fallback {
            marker: marker.into(),
            profile,
        });
    }

    #[must_use]
    pub fn get(&self, institution_id: &str) -> Option<&InstitutionProfile> {
        self.profiles.get(institution_id)
    }

    /// Profile for one record: the registered profile, else the fallback
    /// when the header identifier carries its marker.
    #[must_use]
    pub fn profile_for(
        &self,
        institution_id: &str,
        header_identifier: Option<&str>,
    ) -> Option<&InstitutionProfile> {
        self.get(institution_id).or_else(|| {
            let fallback = self.fallback.as_ref()?;
            header_identifier
                .filter(|id| id.contains(&fallback.marker))
                .map(|_| &fallback.profile)
        })
    }

    /// Sorted ids of all registered institutions.
    #[must_use]
    pub fn registered_ids(&self) -> BTreeSet<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}

const LINDA_HALL_RIGHTS: &str = "NO COPYRIGHT - UNITED STATES\nThe organization that has made the Item available believes that the Item is in the Public Domain under the laws of the United States, but a determination was not made as to its copyright status under the copyright laws of other countries. The Item may not be in the Public Domain under the laws of other countries. Please refer to the organization that has made the Item available for more information.";

const OZARKS_GENEALOGICAL_RIGHTS: &str = "The Ozarks Genealogical Society, Inc. offers access to this collection for educational and personal research purposes only.  Materials within the collection may be protected by the U.S. Copyright Law (Title 17, U.S.C.).  It is the researcher's obligation to determine and satisfy copyright or other use restriction when publishing or otherwise distributing materials within the collection.";

/// Create a registry configured for the hub's contributing institutions.
#[must_use]
pub fn create_default_registry() -> InstitutionRegistry {
    let mut registry = InstitutionRegistry::new();

    // MODS feed
    registry.register(
        "frb",
        InstitutionProfile::new(ModsLocation).with_template(Template::Mods),
    );

    // CONTENTdm feeds
    registry.register("msu", InstitutionProfile::new(ContentDm));
    registry.register("stlpl", InstitutionProfile::new(ContentDm));
    registry.register(
        "mdh",
        InstitutionProfile::new(ContentDm).with_pre(PreOverride::ProviderFromField {
            field: "publisher",
            suffix: " through Missouri Digital Heritage",
        }),
    );
    registry.register(
        "shsm",
        InstitutionProfile::new(ContentDm).with_pre(PreOverride::CollectionInIdPrefix {
            placeholder: "<collection>",
        }),
    );
    registry.register(
        "slu",
        InstitutionProfile::new(ContentDm).with_pre(PreOverride::ClearFieldForCollection {
            collection: "ong",
            field: "description",
        }),
    );
    registry.register(
        "sgcl",
        InstitutionProfile::new(ContentDm).with_pre(PreOverride::ReplaceFieldForCollection {
            collection: "p16792coll1",
            field: "rights",
            value: OZARKS_GENEALOGICAL_RIGHTS,
        }),
    );
    registry.set_fallback("cdm", InstitutionProfile::new(ContentDm));

    // Washington University
    registry.register(
        "wustl1",
        InstitutionProfile::new(PositionalIdentifier::new().with_thumbnail_at(1)),
    );
    registry.register(
        "wustl2",
        InstitutionProfile::new(IdentifierMatch::new(
            "omeka.wustl.edu/omeka/items",
            "omeka.wustl.edu/omeka/files/",
        )),
    );

    // Islandora repositories. A thumbnail arrives as `<identifier type="thumbnail">`.
    for campus in ["umkc", "umsl"] {
        registry.register(
            campus,
            InstitutionProfile::new(
                IslandoraObject::new(format!("https://dl.mospace.umsystem.edu/{campus}"))
                    .with_thumbnail(IslandoraThumbnail::Field("identifier_thumbnail")),
            ),
        );
    }
    registry.register(
        "kcpl2",
        InstitutionProfile::new(IslandoraObject::new("https://kchistory.org")),
    );
    registry.register(
        "grinnell",
        InstitutionProfile::new(
            IslandoraObject::new("https://digital.grinnell.edu")
                .with_namespace("grinnell")
                .with_thumbnail(IslandoraThumbnail::Datastream("TN")),
        )
        .with_pre(PreOverride::StripNamespacedKeys)
        .with_post(PostOverride::RightsUri),
    );

    registry.register(
        "kcpl1",
        InstitutionProfile::new(RelationLink).with_post(PostOverride::Publisher {
            field: "publisher",
        }),
    );
    registry.register(
        "lhl",
        InstitutionProfile::new(HeaderPermalink::new(
            "https://catalog.lindahall.org/permalink/01LINDAHALL_INST/19lda7s/alma",
            "https://catalog.lindahall.org/view/delivery/thumbnail/01LINDAHALL_INST/",
        ))
        .with_post(PostOverride::PublicDomainCatalog {
            rights: LINDA_HALL_RIGHTS,
            format_field: "type",
            creator_field: "contributor",
            id_prefix: "missouri--urn:data.mohistory.org:",
        }),
    );
    registry.register(
        "uni",
        InstitutionProfile::new(DescriptionImage).with_post(PostOverride::RightsUri),
    );

    registry
}
