//! Coverage accounting between taxonomy members and the documentation.
//!
//! Maps every catalog member to the types documenting it and the types the
//! derivation assigns it to, so members that are derived somewhere yet never
//! documented anywhere surface as gaps.

use crate::doc_references::DocumentedRequirements;
use crate::events::TypeHierarchyIndex;
use crate::registry::{RequirementRegistry, SetupError};
use crate::taxonomy::{EventTypeName, MemberName, Taxonomy, TaxonomyIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Types documenting a member and types deriving it.
pub struct CoverageEntry {
    pub documented_by: BTreeSet<EventTypeName>,
    pub derived_by: BTreeSet<EventTypeName>,
}

impl CoverageEntry {
    pub fn is_documented(&self) -> bool {
        !self.documented_by.is_empty()
    }
}

pub type CoverageMap = BTreeMap<Taxonomy, BTreeMap<MemberName, CoverageEntry>>;

/// Build the member coverage map for the whole universe.
///
/// Every catalog member gets an entry, including members no type mentions.
pub fn build_member_coverage_map(
    hierarchy: &TypeHierarchyIndex,
    taxonomies: &TaxonomyIndex,
    registry: &RequirementRegistry<'_>,
    documented: &DocumentedRequirements,
) -> Result<CoverageMap, SetupError> {
    let mut map: CoverageMap = Taxonomy::ALL
        .into_iter()
        .map(|taxonomy| {
            let members = taxonomies
                .members(taxonomy)
                .map(|member| (member.name.clone(), CoverageEntry::default()))
                .collect();
            (taxonomy, members)
        })
        .collect();

    for event in hierarchy.types() {
        for taxonomy in Taxonomy::ALL {
            let Some(entries) = map.get_mut(&taxonomy) else {
                continue;
            };
            for member in registry.required_for(event, taxonomy)? {
                if let Some(entry) = entries.get_mut(&member) {
                    entry.derived_by.insert(event.name.clone());
                }
            }
            if let Some(members) = documented.get(&event.name, taxonomy) {
                for member in members {
                    if let Some(entry) = entries.get_mut(member) {
                        entry.documented_by.insert(event.name.clone());
                    }
                }
            }
        }
    }

    Ok(map)
}

/// Members derived for at least one type but documented by none.
pub fn undocumented_members(coverage: &CoverageMap) -> Vec<(Taxonomy, MemberName)> {
    coverage
        .iter()
        .flat_map(|(taxonomy, members)| {
            members
                .iter()
                .filter(|(_, entry)| !entry.derived_by.is_empty() && !entry.is_documented())
                .map(|(member, _)| (*taxonomy, member.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_references::DocumentationExtractor;
    use crate::events::{EVENT_MANIFEST_SCHEMA_VERSION, EventManifest};
    use crate::registry::CatalogDerivation;
    use crate::taxonomy::{TAXONOMY_SCHEMA_VERSION, TaxonomyCatalog};
    use serde_json::json;

    #[test]
    fn coverage_flags_derived_but_undocumented_members() {
        let manifest: EventManifest = serde_json::from_value(json!({
            "schema_version": EVENT_MANIFEST_SCHEMA_VERSION,
            "namespace": "ev",
            "events": [
                {"name": "ev.Root", "description": "Base event."},
                {"name": "ev.VoiceEvent", "supertype": "ev.Root",
                 "description": "Requires {@link CacheFlag#VOICE_STATE VOICE_STATE}."},
                {"name": "ev.OverrideEvent", "supertype": "ev.Root",
                 "description": "No links here."}
            ]
        }))
        .unwrap();
        let hierarchy = TypeHierarchyIndex::discover(&manifest, "ev").unwrap();
        let catalog: TaxonomyCatalog = serde_json::from_value(json!({
            "schema_version": TAXONOMY_SCHEMA_VERSION,
            "taxonomies": [
                {"key": "intents", "reference_name": "Intent", "members": [{"name": "GUILD_MEMBERS"}]},
                {"key": "cache_flags", "reference_name": "CacheFlag", "members": [
                    {"name": "VOICE_STATE", "events": ["ev.VoiceEvent"]},
                    {"name": "MEMBER_OVERRIDES", "events": ["ev.OverrideEvent"]}
                ]},
                {"key": "permissions", "reference_name": "Permission", "members": [{"name": "BAN_MEMBERS"}]}
            ]
        }))
        .unwrap();
        let taxonomies = TaxonomyIndex::from_catalog(catalog).unwrap();
        let derivation = CatalogDerivation::new(&hierarchy, &taxonomies).unwrap();
        let registry = RequirementRegistry::new(&derivation, &taxonomies);
        let extraction = DocumentationExtractor::new(&taxonomies)
            .unwrap()
            .extract_all(&hierarchy);

        let coverage =
            build_member_coverage_map(&hierarchy, &taxonomies, &registry, &extraction.documented).unwrap();
        let voice = &coverage[&Taxonomy::CacheFlags][&MemberName::new("VOICE_STATE")];
        assert!(voice.is_documented());
        assert!(voice.derived_by.contains(&EventTypeName("ev.VoiceEvent".to_string())));

        let guild_members = &coverage[&Taxonomy::Intents][&MemberName::new("GUILD_MEMBERS")];
        assert_eq!(guild_members, &CoverageEntry::default());

        assert_eq!(
            undocumented_members(&coverage),
            vec![(Taxonomy::CacheFlags, MemberName::new("MEMBER_OVERRIDES"))]
        );
    }
}
