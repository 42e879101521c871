//! Indexed view of the taxonomy catalog.
//!
//! The index enforces the catalog schema version and guarantees that each of
//! the three taxonomies is declared exactly once with unique, non-empty member
//! names. Lookups are therefore infallible per taxonomy; only member lookups
//! return `Option`.

use crate::schema_loader::validate_document;
use crate::taxonomy::model::{Member, TaxonomyCatalog, TaxonomyDefinition};
use crate::taxonomy::identity::{MemberName, Taxonomy};
use anyhow::{Context, Result, bail};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub const TAXONOMY_SCHEMA_VERSION: &str = "reqcheck_taxonomies_v1";
pub const TAXONOMY_SCHEMA_FILE: &str = "taxonomy_catalog.schema.json";

#[derive(Debug)]
/// Taxonomy catalog plus per-taxonomy member indexes.
pub struct TaxonomyIndex {
    intents: IndexedTaxonomy,
    cache_flags: IndexedTaxonomy,
    permissions: IndexedTaxonomy,
}

#[derive(Debug)]
struct IndexedTaxonomy {
    definition: TaxonomyDefinition,
    by_name: BTreeMap<MemberName, Member>,
}

impl TaxonomyIndex {
    /// Load, schema-check and index the catalog at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let value = validate_document(path, TAXONOMY_SCHEMA_FILE, TAXONOMY_SCHEMA_VERSION)?;
        let catalog: TaxonomyCatalog = serde_json::from_value(value)
            .with_context(|| format!("loading {}", path.display()))?;
        Self::from_catalog(catalog)
    }

    /// Index an already-parsed catalog.
    pub fn from_catalog(catalog: TaxonomyCatalog) -> Result<Self> {
        if catalog.schema_version != TAXONOMY_SCHEMA_VERSION {
            bail!(
                "schema_version '{}' not supported, expected '{}'",
                catalog.schema_version,
                TAXONOMY_SCHEMA_VERSION
            );
        }

        let mut indexed: BTreeMap<Taxonomy, IndexedTaxonomy> = BTreeMap::new();
        let mut reference_names = BTreeSet::new();
        for definition in catalog.taxonomies {
            let key = definition.key;
            if indexed.contains_key(&key) {
                bail!("taxonomy {key} declared more than once");
            }
            validate_reference_name(&definition)?;
            if !reference_names.insert(definition.reference_name.clone()) {
                bail!(
                    "reference name {} is shared by more than one taxonomy",
                    definition.reference_name
                );
            }
            let by_name = build_member_index(&definition)?;
            indexed.insert(
                key,
                IndexedTaxonomy {
                    definition,
                    by_name,
                },
            );
        }

        let mut take = |taxonomy: Taxonomy| {
            indexed
                .remove(&taxonomy)
                .with_context(|| format!("catalog is missing taxonomy {taxonomy}"))
        };
        Ok(Self {
            intents: take(Taxonomy::Intents)?,
            cache_flags: take(Taxonomy::CacheFlags)?,
            permissions: take(Taxonomy::Permissions)?,
        })
    }

    fn indexed(&self, taxonomy: Taxonomy) -> &IndexedTaxonomy {
        match taxonomy {
            Taxonomy::Intents => &self.intents,
            Taxonomy::CacheFlags => &self.cache_flags,
            Taxonomy::Permissions => &self.permissions,
        }
    }

    pub fn definition(&self, taxonomy: Taxonomy) -> &TaxonomyDefinition {
        &self.indexed(taxonomy).definition
    }

    /// Name used by documentation cross-references for `taxonomy`.
    pub fn reference_name(&self, taxonomy: Taxonomy) -> &str {
        &self.indexed(taxonomy).definition.reference_name
    }

    /// Resolve a member by name.
    ///
    /// Returns `None` instead of erroring; callers surface errors with the
    /// context that referenced the missing member.
    pub fn member(&self, taxonomy: Taxonomy, name: &str) -> Option<&Member> {
        self.indexed(taxonomy).by_name.get(&MemberName::new(name))
    }

    pub fn contains(&self, taxonomy: Taxonomy, member: &MemberName) -> bool {
        self.indexed(taxonomy).by_name.contains_key(member)
    }

    /// Iterates member definitions of `taxonomy` in stable name order.
    pub fn members(&self, taxonomy: Taxonomy) -> impl Iterator<Item = &Member> {
        self.indexed(taxonomy).by_name.values()
    }
}

fn validate_reference_name(definition: &TaxonomyDefinition) -> Result<()> {
    let name = &definition.reference_name;
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!(
            "taxonomy {} reference_name must be an identifier, got '{}'",
            definition.key,
            name
        );
    }
    Ok(())
}

fn build_member_index(definition: &TaxonomyDefinition) -> Result<BTreeMap<MemberName, Member>> {
    if definition.members.is_empty() {
        bail!("taxonomy {} declares no members", definition.key);
    }

    let mut map = BTreeMap::new();
    for member in &definition.members {
        if member.name.0.trim().is_empty() {
            bail!("taxonomy {} contains a member with no name", definition.key);
        }
        if map.contains_key(&member.name) {
            bail!(
                "duplicate member {} in taxonomy {}",
                member.name,
                definition.key
            );
        }
        map.insert(member.name.clone(), member.clone());
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn catalog(value: Value) -> TaxonomyCatalog {
        serde_json::from_value(value).expect("catalog fixture parses")
    }

    fn taxonomy(key: &str, reference: &str, members: &[&str]) -> Value {
        json!({
            "key": key,
            "reference_name": reference,
            "members": members.iter().map(|name| json!({"name": name})).collect::<Vec<_>>()
        })
    }

    #[test]
    fn from_catalog_indexes_all_three_taxonomies() {
        let index = TaxonomyIndex::from_catalog(catalog(json!({
            "schema_version": TAXONOMY_SCHEMA_VERSION,
            "taxonomies": [
                taxonomy("intents", "GatewayIntent", &["GUILD_MEMBERS"]),
                taxonomy("cache_flags", "CacheFlag", &["VOICE_STATE", "ACTIVITY"]),
                taxonomy("permissions", "Permission", &["BAN_MEMBERS"])
            ]
        })))
        .expect("index builds");

        assert_eq!(index.reference_name(Taxonomy::CacheFlags), "CacheFlag");
        assert!(index.member(Taxonomy::Intents, "GUILD_MEMBERS").is_some());
        assert!(index.member(Taxonomy::Intents, "VOICE_STATE").is_none());
        let names: Vec<_> = index
            .members(Taxonomy::CacheFlags)
            .map(|member| member.name.0.as_str())
            .collect();
        assert_eq!(names, vec!["ACTIVITY", "VOICE_STATE"]);
    }

    #[test]
    fn from_catalog_rejects_missing_taxonomy() {
        let err = TaxonomyIndex::from_catalog(catalog(json!({
            "schema_version": TAXONOMY_SCHEMA_VERSION,
            "taxonomies": [
                taxonomy("intents", "GatewayIntent", &["GUILD_MEMBERS"]),
                taxonomy("permissions", "Permission", &["BAN_MEMBERS"])
            ]
        })))
        .expect_err("missing cache_flags should fail");
        assert!(err.to_string().contains("cache_flags"));
    }

    #[test]
    fn from_catalog_rejects_duplicate_members() {
        let err = TaxonomyIndex::from_catalog(catalog(json!({
            "schema_version": TAXONOMY_SCHEMA_VERSION,
            "taxonomies": [
                taxonomy("intents", "GatewayIntent", &["GUILD_MEMBERS", "GUILD_MEMBERS"]),
                taxonomy("cache_flags", "CacheFlag", &["VOICE_STATE"]),
                taxonomy("permissions", "Permission", &["BAN_MEMBERS"])
            ]
        })))
        .expect_err("duplicate member should fail");
        assert!(err.to_string().contains("duplicate member GUILD_MEMBERS"));
    }

    #[test]
    fn from_catalog_rejects_non_identifier_reference_names() {
        let err = TaxonomyIndex::from_catalog(catalog(json!({
            "schema_version": TAXONOMY_SCHEMA_VERSION,
            "taxonomies": [
                taxonomy("intents", "Gateway Intent", &["GUILD_MEMBERS"]),
                taxonomy("cache_flags", "CacheFlag", &["VOICE_STATE"]),
                taxonomy("permissions", "Permission", &["BAN_MEMBERS"])
            ]
        })))
        .expect_err("reference name with a space should fail");
        assert!(err.to_string().contains("must be an identifier"));
    }
}
