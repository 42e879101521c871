//! Deserializable representation of `data/taxonomies.json`.
//!
//! The types mirror the taxonomy catalog schema. Use `TaxonomyIndex` for
//! validated lookups; use these structs when the raw catalog surface (member
//! descriptions, derivation roots) is required.

use crate::taxonomy::identity::{EventTypeName, MemberName, Taxonomy};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Full taxonomy catalog as stored on disk.
pub struct TaxonomyCatalog {
    pub schema_version: String,
    pub taxonomies: Vec<TaxonomyDefinition>,
}

#[derive(Clone, Debug, Deserialize)]
/// One capability taxonomy and its members.
pub struct TaxonomyDefinition {
    pub key: Taxonomy,
    /// Name used in documentation cross-references, e.g. `CacheFlag` in
    /// `{@link CacheFlag#MEMBER_OVERRIDES}`.
    pub reference_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub members: Vec<Member>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Member {
    pub name: MemberName,
    #[serde(default)]
    pub description: Option<String>,
    /// Event types (and therefore all their subtypes) that need this member.
    #[serde(default)]
    pub events: Vec<EventTypeName>,
}
