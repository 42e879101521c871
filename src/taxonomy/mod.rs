//! Capability taxonomy wiring.
//!
//! This module wraps the JSON catalog under `data/taxonomies.json` that
//! declares the three capability taxonomies (intents, cache flags,
//! permissions), the name each one goes by in documentation references, and
//! the members that exist. Callers use `TaxonomyIndex` for validated lookups.

pub mod identity;
pub mod index;
pub mod model;
pub mod requirement_set;

pub use identity::{EventTypeName, MemberName, MemberSet, Taxonomy, format_members};
pub use index::{TAXONOMY_SCHEMA_VERSION, TaxonomyIndex};
pub use model::{Member, TaxonomyCatalog, TaxonomyDefinition};
pub use requirement_set::RequirementSet;
