//! Integrator-supplied check configuration (`data/reqcheck.json`).
//!
//! Holds the static policy tables consumed by the checker: optional members
//! excused from the mismatch check, subtypes excused from the inheritance
//! check, types never compared at all, and members that are contextual for a
//! whole taxonomy. The tables are passed to the checker explicitly; nothing
//! here is global.

use crate::events::TypeHierarchyIndex;
use crate::schema_loader::validate_document;
use crate::taxonomy::{EventTypeName, MemberName, MemberSet, Taxonomy, TaxonomyIndex};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const CHECK_CONFIG_SCHEMA_VERSION: &str = "reqcheck_config_v1";
pub const CHECK_CONFIG_SCHEMA_FILE: &str = "check_config.schema.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfig {
    #[serde(default)]
    pub exceptions: Vec<ExceptionEntry>,
    #[serde(default)]
    pub inheritance_exemptions: Vec<InheritanceExemption>,
    /// Types the mismatch check never compares, regardless of exceptions.
    #[serde(default)]
    pub ignored_types: Vec<EventTypeName>,
    /// Members subtracted from every documented set of a taxonomy before the
    /// mismatch comparison.
    #[serde(default)]
    pub contextual_members: BTreeMap<Taxonomy, Vec<MemberName>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Members documented as possible for a type but intentionally absent from
/// the derivation.
pub struct ExceptionEntry {
    pub event_type: EventTypeName,
    pub taxonomy: Taxonomy,
    pub members: Vec<MemberName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Subtype excused from restating its ancestors' documented members.
pub struct InheritanceExemption {
    pub event_type: EventTypeName,
    /// Taxonomy the exemption applies to; all of them when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<Taxonomy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CheckConfig {
    /// Load and schema-check a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let value = validate_document(path, CHECK_CONFIG_SCHEMA_FILE, CHECK_CONFIG_SCHEMA_VERSION)?;
        serde_json::from_value(value).with_context(|| format!("loading {}", path.display()))
    }

    /// Cross-check every entry against the manifest and the catalog.
    ///
    /// Entries naming types declared outside the checked namespace are kept;
    /// they simply go unused when a run is narrowed. Returns every problem
    /// rather than the first so a stale table can be fixed in one pass.
    pub fn validate(&self, hierarchy: &TypeHierarchyIndex, taxonomies: &TaxonomyIndex) -> Vec<String> {
        let mut errors = Vec::new();
        let check_type = |context: &str, event_type: &EventTypeName, errors: &mut Vec<String>| {
            if !hierarchy.is_declared(event_type) {
                errors.push(format!("{context} references unknown event type {event_type}"));
            }
        };

        for entry in &self.exceptions {
            check_type("exception", &entry.event_type, &mut errors);
            for member in &entry.members {
                if !taxonomies.contains(entry.taxonomy, member) {
                    errors.push(format!(
                        "exception for {} references unknown {} member '{}'",
                        entry.event_type, entry.taxonomy, member
                    ));
                }
            }
        }
        for exemption in &self.inheritance_exemptions {
            check_type("inheritance exemption", &exemption.event_type, &mut errors);
            if hierarchy.supertype_of(&exemption.event_type).is_none()
                && hierarchy.is_declared(&exemption.event_type)
            {
                errors.push(format!(
                    "inheritance exemption for {} has no supertype to inherit from",
                    exemption.event_type
                ));
            }
        }
        for ignored in &self.ignored_types {
            check_type("ignored type", ignored, &mut errors);
        }
        for (taxonomy, members) in &self.contextual_members {
            for member in members {
                if !taxonomies.contains(*taxonomy, member) {
                    errors.push(format!(
                        "contextual member '{member}' is not a {taxonomy} member"
                    ));
                }
            }
        }
        for event in hierarchy.types() {
            for member in &event.required_permissions.sometimes {
                if !taxonomies.contains(Taxonomy::Permissions, member) {
                    errors.push(format!(
                        "{} required_permissions.sometimes names unknown permissions member '{member}'",
                        event.name
                    ));
                }
            }
        }
        errors
    }

    /// Add exception entries for every `required_permissions.sometimes`
    /// annotation in the universe.
    ///
    /// Such permissions are documented as possibly needed but are never part
    /// of the derivation.
    pub fn with_annotated_optionals(mut self, hierarchy: &TypeHierarchyIndex) -> Self {
        for event in hierarchy.types() {
            let optional = &event.required_permissions.sometimes;
            if optional.is_empty() {
                continue;
            }
            self.exceptions.push(ExceptionEntry {
                event_type: event.name.clone(),
                taxonomy: Taxonomy::Permissions,
                members: optional.clone(),
                reason: Some("required_permissions.sometimes annotation".to_string()),
            });
        }
        self
    }

    /// Union of every exception declared for `event_type` in `taxonomy`.
    pub fn exceptions_for(&self, event_type: &EventTypeName, taxonomy: Taxonomy) -> MemberSet {
        self.exceptions
            .iter()
            .filter(|entry| &entry.event_type == event_type && entry.taxonomy == taxonomy)
            .flat_map(|entry| entry.members.iter().cloned())
            .collect()
    }

    pub fn is_inheritance_exempt(&self, event_type: &EventTypeName, taxonomy: Taxonomy) -> bool {
        self.inheritance_exemptions.iter().any(|exemption| {
            &exemption.event_type == event_type
                && exemption.taxonomy.is_none_or(|scoped| scoped == taxonomy)
        })
    }

    pub fn is_ignored(&self, event_type: &EventTypeName) -> bool {
        self.ignored_types.contains(event_type)
    }

    pub fn contextual(&self, taxonomy: Taxonomy) -> MemberSet {
        self.contextual_members
            .get(&taxonomy)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Validate against the universe and bail with every problem found.
    pub fn ensure_valid(&self, hierarchy: &TypeHierarchyIndex, taxonomies: &TaxonomyIndex) -> Result<()> {
        let errors = self.validate(hierarchy, taxonomies);
        if errors.is_empty() {
            return Ok(());
        }
        bail!(
            "check configuration has {} problem(s):\n{}",
            errors.len(),
            errors.join("\n")
        )
    }
}
