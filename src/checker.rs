//! Documentation-vs-derivation consistency checks.
//!
//! Two independent checks run over the extracted documentation:
//!
//! * **mismatch**: per type and taxonomy, the documented set minus exception
//!   entries and contextual members must equal the derived set;
//! * **inheritance**: every documented subtype must restate the documented
//!   members of each documented ancestor, unless exempted.
//!
//! Neither check stops at the first problem. Failures accumulate so one run
//! surfaces all drift at once.

use crate::config::CheckConfig;
use crate::doc_references::{DocumentedRequirements, Extraction, ReferenceResolutionError};
use crate::events::TypeHierarchyIndex;
use crate::registry::{RequirementRegistry, SetupError};
use crate::taxonomy::{EventTypeName, MemberSet, Taxonomy, format_members};
use serde::Serialize;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// Documented and derived sets differ.
    Mismatch {
        event_type: EventTypeName,
        taxonomy: Taxonomy,
        /// Documented members after exceptions and contextual members were removed.
        documented: MemberSet,
        derived: MemberSet,
    },
    /// A subtype does not document members its ancestor documents.
    Inheritance {
        event_type: EventTypeName,
        taxonomy: Taxonomy,
        missing: MemberSet,
        ancestor: EventTypeName,
    },
    /// A documentation reference could not be resolved.
    UnresolvedReference {
        event_type: EventTypeName,
        taxonomy: Taxonomy,
        reference: String,
    },
}

impl Failure {
    pub fn event_type(&self) -> &EventTypeName {
        match self {
            Failure::Mismatch { event_type, .. }
            | Failure::Inheritance { event_type, .. }
            | Failure::UnresolvedReference { event_type, .. } => event_type,
        }
    }

    pub fn taxonomy(&self) -> Taxonomy {
        match self {
            Failure::Mismatch { taxonomy, .. }
            | Failure::Inheritance { taxonomy, .. }
            | Failure::UnresolvedReference { taxonomy, .. } => *taxonomy,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Failure::Mismatch { .. } => "mismatch",
            Failure::Inheritance { .. } => "inheritance",
            Failure::UnresolvedReference { .. } => "unresolved_reference",
        }
    }
}

impl From<ReferenceResolutionError> for Failure {
    fn from(err: ReferenceResolutionError) -> Self {
        Failure::UnresolvedReference {
            event_type: err.event_type,
            taxonomy: err.taxonomy,
            reference: err.reference,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Mismatch {
                event_type,
                taxonomy,
                documented,
                derived,
            } => {
                let documented_only: MemberSet = documented.difference(derived).cloned().collect();
                let derived_only: MemberSet = derived.difference(documented).cloned().collect();
                write!(
                    f,
                    "[{taxonomy}] {event_type}: documented {} does not match derived {} (documented only: {}, derived only: {})",
                    format_members(documented),
                    format_members(derived),
                    format_members(&documented_only),
                    format_members(&derived_only)
                )
            }
            Failure::Inheritance {
                event_type,
                taxonomy,
                missing,
                ancestor,
            } => write!(
                f,
                "[{taxonomy}] {event_type} does not document {} inherited from {ancestor}",
                format_members(missing)
            ),
            Failure::UnresolvedReference {
                event_type,
                taxonomy,
                reference,
            } => write!(
                f,
                "[{taxonomy}] {event_type}: unresolvable reference '{reference}'"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Raw checker output, before the reporter orders it.
pub struct CheckResults {
    pub checked_types: usize,
    pub failures: Vec<Failure>,
    pub undocumented: Vec<EventTypeName>,
}

pub struct ConsistencyChecker<'a> {
    hierarchy: &'a TypeHierarchyIndex,
    registry: &'a RequirementRegistry<'a>,
    config: &'a CheckConfig,
}

impl<'a> ConsistencyChecker<'a> {
    pub fn new(
        hierarchy: &'a TypeHierarchyIndex,
        registry: &'a RequirementRegistry<'a>,
        config: &'a CheckConfig,
    ) -> Self {
        Self {
            hierarchy,
            registry,
            config,
        }
    }

    /// Run both checks over `extraction`.
    ///
    /// Only a failing derivation aborts; everything else is accumulated.
    pub fn run(&self, extraction: &Extraction) -> Result<CheckResults, SetupError> {
        let mut failures: Vec<Failure> = extraction
            .resolution_errors
            .iter()
            .cloned()
            .map(Failure::from)
            .collect();
        failures.extend(self.check_mismatches(&extraction.documented)?);
        failures.extend(self.check_inheritance(&extraction.documented));

        Ok(CheckResults {
            checked_types: self.hierarchy.len(),
            failures,
            undocumented: extraction.undocumented.clone(),
        })
    }

    /// Compare documented against derived sets for every documented type.
    pub fn check_mismatches(&self, documented: &DocumentedRequirements) -> Result<Vec<Failure>, SetupError> {
        let mut failures = Vec::new();
        for event_type in documented.types() {
            if self.config.is_ignored(event_type) {
                debug!(event_type = %event_type, "ignored type skipped by mismatch check");
                continue;
            }
            let Some(event) = self.hierarchy.get(event_type) else {
                continue;
            };
            for taxonomy in Taxonomy::ALL {
                let Some(raw) = documented.get(event_type, taxonomy) else {
                    continue;
                };
                let excused = self.config.exceptions_for(event_type, taxonomy);
                let contextual = self.config.contextual(taxonomy);
                let expected: MemberSet = raw
                    .iter()
                    .filter(|member| !excused.contains(*member) && !contextual.contains(*member))
                    .cloned()
                    .collect();
                let derived = self.registry.required_for(event, taxonomy)?;
                if expected != derived {
                    failures.push(Failure::Mismatch {
                        event_type: event_type.clone(),
                        taxonomy,
                        documented: expected,
                        derived,
                    });
                }
            }
        }
        Ok(failures)
    }

    /// Check that documented subtypes carry their ancestors' documented members.
    ///
    /// A subtype's own exception entries also excuse it here; undocumented
    /// subtypes have nothing to check.
    pub fn check_inheritance(&self, documented: &DocumentedRequirements) -> Vec<Failure> {
        let mut failures = Vec::new();
        for ancestor in documented.types() {
            for taxonomy in Taxonomy::ALL {
                let Some(obligations) = documented.get(ancestor, taxonomy) else {
                    continue;
                };
                if obligations.is_empty() {
                    continue;
                }
                for subtype in self.hierarchy.subtypes_of(ancestor) {
                    if self.config.is_inheritance_exempt(&subtype, taxonomy) {
                        continue;
                    }
                    let Some(carried) = documented.get(&subtype, taxonomy) else {
                        continue;
                    };
                    let excused = self.config.exceptions_for(&subtype, taxonomy);
                    let missing: MemberSet = obligations
                        .iter()
                        .filter(|member| !carried.contains(*member) && !excused.contains(*member))
                        .cloned()
                        .collect();
                    if !missing.is_empty() {
                        failures.push(Failure::Inheritance {
                            event_type: subtype,
                            taxonomy,
                            missing,
                            ancestor: ancestor.clone(),
                        });
                    }
                }
            }
        }
        failures
    }
}
