//! Adapter over the authoritative derivation function.
//!
//! The engine never decides what an event requires; it asks a
//! `DerivationOracle` supplied by the host library and treats the answer as
//! ground truth. The registry only guards the boundary: a failing oracle or an
//! answer naming a member outside the taxonomy is a setup defect and aborts
//! the run instead of being reported as a per-type mismatch.

use crate::events::{EventType, TypeHierarchyIndex};
use crate::taxonomy::{EventTypeName, MemberSet, RequirementSet, Taxonomy, TaxonomyIndex};
use anyhow::{Result, bail};
use thiserror::Error;

/// The derivation function under test, one answer per (type, taxonomy).
pub trait DerivationOracle {
    fn required_for(&self, event: &EventType, taxonomy: Taxonomy) -> Result<MemberSet>;
}

impl<F> DerivationOracle for F
where
    F: Fn(&EventType, Taxonomy) -> Result<MemberSet>,
{
    fn required_for(&self, event: &EventType, taxonomy: Taxonomy) -> Result<MemberSet> {
        self(event, taxonomy)
    }
}

/// Fatal defects in the derivation function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("derivation failed for {event_type} ({taxonomy}): {message}")]
    DerivationFailed {
        event_type: EventTypeName,
        taxonomy: Taxonomy,
        message: String,
    },
    #[error("derivation for {event_type} ({taxonomy}) returned unknown member '{member}'")]
    UnknownMember {
        event_type: EventTypeName,
        taxonomy: Taxonomy,
        member: String,
    },
}

pub struct RequirementRegistry<'a> {
    oracle: &'a dyn DerivationOracle,
    taxonomies: &'a TaxonomyIndex,
}

impl<'a> RequirementRegistry<'a> {
    pub fn new(oracle: &'a dyn DerivationOracle, taxonomies: &'a TaxonomyIndex) -> Self {
        Self { oracle, taxonomies }
    }

    /// Derived members of `event` for `taxonomy`.
    pub fn required_for(&self, event: &EventType, taxonomy: Taxonomy) -> Result<MemberSet, SetupError> {
        let members =
            self.oracle
                .required_for(event, taxonomy)
                .map_err(|err| SetupError::DerivationFailed {
                    event_type: event.name.clone(),
                    taxonomy,
                    message: format!("{err:#}"),
                })?;
        if let Some(unknown) = members
            .iter()
            .find(|member| !self.taxonomies.contains(taxonomy, member))
        {
            return Err(SetupError::UnknownMember {
                event_type: event.name.clone(),
                taxonomy,
                member: unknown.0.clone(),
            });
        }
        Ok(members)
    }

    /// Derived members of `event` for every taxonomy.
    pub fn requirements_for(&self, event: &EventType) -> Result<RequirementSet, SetupError> {
        let mut requirements = RequirementSet::new();
        for taxonomy in Taxonomy::ALL {
            requirements.set(taxonomy, self.required_for(event, taxonomy)?);
        }
        Ok(requirements)
    }
}

/// Reference derivation backed by the taxonomy catalog.
///
/// Each catalog member lists the event types that need it; an event requires
/// the member when it is assignable to one of them. Permissions additionally
/// include `required_permissions.always` annotations declared on the event or
/// any of its ancestors.
pub struct CatalogDerivation<'a> {
    hierarchy: &'a TypeHierarchyIndex,
    taxonomies: &'a TaxonomyIndex,
}

impl<'a> CatalogDerivation<'a> {
    /// Fails when a member names an event type the manifest does not declare,
    /// since such a member could never be derived.
    pub fn new(hierarchy: &'a TypeHierarchyIndex, taxonomies: &'a TaxonomyIndex) -> Result<Self> {
        for taxonomy in Taxonomy::ALL {
            for member in taxonomies.members(taxonomy) {
                if let Some(missing) = member
                    .events
                    .iter()
                    .find(|event| !hierarchy.is_declared(event))
                {
                    bail!(
                        "{taxonomy} member {} is derived from undeclared event type {missing}",
                        member.name
                    );
                }
            }
        }
        Ok(Self {
            hierarchy,
            taxonomies,
        })
    }
}

impl DerivationOracle for CatalogDerivation<'_> {
    fn required_for(&self, event: &EventType, taxonomy: Taxonomy) -> Result<MemberSet> {
        let mut required: MemberSet = self
            .taxonomies
            .members(taxonomy)
            .filter(|member| {
                member
                    .events
                    .iter()
                    .any(|root| self.hierarchy.is_assignable_to(&event.name, root))
            })
            .map(|member| member.name.clone())
            .collect();

        if taxonomy == Taxonomy::Permissions {
            required.extend(event.required_permissions.always.iter().cloned());
            for ancestor in self.hierarchy.ancestors_of(&event.name) {
                if let Some(declared) = self.hierarchy.get(ancestor) {
                    required.extend(declared.required_permissions.always.iter().cloned());
                }
            }
        }
        Ok(required)
    }
}
