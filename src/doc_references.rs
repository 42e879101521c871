//! Extraction of documented requirements from event descriptions.
//!
//! Descriptions carry requirements as inline link tags such as
//! `{@link CacheFlag#MEMBER_OVERRIDES MEMBER_OVERRIDES}`. Only the link target
//! counts: the label after the first whitespace is dropped, unless that
//! whitespace follows a comma, which keeps `{@link CacheFlag#A, CacheFlag#B}`
//! together as one compound target. Targets are matched per taxonomy on
//! `<ReferenceName>#<Member>` and each member must exist in the catalog.

use crate::events::{EventType, TypeHierarchyIndex};
use crate::taxonomy::{EventTypeName, MemberName, MemberSet, RequirementSet, Taxonomy, TaxonomyIndex};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

const LINK_TAG: &str = "{@link";

/// A documentation reference naming a member that does not exist.
///
/// Always a real defect: either a typo or a stale reference to a renamed
/// member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{event_type} references unknown {taxonomy} member '{reference}'")]
pub struct ReferenceResolutionError {
    pub event_type: EventTypeName,
    pub taxonomy: Taxonomy,
    pub reference: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Documented requirement sets of every type that has a description.
///
/// A documented type lacks an entry for a taxonomy only when extraction for
/// that taxonomy failed.
pub struct DocumentedRequirements {
    by_type: BTreeMap<EventTypeName, RequirementSet>,
}

impl DocumentedRequirements {
    /// Documented members of `event_type` for `taxonomy`; `None` when the type
    /// is undocumented or its references could not be resolved.
    pub fn get(&self, event_type: &EventTypeName, taxonomy: Taxonomy) -> Option<&MemberSet> {
        let set = self.by_type.get(event_type)?;
        set.contains(taxonomy).then(|| set.get(taxonomy))
    }

    /// Documented types in name order.
    pub fn types(&self) -> impl Iterator<Item = &EventTypeName> {
        self.by_type.keys()
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    pub fn insert(&mut self, event_type: EventTypeName, requirements: RequirementSet) {
        self.by_type.insert(event_type, requirements);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Outcome of extracting documentation for a whole universe.
pub struct Extraction {
    pub documented: DocumentedRequirements,
    pub undocumented: Vec<EventTypeName>,
    pub resolution_errors: Vec<ReferenceResolutionError>,
}

pub struct DocumentationExtractor<'a> {
    taxonomies: &'a TaxonomyIndex,
    intents: Regex,
    cache_flags: Regex,
    permissions: Regex,
}

impl<'a> DocumentationExtractor<'a> {
    pub fn new(taxonomies: &'a TaxonomyIndex) -> Result<Self> {
        Ok(Self {
            taxonomies,
            intents: reference_pattern(taxonomies, Taxonomy::Intents)?,
            cache_flags: reference_pattern(taxonomies, Taxonomy::CacheFlags)?,
            permissions: reference_pattern(taxonomies, Taxonomy::Permissions)?,
        })
    }

    fn pattern(&self, taxonomy: Taxonomy) -> &Regex {
        match taxonomy {
            Taxonomy::Intents => &self.intents,
            Taxonomy::CacheFlags => &self.cache_flags,
            Taxonomy::Permissions => &self.permissions,
        }
    }

    /// Documented members of `event` for `taxonomy`.
    ///
    /// `Ok(None)` means the type has no description at all, which is distinct
    /// from `Ok(Some(empty))`: a description without references documents
    /// that nothing is required.
    pub fn extract(
        &self,
        event: &EventType,
        taxonomy: Taxonomy,
    ) -> Result<Option<MemberSet>, ReferenceResolutionError> {
        let Some(description) = event.description.as_deref() else {
            return Ok(None);
        };

        let pattern = self.pattern(taxonomy);
        let mut members = MemberSet::new();
        for link in inline_links(description) {
            for captures in pattern.captures_iter(link) {
                let reference = captures.get(0).map_or("", |m| m.as_str());
                let member = captures.get(1).map_or("", |m| m.as_str());
                if self.taxonomies.member(taxonomy, member).is_none() {
                    return Err(ReferenceResolutionError {
                        event_type: event.name.clone(),
                        taxonomy,
                        reference: reference.to_string(),
                    });
                }
                members.insert(MemberName::new(member));
            }
        }
        Ok(Some(members))
    }

    /// Extract every taxonomy for every type in the universe.
    ///
    /// Resolution errors are collected instead of aborting so one bad
    /// reference does not hide problems in other types.
    pub fn extract_all(&self, hierarchy: &TypeHierarchyIndex) -> Extraction {
        let mut extraction = Extraction::default();
        for event in hierarchy.types() {
            if event.description.is_none() {
                warn!(event_type = %event.name, "undocumented event type");
                extraction.undocumented.push(event.name.clone());
                continue;
            }

            let mut requirements = RequirementSet::new();
            for taxonomy in Taxonomy::ALL {
                match self.extract(event, taxonomy) {
                    Ok(Some(members)) => requirements.set(taxonomy, members),
                    Ok(None) => {}
                    Err(err) => {
                        warn!(
                            event_type = %err.event_type,
                            reference = %err.reference,
                            "unresolvable documentation reference"
                        );
                        extraction.resolution_errors.push(err);
                    }
                }
            }
            extraction
                .documented
                .insert(event.name.clone(), requirements);
        }
        extraction
    }
}

fn reference_pattern(taxonomies: &TaxonomyIndex, taxonomy: Taxonomy) -> Result<Regex> {
    let reference_name = taxonomies.reference_name(taxonomy);
    Regex::new(&format!(r"\b{}#(\w+)", regex::escape(reference_name)))
        .with_context(|| format!("compiling reference pattern for {taxonomy}"))
}

/// Link targets of every `{@link ...}` tag in `description`, in order.
pub fn inline_links(description: &str) -> Vec<&str> {
    let mut links = Vec::new();
    let mut rest = description;
    while let Some(start) = rest.find(LINK_TAG) {
        let after_tag = &rest[start + LINK_TAG.len()..];
        // `{@linkplain ...}` shares the prefix but is not a link tag.
        if !after_tag.starts_with(char::is_whitespace) {
            rest = after_tag;
            continue;
        }
        let Some(end) = closing_brace(after_tag) else {
            break;
        };
        links.push(link_target(after_tag[..end].trim()));
        rest = &after_tag[end + 1..];
    }
    links
}

/// Left-hand part of a link, split on the first whitespace not preceded by a
/// comma.
fn link_target(link: &str) -> &str {
    let mut previous = None;
    for (idx, ch) in link.char_indices() {
        if ch.is_whitespace() && previous != Some(',') {
            return &link[..idx];
        }
        previous = Some(ch);
    }
    link
}

fn closing_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(idx),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}
