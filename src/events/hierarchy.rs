//! Supertype/subtype graph over the declared event types.
//!
//! Discovery is strict: every supertype must be declared, names must be
//! unique and the graph must be acyclic. An empty universe is an error
//! because every later check would pass vacuously over it.

use crate::events::manifest::{EventEntry, EventManifest, RequiredPermissions};
use crate::taxonomy::EventTypeName;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use thiserror::Error;
use tracing::{debug, info};

/// Fatal problems building the type universe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("namespace root must not be empty")]
    EmptyNamespace,
    #[error("no event types found under namespace '{namespace}'")]
    NoTypesFound { namespace: String },
    #[error("event type {0} is declared more than once")]
    DuplicateType(EventTypeName),
    #[error("event type {event_type} extends undeclared supertype {supertype}")]
    UnknownSupertype {
        event_type: EventTypeName,
        supertype: EventTypeName,
    },
    #[error("supertype chain of {0} is cyclic")]
    Cycle(EventTypeName),
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// One node of the hierarchy. Immutable once discovered.
pub struct EventType {
    pub name: EventTypeName,
    pub supertype: Option<EventTypeName>,
    pub description: Option<String>,
    pub required_permissions: RequiredPermissions,
}

impl From<&EventEntry> for EventType {
    fn from(entry: &EventEntry) -> Self {
        Self {
            name: entry.name.clone(),
            supertype: entry.supertype.clone(),
            description: entry.description.clone(),
            required_permissions: entry.required_permissions.clone(),
        }
    }
}

#[derive(Debug)]
pub struct TypeHierarchyIndex {
    namespace: String,
    declared: BTreeMap<EventTypeName, EventType>,
    children: BTreeMap<EventTypeName, BTreeSet<EventTypeName>>,
    universe: BTreeSet<EventTypeName>,
}

impl TypeHierarchyIndex {
    /// Build the index for every manifest type under `root_namespace`.
    ///
    /// Types outside the namespace still contribute edges, so a subtype
    /// relation that passes through them is preserved, but they are never
    /// part of the checked universe.
    pub fn discover(manifest: &EventManifest, root_namespace: &str) -> Result<Self, DiscoveryError> {
        let namespace = root_namespace.trim();
        if namespace.is_empty() {
            return Err(DiscoveryError::EmptyNamespace);
        }

        let mut declared = BTreeMap::new();
        for entry in &manifest.events {
            if declared.contains_key(&entry.name) {
                return Err(DiscoveryError::DuplicateType(entry.name.clone()));
            }
            declared.insert(entry.name.clone(), EventType::from(entry));
        }

        let mut children: BTreeMap<EventTypeName, BTreeSet<EventTypeName>> = BTreeMap::new();
        for event in declared.values() {
            let Some(supertype) = &event.supertype else {
                continue;
            };
            if !declared.contains_key(supertype) {
                return Err(DiscoveryError::UnknownSupertype {
                    event_type: event.name.clone(),
                    supertype: supertype.clone(),
                });
            }
            children
                .entry(supertype.clone())
                .or_default()
                .insert(event.name.clone());
        }
        reject_cycles(&declared)?;

        let universe: BTreeSet<EventTypeName> = declared
            .keys()
            .filter(|name| name.is_within(namespace))
            .cloned()
            .collect();
        if universe.is_empty() {
            return Err(DiscoveryError::NoTypesFound {
                namespace: namespace.to_string(),
            });
        }

        info!(
            namespace,
            types = universe.len(),
            declared = declared.len(),
            "discovered event types"
        );
        Ok(Self {
            namespace: namespace.to_string(),
            declared,
            children,
            universe,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of types in the checked universe.
    pub fn len(&self) -> usize {
        self.universe.len()
    }

    pub fn is_empty(&self) -> bool {
        self.universe.is_empty()
    }

    /// Whether `name` belongs to the checked universe.
    pub fn contains(&self, name: &EventTypeName) -> bool {
        self.universe.contains(name)
    }

    /// Whether `name` appears anywhere in the manifest, inside the namespace
    /// or not.
    pub fn is_declared(&self, name: &EventTypeName) -> bool {
        self.declared.contains_key(name)
    }

    pub fn get(&self, name: &EventTypeName) -> Option<&EventType> {
        self.declared.get(name)
    }

    /// Iterates the checked universe in name order.
    pub fn types(&self) -> impl Iterator<Item = &EventType> {
        self.universe
            .iter()
            .filter_map(|name| self.declared.get(name))
    }

    pub fn supertype_of(&self, name: &EventTypeName) -> Option<&EventTypeName> {
        self.declared.get(name)?.supertype.as_ref()
    }

    /// Supertype chain of `name`, nearest first.
    pub fn ancestors_of(&self, name: &EventTypeName) -> Vec<&EventTypeName> {
        let mut chain = Vec::new();
        let mut current = self.supertype_of(name);
        while let Some(supertype) = current {
            chain.push(supertype);
            current = self.supertype_of(supertype);
        }
        chain
    }

    /// Reflexive subtype test: a type is assignable to itself and to every
    /// ancestor.
    pub fn is_assignable_to(&self, name: &EventTypeName, ancestor: &EventTypeName) -> bool {
        name == ancestor || self.ancestors_of(name).contains(&ancestor)
    }

    /// Every direct or indirect subtype of `name` inside the universe.
    pub fn subtypes_of(&self, name: &EventTypeName) -> BTreeSet<EventTypeName> {
        let mut found = BTreeSet::new();
        let mut queue: VecDeque<&EventTypeName> = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            let Some(direct) = self.children.get(current) else {
                continue;
            };
            for child in direct {
                if self.universe.contains(child) {
                    found.insert(child.clone());
                }
                queue.push_back(child);
            }
        }
        debug!(event_type = %name, subtypes = found.len(), "resolved subtypes");
        found
    }
}

fn reject_cycles(declared: &BTreeMap<EventTypeName, EventType>) -> Result<(), DiscoveryError> {
    for start in declared.keys() {
        let mut current = start;
        let mut steps = 0usize;
        while let Some(next) = declared.get(current).and_then(|event| event.supertype.as_ref()) {
            steps += 1;
            if steps > declared.len() {
                return Err(DiscoveryError::Cycle(start.clone()));
            }
            current = next;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::manifest::EVENT_MANIFEST_SCHEMA_VERSION;
    use serde_json::{Value, json};

    fn manifest(events: Value) -> EventManifest {
        serde_json::from_value(json!({
            "schema_version": EVENT_MANIFEST_SCHEMA_VERSION,
            "namespace": "ev",
            "events": events
        }))
        .expect("manifest fixture parses")
    }

    fn name(raw: &str) -> EventTypeName {
        EventTypeName(raw.to_string())
    }

    fn sample() -> EventManifest {
        manifest(json!([
            {"name": "ev.Root"},
            {"name": "ev.guild.GuildEvent", "supertype": "ev.Root"},
            {"name": "ev.guild.BanEvent", "supertype": "ev.guild.GuildEvent"},
            {"name": "ext.Bridge", "supertype": "ev.guild.GuildEvent"},
            {"name": "ev.guild.BridgedEvent", "supertype": "ext.Bridge"},
            {"name": "ev.user.UserEvent", "supertype": "ev.Root"}
        ]))
    }

    #[test]
    fn subtypes_are_transitive_and_skip_foreign_types() {
        let index = TypeHierarchyIndex::discover(&sample(), "ev").expect("discover");
        assert_eq!(index.len(), 5);
        assert!(!index.contains(&name("ext.Bridge")));
        assert!(index.is_declared(&name("ext.Bridge")));

        let subtypes = index.subtypes_of(&name("ev.guild.GuildEvent"));
        assert_eq!(
            subtypes,
            BTreeSet::from([name("ev.guild.BanEvent"), name("ev.guild.BridgedEvent")])
        );
        assert_eq!(index.subtypes_of(&name("ev.Root")).len(), 4);
        assert!(index.subtypes_of(&name("ev.user.UserEvent")).is_empty());
    }

    #[test]
    fn ancestors_are_nearest_first() {
        let index = TypeHierarchyIndex::discover(&sample(), "ev").expect("discover");
        let chain: Vec<_> = index
            .ancestors_of(&name("ev.guild.BridgedEvent"))
            .into_iter()
            .map(|n| n.0.as_str())
            .collect();
        assert_eq!(chain, vec!["ext.Bridge", "ev.guild.GuildEvent", "ev.Root"]);
        assert!(index.is_assignable_to(&name("ev.guild.BanEvent"), &name("ev.guild.BanEvent")));
        assert!(index.is_assignable_to(&name("ev.guild.BanEvent"), &name("ev.Root")));
        assert!(!index.is_assignable_to(&name("ev.Root"), &name("ev.guild.BanEvent")));
    }

    #[test]
    fn namespace_narrows_universe() {
        let index = TypeHierarchyIndex::discover(&sample(), "ev.guild").expect("discover");
        let names: Vec<_> = index.types().map(|t| t.name.0.as_str()).collect();
        assert_eq!(
            names,
            vec!["ev.guild.BanEvent", "ev.guild.BridgedEvent", "ev.guild.GuildEvent"]
        );
        assert_eq!(index.namespace(), "ev.guild");
    }

    #[test]
    fn empty_universe_is_fatal() {
        let err = TypeHierarchyIndex::discover(&sample(), "nothing.here").unwrap_err();
        assert_eq!(
            err,
            DiscoveryError::NoTypesFound {
                namespace: "nothing.here".to_string()
            }
        );
        assert_eq!(
            TypeHierarchyIndex::discover(&sample(), "  ").unwrap_err(),
            DiscoveryError::EmptyNamespace
        );
    }

    #[test]
    fn malformed_graphs_are_rejected() {
        let unknown = manifest(json!([{"name": "ev.A", "supertype": "ev.Missing"}]));
        assert!(matches!(
            TypeHierarchyIndex::discover(&unknown, "ev"),
            Err(DiscoveryError::UnknownSupertype { .. })
        ));

        let duplicate = manifest(json!([{"name": "ev.A"}, {"name": "ev.A"}]));
        assert_eq!(
            TypeHierarchyIndex::discover(&duplicate, "ev").unwrap_err(),
            DiscoveryError::DuplicateType(name("ev.A"))
        );

        let cyclic = manifest(json!([
            {"name": "ev.A", "supertype": "ev.B"},
            {"name": "ev.B", "supertype": "ev.A"}
        ]));
        assert!(matches!(
            TypeHierarchyIndex::discover(&cyclic, "ev"),
            Err(DiscoveryError::Cycle(_))
        ));
    }
}
