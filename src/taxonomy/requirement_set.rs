use crate::taxonomy::identity::{MemberName, MemberSet, Taxonomy};
use serde::Serialize;
use std::collections::BTreeMap;

/// Required members per taxonomy.
///
/// A taxonomy with no entry reads as the empty set; comparisons only ever
/// happen within one taxonomy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RequirementSet {
    by_taxonomy: BTreeMap<Taxonomy, MemberSet>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Members required for `taxonomy`, empty when nothing was recorded.
    pub fn get(&self, taxonomy: Taxonomy) -> &MemberSet {
        static EMPTY: MemberSet = MemberSet::new();
        self.by_taxonomy.get(&taxonomy).unwrap_or(&EMPTY)
    }

    /// Whether an entry (possibly empty) exists for `taxonomy`.
    pub fn contains(&self, taxonomy: Taxonomy) -> bool {
        self.by_taxonomy.contains_key(&taxonomy)
    }

    /// Record the full member set for `taxonomy`, replacing any previous one.
    pub fn set(&mut self, taxonomy: Taxonomy, members: MemberSet) {
        self.by_taxonomy.insert(taxonomy, members);
    }

    pub fn insert(&mut self, taxonomy: Taxonomy, member: MemberName) {
        self.by_taxonomy.entry(taxonomy).or_default().insert(member);
    }

    pub fn taxonomies(&self) -> impl Iterator<Item = Taxonomy> + '_ {
        self.by_taxonomy.keys().copied()
    }
}
