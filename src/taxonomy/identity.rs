use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Fully-qualified name of an event type (e.g., `gateway.events.guild.GuildBanEvent`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventTypeName(pub String);

impl EventTypeName {
    /// Last dotted segment, used for compact diagnostics.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Whether the name sits at or below `namespace`.
    pub fn is_within(&self, namespace: &str) -> bool {
        self.0 == namespace
            || self
                .0
                .strip_prefix(namespace)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl fmt::Display for EventTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier for one member of a taxonomy (e.g., `MEMBER_OVERRIDES`).
///
/// The same text is used by the derivation function and by documentation
/// cross-references, which is what makes the two comparable.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberName(pub String);

impl MemberName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of members within a single taxonomy.
pub type MemberSet = BTreeSet<MemberName>;

/// Render a member set as `{A, B}` for diagnostics.
pub fn format_members(members: &MemberSet) -> String {
    let joined = members
        .iter()
        .map(|member| member.0.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{joined}}}")
}

/// Capability domain an event can depend on.
///
/// Exactly three taxonomies exist; unlike free-form identifiers an unknown key
/// is rejected at deserialization time so configuration typos cannot silently
/// create a fourth, unchecked domain.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Taxonomy {
    Intents,
    CacheFlags,
    Permissions,
}

impl Taxonomy {
    pub const ALL: [Taxonomy; 3] = [Taxonomy::Intents, Taxonomy::CacheFlags, Taxonomy::Permissions];

    pub fn as_str(self) -> &'static str {
        match self {
            Taxonomy::Intents => "intents",
            Taxonomy::CacheFlags => "cache_flags",
            Taxonomy::Permissions => "permissions",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "intents" => Some(Taxonomy::Intents),
            "cache_flags" => Some(Taxonomy::CacheFlags),
            "permissions" => Some(Taxonomy::Permissions),
            _ => None,
        }
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Taxonomy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Taxonomy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown taxonomy '{value}', expected one of intents, cache_flags, permissions"
            ))
        })
    }
}
