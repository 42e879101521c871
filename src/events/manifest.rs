//! Static event-type manifest.
//!
//! Event types cannot be discovered by reflecting over a loaded runtime, so
//! the host library ships a manifest (`data/events.json`) listing every event
//! type, its direct supertype, its extracted description text and any
//! structured requirement annotations. The manifest is schema-checked before
//! deserialization.

use crate::schema_loader::validate_document;
use crate::taxonomy::{EventTypeName, MemberName};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const EVENT_MANIFEST_SCHEMA_VERSION: &str = "reqcheck_events_v1";
pub const EVENT_MANIFEST_SCHEMA_FILE: &str = "event_manifest.schema.json";

#[derive(Clone, Debug, Deserialize)]
pub struct EventManifest {
    pub schema_version: String,
    /// Default namespace root scanned when the caller does not pick one.
    pub namespace: String,
    pub events: Vec<EventEntry>,
}

#[derive(Clone, Debug, Deserialize)]
/// One declared event type.
pub struct EventEntry {
    pub name: EventTypeName,
    #[serde(default)]
    pub supertype: Option<EventTypeName>,
    /// Description text as already extracted by the host's documentation
    /// model. Absent means the type is undocumented.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required_permissions: RequiredPermissions,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
/// Structured permission annotation attached to an event type.
pub struct RequiredPermissions {
    /// Permissions the event needs to fire at all.
    #[serde(default)]
    pub always: Vec<MemberName>,
    /// Permissions needed only for some accessors or under some conditions.
    #[serde(default)]
    pub sometimes: Vec<MemberName>,
}

impl EventManifest {
    /// Load and schema-check a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let value = validate_document(
            path,
            EVENT_MANIFEST_SCHEMA_FILE,
            EVENT_MANIFEST_SCHEMA_VERSION,
        )?;
        serde_json::from_value(value).with_context(|| format!("loading {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entries_default_optional_fields() {
        let manifest: EventManifest = serde_json::from_value(json!({
            "schema_version": EVENT_MANIFEST_SCHEMA_VERSION,
            "namespace": "gateway.events",
            "events": [
                {"name": "gateway.events.GenericEvent"},
                {
                    "name": "gateway.events.guild.GuildBanEvent",
                    "supertype": "gateway.events.GenericEvent",
                    "description": "Requires {@link Permission#BAN_MEMBERS}.",
                    "required_permissions": {"always": ["BAN_MEMBERS"]}
                }
            ]
        }))
        .expect("manifest parses");

        let root = &manifest.events[0];
        assert!(root.supertype.is_none());
        assert!(root.description.is_none());
        assert_eq!(root.required_permissions, RequiredPermissions::default());

        let ban = &manifest.events[1];
        assert_eq!(
            ban.supertype.as_ref().map(|s| s.0.as_str()),
            Some("gateway.events.GenericEvent")
        );
        assert_eq!(ban.required_permissions.always, vec![MemberName::new("BAN_MEMBERS")]);
        assert!(ban.required_permissions.sometimes.is_empty());
    }
}
