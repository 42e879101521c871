//! Event-type universe: the static manifest and the hierarchy built from it.

pub mod hierarchy;
pub mod manifest;

pub use hierarchy::{DiscoveryError, EventType, TypeHierarchyIndex};
pub use manifest::{EVENT_MANIFEST_SCHEMA_VERSION, EventEntry, EventManifest, RequiredPermissions};
