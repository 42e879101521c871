//! Documentation-consistency verification for event capability requirements.
//!
//! Every event type documents, in its description, which gateway intents,
//! cache flags and permissions it needs. The library derives those
//! requirements independently through a [`DerivationOracle`] and reports every
//! place where the two disagree, including subtypes that forget members their
//! ancestors document.
//!
//! Inputs are three JSON documents under `data/`: the event manifest, the
//! taxonomy catalog and the check configuration. The helpers here locate them
//! the same way whether the binary runs from a checkout, from `target/`, or
//! from a test.

use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod checker;
pub mod config;
pub mod coverage;
pub mod doc_references;
pub mod events;
pub mod registry;
pub mod report;
mod schema_loader;
pub mod taxonomy;
pub mod verify;

pub use checker::{CheckResults, ConsistencyChecker, Failure};
pub use config::{CheckConfig, ExceptionEntry, InheritanceExemption};
pub use coverage::{CoverageEntry, CoverageMap, build_member_coverage_map, undocumented_members};
pub use doc_references::{
    DocumentationExtractor, DocumentedRequirements, Extraction, ReferenceResolutionError,
    inline_links,
};
pub use events::{DiscoveryError, EventEntry, EventManifest, EventType, TypeHierarchyIndex};
pub use registry::{CatalogDerivation, DerivationOracle, RequirementRegistry, SetupError};
pub use report::Report;
pub use taxonomy::{
    EventTypeName, MemberName, MemberSet, RequirementSet, Taxonomy, TaxonomyIndex,
};
pub use verify::{member_coverage, verify};

const ROOT_SENTINEL: &str = "data/taxonomies.json";
const CARGO_MANIFEST: &str = "Cargo.toml";

pub const DEFAULT_MANIFEST: &str = "data/events.json";
pub const DEFAULT_TAXONOMIES: &str = "data/taxonomies.json";
pub const DEFAULT_CONFIG: &str = "data/reqcheck.json";

fn is_repo_root(candidate: &Path) -> bool {
    candidate.join(ROOT_SENTINEL).is_file() && candidate.join(CARGO_MANIFEST).is_file()
}

fn repo_root_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !is_repo_root(&hint_path) {
        return None;
    }
    fs::canonicalize(hint_path).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_repo_root(&dir) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the repository root holding `data/`.
///
/// Honors `REQCHECK_ROOT` when it points at a real root, then climbs up from
/// the working directory and from the executable, then uses the build-time
/// hint.
pub fn find_repo_root() -> Result<PathBuf> {
    if let Ok(env_root) = env::var("REQCHECK_ROOT") {
        if let Some(root) = repo_root_from_hint(&env_root) {
            return Ok(root);
        }
    }

    if let Ok(cwd) = env::current_dir() {
        if let Some(root) = search_upwards(&cwd) {
            return Ok(root);
        }
    }

    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            if let Some(root) = search_upwards(exe_dir) {
                return Ok(root);
            }
        }
    }

    if let Some(hint) = option_env!("REQCHECK_ROOT_HINT") {
        if let Some(root) = repo_root_from_hint(hint) {
            return Ok(root);
        }
    }

    bail!("Unable to locate the reqcheck data directory. Set REQCHECK_ROOT to the repository root.");
}

/// Pick an input path: explicit override, then `env_var`, then `default`
/// relative to the repository root.
fn resolve_input_path(explicit: Option<&Path>, env_var: &str, default: &str) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(value) = env::var_os(env_var).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(value));
    }
    Ok(find_repo_root()?.join(default))
}

pub fn resolve_manifest_path(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_input_path(explicit, "REQCHECK_MANIFEST", DEFAULT_MANIFEST)
}

pub fn resolve_taxonomies_path(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_input_path(explicit, "REQCHECK_TAXONOMIES", DEFAULT_TAXONOMIES)
}

pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_input_path(explicit, "REQCHECK_CONFIG", DEFAULT_CONFIG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_paths_win_over_everything() {
        let path = Path::new("/tmp/custom/events.json");
        assert_eq!(resolve_manifest_path(Some(path)).unwrap(), path);
    }

    #[test]
    fn repo_root_requires_both_sentinels() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join(ROOT_SENTINEL), "{}").unwrap();
        assert!(!is_repo_root(dir.path()));
        assert!(repo_root_from_hint(&dir.path().to_string_lossy()).is_none());

        fs::write(dir.path().join(CARGO_MANIFEST), "").unwrap();
        assert!(is_repo_root(dir.path()));

        let nested = dir.path().join("data");
        let found = search_upwards(&nested).unwrap();
        assert_eq!(found, fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn crate_checkout_is_a_repo_root() {
        assert!(is_repo_root(Path::new(env!("CARGO_MANIFEST_DIR"))));
    }
}
