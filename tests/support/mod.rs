use anyhow::{Context, Result};
use reqcheck::find_repo_root;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub fn repo_root() -> PathBuf {
    find_repo_root().expect("tests require repository root")
}

pub fn reqcheck_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_reqcheck"))
}

/// Run a command and capture its output without judging the exit status.
pub fn run_command(mut cmd: Command) -> Result<Output> {
    cmd.output()
        .with_context(|| format!("failed to run command: {:?}", cmd))
}

/// Taxonomy catalog used by fixtures. Reference names are kept short so
/// descriptions read like `Intent#GUILD_MEMBERS`.
pub fn fixture_taxonomies() -> Value {
    json!({
        "schema_version": "reqcheck_taxonomies_v1",
        "taxonomies": [
            {"key": "intents", "reference_name": "Intent", "members": [
                {"name": "GUILD_MEMBERS", "events": ["fx.MemberEvent"]},
                {"name": "GUILD_MESSAGES"}
            ]},
            {"key": "cache_flags", "reference_name": "CacheFlag", "members": [
                {"name": "MEMBER_OVERRIDES"},
                {"name": "VOICE_STATE"}
            ]},
            {"key": "permissions", "reference_name": "Permission", "members": [
                {"name": "BAN_MEMBERS"}
            ]}
        ]
    })
}

pub fn fixture_manifest(events: Value) -> Value {
    json!({
        "schema_version": "reqcheck_events_v1",
        "namespace": "fx",
        "events": events
    })
}

pub fn fixture_config(tables: Value) -> Value {
    let mut config = json!({"schema_version": "reqcheck_config_v1"});
    if let (Some(target), Value::Object(extra)) = (config.as_object_mut(), tables) {
        target.extend(extra);
    }
    config
}

/// Temporary `data/` directory holding the three input documents.
///
/// Schemas resolve to the ones shipped with the crate since the fixture has no
/// `schema/` directory of its own.
pub struct DataFixture {
    dir: TempDir,
}

impl DataFixture {
    pub fn new(manifest: &Value, taxonomies: &Value, config: &Value) -> Result<Self> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("data"))?;
        let fixture = Self { dir };
        fixture.write("events.json", manifest)?;
        fixture.write("taxonomies.json", taxonomies)?;
        fixture.write("reqcheck.json", config)?;
        Ok(fixture)
    }

    pub fn write(&self, name: &str, value: &Value) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, serde_json::to_vec_pretty(value)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join("data").join(name)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// `reqcheck` invocation pointed at this fixture's documents.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(reqcheck_binary());
        cmd.arg("--manifest")
            .arg(self.path("events.json"))
            .arg("--taxonomies")
            .arg(self.path("taxonomies.json"))
            .arg("--config")
            .arg(self.path("reqcheck.json"))
            .env_remove("REQCHECK_NAMESPACE")
            .env("RUST_LOG", "warn");
        cmd
    }
}
