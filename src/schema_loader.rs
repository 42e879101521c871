//! Shared JSON Schema loader for the input documents.
//!
//! The event manifest, the taxonomy catalog and the check configuration are
//! each validated against a schema under `schema/` before being deserialized.
//! Schemas pin their `schema_version` through a `const`; the loader enforces
//! that the pinned version is one the crate understands and that the document
//! declares the same version.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Result of loading and compiling a JSON Schema.
pub(crate) struct SchemaLoadResult {
    pub schema_version: String,
    pub compiled: JSONSchema,
}

/// Controls how schemas are checked before compilation.
pub(crate) struct SchemaLoadOptions<'a> {
    /// Where to find the schema_version const inside the schema payload.
    pub schema_version_pointer: &'a str,
    /// Allowed schema_version values; enforced when present.
    pub allowed_versions: Option<&'a BTreeSet<String>>,
}

impl Default for SchemaLoadOptions<'_> {
    fn default() -> Self {
        Self {
            schema_version_pointer: "/properties/schema_version/const",
            allowed_versions: None,
        }
    }
}

pub(crate) fn load_json_schema(
    path: &Path,
    options: SchemaLoadOptions<'_>,
) -> Result<SchemaLoadResult> {
    let schema_value = read_json(path).with_context(|| format!("loading schema {}", path.display()))?;

    let schema_version = extract_schema_version(&schema_value, options.schema_version_pointer)
        .ok_or_else(|| anyhow!("schema {} missing schema_version const", path.display()))?;

    if let Some(allowed) = options.allowed_versions {
        if !allowed.contains(&schema_version) {
            bail!(
                "schema_version '{}' not in allowed set {:?}",
                schema_version,
                allowed
            );
        }
    }

    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|err| anyhow!("compiling schema {}: {err}", path.display()))?;

    Ok(SchemaLoadResult {
        schema_version,
        compiled,
    })
}

/// Validate a JSON document against `schema_file` and return the parsed value.
///
/// Every validation error is reported at once so a broken document can be
/// fixed in a single pass.
pub(crate) fn validate_document(
    document_path: &Path,
    schema_file: &str,
    expected_version: &str,
) -> Result<Value> {
    let document = read_json(document_path)?;

    let schema_path = resolve_schema_path(document_path, schema_file);
    let allowed = BTreeSet::from_iter([expected_version.to_string()]);
    let schema = load_json_schema(
        &schema_path,
        SchemaLoadOptions {
            allowed_versions: Some(&allowed),
            ..Default::default()
        },
    )?;

    let declared = document
        .get("schema_version")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if declared != schema.schema_version {
        bail!(
            "{} declares schema_version '{}', expected '{}'",
            document_path.display(),
            declared,
            schema.schema_version
        );
    }

    if let Err(errors) = schema.compiled.validate(&document) {
        let details = errors
            .map(|err| format!("{}: {err}", err.instance_path))
            .collect::<Vec<_>>()
            .join("\n");
        bail!(
            "{} failed schema validation against {}:\n{}",
            document_path.display(),
            schema_path.display(),
            details
        );
    }
    Ok(document)
}

/// Locate `schema_file` next to the document's data directory, falling back to
/// the schemas shipped with the crate.
pub(crate) fn resolve_schema_path(document_path: &Path, schema_file: &str) -> PathBuf {
    if let Some(base) = document_path.parent().and_then(|p| p.parent()) {
        let candidate = base.join("schema").join(schema_file);
        if candidate.exists() {
            return candidate;
        }
    }

    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("schema")
        .join(schema_file)
}

fn read_json(path: &Path) -> Result<Value> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

fn extract_schema_version(schema: &Value, pointer: &str) -> Option<String> {
    let version = schema.pointer(pointer).and_then(Value::as_str)?;
    if version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
        path
    }

    fn sample_schema() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "required": ["schema_version", "items"],
            "properties": {
                "schema_version": {"type": "string", "const": "sample_v1"},
                "items": {"type": "array", "items": {"type": "string"}}
            }
        })
    }

    #[test]
    fn validate_document_accepts_matching_document() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "schema/sample.schema.json", &sample_schema());
        let doc = write(
            temp.path(),
            "data/sample.json",
            &json!({"schema_version": "sample_v1", "items": ["a"]}),
        );

        let value = validate_document(&doc, "sample.schema.json", "sample_v1").unwrap();
        assert_eq!(value["items"][0], "a");
    }

    #[test]
    fn validate_document_reports_schema_errors() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "schema/sample.schema.json", &sample_schema());
        let doc = write(
            temp.path(),
            "data/sample.json",
            &json!({"schema_version": "sample_v1", "items": [1]}),
        );

        let err = validate_document(&doc, "sample.schema.json", "sample_v1").unwrap_err();
        assert!(
            err.to_string().contains("failed schema validation"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn validate_document_rejects_unexpected_versions() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "schema/sample.schema.json", &sample_schema());
        let doc = write(
            temp.path(),
            "data/sample.json",
            &json!({"schema_version": "sample_v2", "items": []}),
        );

        let err = validate_document(&doc, "sample.schema.json", "sample_v1").unwrap_err();
        assert!(err.to_string().contains("expected 'sample_v1'"));

        let err = validate_document(&doc, "sample.schema.json", "sample_v2").unwrap_err();
        assert!(err.to_string().contains("not in allowed set"));
    }
}
