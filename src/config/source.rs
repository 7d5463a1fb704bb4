//! The four precedence layers: defaults, file, environment, flags.
//!
//! Each loader produces a flat `HashMap<String, Value>` keyed by the
//! schema's dotted keys directly, rather than an intermediate nested-map
//! tree that gets flattened afterwards — the file loader flattens its
//! parsed JSON tree at load time, so "merge nested maps, then flatten to
//! dotted keys" collapses into one step without changing the outcome.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{CliError, CliErrorKind};
use crate::model::Value;
use crate::parser::ParseResult;

use super::schema::Schema;

pub fn defaults_source(schema: &Schema) -> HashMap<String, Value> {
    schema
        .fields
        .iter()
        .filter(|f| !f.ignored)
        .filter_map(|f| f.default.clone().map(|d| (f.key.clone(), d)))
        .collect()
}

/// Load a JSON config file, flattening its object tree into dotted keys.
/// Any other extension is an unsupported format — the caller (the
/// resolver) treats that as an omitted source rather than a hard failure.
pub fn file_source(path: &Path) -> Result<HashMap<String, Value>, CliError> {
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    if !is_json {
        return Err(CliError::new(
            CliErrorKind::Validation,
            format!("unsupported config file format: {}", path.display()),
        ));
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(
            CliErrorKind::Internal,
            format!("failed to read {}: {e}", path.display()),
        )
    })?;
    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        CliError::new(
            CliErrorKind::InvalidValue,
            format!("invalid JSON in {}: {e}", path.display()),
        )
    })?;
    let mut out = HashMap::new();
    flatten(&mut out, String::new(), &json);
    Ok(out)
}

fn flatten(out: &mut HashMap<String, Value>, prefix: String, value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let dotted = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(out, dotted, val);
            }
        }
        serde_json::Value::String(s) => {
            out.insert(prefix, Value::Str(s.clone()));
        }
        serde_json::Value::Bool(b) => {
            out.insert(prefix, Value::Bool(*b));
        }
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.insert(prefix, Value::Int(i));
            } else if let Some(f) = n.as_f64() {
                out.insert(prefix, Value::Float(f));
            }
        }
        serde_json::Value::Array(items) => {
            if items.iter().all(serde_json::Value::is_string) {
                out.insert(
                    prefix,
                    Value::StrSeq(items.iter().filter_map(|v| v.as_str().map(String::from)).collect()),
                );
            } else if items.iter().all(|v| v.is_i64() || v.is_u64()) {
                out.insert(
                    prefix,
                    Value::IntSeq(items.iter().filter_map(serde_json::Value::as_i64).collect()),
                );
            }
        }
        serde_json::Value::Null => {}
    }
}

/// Read each schema field's declared environment variable, parsing it
/// through the same per-kind conversion the argument parser uses.
/// Unset or unparsable variables are skipped rather than erroring — an
/// environment override that doesn't apply just doesn't contribute.
pub fn env_source(schema: &Schema) -> HashMap<String, Value> {
    let mut out = HashMap::new();
    for field in &schema.fields {
        if field.ignored {
            continue;
        }
        let Some(var) = &field.env else { continue };
        let Ok(raw) = std::env::var(var) else { continue };
        if let Ok(value) = crate::parser::convert::parse_for_kind(field.kind, &raw, &field.enum_values) {
            out.insert(field.key.clone(), value);
        }
    }
    out
}

/// Pull values the flag parser already resolved, skipping any flag whose
/// value equals its own declared default — a default-filled flag carries
/// no information about user intent, so it must not shadow a file/env
/// value lower in precedence.
pub fn flag_source(schema: &Schema, result: &ParseResult) -> HashMap<String, Value> {
    let mut out = HashMap::new();
    for field in &schema.fields {
        if field.ignored {
            continue;
        }
        let Some(flag_name) = &field.flag else { continue };
        let Some(value) = result.get(flag_name) else { continue };
        if Some(value) == field.default.as_ref() {
            continue;
        }
        out.insert(field.key.clone(), value.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Kind;
    use super::super::schema::FieldSchema;

    #[test]
    fn flattens_nested_json() {
        let dir = std::env::temp_dir().join(format!("ferrocli-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cfg.json");
        std::fs::write(&path, r#"{"database":{"url":"postgres://x","pool":4}}"#).unwrap();
        let loaded = file_source(&path).unwrap();
        assert_eq!(loaded.get("database.url"), Some(&Value::Str("postgres://x".into())));
        assert_eq!(loaded.get("database.pool"), Some(&Value::Int(4)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn non_json_extension_is_rejected() {
        let path = Path::new("/tmp/does-not-matter.toml");
        assert!(file_source(path).is_err());
    }

    #[test]
    fn flag_source_skips_default_equal_values() {
        let schema = Schema::new().field(
            FieldSchema::new("retries", Kind::Int)
                .flag("retries")
                .default_value(Value::Int(3)),
        );
        let mut result = ParseResult::empty();
        result.set("retries", Value::Int(3));
        assert!(flag_source(&schema, &result).is_empty());

        let mut changed = ParseResult::empty();
        changed.set("retries", Value::Int(9));
        assert_eq!(flag_source(&schema, &changed).get("retries"), Some(&Value::Int(9)));
    }
}
