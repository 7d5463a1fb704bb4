//! Priority merge and validation: defaults < file < environment <
//! flags, followed by required-key and enum-membership checks.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{CliError, CliErrorKind};
use crate::model::{Kind, Value};
use crate::parser::ParseResult;

use super::schema::Schema;
use super::source;

/// The merged, validated configuration. Read-only: look values up by
/// their dotted schema key, or bind the whole thing into a target type
/// that implements [`Bind`].
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    values: HashMap<String, Value>,
}

impl ResolvedConfig {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Reflect-set each resolved key onto `target`. Rust has no runtime
    /// reflection, so the target opts in by implementing [`Bind`] itself —
    /// the explicit-descriptor equivalent of reflective field-by-field
    /// assignment.
    pub fn bind_into(&self, target: &mut impl Bind) -> Result<(), CliError> {
        for (key, value) in &self.values {
            target.bind(key, value).map_err(|message| {
                CliError::new(CliErrorKind::Validation, message).with_flag(key.clone())
            })?;
        }
        Ok(())
    }
}

/// Implemented by a configuration target record to receive resolved
/// values by dotted key.
pub trait Bind {
    fn bind(&mut self, key: &str, value: &Value) -> Result<(), String>;
}

/// Resolve `schema` against all four sources. `config_file`, if given,
/// is read as JSON; an unreadable or non-JSON file degrades to an empty
/// source (logged, not propagated) rather than failing the whole
/// resolution.
pub fn resolve(
    schema: &Schema,
    config_file: Option<&Path>,
    parse_result: &ParseResult,
) -> Result<ResolvedConfig, CliError> {
    let defaults = source::defaults_source(schema);
    let file = match config_file {
        Some(path) => match source::file_source(path) {
            Ok(map) => map,
            Err(err) => {
                log::warn!("config file {} omitted from resolution: {err}", path.display());
                HashMap::new()
            }
        },
        None => HashMap::new(),
    };
    let env = source::env_source(schema);
    let flags = source::flag_source(schema, parse_result);

    let mut merged = defaults;
    merged.extend(file);
    merged.extend(env);
    merged.extend(flags);

    for field in &schema.fields {
        if field.ignored {
            continue;
        }
        if !merged.contains_key(&field.key) {
            if let Some(default) = &field.default {
                merged.insert(field.key.clone(), default.clone());
            } else if field.required {
                return Err(CliError::new(
                    CliErrorKind::MissingRequired,
                    format!("config key {:?} is required but was not supplied", field.key),
                )
                .with_flag(field.key.clone()));
            }
            continue;
        }

        // An enum field with no declared enum_values accepts whatever the
        // source produced without a membership check — it behaves like a
        // plain string for collection purposes.
        if field.kind == Kind::Enum && !field.enum_values.is_empty() {
            if let Some(value) = merged.get(&field.key) {
                if let Some(s) = value.as_str() {
                    if !field.enum_values.iter().any(|v| v == s) {
                        return Err(CliError::new(
                            CliErrorKind::InvalidValue,
                            format!("{s:?} is not a valid value for {:?}", field.key),
                        )
                        .with_flag(field.key.clone()));
                    }
                }
            }
        }
    }

    Ok(ResolvedConfig { values: merged })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::FieldSchema;

    fn schema() -> Schema {
        Schema::new()
            .field(
                FieldSchema::new("retries", Kind::Int)
                    .env("APP_RETRIES")
                    .flag("retries")
                    .default_value(Value::Int(3)),
            )
            .field(FieldSchema::new("name", Kind::String).required())
            .field(
                FieldSchema::new("mode", Kind::Enum)
                    .enum_values(["fast", "slow"])
                    .default_value(Value::Enum("fast".into())),
            )
    }

    #[test]
    fn missing_required_field_errors() {
        let result = ParseResult::empty();
        let err = resolve(&schema(), None, &result).unwrap_err();
        assert_eq!(err.kind, CliErrorKind::MissingRequired);
    }

    #[test]
    fn default_fills_missing_optional_field() {
        let mut schema = schema();
        schema.fields.retain(|f| f.key != "name");
        let result = ParseResult::empty();
        let resolved = resolve(&schema, None, &result).unwrap();
        assert_eq!(resolved.get("retries"), Some(&Value::Int(3)));
    }

    #[test]
    fn flags_take_precedence_over_defaults() {
        let mut schema = schema();
        schema.fields.retain(|f| f.key != "name");
        let mut result = ParseResult::empty();
        result.set("retries", Value::Int(9));
        let resolved = resolve(&schema, None, &result).unwrap();
        assert_eq!(resolved.get("retries"), Some(&Value::Int(9)));
    }

    #[test]
    fn invalid_enum_value_is_rejected() {
        let mut schema = schema();
        schema.fields.retain(|f| f.key != "name");
        for field in &mut schema.fields {
            if field.key == "mode" {
                field.default = Some(Value::Enum("bogus".into()));
            }
        }
        let result = ParseResult::empty();
        let err = resolve(&schema, None, &result).unwrap_err();
        assert_eq!(err.kind, CliErrorKind::InvalidValue);
    }

    #[test]
    fn unreadable_file_is_silently_omitted_not_fatal() {
        let mut schema = schema();
        schema.fields.retain(|f| f.key != "name");
        let result = ParseResult::empty();
        let resolved = resolve(&schema, Some(Path::new("/nonexistent/path.json")), &result).unwrap();
        assert_eq!(resolved.get("retries"), Some(&Value::Int(3)));
    }
}
