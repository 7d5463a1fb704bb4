//! Declarative schema descriptors.
//!
//! Rust has no runtime reflection, so a schema can't be derived by
//! walking a target record's field attributes automatically. Instead it
//! is built explicitly, field by field, with nesting expressed by
//! prefixing a sub-schema's keys rather than by recursing into a
//! record's fields automatically.

use crate::model::{Kind, Value};

/// One resolvable configuration key.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    /// The dotted key this field resolves under, e.g. `"database.url"`.
    pub key: String,
    pub kind: Kind,
    pub env: Option<String>,
    pub flag: Option<String>,
    pub default: Option<Value>,
    pub enum_values: Vec<String>,
    pub group: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub ignored: bool,
}

impl FieldSchema {
    pub fn new(key: impl Into<String>, kind: Kind) -> Self {
        FieldSchema {
            key: key.into(),
            kind,
            env: None,
            flag: None,
            default: None,
            enum_values: Vec::new(),
            group: None,
            description: None,
            required: false,
            ignored: false,
        }
    }

    #[must_use]
    pub fn env(mut self, name: impl Into<String>) -> Self {
        self.env = Some(name.into());
        self
    }

    #[must_use]
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.flag = Some(name.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn enum_values<I: IntoIterator<Item = S>, S: Into<String>>(mut self, values: I) -> Self {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn group(mut self, name: impl Into<String>) -> Self {
        self.group = Some(name.into());
        self
    }

    #[must_use]
    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }
}

/// A flat list of field descriptors. Built once per target record type,
/// reused across resolutions.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    #[must_use]
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Splice another schema's fields in under `prefix`, dotting their
    /// keys — the explicit-descriptor equivalent of "a nested record
    /// receives an implicit group derived from the field name."
    #[must_use]
    pub fn nested(mut self, prefix: &str, other: Schema) -> Self {
        for mut field in other.fields {
            field.key = format!("{prefix}.{}", field.key);
            self.fields.push(field);
        }
        self
    }
}
