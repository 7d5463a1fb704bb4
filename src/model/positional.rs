//! Positional argument declaration.

use crate::model::value::Kind;

#[derive(Debug, Clone)]
pub struct PositionalArgument {
    pub name: String,
    pub description: Option<String>,
    pub kind: Kind,
    pub position: usize,
    pub default: Option<crate::model::value::Value>,
    pub required: bool,
    pub variadic: bool,
    pub validator: Option<std::sync::Arc<dyn Fn(&crate::model::value::Value) -> Result<(), String> + Send + Sync>>,
}

impl PositionalArgument {
    pub fn new(name: impl Into<String>, kind: Kind, position: usize) -> Self {
        assert!(
            kind.valid_for_positional(),
            "enum kind is not valid for positional arguments"
        );
        PositionalArgument {
            name: name.into(),
            description: None,
            kind,
            position,
            default: None,
            required: false,
            variadic: false,
            validator: None,
        }
    }

    #[must_use]
    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: crate::model::value::Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark this positional as variadic. Only legal on a sequence kind, and
    /// only legal as the final descriptor of its owner — both invariants
    /// are enforced by [`crate::model::command::validate_positionals`] at
    /// build time, not here, since this descriptor doesn't know its
    /// siblings yet.
    #[must_use]
    pub fn variadic(mut self) -> Self {
        assert!(
            self.kind.is_sequence(),
            "variadic positional must use a sequence kind"
        );
        self.variadic = true;
        self
    }

    #[must_use]
    pub fn validator(
        mut self,
        f: impl Fn(&crate::model::value::Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(std::sync::Arc::new(f));
        self
    }
}
