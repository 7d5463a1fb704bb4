//! Flag declaration. A small builder struct accumulates name/help/etc,
//! then `build()` (here, implicit — [`Flag`] is constructed directly and
//! registered) freezes it into the registry.

use crate::intern::Sym;
use crate::model::value::Kind;

/// A named optional value attached to an application or a specific command.
///
/// Constructed with [`Flag::new`] then customized with the `with_*`
/// builder methods, mirroring `bpaf`'s `short(..).long(..).help(..)` chain
/// but as methods on the value itself rather than free functions, since the
/// registry (not a combinator) owns these afterwards.
#[derive(Debug, Clone)]
pub struct Flag {
    pub name: Sym,
    pub description: Option<String>,
    pub kind: Kind,
    pub default: Option<crate::model::value::Value>,
    pub global: bool,
    pub required: bool,
    pub hidden: bool,
    pub short: Option<Sym>,
    pub env: Vec<String>,
    pub enum_values: Vec<String>,
    pub validator: Option<std::sync::Arc<dyn Fn(&crate::model::value::Value) -> Result<(), String> + Send + Sync>>,
}

impl Flag {
    pub fn new(name: &str, kind: Kind) -> Self {
        Flag {
            name: crate::intern::global().intern(name),
            description: None,
            kind,
            default: None,
            global: false,
            required: false,
            hidden: false,
            short: None,
            env: Vec::new(),
            enum_values: Vec::new(),
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
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Claim a single-character short code. The code
    /// must come from the byte-interned small-string table so lookup stays
    /// allocation-free — `intern_byte` guarantees that for any ASCII
    /// alphanumeric character.
    #[must_use]
    pub fn short(mut self, c: char) -> Self {
        let mut buf = [0u8; 4];
        let s = c.encode_utf8(&mut buf);
        self.short = Some(crate::intern::global().intern_byte(s.as_bytes()[0]));
        self
    }

    /// Add an environment-variable binding. Bindings are tried in
    /// declaration order at finalisation; first non-empty wins.
    #[must_use]
    pub fn env(mut self, name: impl Into<String>) -> Self {
        self.env.push(name.into());
        self
    }

    #[must_use]
    pub fn enum_values<I: IntoIterator<Item = S>, S: Into<String>>(mut self, values: I) -> Self {
        self.enum_values = values.into_iter().map(Into::into).collect();
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_code_interns_to_a_single_byte() {
        let flag = Flag::new("verbose", Kind::Bool).short('v');
        assert_eq!(flag.short.unwrap().as_str(), "v");
    }

    #[test]
    fn builder_chain_sets_every_field() {
        let flag = Flag::new("env", Kind::Enum)
            .help("deployment environment")
            .enum_values(["dev", "staging", "prod"])
            .default_value(crate::model::value::Value::Enum("prod".into()))
            .required();
        assert_eq!(flag.description.as_deref(), Some("deployment environment"));
        assert_eq!(flag.enum_values, vec!["dev", "staging", "prod"]);
        assert!(flag.required);
    }
}
