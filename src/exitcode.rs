//! Exit-code mapper.
//!
//! Holds the four mapping tables and resolves any error value
//! to a final process exit code through the documented priority chain:
//! explicit [`ExitError`] first, then a registered CLI-category code, then a
//! registered concrete-error-type code (via downcast), then the `general`
//! default.

use std::any::TypeId;
use std::collections::HashMap;

use crate::error::{CliError, CliErrorKind};

/// An error that pins its own exit code, bypassing every other table.
#[derive(Debug, Clone)]
pub struct ExitError {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitError {
    pub fn new(code: i32) -> Self {
        ExitError {
            code,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl std::fmt::Display for ExitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(m) => write!(f, "{m} (exit code {})", self.code),
            None => write!(f, "exit code {}", self.code),
        }
    }
}

impl std::error::Error for ExitError {}

/// The default codes, always present, overridable per instance.
#[derive(Debug, Clone, Copy)]
pub struct DefaultCodes {
    pub success: i32,
    pub general: i32,
    pub misusage: i32,
    pub validation: i32,
    pub not_found: i32,
    pub permission: i32,
}

impl Default for DefaultCodes {
    fn default() -> Self {
        DefaultCodes {
            success: 0,
            general: 1,
            misusage: 2,
            validation: 3,
            not_found: 127,
            permission: 126,
        }
    }
}

/// A concrete-error-type code registration: tests type identity via
/// downcast, in declaration order, first match wins.
struct TypeRule {
    type_id: TypeId,
    name: &'static str,
    code: i32,
    downcast: Box<dyn Fn(&(dyn std::error::Error + 'static)) -> bool + Send + Sync>,
}

/// Resolves any error to a process exit code.
pub struct ExitCodeMapper {
    /// Named overrides, documentary only — not consulted during resolution,
    /// but kept so callers can introspect "what does code N mean here".
    named: HashMap<i32, &'static str>,
    categories: HashMap<CliErrorKind, i32>,
    types: Vec<TypeRule>,
    defaults: DefaultCodes,
}

impl Default for ExitCodeMapper {
    fn default() -> Self {
        let mut categories = HashMap::new();
        let defaults = DefaultCodes::default();
        categories.insert(CliErrorKind::FlagGroupViolation, defaults.misusage);
        categories.insert(CliErrorKind::UnknownFlag, defaults.misusage);
        categories.insert(CliErrorKind::UnknownCommand, defaults.misusage);
        categories.insert(CliErrorKind::MissingValue, defaults.misusage);
        categories.insert(CliErrorKind::MissingRequired, defaults.misusage);
        categories.insert(CliErrorKind::InvalidArgument, defaults.misusage);
        categories.insert(CliErrorKind::InvalidValue, defaults.validation);
        categories.insert(CliErrorKind::Validation, defaults.validation);
        categories.insert(CliErrorKind::Permission, defaults.permission);
        ExitCodeMapper {
            named: HashMap::new(),
            categories,
            types: Vec::new(),
            defaults,
        }
    }
}

impl ExitCodeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name_code(mut self, code: i32, name: &'static str) -> Self {
        self.named.insert(code, name);
        self
    }

    #[must_use]
    pub fn with_category(mut self, kind: CliErrorKind, code: i32) -> Self {
        self.categories.insert(kind, code);
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: DefaultCodes) -> Self {
        self.defaults = defaults;
        self
    }

    /// Register a concrete error type and the code it should map to. Tested
    /// in declaration order; the first type that downcasts successfully
    /// wins.
    #[must_use]
    pub fn with_type<T: std::error::Error + 'static>(mut self, code: i32) -> Self {
        self.types.push(TypeRule {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            code,
            downcast: Box::new(|e| e.downcast_ref::<T>().is_some()),
        });
        self
    }

    pub fn name_of(&self, code: i32) -> Option<&'static str> {
        self.named.get(&code).copied()
    }

    /// Resolve an optional error to a final exit code.
    ///
    /// Priority: explicit [`ExitError`] → CLI-category code → first matching
    /// concrete-type code → `general` → (`success` if there was no error at
    /// all).
    pub fn resolve(&self, error: Option<&(dyn std::error::Error + 'static)>) -> i32 {
        let Some(err) = error else {
            return self.defaults.success;
        };

        if let Some(exit) = err.downcast_ref::<ExitError>() {
            return exit.code;
        }

        if let Some(cli) = err.downcast_ref::<CliError>() {
            if let Some(code) = self.categories.get(&cli.kind) {
                return *code;
            }
            return self.defaults.general;
        }

        for rule in &self.types {
            if (rule.downcast)(err) {
                log::debug!(
                    "exit code mapper: matched concrete type {} -> {}",
                    rule.name,
                    rule.code
                );
                let _ = rule.type_id; // kept for potential future fast-path dedup
                return rule.code;
            }
        }

        self.defaults.general
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct BoomError;
    impl std::fmt::Display for BoomError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("boom")
        }
    }
    impl std::error::Error for BoomError {}

    #[test]
    fn no_error_is_success() {
        let mapper = ExitCodeMapper::new();
        assert_eq!(mapper.resolve(None), 0);
    }

    #[test]
    fn exit_error_wins_over_everything() {
        let mapper = ExitCodeMapper::new()
            .with_category(CliErrorKind::Validation, 3)
            .with_type::<BoomError>(9);
        let err = ExitError::new(42);
        assert_eq!(mapper.resolve(Some(&err)), 42);
    }

    #[test]
    fn category_code_wins_over_concrete_type() {
        let mapper = ExitCodeMapper::new().with_category(CliErrorKind::Validation, 3);
        let err = CliError::new(CliErrorKind::Validation, "bad value");
        assert_eq!(mapper.resolve(Some(&err)), 3);
    }

    #[test]
    fn concrete_type_used_when_not_a_cli_error() {
        let mapper = ExitCodeMapper::new().with_type::<BoomError>(9);
        let err = BoomError;
        assert_eq!(mapper.resolve(Some(&err)), 9);
    }

    #[test]
    fn unregistered_error_falls_back_to_general() {
        let mapper = ExitCodeMapper::new();
        let err = BoomError;
        assert_eq!(mapper.resolve(Some(&err)), 1);
    }

    #[test]
    fn cli_error_without_category_falls_back_to_general() {
        let mapper = ExitCodeMapper::new().with_category(CliErrorKind::Validation, 3);
        let err = CliError::new(CliErrorKind::Internal, "oops");
        assert_eq!(mapper.resolve(Some(&err)), 1);
    }
}
