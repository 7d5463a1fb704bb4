//! Error taxonomy.
//!
//! Splits the concerns: a plain [`CliErrorKind`] carries the
//! structural fact of what went wrong, [`CliError`] adds the context keys
//! the dispatcher attaches on the way out (`flag`, `command`, `group`,
//! `suggestion`), and [`Outcome`] keeps the "please exit 0 but don't run an
//! action" sentinels (`help-shown`, `version-shown`) out of the error type
//! entirely so they can never be mistaken for a failure.

use std::fmt;

/// A single kind from the error taxonomy. Each corresponds to one
/// decision point in the parser, group validator or precedence resolver,
/// not to a distinct Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CliErrorKind {
    UnknownFlag,
    UnknownCommand,
    InvalidFlag,
    InvalidValue,
    MissingValue,
    MissingRequired,
    InvalidArgument,
    FlagGroupViolation,
    Validation,
    Permission,
    Internal,
}

impl fmt::Display for CliErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CliErrorKind::UnknownFlag => "unknown-flag",
            CliErrorKind::UnknownCommand => "unknown-command",
            CliErrorKind::InvalidFlag => "invalid-flag",
            CliErrorKind::InvalidValue => "invalid-value",
            CliErrorKind::MissingValue => "missing-value",
            CliErrorKind::MissingRequired => "missing-required",
            CliErrorKind::InvalidArgument => "invalid-argument",
            CliErrorKind::FlagGroupViolation => "flag-group-violation",
            CliErrorKind::Validation => "validation",
            CliErrorKind::Permission => "permission",
            CliErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// A parse/validation/dispatch failure, with enough context attached to
/// render a useful message and a fuzzy-match suggestion.
///
/// Context fields are only populated on the failure path, so the happy
/// path never allocates a `String` it won't use.
#[derive(Debug, Clone)]
pub struct CliError {
    pub kind: CliErrorKind,
    pub message: String,
    pub flag: Option<String>,
    pub command: Option<String>,
    pub group: Option<String>,
    pub suggestion: Option<String>,
}

impl CliError {
    pub fn new(kind: CliErrorKind, message: impl Into<String>) -> Self {
        CliError {
            kind,
            message: message.into(),
            flag: None,
            command: None,
            group: None,
            suggestion: None,
        }
    }

    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(flag) = &self.flag {
            write!(f, " (flag: {flag})")?;
        }
        if let Some(command) = &self.command {
            write!(f, " (command: {command})")?;
        }
        if let Some(group) = &self.group {
            write!(f, " (group: {group})")?;
        }
        Ok(())
    }
}

impl std::error::Error for CliError {}

/// Outcome of a full dispatch: either the action ran (with whatever error
/// it produced, if any), or one of the two sentinels fired and no action
/// ever ran.
#[derive(Debug)]
pub enum Outcome<E> {
    /// The action (or nothing) ran; carries its error, if any.
    Ran(Option<E>),
    /// `--help` was resolved; caller should print help and exit 0.
    HelpShown,
    /// `--version` was resolved; caller should print the version and exit 0.
    VersionShown,
}

impl<E> Outcome<E> {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Outcome::HelpShown | Outcome::VersionShown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context_only_when_present() {
        let bare = CliError::new(CliErrorKind::UnknownFlag, "no such flag");
        assert_eq!(bare.to_string(), "unknown-flag: no such flag");

        let contextual = CliError::new(CliErrorKind::FlagGroupViolation, "need exactly one")
            .with_group("output");
        assert_eq!(
            contextual.to_string(),
            "flag-group-violation: need exactly one (group: output)"
        );
    }

    #[test]
    fn sentinel_detection() {
        let ran: Outcome<CliError> = Outcome::Ran(None);
        assert!(!ran.is_sentinel());
        let help: Outcome<CliError> = Outcome::HelpShown;
        assert!(help.is_sentinel());
    }
}
