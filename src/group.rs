//! Flag-group constraint validator.

use crate::error::{CliError, CliErrorKind};
use crate::model::{Constraint, FlagGroup};
use crate::parser::ParseResult;

/// Validate every group declared at this scope against a freshly-parsed
/// result. Returns the first violation found; groups are checked in
/// declaration order.
pub fn validate(groups: &[FlagGroup], result: &ParseResult) -> Result<(), CliError> {
    for group in groups {
        check_group(group, result)?;
    }
    Ok(())
}

fn check_group(group: &FlagGroup, result: &ParseResult) -> Result<(), CliError> {
    let set: Vec<&str> = group
        .flags
        .iter()
        .filter(|name| result.is_set(name.as_str()))
        .map(|name| name.as_str())
        .collect();
    let count = set.len();

    let ok = match group.constraint {
        Constraint::None => true,
        Constraint::MutuallyExclusive => count <= 1,
        Constraint::AtLeastOne => count >= 1,
        Constraint::AllOrNone => count == 0 || count == group.flags.len(),
        Constraint::ExactlyOne => count == 1,
    };

    if ok {
        return Ok(());
    }

    let members: Vec<&str> = group.flags.iter().map(|s| s.as_str()).collect();
    let message = match group.constraint {
        Constraint::None => unreachable!("Constraint::None always passes"),
        Constraint::MutuallyExclusive => format!(
            "flags {} are mutually exclusive, but {} were given: {}",
            members.join(", "),
            count,
            set.join(", ")
        ),
        Constraint::AtLeastOne => format!(
            "at least one of {} is required",
            members.join(", ")
        ),
        Constraint::AllOrNone => format!(
            "flags {} must be given all together or not at all, but only {} were given: {}",
            members.join(", "),
            count,
            set.join(", ")
        ),
        Constraint::ExactlyOne => format!(
            "exactly one of {} is required, but {} were given: {}",
            members.join(", "),
            count,
            set.join(", ")
        ),
    };

    Err(CliError::new(CliErrorKind::FlagGroupViolation, message).with_group(group.name.clone()))
}
