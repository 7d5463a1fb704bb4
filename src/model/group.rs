//! Flag-group declaration. The constraint-checking logic itself lives
//! in [`crate::group`]; this module only holds the declarative shape.

use crate::intern::Sym;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    None,
    MutuallyExclusive,
    AllOrNone,
    AtLeastOne,
    ExactlyOne,
}

/// A named overlay over a subset of an enclosing flag table. Every member
/// here must also be registered in the enclosing
/// flag table directly — a group is a tagging overlay, not a second
/// registry.
#[derive(Debug, Clone)]
pub struct FlagGroup {
    pub name: String,
    pub description: Option<String>,
    pub flags: Vec<Sym>,
    pub constraint: Constraint,
}

impl FlagGroup {
    pub fn new(name: impl Into<String>, constraint: Constraint) -> Self {
        FlagGroup {
            name: name.into(),
            description: None,
            flags: Vec::new(),
            constraint,
        }
    }

    #[must_use]
    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn flag(mut self, name: &str) -> Self {
        self.flags.push(crate::intern::global().intern(name));
        self
    }
}
