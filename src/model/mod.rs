//! The command/flag/argument model — the data types, invariants and
//! lookup structures that describe a CLI. Built once during `Application`
//! construction; read-only for the lifetime of every parse afterwards.

pub mod application;
pub mod command;
pub mod flag;
pub mod group;
pub mod positional;
pub mod value;

pub use application::Application;
pub use command::Command;
pub use flag::Flag;
pub use group::{Constraint, FlagGroup};
pub use positional::PositionalArgument;
pub use value::{Kind, Value};

use crate::intern::Sym;
use std::collections::HashMap;

/// Capability shared by [`Application`] and [`Command`]: both are a place
/// flags and short codes can be registered against. Modeled as a small
/// trait rather than a shared base struct, since Rust has no
/// inheritance — both builders implement it uniformly.
pub trait RegisterFlags {
    fn flags_mut(&mut self) -> &mut HashMap<Sym, Flag>;
    fn short_flags_mut(&mut self) -> &mut HashMap<Sym, Sym>;

    /// Register a flag, panicking if its name or short code collides with
    /// one already in this table — a duplicate name/short code is a
    /// programming error caught at build time, not a runtime condition.
    fn register_flag(&mut self, flag: Flag) {
        assert!(
            !self.flags_mut().contains_key(&flag.name),
            "duplicate flag name {:?}",
            flag.name
        );
        if let Some(short) = &flag.short {
            assert!(
                !self.short_flags_mut().contains_key(short),
                "duplicate short code {:?}",
                short
            );
            self.short_flags_mut().insert(short.clone(), flag.name.clone());
        }
        self.flags_mut().insert(flag.name.clone(), flag);
    }
}

/// Capability shared by [`Application`] and [`Command`]: both can declare
/// flag groups over their own flag table.
pub trait RegisterGroups: RegisterFlags {
    fn groups_mut(&mut self) -> &mut Vec<FlagGroup>;

    /// Register a group, panicking if any member isn't already present in
    /// the enclosing flag table — a flag-group member's underlying Flag
    /// must also be registered in the enclosing flag table.
    fn register_group(&mut self, group: FlagGroup) {
        for member in &group.flags {
            assert!(
                self.flags_mut().contains_key(member),
                "flag group {:?} references unregistered flag {:?}",
                group.name,
                member
            );
        }
        self.groups_mut().push(group);
    }
}

/// Shared validation for a positional-argument list: only the last
/// descriptor may be variadic.
pub(crate) fn validate_positionals(positionals: &[PositionalArgument]) {
    for (ix, p) in positionals.iter().enumerate() {
        if p.variadic {
            assert!(
                ix == positionals.len() - 1,
                "variadic positional {:?} must be the last declared positional",
                p.name
            );
        }
    }
}
