//! A single command or subcommand.

use std::collections::{HashMap, HashSet};

use crate::action::{Action, Hook, Middleware};
use crate::intern::Sym;
use crate::model::{validate_positionals, Flag, FlagGroup, PositionalArgument, RegisterFlags, RegisterGroups};
use crate::wrapper::WrapperConfig;

pub struct Command {
    pub name: Sym,
    pub description: Option<String>,
    pub aliases: HashSet<Sym>,
    pub hidden: bool,
    pub(crate) flags: HashMap<Sym, Flag>,
    pub(crate) short_flags: HashMap<Sym, Sym>,
    pub subcommands: HashMap<Sym, Command>,
    pub(crate) subcommand_aliases: HashMap<Sym, Sym>,
    pub(crate) groups: Vec<FlagGroup>,
    pub positionals: Vec<PositionalArgument>,
    pub rest_args: bool,
    pub action: Option<Action>,
    pub before_hook: Option<Hook>,
    pub after_hook: Option<Hook>,
    pub middleware: Vec<Middleware>,
    pub wrapper: Option<WrapperConfig>,
}

impl RegisterFlags for Command {
    fn flags_mut(&mut self) -> &mut HashMap<Sym, Flag> {
        &mut self.flags
    }
    fn short_flags_mut(&mut self) -> &mut HashMap<Sym, Sym> {
        &mut self.short_flags
    }
}

impl RegisterGroups for Command {
    fn groups_mut(&mut self) -> &mut Vec<FlagGroup> {
        &mut self.groups
    }
}

impl Command {
    pub fn new(name: &str) -> Self {
        Command {
            name: crate::intern::global().intern(name),
            description: None,
            aliases: HashSet::new(),
            hidden: false,
            flags: HashMap::new(),
            short_flags: HashMap::new(),
            subcommands: HashMap::new(),
            subcommand_aliases: HashMap::new(),
            groups: Vec::new(),
            positionals: Vec::new(),
            rest_args: false,
            action: None,
            before_hook: None,
            after_hook: None,
            middleware: Vec::new(),
            wrapper: None,
        }
    }

    #[must_use]
    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.insert(crate::intern::global().intern(alias));
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: Flag) -> Self {
        self.register_flag(flag);
        self
    }

    #[must_use]
    pub fn group(mut self, group: FlagGroup) -> Self {
        self.register_group(group);
        self
    }

    #[must_use]
    pub fn positional(mut self, positional: PositionalArgument) -> Self {
        self.positionals.push(positional);
        validate_positionals(&self.positionals);
        self
    }

    #[must_use]
    pub fn rest_args(mut self) -> Self {
        self.rest_args = true;
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn before(mut self, hook: Hook) -> Self {
        self.before_hook = Some(hook);
        self
    }

    #[must_use]
    pub fn after(mut self, hook: Hook) -> Self {
        self.after_hook = Some(hook);
        self
    }

    #[must_use]
    pub fn middleware(mut self, mw: Middleware) -> Self {
        self.middleware.push(mw);
        self
    }

    #[must_use]
    pub fn wrapper(mut self, wrapper: WrapperConfig) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    #[must_use]
    pub fn subcommand(mut self, command: Command) -> Self {
        for alias in &command.aliases {
            assert!(
                !self.subcommand_aliases.contains_key(alias),
                "duplicate subcommand alias {:?}",
                alias
            );
            self.subcommand_aliases.insert(alias.clone(), command.name.clone());
        }
        assert!(
            !self.subcommands.contains_key(&command.name),
            "duplicate subcommand name {:?}",
            command.name
        );
        self.subcommands.insert(command.name.clone(), command);
        self
    }

    pub fn flags(&self) -> &HashMap<Sym, Flag> {
        &self.flags
    }

    pub fn short_flags(&self) -> &HashMap<Sym, Sym> {
        &self.short_flags
    }

    pub fn groups(&self) -> &[FlagGroup] {
        &self.groups
    }

    /// Resolve a bare token against this command's subcommand table,
    /// checking aliases too.
    pub fn resolve_subcommand(&self, token: &str) -> Option<&Command> {
        if let Some(cmd) = self.subcommands.get(token) {
            return Some(cmd);
        }
        let canonical = self.subcommand_aliases.get(token)?;
        self.subcommands.get(canonical)
    }

    pub fn subcommand_names(&self) -> impl Iterator<Item = &str> {
        self.subcommands.keys().map(Sym::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::Kind;

    #[test]
    fn subcommand_resolves_by_alias() {
        let leaf = Command::new("deploy").alias("d");
        let root = Command::new("root").subcommand(leaf);
        assert!(root.resolve_subcommand("deploy").is_some());
        assert!(root.resolve_subcommand("d").is_some());
        assert!(root.resolve_subcommand("nope").is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate flag name")]
    fn duplicate_flag_name_panics() {
        let _ = Command::new("c")
            .flag(Flag::new("name", Kind::String))
            .flag(Flag::new("name", Kind::Int));
    }

    #[test]
    #[should_panic(expected = "duplicate short code")]
    fn duplicate_short_code_panics() {
        let _ = Command::new("c")
            .flag(Flag::new("a", Kind::Bool).short('x'))
            .flag(Flag::new("b", Kind::Bool).short('x'));
    }

    #[test]
    #[should_panic(expected = "must be the last declared positional")]
    fn variadic_must_be_last() {
        let _ = Command::new("c")
            .positional(PositionalArgument::new("a", Kind::StringSeq, 0).variadic())
            .positional(PositionalArgument::new("b", Kind::String, 1));
    }
}
