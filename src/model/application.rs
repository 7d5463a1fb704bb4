//! The application root — the single entry point that owns everything
//! reachable through it: the top-level flag table, the command tree, the
//! positional-argument list, flag groups, middleware, and handles to the
//! exit-code mapper and I/O manager.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::action::{Action, Hook, Middleware};
use crate::config::Schema;
use crate::exitcode::ExitCodeMapper;
use crate::intern::Sym;
use crate::io::IoManager;
use crate::model::{validate_positionals, Command, Flag, FlagGroup, PositionalArgument, RegisterFlags, RegisterGroups};
use crate::wrapper::WrapperConfig;

/// Controls whether the default error handler prints contextual help after
/// a failure, for applications that have opted into "show help on error".
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandlerConfig {
    pub show_help_on_error: bool,
}

pub struct Application {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub authors: Vec<String>,
    pub(crate) flags: HashMap<Sym, Flag>,
    pub(crate) short_flags: HashMap<Sym, Sym>,
    pub(crate) commands: HashMap<Sym, Command>,
    pub(crate) command_aliases: HashMap<Sym, Sym>,
    pub(crate) groups: Vec<FlagGroup>,
    pub positionals: Vec<PositionalArgument>,
    pub rest_args: bool,
    pub middleware: Vec<Middleware>,
    pub default_wrapper: Option<WrapperConfig>,
    pub error_handler: ErrorHandlerConfig,
    pub exit_codes: ExitCodeMapper,
    pub io: Mutex<IoManager>,
    pub before_hook: Option<Hook>,
    pub after_hook: Option<Hook>,
    /// `--help`/`-h` are reserved at every level unless disabled.
    pub help_enabled: bool,
    /// `--version` is reserved unless disabled.
    pub version_enabled: bool,
    /// Field descriptors for the configuration-precedence resolver.
    /// `None` means the application doesn't use layered configuration at
    /// all; the dispatcher skips config resolution entirely in that case.
    pub config_schema: Option<Schema>,
    /// Path to an optional JSON config file, the second precedence layer.
    pub config_file: Option<PathBuf>,
}

impl RegisterFlags for Application {
    fn flags_mut(&mut self) -> &mut HashMap<Sym, Flag> {
        &mut self.flags
    }
    fn short_flags_mut(&mut self) -> &mut HashMap<Sym, Sym> {
        &mut self.short_flags
    }
}

impl RegisterGroups for Application {
    fn groups_mut(&mut self) -> &mut Vec<FlagGroup> {
        &mut self.groups
    }
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Application {
            name: name.into(),
            description: None,
            version: None,
            authors: Vec::new(),
            flags: HashMap::new(),
            short_flags: HashMap::new(),
            commands: HashMap::new(),
            command_aliases: HashMap::new(),
            groups: Vec::new(),
            positionals: Vec::new(),
            rest_args: false,
            middleware: Vec::new(),
            default_wrapper: None,
            error_handler: ErrorHandlerConfig::default(),
            exit_codes: ExitCodeMapper::new(),
            io: Mutex::new(IoManager::stdio()),
            before_hook: None,
            after_hook: None,
            help_enabled: true,
            version_enabled: true,
            config_schema: None,
            config_file: None,
        }
    }

    /// A minimal, IO-free application used by tests elsewhere in the crate
    /// that only need *an* `Application` to build an `ExecutionContext`
    /// around — avoids every unit test paying for real stdio detection.
    #[doc(hidden)]
    pub fn minimal_for_tests() -> Self {
        let mut app = Self::new("test");
        app.io = Mutex::new(IoManager::with_writers(
            Box::new(std::io::sink()),
            Box::new(std::io::sink()),
            false,
        ));
        app
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
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
    pub fn middleware(mut self, mw: Middleware) -> Self {
        self.middleware.push(mw);
        self
    }

    #[must_use]
    pub fn default_wrapper(mut self, wrapper: WrapperConfig) -> Self {
        self.default_wrapper = Some(wrapper);
        self
    }

    #[must_use]
    pub fn show_help_on_error(mut self) -> Self {
        self.error_handler.show_help_on_error = true;
        self
    }

    #[must_use]
    pub fn exit_codes(mut self, mapper: ExitCodeMapper) -> Self {
        self.exit_codes = mapper;
        self
    }

    #[must_use]
    pub fn config_schema(mut self, schema: Schema) -> Self {
        self.config_schema = Some(schema);
        self
    }

    #[must_use]
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
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
    pub fn command(mut self, command: Command) -> Self {
        for alias in &command.aliases {
            assert!(
                !self.command_aliases.contains_key(alias),
                "duplicate command alias {:?}",
                alias
            );
            self.command_aliases.insert(alias.clone(), command.name.clone());
        }
        assert!(
            !self.commands.contains_key(&command.name),
            "duplicate command name {:?}",
            command.name
        );
        self.commands.insert(command.name.clone(), command);
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

    pub fn resolve_command(&self, token: &str) -> Option<&Command> {
        if let Some(cmd) = self.commands.get(token) {
            return Some(cmd);
        }
        let canonical = self.command_aliases.get(token)?;
        self.commands.get(canonical)
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(Sym::as_str)
    }

    /// All flag names visible at this scope, used by the unknown-flag
    /// suggestion search.
    pub fn all_flag_names(&self) -> HashSet<&str> {
        self.flags.keys().map(Sym::as_str).collect()
    }
}
