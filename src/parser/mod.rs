//! The argument parser: a small state machine over a raw token vector that
//! produces a [`ParseResult`], plus the per-kind value conversions in
//! [`convert`] and the duration grammar in [`duration`].
//!
//! Conceptually there are seven states (`init`, `global-flags`, `command`,
//! `command-flags`, `positional`, `done`, `error`). `done`/`error` are
//! simply this function returning `Ok`/`Err`, and `init`/`global-flags` and
//! `command`/`command-flags` collapse into the same branches below — they
//! differ only in whether a command has been resolved yet, which is
//! already tracked by whether `path` is empty. The one state transition
//! that matters operationally is `positional`, entered permanently once a
//! literal `--` is seen.

pub mod convert;
pub mod duration;

use std::collections::HashMap;

use crate::error::{CliError, CliErrorKind};
use crate::intern::Sym;
use crate::model::{Application, Command, Flag, FlagGroup, Value};
use crate::suggest::best_match;

/// The typed, flattened output of one parse. Drawn from
/// [`crate::pool::parse_results`] at the start of [`parse`] and returned by
/// [`ParseResult::discard`]: its keyed maps are cleared in place by the
/// pool's reset hook rather than reallocated. Sequence values
/// (`Value::StrSeq`/`Value::IntSeq`) stay plain owned `Vec`s inside the
/// single `Value` enum rather than separate pooled handles — see
/// DESIGN.md's parser entry for why. `ParseResult` itself still needs to be
/// `Clone` for [`crate::context::ExecutionContext::fork_for_binary`] to
/// hand an independent copy to each parallel fan-out iteration; those
/// forked copies are never drawn from or returned to the pool themselves.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Resolved command names, root to leaf; empty if no command matched.
    pub command_path: Vec<String>,
    values: HashMap<Sym, Value>,
    positionals: HashMap<String, Value>,
    rest: Vec<String>,
    help_requested: bool,
    version_requested: bool,
}

impl ParseResult {
    /// A result with nothing in it — the "freshly taken from the pool and
    /// reset" state, and the starting point for a parse.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a flag's value by name. Used both by the parser's own
    /// finalisation step and directly by tests.
    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(crate::intern::global().intern(name), value);
    }

    pub(crate) fn set_sym(&mut self, name: Sym, value: Value) {
        self.values.insert(name, value);
    }

    /// Whether `name` is present in the result *and* counts by the
    /// kind-specific "is set" rule (a `false` bool does not count).
    pub fn is_set(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(Value::counts_as_set)
    }

    /// Raw key presence, ignoring the bool-false special case — used by
    /// finalisation to decide whether a flag was touched at all (an
    /// explicit `--verbose=false` must not be overwritten by a default).
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set_positional(&mut self, name: &str, value: Value) {
        self.positionals.insert(name.to_string(), value);
    }

    pub fn positional(&self, name: &str) -> Option<&Value> {
        self.positionals.get(name)
    }

    pub fn rest_args(&self) -> &[String] {
        &self.rest
    }

    pub fn help_requested(&self) -> bool {
        self.help_requested
    }

    pub fn version_requested(&self) -> bool {
        self.version_requested
    }

    pub fn command_name(&self) -> Option<&str> {
        self.command_path.last().map(String::as_str)
    }

    /// Return the result to [`crate::pool::parse_results`] so a later
    /// parse can reuse its allocated maps instead of rebuilding them.
    pub fn discard(self) {
        crate::pool::parse_results().put(self);
    }

    /// Clear every field in place, preserving whatever capacity the maps
    /// and vectors already hold. Called by the pool's reset hook when a
    /// previously-used result is handed back out.
    pub(crate) fn reset(&mut self) {
        self.command_path.clear();
        self.values.clear();
        self.positionals.clear();
        self.rest.clear();
        self.help_requested = false;
        self.version_requested = false;
    }
}

/// Parse `tokens` against `app`, producing a typed result or the first
/// error encountered.
pub fn parse(app: &Application, tokens: &[String]) -> Result<ParseResult, CliError> {
    let mut result = crate::pool::parse_results().get();
    let mut path: Vec<&Command> = Vec::new();
    let mut positional_buffer: Vec<String> = Vec::new();
    let mut forced_positional = false;
    let mut i = 0;

    while i < tokens.len() {
        let tok = tokens[i].as_str();

        if !forced_positional && tok == "--" {
            if is_dynamic_wrapper(app, &path) {
                positional_buffer.push(tok.to_string());
            }
            forced_positional = true;
            i += 1;
            continue;
        }

        if forced_positional {
            positional_buffer.push(tok.to_string());
            i += 1;
            continue;
        }

        if let Some(body) = tok.strip_prefix("--") {
            i = parse_long_flag(app, &path, body, tokens, i, &mut result, &mut positional_buffer)?;
            continue;
        }

        if tok.starts_with('-') && tok.len() >= 2 {
            i = parse_short_cluster(app, &path, &tok[1..], tokens, i, &mut result, &mut positional_buffer)?;
            continue;
        }

        i = classify_bare_token(app, &mut path, tok, i, &mut positional_buffer)?;
    }

    for cmd in &path {
        result.command_path.push(cmd.name.as_str().to_string());
    }

    finalize(app, &path, &mut result, positional_buffer)?;
    Ok(result)
}

fn classify_bare_token<'a>(
    app: &'a Application,
    path: &mut Vec<&'a Command>,
    tok: &str,
    i: usize,
    positional_buffer: &mut Vec<String>,
) -> Result<usize, CliError> {
    if let Some(leaf) = path.last() {
        if !leaf.subcommands.is_empty() {
            return match leaf.resolve_subcommand(tok) {
                Some(sub) => {
                    path.push(sub);
                    Ok(i + 1)
                }
                None => Err(unknown_command_error(leaf.subcommand_names(), tok).with_command(leaf.name.as_str())),
            };
        }
        positional_buffer.push(tok.to_string());
        return Ok(i + 1);
    }

    if let Some(cmd) = app.resolve_command(tok) {
        path.push(cmd);
        return Ok(i + 1);
    }
    if accepts_top_level_positional(app) {
        positional_buffer.push(tok.to_string());
        return Ok(i + 1);
    }
    Err(unknown_command_error(app.command_names(), tok))
}

fn accepts_top_level_positional(app: &Application) -> bool {
    !app.positionals.is_empty() || app.rest_args || app.default_wrapper.is_some()
}

fn is_dynamic_wrapper(app: &Application, path: &[&Command]) -> bool {
    active_wrapper(app, path).is_some_and(|w| w.dynamic)
}

fn forwards_unknown(app: &Application, path: &[&Command]) -> bool {
    active_wrapper(app, path).is_some_and(|w| w.forward_unknown)
}

fn active_wrapper<'a>(app: &'a Application, path: &[&'a Command]) -> Option<&'a crate::wrapper::WrapperConfig> {
    path.last()
        .and_then(|cmd| cmd.wrapper.as_ref())
        .or(app.default_wrapper.as_ref())
}

/// Merge the application's global flags with every level of `path`,
/// keeping the leaf command's own table in full and only cascading
/// ancestor flags down when they're marked `global`.
fn effective_flags<'a>(app: &'a Application, path: &[&'a Command]) -> HashMap<&'a str, &'a Flag> {
    let mut map = HashMap::new();
    for (name, flag) in app.flags() {
        if path.is_empty() || flag.global {
            map.insert(name.as_str(), flag);
        }
    }
    for (depth, cmd) in path.iter().enumerate() {
        let is_leaf = depth == path.len() - 1;
        for (name, flag) in cmd.flags() {
            if is_leaf || flag.global {
                map.insert(name.as_str(), flag);
            }
        }
    }
    map
}

fn effective_short_flags<'a>(app: &'a Application, path: &[&'a Command]) -> HashMap<char, &'a str> {
    let mut map = HashMap::new();
    for (short, long) in app.short_flags() {
        if path.is_empty() || app.flags().get(long).is_some_and(|f| f.global) {
            if let Some(c) = short.as_str().chars().next() {
                map.insert(c, long.as_str());
            }
        }
    }
    for (depth, cmd) in path.iter().enumerate() {
        let is_leaf = depth == path.len() - 1;
        for (short, long) in cmd.short_flags() {
            if is_leaf || cmd.flags().get(long).is_some_and(|f| f.global) {
                if let Some(c) = short.as_str().chars().next() {
                    map.insert(c, long.as_str());
                }
            }
        }
    }
    map
}

fn active_groups<'a>(app: &'a Application, path: &[&'a Command]) -> &'a [FlagGroup] {
    match path.last() {
        Some(cmd) => cmd.groups(),
        None => app.groups(),
    }
}

fn active_positionals<'a>(app: &'a Application, path: &[&'a Command]) -> &'a [crate::model::PositionalArgument] {
    match path.last() {
        Some(cmd) => &cmd.positionals,
        None => &app.positionals,
    }
}

/// Whether overflow positional tokens should be collected into
/// [`ParseResult::rest_args`] rather than rejected. True whenever declared
/// directly, or implicitly whenever a wrapper is attached — a wrapper
/// command always forwards whatever positional tokens it's given.
fn active_rest_args(app: &Application, path: &[&Command]) -> bool {
    let declared = match path.last() {
        Some(cmd) => cmd.rest_args,
        None => app.rest_args,
    };
    declared || active_wrapper(app, path).is_some()
}

fn parse_long_flag<'a>(
    app: &'a Application,
    path: &[&'a Command],
    body: &str,
    tokens: &[String],
    i: usize,
    result: &mut ParseResult,
    positional_buffer: &mut Vec<String>,
) -> Result<usize, CliError> {
    let (name, inline) = match body.find('=') {
        Some(pos) => (&body[..pos], Some(body[pos + 1..].to_string())),
        None => (body, None),
    };

    if name == "help" && app.help_enabled {
        result.help_requested = true;
        return Ok(i + 1);
    }
    if name == "version" && app.version_enabled {
        result.version_requested = true;
        return Ok(i + 1);
    }

    let flags = effective_flags(app, path);
    let Some(flag) = flags.get(name).copied() else {
        if forwards_unknown(app, path) {
            positional_buffer.push(format!("--{body}"));
            return Ok(i + 1);
        }
        return Err(unknown_flag_error(&flags, name));
    };

    consume_flag_value(flag, inline, tokens, i, result)
}

fn parse_short_cluster<'a>(
    app: &'a Application,
    path: &[&'a Command],
    body: &str,
    tokens: &[String],
    i: usize,
    result: &mut ParseResult,
    positional_buffer: &mut Vec<String>,
) -> Result<usize, CliError> {
    let flags = effective_flags(app, path);
    let shorts = effective_short_flags(app, path);
    let help_short_free = app.help_enabled && !shorts.contains_key(&'h');

    let mut chars = body.char_indices();
    while let Some((byte_ix, c)) = chars.next() {
        if c == 'h' && help_short_free {
            result.help_requested = true;
            continue;
        }

        let Some(&name) = shorts.get(&c) else {
            if forwards_unknown(app, path) {
                positional_buffer.push(format!("-{body}"));
                return Ok(i + 1);
            }
            return Err(unknown_flag_error(&flags, &c.to_string()));
        };
        let flag = flags[name];

        if flag.kind == crate::model::Kind::Bool {
            result.set_sym(flag.name.clone(), Value::Bool(true));
            continue;
        }

        let next_byte = byte_ix + c.len_utf8();
        let remainder = &body[next_byte..];
        if !remainder.is_empty() {
            let value = convert::parse_for_kind(flag.kind, remainder, &flag.enum_values)
                .map_err(|e| invalid_value_error(flag, e))?;
            result.set_sym(flag.name.clone(), value);
            return Ok(i + 1);
        }
        let raw = tokens.get(i + 1).ok_or_else(|| missing_value_error(flag))?;
        let value = convert::parse_for_kind(flag.kind, raw, &flag.enum_values)
            .map_err(|e| invalid_value_error(flag, e))?;
        result.set_sym(flag.name.clone(), value);
        return Ok(i + 2);
    }
    Ok(i + 1)
}

fn consume_flag_value(
    flag: &Flag,
    inline: Option<String>,
    tokens: &[String],
    i: usize,
    result: &mut ParseResult,
) -> Result<usize, CliError> {
    if flag.kind == crate::model::Kind::Bool {
        let raw = inline.unwrap_or_else(|| "true".to_string());
        result.set_sym(flag.name.clone(), Value::Bool(convert::parse_bool(&raw)));
        return Ok(i + 1);
    }

    let (raw, consumed) = match inline {
        Some(v) => (v, 1),
        None => {
            let next = tokens.get(i + 1).ok_or_else(|| missing_value_error(flag))?;
            (next.clone(), 2)
        }
    };

    let value = convert::parse_for_kind(flag.kind, &raw, &flag.enum_values)
        .map_err(|e| invalid_value_error(flag, e))?;

    if let Some(validator) = &flag.validator {
        validator(&value).map_err(|e| {
            CliError::new(CliErrorKind::Validation, e).with_flag(flag.name.as_str())
        })?;
    }

    result.set_sym(flag.name.clone(), value);
    Ok(i + consumed)
}

fn finalize(
    app: &Application,
    path: &[&Command],
    result: &mut ParseResult,
    positional_buffer: Vec<String>,
) -> Result<(), CliError> {
    for (name, flag) in effective_flags(app, path) {
        if result.contains(name) {
            continue;
        }
        if let Some(value) = resolve_env(flag) {
            result.set_sym(flag.name.clone(), value);
            continue;
        }
        if let Some(default) = &flag.default {
            result.set_sym(flag.name.clone(), default.clone());
            continue;
        }
        if flag.required && !result.help_requested && !result.version_requested {
            return Err(CliError::new(
                CliErrorKind::MissingRequired,
                format!("flag {name:?} is required"),
            )
            .with_flag(name));
        }
    }

    consume_positionals(app, path, result, positional_buffer)?;

    crate::group::validate(active_groups(app, path), result)?;
    Ok(())
}

fn resolve_env(flag: &Flag) -> Option<Value> {
    for name in &flag.env {
        if let Ok(raw) = std::env::var(name) {
            if !raw.is_empty() {
                return convert::parse_for_kind(flag.kind, &raw, &flag.enum_values).ok();
            }
        }
    }
    None
}

fn consume_positionals(
    app: &Application,
    path: &[&Command],
    result: &mut ParseResult,
    mut buffer: Vec<String>,
) -> Result<(), CliError> {
    let positionals = active_positionals(app, path);
    let mut cursor = 0usize;

    for p in positionals {
        if p.variadic {
            let rest: Vec<String> = buffer.drain(cursor..).collect();
            if rest.is_empty() {
                if p.required && !result.help_requested && !result.version_requested {
                    return Err(CliError::new(
                        CliErrorKind::InvalidArgument,
                        format!("positional argument {:?} is required", p.name),
                    ));
                }
                if let Some(default) = &p.default {
                    result.set_positional(&p.name, default.clone());
                }
                continue;
            }
            let value = if p.kind == crate::model::Kind::IntSeq {
                let ints: Result<Vec<i64>, String> =
                    rest.iter().map(|s| convert::parse_int(s)).collect();
                Value::IntSeq(ints.map_err(|e| {
                    CliError::new(CliErrorKind::InvalidArgument, e)
                })?)
            } else {
                Value::StrSeq(rest)
            };
            if let Some(validator) = &p.validator {
                validator(&value)
                    .map_err(|e| CliError::new(CliErrorKind::Validation, e))?;
            }
            result.set_positional(&p.name, value);
            continue;
        }

        match buffer.get(cursor) {
            Some(raw) => {
                let value = convert::parse_for_kind(p.kind, raw, &[])
                    .map_err(|e| CliError::new(CliErrorKind::InvalidArgument, e))?;
                if let Some(validator) = &p.validator {
                    validator(&value)
                        .map_err(|e| CliError::new(CliErrorKind::Validation, e))?;
                }
                result.set_positional(&p.name, value);
                cursor += 1;
            }
            None => {
                if p.required && !result.help_requested && !result.version_requested {
                    return Err(CliError::new(
                        CliErrorKind::InvalidArgument,
                        format!("positional argument {:?} is required", p.name),
                    ));
                }
                if let Some(default) = &p.default {
                    result.set_positional(&p.name, default.clone());
                }
            }
        }
    }

    let remainder: Vec<String> = buffer.drain(cursor..).collect();
    if !remainder.is_empty() {
        if active_rest_args(app, path) {
            result.rest = remainder;
        } else {
            return Err(CliError::new(
                CliErrorKind::InvalidArgument,
                format!("unexpected positional argument(s): {}", remainder.join(", ")),
            ));
        }
    }
    Ok(())
}

fn unknown_flag_error(flags: &HashMap<&str, &Flag>, name: &str) -> CliError {
    let err = CliError::new(CliErrorKind::UnknownFlag, format!("unknown flag {name:?}"))
        .with_flag(name);
    match best_match(name, flags.keys().copied()) {
        Some(s) => err.with_suggestion(s),
        None => err,
    }
}

fn unknown_command_error<'a>(candidates: impl Iterator<Item = &'a str>, name: &str) -> CliError {
    let candidates: Vec<&str> = candidates.collect();
    let err = CliError::new(CliErrorKind::UnknownCommand, format!("unknown command {name:?}"))
        .with_command(name);
    match best_match(name, candidates) {
        Some(s) => err.with_suggestion(s),
        None => err,
    }
}

fn missing_value_error(flag: &Flag) -> CliError {
    CliError::new(
        CliErrorKind::MissingValue,
        format!("flag {:?} requires a value", flag.name.as_str()),
    )
    .with_flag(flag.name.as_str())
}

fn invalid_value_error(flag: &Flag, reason: String) -> CliError {
    CliError::new(CliErrorKind::InvalidValue, reason).with_flag(flag.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Application, Command, Flag, Kind, PositionalArgument};

    fn app_a() -> Application {
        Application::new("app")
            .flag(Flag::new("name", Kind::String).default_value(Value::Str("Go User".into())))
            .flag(Flag::new("age", Kind::Int).default_value(Value::Int(30)))
            .flag(Flag::new("verbose", Kind::Bool).short('v'))
    }

    #[test]
    fn scenario_a_flags_and_short_bool() {
        let app = app_a();
        let tokens = vec!["--name".to_string(), "Alice".to_string(), "-v".to_string()];
        let result = parse(&app, &tokens).unwrap();
        assert_eq!(result.get("name").unwrap().as_str(), Some("Alice"));
        assert_eq!(result.get("age").unwrap().as_int(), Some(30));
        assert_eq!(result.get("verbose").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn scenario_b_subcommand_enum_and_positional() {
        let app = Application::new("app").command(
            Command::new("deploy")
                .flag(
                    Flag::new("env", Kind::Enum)
                        .enum_values(["dev", "staging", "prod"])
                        .default_value(Value::Enum("prod".into())),
                )
                .positional(PositionalArgument::new("target", Kind::String, 0).required()),
        );
        let tokens = vec![
            "deploy".to_string(),
            "--env".to_string(),
            "staging".to_string(),
            "web-1".to_string(),
        ];
        let result = parse(&app, &tokens).unwrap();
        assert_eq!(result.command_name(), Some("deploy"));
        assert_eq!(result.get("env").unwrap().as_str(), Some("staging"));
        assert_eq!(result.positional("target").unwrap().as_str(), Some("web-1"));
    }

    #[test]
    fn short_cluster_equivalence() {
        let app = Application::new("app")
            .flag(Flag::new("a", Kind::Bool).short('a'))
            .flag(Flag::new("b", Kind::Bool).short('b'))
            .flag(Flag::new("c", Kind::Bool).short('c'));

        let clustered = parse(&app, &["-abc".to_string()]).unwrap();
        let separate = parse(
            &app,
            &["-a".to_string(), "-b".to_string(), "-c".to_string()],
        )
        .unwrap();
        assert_eq!(clustered.get("a"), separate.get("a"));
        assert_eq!(clustered.get("b"), separate.get("b"));
        assert_eq!(clustered.get("c"), separate.get("c"));
    }

    #[test]
    fn double_dash_terminates_flag_parsing() {
        let app = Application::new("app")
            .flag(Flag::new("verbose", Kind::Bool))
            .rest_args();
        let tokens = vec!["--".to_string(), "--verbose".to_string(), "x".to_string()];
        let result = parse(&app, &tokens).unwrap();
        assert!(!result.is_set("verbose"));
        assert_eq!(result.rest_args(), &["--verbose".to_string(), "x".to_string()]);
    }

    #[test]
    fn unknown_flag_suggests_closest_match() {
        let app = Application::new("app").flag(Flag::new("verbose", Kind::Bool));
        let err = parse(&app, &["--verbos".to_string()]).unwrap_err();
        assert_eq!(err.kind, CliErrorKind::UnknownFlag);
        assert_eq!(err.suggestion.as_deref(), Some("verbose"));
    }

    #[test]
    fn missing_required_flag_fails() {
        let app = Application::new("app").flag(Flag::new("name", Kind::String).required());
        let err = parse(&app, &[]).unwrap_err();
        assert_eq!(err.kind, CliErrorKind::MissingRequired);
    }

    #[test]
    fn help_suppresses_required_checks() {
        let app = Application::new("app").flag(Flag::new("name", Kind::String).required());
        let result = parse(&app, &["--help".to_string()]).unwrap();
        assert!(result.help_requested());
    }

    #[test]
    fn inline_equals_value_is_accepted() {
        let app = Application::new("app").flag(Flag::new("port", Kind::Int));
        let result = parse(&app, &["--port=8080".to_string()]).unwrap();
        assert_eq!(result.get("port").unwrap().as_int(), Some(8080));
    }
}
