//! The child-process wrapper runtime: a declarative description of
//! an external binary invocation, argv assembly from that description, and
//! (in [`exec`] and [`fanout`]) the actual spawn/capture/fan-out machinery.

pub mod exec;
pub mod fanout;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::action::Hook;
use crate::io::SharedBuffer;
use crate::parser::ParseResult;

pub use exec::ExecResult;
pub use fanout::FanOut;

/// How the child's stdout/stderr are wired to this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoMode {
    /// Stream to the execution context's writers; nothing is retained.
    Passthrough,
    /// Both channels go to buffers only; nothing is streamed.
    Capture,
    /// Stream *and* retain in buffers: an application that sets a tee
    /// writer without picking a mode explicitly gets this combination.
    PassthroughCapture,
}

pub type ArgvTransform = Arc<dyn Fn(&[String]) -> Vec<String> + Send + Sync>;
pub type ReplaceArgRule = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;
/// Dynamic-mode tool-path transform: receives the resolved tool path and
/// the argv built so far, returns the (possibly rewritten) pair.
pub type ToolPathTransform = Arc<dyn Fn(&str, &[String]) -> (String, Vec<String>) + Send + Sync>;

#[derive(Clone)]
pub struct WrapperConfig {
    pub binary: String,
    pub discover_on_path: bool,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub inherit_env: bool,
    pub pre_args: Vec<String>,
    pub post_args: Vec<String>,
    pub forward_args: bool,
    pub forward_unknown: bool,
    pub argv_transform: Option<ArgvTransform>,
    pub replace_arg: Option<ReplaceArgRule>,
    pub tool_path_transform: Option<ToolPathTransform>,
    pub tool_allow_list: Option<Vec<String>>,
    pub io_mode: IoMode,
    pub tee_stdout: Option<SharedBuffer>,
    pub tee_stderr: Option<SharedBuffer>,
    /// Dynamic mode: the first positional argument names the tool to
    /// invoke, and `--` (if present) is preserved in the forwarded argv.
    pub dynamic: bool,
    pub leading_flags: HashSet<String>,
    pub after_leading_tokens: Vec<String>,
    /// Wrapper boolean flag name -> child tokens injected among the
    /// leading flags when that wrapper flag is set.
    pub bool_flag_tokens: HashMap<String, Vec<String>>,
    pub fanout: Option<FanOut>,
    pub before_exec: Option<Hook>,
    pub after_exec: Option<Hook>,
}

impl WrapperConfig {
    pub fn new(binary: impl Into<String>) -> Self {
        WrapperConfig {
            binary: binary.into(),
            discover_on_path: true,
            cwd: None,
            env: HashMap::new(),
            inherit_env: true,
            pre_args: Vec::new(),
            post_args: Vec::new(),
            forward_args: false,
            forward_unknown: false,
            argv_transform: None,
            replace_arg: None,
            tool_path_transform: None,
            tool_allow_list: None,
            io_mode: IoMode::Passthrough,
            tee_stdout: None,
            tee_stderr: None,
            dynamic: false,
            leading_flags: HashSet::new(),
            after_leading_tokens: Vec::new(),
            bool_flag_tokens: HashMap::new(),
            fanout: None,
            before_exec: None,
            after_exec: None,
        }
    }

    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn no_inherit_env(mut self) -> Self {
        self.inherit_env = false;
        self
    }

    #[must_use]
    pub fn pre_args<I: IntoIterator<Item = S>, S: Into<String>>(mut self, args: I) -> Self {
        self.pre_args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn post_args<I: IntoIterator<Item = S>, S: Into<String>>(mut self, args: I) -> Self {
        self.post_args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn forward_args(mut self) -> Self {
        self.forward_args = true;
        self
    }

    #[must_use]
    pub fn forward_unknown(mut self) -> Self {
        self.forward_unknown = true;
        self
    }

    #[must_use]
    pub fn no_path_discovery(mut self) -> Self {
        self.discover_on_path = false;
        self
    }

    #[must_use]
    pub fn argv_transform(
        mut self,
        f: impl Fn(&[String]) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.argv_transform = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn replace_arg(mut self, f: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        self.replace_arg = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn tool_path_transform(
        mut self,
        f: impl Fn(&str, &[String]) -> (String, Vec<String>) + Send + Sync + 'static,
    ) -> Self {
        self.tool_path_transform = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn tool_allow_list<I: IntoIterator<Item = S>, S: Into<String>>(mut self, tools: I) -> Self {
        self.tool_allow_list = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn io_mode(mut self, mode: IoMode) -> Self {
        self.io_mode = mode;
        self
    }

    #[must_use]
    pub fn tee_stdout(mut self, buf: SharedBuffer) -> Self {
        self.tee_stdout = Some(buf);
        if self.io_mode == IoMode::Capture {
            self.io_mode = IoMode::PassthroughCapture;
        }
        self
    }

    #[must_use]
    pub fn tee_stderr(mut self, buf: SharedBuffer) -> Self {
        self.tee_stderr = Some(buf);
        if self.io_mode == IoMode::Capture {
            self.io_mode = IoMode::PassthroughCapture;
        }
        self
    }

    #[must_use]
    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    #[must_use]
    pub fn leading_flag(mut self, name: impl Into<String>) -> Self {
        self.leading_flags.insert(name.into());
        self
    }

    #[must_use]
    pub fn after_leading(mut self, tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.after_leading_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn bool_flag_tokens(
        mut self,
        flag: impl Into<String>,
        tokens: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.bool_flag_tokens
            .insert(flag.into(), tokens.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn fanout(mut self, fanout: FanOut) -> Self {
        self.fanout = Some(fanout);
        self
    }

    #[must_use]
    pub fn before_exec(mut self, hook: Hook) -> Self {
        self.before_exec = Some(hook);
        self
    }

    #[must_use]
    pub fn after_exec(mut self, hook: Hook) -> Self {
        self.after_exec = Some(hook);
        self
    }
}

/// The single entry point the dispatcher calls when a command (or the
/// application's default wrapper) has no user action: runs the fan-out
/// list if one is configured, otherwise a single invocation.
pub fn run(cfg: &WrapperConfig, ctx: &mut crate::context::ExecutionContext) -> crate::action::ActionResult {
    if cfg.fanout.is_some() {
        fanout::run(cfg, ctx)
    } else {
        exec::execute(cfg, ctx)
    }
}

/// Resolve the final binary path: PATH lookup only for bare names (no
/// path separator) and only when discovery is enabled.
pub fn resolve_binary(cfg: &WrapperConfig) -> String {
    let looks_like_a_path = cfg.binary.contains('/') || cfg.binary.contains(std::path::MAIN_SEPARATOR);
    if !cfg.discover_on_path || looks_like_a_path {
        return cfg.binary.clone();
    }
    if let Some(path_var) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(&cfg.binary);
            if candidate.is_file() {
                return candidate.to_string_lossy().into_owned();
            }
        }
    }
    cfg.binary.clone()
}

/// Assemble the final argv by a seven-step recipe. `positional` is
/// the caller's positional buffer (in dynamic mode its first element is
/// the tool name, already stripped by the caller if `binary` was
/// overridden via the tool-path transform). `self_exe` is substituted for
/// any `${SELF}` placeholder.
pub fn assemble_argv(
    cfg: &WrapperConfig,
    positional: &[String],
    result: &ParseResult,
    self_exe: &str,
) -> (String, Vec<String>) {
    let mut binary = resolve_binary(cfg);

    let mut forwarded: Vec<String> = if cfg.forward_args {
        let mut args = positional.to_vec();
        if cfg.dynamic && !args.is_empty() {
            args.remove(0);
        }
        args
    } else {
        Vec::new()
    };

    if let Some(replace) = &cfg.replace_arg {
        forwarded = forwarded
            .into_iter()
            .map(|tok| replace(&tok).unwrap_or(tok))
            .collect();
    }

    if !cfg.leading_flags.is_empty() {
        forwarded = reorder_leading(cfg, result, forwarded);
    }

    let mut argv = Vec::with_capacity(cfg.pre_args.len() + forwarded.len() + cfg.post_args.len());
    argv.extend(cfg.pre_args.iter().cloned());
    argv.extend(forwarded);
    argv.extend(cfg.post_args.iter().cloned());

    if cfg.dynamic {
        if let Some(transform) = &cfg.tool_path_transform {
            let tool = positional.first().cloned().unwrap_or_default();
            let (new_binary, new_argv) = transform(&tool, &argv);
            binary = new_binary;
            argv = new_argv;
        }
    }

    if let Some(transform) = &cfg.argv_transform {
        argv = transform(&argv);
    }

    for tok in &mut argv {
        if tok.contains("${SELF}") {
            *tok = tok.replace("${SELF}", self_exe);
        }
    }

    (binary, argv)
}

/// Split `forwarded` into a leading-flag prefix (matching the declared set,
/// up to the first non-matching token or `--`) and the rest, then prepend
/// any set wrapper-bool tokens and the configured after-leading tokens.
fn reorder_leading(cfg: &WrapperConfig, result: &ParseResult, forwarded: Vec<String>) -> Vec<String> {
    let mut leading = Vec::new();
    let mut rest = Vec::new();
    let mut still_matching = true;

    for tok in forwarded {
        if still_matching && tok != "--" && cfg.leading_flags.contains(&tok) {
            leading.push(tok);
        } else {
            still_matching = false;
            rest.push(tok);
        }
    }

    let mut bool_tokens = Vec::new();
    for (flag, tokens) in &cfg.bool_flag_tokens {
        if result.is_set(flag) {
            bool_tokens.extend(tokens.iter().cloned());
        }
    }

    let mut out = Vec::with_capacity(bool_tokens.len() + leading.len() + cfg.after_leading_tokens.len() + rest.len());
    out.extend(bool_tokens);
    out.extend(leading);
    out.extend(cfg.after_leading_tokens.iter().cloned());
    out.extend(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_pre_forwarded_post_with_self_placeholder() {
        let cfg = WrapperConfig::new("echo")
            .pre_args(["wrapped:"])
            .forward_args();
        let result = ParseResult::empty();
        let (binary, argv) = assemble_argv(&cfg, &["hello".to_string()], &result, "/usr/bin/ferrocli");
        assert_eq!(binary, "echo");
        assert_eq!(argv, vec!["wrapped:".to_string(), "hello".to_string()]);
    }

    #[test]
    fn self_placeholder_expands() {
        let cfg = WrapperConfig::new("tool").pre_args(["${SELF}"]);
        let result = ParseResult::empty();
        let (_binary, argv) = assemble_argv(&cfg, &[], &result, "/usr/bin/ferrocli");
        assert_eq!(argv, vec!["/usr/bin/ferrocli".to_string()]);
    }

    #[test]
    fn leading_flags_reordered_with_bool_tokens() {
        let cfg = WrapperConfig::new("tool")
            .forward_args()
            .leading_flag("--verbose")
            .bool_flag_tokens("json", ["--format=json"]);
        let mut result = ParseResult::empty();
        result.set("json", crate::model::Value::Bool(true));
        let (_binary, argv) = assemble_argv(
            &cfg,
            &["--verbose".to_string(), "build".to_string()],
            &result,
            "/bin/x",
        );
        assert_eq!(
            argv,
            vec!["--format=json".to_string(), "--verbose".to_string(), "build".to_string()]
        );
    }

    #[test]
    fn tee_without_explicit_mode_becomes_passthrough_capture() {
        let cfg = WrapperConfig::new("tool").tee_stdout(SharedBuffer::new());
        assert_eq!(cfg.io_mode, IoMode::PassthroughCapture);
    }
}
