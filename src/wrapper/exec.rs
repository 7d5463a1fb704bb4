//! Process spawn, I/O routing, and exit-code translation for a single
//! wrapper invocation.

use std::io::{Read, Write};
use std::process::{Command as StdCommand, Stdio};

use crate::action::{ActionError, ActionResult};
use crate::context::{ExecutionContext, EXEC_RESULT_KEY};
use crate::error::{CliError, CliErrorKind};
use crate::exitcode::ExitError;

use super::{assemble_argv, resolve_binary, IoMode, WrapperConfig};

/// What a single invocation produced, stashed on the execution context at
/// [`EXEC_RESULT_KEY`] in capture modes.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: Option<i32>,
}

fn current_exe() -> String {
    std::env::current_exe()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Run `cfg` once against the parse result carried by `ctx`, wiring I/O
/// per its [`IoMode`] and translating a non-zero exit into an
/// [`ExitError`].
pub fn execute(cfg: &WrapperConfig, ctx: &mut ExecutionContext) -> ActionResult {
    if let Some(hook) = &cfg.before_exec {
        hook(ctx)?;
    }

    let positional: Vec<String> = ctx
        .parse_result
        .as_ref()
        .map(|r| r.rest_args().to_vec())
        .unwrap_or_default();
    let empty_result = crate::parser::ParseResult::empty();
    let parse_result = ctx.parse_result.as_ref().unwrap_or(&empty_result);

    if let Some(allow) = &cfg.tool_allow_list {
        let tool = positional.first().cloned().unwrap_or_else(|| cfg.binary.clone());
        if !allow.iter().any(|a| a == &tool) {
            return Err(Box::new(CliError::new(
                CliErrorKind::Permission,
                format!("{tool:?} is not on the wrapper's allow-list"),
            )));
        }
    }

    let self_exe = current_exe();
    let (binary, argv) = assemble_argv(cfg, &positional, parse_result, &self_exe);
    let result = run_process(cfg, &binary, &argv)?;

    if matches!(cfg.io_mode, IoMode::Capture | IoMode::PassthroughCapture) {
        ctx.set_metadata(EXEC_RESULT_KEY, result.clone());
    }

    if matches!(cfg.io_mode, IoMode::Passthrough | IoMode::PassthroughCapture) {
        let mut io = ctx.application.io.lock().unwrap();
        let _ = io.stdout().write_all(&result.stdout);
        let _ = io.stderr().write_all(&result.stderr);
    }
    if let Some(tee) = &cfg.tee_stdout {
        let _ = tee.clone().write_all(&result.stdout);
    }
    if let Some(tee) = &cfg.tee_stderr {
        let _ = tee.clone().write_all(&result.stderr);
    }

    if let Some(hook) = &cfg.after_exec {
        hook(ctx)?;
    }

    match result.status {
        Some(0) | None => Ok(()),
        Some(code) => Err(Box::new(ExitError::new(code)) as ActionError),
    }
}

/// Spawn `binary argv`, route stdin from the parent, and collect both
/// output channels — streaming and capture are both served from the same
/// buffers afterwards rather than two independent live paths, trading true
/// real-time passthrough for a much simpler, deadlock-free implementation.
/// Both capture buffers are drawn from [`crate::pool::buffers`] rather
/// than built fresh, since every wrapper invocation needs one.
fn run_process(cfg: &WrapperConfig, binary: &str, argv: &[String]) -> Result<ExecResult, ActionError> {
    let resolved = if binary == cfg.binary {
        resolve_binary(cfg)
    } else {
        binary.to_string()
    };

    let mut command = StdCommand::new(&resolved);
    command.args(argv);
    if let Some(cwd) = &cfg.cwd {
        command.current_dir(cwd);
    }
    if !cfg.inherit_env {
        command.env_clear();
    }
    for (key, value) in &cfg.env {
        command.env(key, value);
    }
    command.stdin(Stdio::inherit());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| {
        Box::new(CliError::new(
            CliErrorKind::Internal,
            format!("failed to spawn {resolved:?}: {e}"),
        )) as ActionError
    })?;

    let mut child_stdout = child.stdout.take().expect("stdout is piped");
    let mut child_stderr = child.stderr.take().expect("stderr is piped");

    let stdout_reader = std::thread::spawn(move || {
        let mut buf = crate::pool::buffers().get(4096);
        let _ = child_stdout.read_to_end(&mut buf);
        buf
    });
    let mut stderr_buf = crate::pool::buffers().get(4096);
    let _ = child_stderr.read_to_end(&mut stderr_buf);

    let stdout_buf = stdout_reader.join().unwrap_or_default();

    let status = child.wait().map_err(|e| {
        Box::new(CliError::new(
            CliErrorKind::Internal,
            format!("failed to wait on {resolved:?}: {e}"),
        )) as ActionError
    })?;

    Ok(ExecResult {
        stdout: stdout_buf,
        stderr: stderr_buf,
        status: status.code(),
    })
}
