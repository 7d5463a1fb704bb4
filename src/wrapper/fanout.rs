//! Sequential/parallel fan-out over a list of binaries.
//!
//! Parallel mode uses `std::thread::scope` rather than a thread-pool crate:
//! nothing in the pack pulls in `rayon`/`tokio` for this kind of bounded,
//! short-lived fan-out, and scoped threads let each iteration borrow the
//! shared [`WrapperConfig`] without an `Arc` wrapper.

use crate::action::ActionError;
use crate::context::ExecutionContext;

use super::exec;
use super::WrapperConfig;

#[derive(Clone)]
pub struct FanOut {
    pub binaries: Vec<String>,
    pub parallel: bool,
    pub stop_on_error: bool,
}

impl FanOut {
    pub fn new(binaries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        FanOut {
            binaries: binaries.into_iter().map(Into::into).collect(),
            parallel: false,
            stop_on_error: true,
        }
    }

    #[must_use]
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    #[must_use]
    pub fn continue_on_error(mut self) -> Self {
        self.stop_on_error = false;
        self
    }
}

/// Run `cfg` once per binary in its `fanout` list, honoring sequential vs
/// parallel mode and the stop-on-error flag. Each iteration gets its own
/// forked [`ExecutionContext`], cloned per iteration so the
/// current-binary field is not shared.
pub fn run(cfg: &WrapperConfig, ctx: &mut ExecutionContext) -> Result<(), ActionError> {
    let fanout = cfg.fanout.as_ref().expect("run is only called when fanout is configured");

    ctx.all_binaries = fanout.binaries.clone();

    if fanout.parallel {
        run_parallel(cfg, ctx, fanout)
    } else {
        run_sequential(cfg, ctx, fanout)
    }
}

/// Run one fan-out iteration. Before/after-exec hooks are the wrapper's
/// own `cfg.before_exec`/`cfg.after_exec` — [`exec::execute`] invokes them,
/// so this just needs to point `binary` at the current iteration's target
/// before delegating.
fn run_one(cfg: &WrapperConfig, ctx: &mut ExecutionContext) -> Result<(), ActionError> {
    let mut per_binary = cfg.clone();
    per_binary.binary = ctx.current_binary.clone().unwrap_or_else(|| cfg.binary.clone());
    per_binary.fanout = None;
    exec::execute(&per_binary, ctx)
}

fn run_sequential(cfg: &WrapperConfig, ctx: &mut ExecutionContext, fanout: &FanOut) -> Result<(), ActionError> {
    for binary in &fanout.binaries {
        let mut iter_ctx = ctx.fork_for_binary(binary);
        if let Err(e) = run_one(cfg, &mut iter_ctx) {
            if fanout.stop_on_error {
                return Err(e);
            }
            // suppressed: continue-on-error mode aggregates by dropping the error
        }
    }
    Ok(())
}

fn run_parallel(cfg: &WrapperConfig, ctx: &ExecutionContext, fanout: &FanOut) -> Result<(), ActionError> {
    let results: Vec<Result<(), ActionError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = fanout
            .binaries
            .iter()
            .map(|binary| {
                let mut iter_ctx = ctx.fork_for_binary(binary);
                scope.spawn(move || run_one(cfg, &mut iter_ctx))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| {
                Err(Box::new(crate::error::CliError::new(
                    crate::error::CliErrorKind::Internal,
                    "fan-out worker panicked",
                )) as ActionError)
            }))
            .collect()
    });

    if fanout.stop_on_error {
        for r in results {
            r?;
        }
        Ok(())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Application;
    use std::sync::Arc;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(Arc::new(Application::minimal_for_tests()), None)
    }

    #[test]
    fn sequential_stop_on_error_halts_after_first_failure() {
        let cfg = WrapperConfig::new("true")
            .fanout(FanOut::new(["true", "false", "true"]));
        let mut context = ctx();
        let result = run(&cfg, &mut context);
        assert!(result.is_err());
    }

    #[test]
    fn sequential_continue_on_error_runs_every_binary() {
        let cfg = WrapperConfig::new("true")
            .fanout(FanOut::new(["true", "false", "true"]).continue_on_error());
        let mut context = ctx();
        let result = run(&cfg, &mut context);
        assert!(result.is_ok());
    }

    #[test]
    fn parallel_stop_on_error_surfaces_the_failure() {
        let cfg = WrapperConfig::new("true")
            .fanout(FanOut::new(["true", "false", "true"]).parallel());
        let mut context = ctx();
        let result = run(&cfg, &mut context);
        assert!(result.is_err());
    }

    #[test]
    fn parallel_continue_on_error_runs_every_binary() {
        let cfg = WrapperConfig::new("true")
            .fanout(FanOut::new(["true", "false", "true"]).parallel().continue_on_error());
        let mut context = ctx();
        let result = run(&cfg, &mut context);
        assert!(result.is_ok());
    }
}
