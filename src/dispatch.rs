//! Action dispatch: the eight-step sequence that turns a raw token
//! vector into a finished [`Outcome`] — parse, short-circuit on help/version,
//! resolve configuration, build the execution context, run hooks around the
//! resolved command's middleware-wrapped action (or its wrapper, or the
//! application's default wrapper), and fold the result through the
//! application's [`crate::exitcode::ExitCodeMapper`].

use std::sync::Arc;

use crate::action::{compose, Action, ActionError};
use crate::context::{ExecutionContext, EXIT_REQUEST_KEY};
use crate::error::{CliError, Outcome};
use crate::model::{Application, Command};
use crate::parser::{self, ParseResult};

/// Walk a resolved command path (root to leaf, by name) back down the
/// command tree to recover the `&Command` handles the parser only
/// recorded by name.
fn resolve_path<'a>(app: &'a Application, names: &[String]) -> Vec<&'a Command> {
    let mut path = Vec::with_capacity(names.len());
    let mut iter = names.iter();
    let Some(first) = iter.next() else { return path };
    let Some(mut command) = app.resolve_command(first) else { return path };
    path.push(command);
    for name in iter {
        let Some(next) = command.resolve_subcommand(name) else { break };
        path.push(next);
        command = next;
    }
    path
}

/// Run a full dispatch over `tokens` against `app`. The caller is
/// responsible for turning the returned [`Outcome`] into process exit
/// behavior — rendering help/version text and mapping the error (if any)
/// through `app.exit_codes` are both left to the caller, since this crate
/// explicitly treats help/version rendering as an external contract.
pub fn run(app: Arc<Application>, tokens: &[String]) -> Outcome<ActionError> {
    let parse_result = match parser::parse(&app, tokens) {
        Ok(result) => result,
        Err(err) => return Outcome::Ran(Some(Box::new(err) as ActionError)),
    };

    // Step 1: help/version sentinels short-circuit before anything else
    // runs — no config resolution, no hooks, no action.
    if parse_result.help_requested() {
        return Outcome::HelpShown;
    }
    if parse_result.version_requested() {
        return Outcome::VersionShown;
    }

    // Step 2: configuration resolution, before the execution context (and
    // therefore the action) ever sees a parse result. The resolved config
    // is attached to the execution context below so actions can read it
    // back out by the `"ferrocli.resolved_config"` metadata key.
    let resolved_config = app
        .config_schema
        .as_ref()
        .map(|schema| crate::config::resolve(schema, app.config_file.as_deref(), &parse_result))
        .transpose();
    let resolved_config = match resolved_config {
        Ok(cfg) => cfg,
        Err(err) => return Outcome::Ran(Some(Box::new(err) as ActionError)),
    };

    let command_path = parse_result.command_path.clone();
    let path = resolve_path(&app, &command_path);

    // No command resolved and nothing to fall back to: run the
    // application default wrapper if present, else emit help — same
    // sentinel the `--help` flag itself produces, since there is nothing
    // for hooks or an action to run against.
    if path.is_empty() && app.default_wrapper.is_none() {
        return Outcome::HelpShown;
    }

    // Step 3: execution context build.
    let mut ctx = ExecutionContext::new(app.clone(), Some(parse_result));
    if let Some(cfg) = resolved_config {
        ctx.set_metadata("ferrocli.resolved_config", cfg);
    }

    // Step 4: application before-hook.
    let result = match &app.before_hook {
        Some(hook) => match hook(&mut ctx) {
            Ok(()) => run_command(&app, &path, &mut ctx),
            Err(err) => Err(err),
        },
        None => run_command(&app, &path, &mut ctx),
    };

    let outcome = finish(&app, &mut ctx, result);

    // Hand the parse result back to its pool now that dispatch is done
    // with it; forked per-iteration copies (see `fork_for_binary`) are
    // never drawn from the pool themselves and are simply dropped.
    if let Some(parsed) = ctx.parse_result.take() {
        parsed.discard();
    }

    outcome
}

/// Steps 6–8: an explicit exit-request in the metadata overrides whatever
/// the action returned, the application's after-hook always runs (even on
/// failure, so cleanup hooks see every outcome), and the final error (if
/// any) is handed back to the caller.
fn finish(
    app: &Application,
    ctx: &mut ExecutionContext,
    mut result: Result<(), ActionError>,
) -> Outcome<ActionError> {
    if let Some(code) = ctx.take_metadata::<i32>(EXIT_REQUEST_KEY) {
        result = Err(Box::new(crate::exitcode::ExitError::new(code)) as ActionError);
    }

    if let Some(hook) = &app.after_hook {
        if let Err(err) = hook(ctx) {
            if result.is_ok() {
                result = Err(err);
            }
        }
    }

    Outcome::Ran(result.err())
}

/// Step 5: run whichever of the resolved command's before-hook /
/// middleware-wrapped action or wrapper / after-hook applies, or fall
/// back to the application's default wrapper when no command resolved.
/// The caller has already short-circuited the case where neither a
/// command nor a default wrapper is available.
fn run_command(
    app: &Application,
    path: &[&Command],
    ctx: &mut ExecutionContext,
) -> Result<(), ActionError> {
    let Some(leaf) = path.last().copied() else {
        let wrapper = app.default_wrapper.as_ref().expect("caller guarantees a default wrapper here");
        return crate::wrapper::run(wrapper, ctx);
    };

    if let Some(hook) = &leaf.before_hook {
        hook(ctx)?;
    }

    let outcome = match (&leaf.action, &leaf.wrapper) {
        (Some(action), _) => {
            let composed: Action = compose(&app.middleware, &leaf.middleware, action.clone());
            composed(ctx)
        }
        (None, Some(wrapper)) => crate::wrapper::run(wrapper, ctx),
        (None, None) => Err(Box::new(CliError::new(
            crate::error::CliErrorKind::Validation,
            format!("command {:?} has neither an action nor a wrapper", leaf.name),
        )) as ActionError),
    };

    let outcome = match outcome {
        Ok(()) => {
            if let Some(hook) = &leaf.after_hook {
                hook(ctx)
            } else {
                Ok(())
            }
        }
        Err(err) => {
            // After-hooks still run on failure (cleanup), but the
            // original error wins unless the hook itself errors first.
            if let Some(hook) = &leaf.after_hook {
                if let Err(hook_err) = hook(ctx) {
                    return Err(hook_err);
                }
            }
            Err(err)
        }
    };

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Flag;
    use crate::model::value::Kind;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn help_flag_short_circuits_to_help_shown() {
        let app = Arc::new(Application::new("demo").flag(Flag::new("help", Kind::Bool).short('h')));
        let outcome = run(app, &["--help".to_string()]);
        assert!(matches!(outcome, Outcome::HelpShown));
    }

    #[test]
    fn resolved_command_action_runs() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let app = Arc::new(
            Application::new("demo").command(
                Command::new("build").action(Arc::new(move |_ctx| {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                })),
            ),
        );
        let outcome = run(app, &["build".to_string()]);
        assert!(matches!(outcome, Outcome::Ran(None)));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn missing_command_without_default_wrapper_shows_help() {
        let app = Arc::new(Application::new("demo"));
        let outcome = run(app, &[]);
        assert!(matches!(outcome, Outcome::HelpShown));
    }

    #[test]
    fn action_error_still_runs_after_hook() {
        let hook_ran = Arc::new(AtomicBool::new(false));
        let flag = hook_ran.clone();
        let command = Command::new("fail")
            .action(Arc::new(|_ctx| {
                Err(Box::new(CliError::new(crate::error::CliErrorKind::Internal, "boom")) as ActionError)
            }))
            .after(Arc::new(move |_ctx| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }));
        let app = Arc::new(Application::new("demo").command(command));
        let outcome = run(app, &["fail".to_string()]);
        assert!(matches!(outcome, Outcome::Ran(Some(_))));
        assert!(hook_ran.load(Ordering::SeqCst));
    }
}
