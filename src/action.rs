//! Action/middleware/hook type aliases shared by [`crate::model`] (which
//! stores them) and [`crate::dispatch`] (which runs them).

use crate::context::ExecutionContext;
use std::sync::Arc;

pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type ActionResult = Result<(), ActionError>;

/// A command's action: the work to run once a command resolves and the
/// parser/group-validator/precedence-resolver have all succeeded.
pub type Action = Arc<dyn Fn(&mut ExecutionContext) -> ActionResult + Send + Sync>;

/// A before/after hook: same shape as an action, run immediately before or
/// after it during dispatch.
pub type Hook = Arc<dyn Fn(&mut ExecutionContext) -> ActionResult + Send + Sync>;

/// Middleware wraps the action that would otherwise run; it receives the
/// context and the next step in the chain and decides whether/when to
/// invoke it.
pub type Middleware =
    Arc<dyn Fn(&mut ExecutionContext, Action) -> ActionResult + Send + Sync>;

/// Fold a list of middleware around a base action, application middleware
/// outermost, command middleware innermost — so application middleware
/// sees the command's middleware as just another link in its `next`.
pub fn compose(app_mw: &[Middleware], cmd_mw: &[Middleware], base: Action) -> Action {
    let mut action = base;
    for mw in cmd_mw.iter().rev() {
        let mw = mw.clone();
        let inner = action.clone();
        action = Arc::new(move |ctx| mw(ctx, inner.clone()));
    }
    for mw in app_mw.iter().rev() {
        let mw = mw.clone();
        let inner = action.clone();
        action = Arc::new(move |ctx| mw(ctx, inner.clone()));
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Application;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn middleware_runs_outermost_application_first() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let app_order = order.clone();
        let cmd_order = order.clone();
        let base_order = order.clone();

        let app_mw: Middleware = Arc::new(move |ctx, next| {
            app_order.lock().unwrap().push("app-before");
            let r = next(ctx);
            app_order.lock().unwrap().push("app-after");
            r
        });
        let cmd_mw: Middleware = Arc::new(move |ctx, next| {
            cmd_order.lock().unwrap().push("cmd-before");
            let r = next(ctx);
            cmd_order.lock().unwrap().push("cmd-after");
            r
        });
        let base: Action = Arc::new(move |_ctx| {
            base_order.lock().unwrap().push("action");
            Ok(())
        });

        let composed = compose(&[app_mw], &[cmd_mw], base);
        let mut ctx = ExecutionContext::new(Arc::new(Application::minimal_for_tests()), None);
        composed(&mut ctx).unwrap();

        let seen = order.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec!["app-before", "cmd-before", "action", "cmd-after", "app-after"]
        );
    }

    #[test]
    fn no_middleware_runs_base_directly() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let base: Action = Arc::new(move |_ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let composed = compose(&[], &[], base);
        let mut ctx = ExecutionContext::new(Arc::new(Application::minimal_for_tests()), None);
        composed(&mut ctx).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
