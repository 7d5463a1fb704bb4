//! Cancellable execution context.
//!
//! Carries everything an action, middleware, or the wrapper runtime needs:
//! the application handle, the parse result, a cancellation handle, a
//! metadata map, and — for fan-out wrapper iterations — the binary
//! currently executing plus the full list. No hidden globals: everything
//! middleware reads comes off this struct.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::model::Application;
use crate::parser::ParseResult;

/// A shareable cancellation flag. Cloning it shares the same underlying
/// flag; cancelling any clone cancels every clone. Fan-out iterations get
/// their own sub-handle (a fresh `Cancellation` chained to the parent) so
/// the current-binary field on each cloned context can be cancelled
/// independently while cancelling the parent still cancels every child.
#[derive(Clone)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<Cancellation>>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Cancellation {
            flag: Arc::new(AtomicBool::new(false)),
            parent: None,
        }
    }
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        Cancellation {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self
                .parent
                .as_ref()
                .is_some_and(|p| p.is_cancelled())
    }
}

/// Metadata key the wrapper runtime stores its [`crate::wrapper::ExecResult`]
/// under.
pub const EXEC_RESULT_KEY: &str = "ferrocli.wrapper.exec_result";

/// Metadata key the dispatcher checks after the action runs: if the
/// context metadata contains an explicit exit request, that replaces the
/// action result.
pub const EXIT_REQUEST_KEY: &str = "ferrocli.exit_request";

/// One action/wrapper invocation's worth of shared state.
pub struct ExecutionContext {
    pub application: Arc<Application>,
    pub parse_result: Option<ParseResult>,
    pub cancellation: Cancellation,
    pub parent: Option<Box<ExecutionContext>>,
    pub metadata: HashMap<String, Box<dyn Any + Send + Sync>>,
    /// The binary currently executing, set only during a wrapper fan-out
    /// iteration.
    pub current_binary: Option<String>,
    /// The full fan-out binary list, set whenever a fan-out wrapper runs,
    /// even before/after any individual binary.
    pub all_binaries: Vec<String>,
}

impl ExecutionContext {
    pub fn new(application: Arc<Application>, parse_result: Option<ParseResult>) -> Self {
        ExecutionContext {
            application,
            parse_result,
            cancellation: Cancellation::new(),
            parent: None,
            metadata: HashMap::new(),
            current_binary: None,
            all_binaries: Vec::new(),
        }
    }

    /// Clone the per-iteration state a parallel fan-out needs: a fresh
    /// cancellation sub-handle (so an individual binary's iteration doesn't
    /// cancel its siblings) and this context as parent, so the
    /// current-binary field is not shared across iterations.
    pub fn fork_for_binary(&self, binary: &str) -> Self {
        ExecutionContext {
            application: self.application.clone(),
            parse_result: self.parse_result.clone(),
            cancellation: self.cancellation.child(),
            parent: None,
            metadata: HashMap::new(),
            current_binary: Some(binary.to_string()),
            all_binaries: self.all_binaries.clone(),
        }
    }

    pub fn set_metadata<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.metadata.insert(key.into(), Box::new(value));
    }

    pub fn metadata<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.metadata.get(key).and_then(|v| v.downcast_ref())
    }

    pub fn take_metadata<T: Any + Send + Sync>(&mut self, key: &str) -> Option<T> {
        self.metadata
            .remove(key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|b| *b)
    }
}
