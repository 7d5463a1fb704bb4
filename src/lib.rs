//! A declarative command tree, flag registry and child-process wrapper
//! runtime for building CLI applications: describe commands, flags,
//! positionals and flag groups up front, parse into a typed [`ParseResult`],
//! resolve layered configuration, and dispatch to an action or a
//! declaratively-configured subprocess wrapper.
//!
//! Rendering `--help`/`--version` text, terminal/color detection, shell
//! completion and man-page generation are deliberately outside this crate's
//! scope — it hands back enough structure (a [`error::Outcome`] sentinel,
//! the command tree, [`io::IoManager`]'s capability booleans) for an
//! external renderer to act on.

pub mod action;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod exitcode;
pub mod group;
pub mod intern;
pub mod io;
pub mod model;
pub mod parser;
pub mod pool;
pub mod suggest;
pub mod wrapper;

pub use action::{Action, ActionError, ActionResult, Hook, Middleware};
pub use config::{Bind, FieldSchema, ResolvedConfig, Schema};
pub use context::{Cancellation, ExecutionContext};
pub use error::{CliError, CliErrorKind, Outcome};
pub use exitcode::{DefaultCodes, ExitCodeMapper, ExitError};
pub use model::{Application, Command, Constraint, Flag, FlagGroup, Kind, PositionalArgument, Value};
pub use parser::ParseResult;
pub use wrapper::{FanOut, IoMode, WrapperConfig};

use std::sync::Arc;

/// Run a built [`Application`] against a raw argv slice (typically
/// `std::env::args().skip(1).collect::<Vec<_>>()`), returning the
/// dispatch [`Outcome`]. This is the crate's single top-level entry point;
/// everything else is building the [`Application`] this takes.
pub fn run(app: Arc<Application>, args: &[String]) -> Outcome<ActionError> {
    dispatch::run(app, args)
}
