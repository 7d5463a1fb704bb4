//! Configuration-precedence resolver: merge defaults, an optional
//! JSON file, environment variables and parsed flags into one resolved
//! view, defaults < file < env < flags.

pub mod resolver;
pub mod schema;
pub mod source;

pub use resolver::{resolve, Bind, ResolvedConfig};
pub use schema::{FieldSchema, Schema};
