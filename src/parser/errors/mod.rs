//! Syntax error types for the RIDL parser.

mod codes;
mod error;

pub use codes::ErrorCode;
pub use error::{Severity, SyntaxError};
