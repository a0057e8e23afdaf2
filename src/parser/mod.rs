//! Parser: lexing, recursive descent parsing, and syntax errors.
//!
//! The pipeline is text -> tokens ([`tokenize`]) -> AST ([`parse`]). Lexing
//! is total: malformed input becomes recovery tokens rather than failures,
//! and the parser turns those into diagnostics.

pub mod errors;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod token_kind;

pub use errors::{ErrorCode, Severity, SyntaxError};
pub use lexer::{tokenize, Lexer, Token};
pub use parser::{parse, ParseResult};
pub use token_kind::TokenKind;
