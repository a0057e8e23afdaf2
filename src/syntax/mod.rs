//! Syntax: owned AST types and the round-trip printer.
//!
//! AST nodes carry byte ranges for diagnostics and navigation. Nodes are
//! recreated wholesale when a file is re-parsed; no node identity persists
//! across edits.

pub mod ast;
pub mod printer;

pub use ast::*;
pub use printer::print;
