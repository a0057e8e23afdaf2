//! # ridl-base
//!
//! Core library for RIDL (an interface definition language) parsing, AST,
//! and semantic analysis. Turns IDL text spread across many interdependent
//! files into a consistent, queryable type model kept accurate across
//! edits, fast enough to back live diagnostics and navigation in an editor.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project   → Workspace discovery, import-path policy
//!   ↓
//! semantic  → Symbols, import graph, type registry, incremental workspace
//!   ↓
//! syntax    → AST types, round-trip printer
//!   ↓
//! parser    → Logos lexer, recursive-descent parser, syntax errors
//!   ↓
//! base      → Primitives (FileId, Position, Span, LineIndex)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → semantic → project)
// ============================================================================

/// Foundation types: FileId, Position, Span, LineIndex
pub mod base;

/// Parser: Logos lexer, recursive-descent parser, syntax errors
pub mod parser;

/// Syntax: AST types and the round-trip printer
pub mod syntax;

/// Semantic analysis: symbols, imports, types, diagnostics, workspace
pub mod semantic;

/// Project management: workspace discovery
pub mod project;

// Re-export foundation types
pub use base::{FileId, LineIndex, Position, Span};

// Re-export the primary entry points
pub use parser::{parse, tokenize, ParseResult};
pub use semantic::{
    Diagnostic, DiagnosticCode, ImportMap, Symbol, SymbolKind, TextEdit, TypeDefinition,
    TypeReference, Workspace, WorkspaceError,
};
