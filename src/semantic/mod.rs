//! Semantic analysis: symbols, imports, types, diagnostics, and the
//! incremental workspace that ties them together.
//!
//! Stage order per file: symbol building (local declarations), import
//! resolution (workspace dependency graph), then type resolution in
//! dependency order. Every stage returns a best-effort partial result plus
//! diagnostics; nothing here panics on malformed input.

pub mod diagnostics;
pub mod imports;
pub mod symbols;
pub mod types;
pub mod workspace;

pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticStore, RelatedInfo, Severity};
pub use imports::{DependencyGraph, ImportEdge, ImportMap};
pub use symbols::{Symbol, SymbolId, SymbolKind, SymbolTable};
pub use types::{
    FieldDef, FileView, MethodDef, TypeDefinition, TypeKind, TypeReference, TypeRegistry,
    TypeShape,
};
pub use workspace::{FileState, TextEdit, Workspace, WorkspaceError};
