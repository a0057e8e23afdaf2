//! Shared helpers for integration tests.
#![allow(dead_code)]

pub mod source_fixtures;

use std::sync::Arc;

use ridl::base::FileId;
use ridl::project::ModulePathMap;
use ridl::semantic::{Diagnostic, DiagnosticCode, Workspace};

/// Build a workspace from sources using the module-path import convention,
/// and run the initial analysis.
pub fn workspace_from(sources: &[&str]) -> (Workspace, Vec<FileId>, Arc<ModulePathMap>) {
    let map = ModulePathMap::new();
    let mut workspace = Workspace::new(map.clone());
    let files = workspace.insert_sources(
        sources
            .iter()
            .enumerate()
            .map(|(i, text)| (format!("f{i}.ridl"), text.to_string()))
            .collect(),
    );
    for &file in &files {
        let ast = workspace.file_ast(file).unwrap();
        map.record_modules(file, ast);
    }
    workspace.analyze();
    (workspace, files, map)
}

/// All diagnostics of a workspace, keyed by file in registration order.
pub fn all_diagnostics(workspace: &Workspace, files: &[FileId]) -> Vec<Vec<Diagnostic>> {
    files
        .iter()
        .map(|&f| workspace.get_diagnostics(f))
        .collect()
}

pub fn codes_of(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
    diagnostics.iter().map(|d| d.code).collect()
}

pub fn assert_has_code(diagnostics: &[Diagnostic], code: DiagnosticCode) {
    assert!(
        diagnostics.iter().any(|d| d.code == code),
        "expected {code} in {diagnostics:?}"
    );
}

pub fn count_code(diagnostics: &[Diagnostic], code: DiagnosticCode) -> usize {
    diagnostics.iter().filter(|d| d.code == code).count()
}

/// Assert the incremental state equals a from-scratch analysis of the same
/// texts: same diagnostics per file and same resolved type definitions.
pub fn assert_matches_from_scratch(workspace: &Workspace, files: &[FileId]) {
    let sources: Vec<&str> = files.iter().map(|&f| workspace.text(f).unwrap()).collect();
    let (fresh, fresh_files, _) = workspace_from(&sources);
    assert_eq!(files.len(), fresh_files.len());

    for (&old, &new) in files.iter().zip(&fresh_files) {
        assert_eq!(
            workspace.get_diagnostics(old),
            fresh.get_diagnostics(new),
            "diagnostics diverged for {old}"
        );
        let old_types: Vec<String> = type_names(workspace, old);
        let new_types: Vec<String> = type_names(&fresh, new);
        assert_eq!(old_types, new_types, "type set diverged for {old}");
        for name in &old_types {
            assert_eq!(
                workspace.get_type(name),
                fresh.get_type(name),
                "definition of `{name}` diverged"
            );
        }
    }
}

fn type_names(workspace: &Workspace, file: FileId) -> Vec<String> {
    use ridl::semantic::SymbolTable;
    // Recover declared type names from a fresh symbol walk of the AST
    let ast = workspace.file_ast(file).unwrap();
    let (symbols, _) = SymbolTable::build(file, ast);
    symbols
        .symbols()
        .filter(|(_, s)| s.kind.is_type())
        .map(|(_, s)| s.qualified_name.to_string())
        .collect()
}
