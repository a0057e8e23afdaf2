//! Workspace discovery: loading `.ridl` files from a directory tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::base::FileId;
use crate::semantic::imports::ImportMap;
use crate::semantic::workspace::Workspace;
use crate::syntax::ast::{Item, SourceUnit};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("workspace root `{0}` is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The shipped import-path convention: `import a.b;` resolves to the file
/// that declares module `a.b`.
///
/// The map is shared between the loader (writer) and the workspace
/// (reader); interior locking keeps the `ImportMap` contract a plain `&self`
/// call.
#[derive(Debug, Default)]
pub struct ModulePathMap {
    map: RwLock<FxHashMap<String, FileId>>,
}

impl ModulePathMap {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, module_path: impl Into<String>, file: FileId) {
        self.map.write().insert(module_path.into(), file);
    }

    /// Register every module path a file declares, including nested ones
    /// (`module a { module b { } }` registers both `a` and `a.b`).
    pub fn record_modules(&self, file: FileId, unit: &SourceUnit) {
        fn walk(items: &[Item], prefix: &str, file: FileId, map: &ModulePathMap) {
            for item in items {
                if let Item::Module(module) = item {
                    let path = if prefix.is_empty() {
                        module.name.as_str().to_string()
                    } else {
                        format!("{prefix}.{}", module.name.as_str())
                    };
                    map.insert(path.clone(), file);
                    walk(&module.items, &path, file, map);
                }
            }
        }
        walk(&unit.items, "", file, self);
    }

    pub fn remove_file(&self, file: FileId) {
        self.map.write().retain(|_, &mut f| f != file);
    }
}

impl ImportMap for ModulePathMap {
    fn resolve(&self, path: &str) -> Option<FileId> {
        self.map.read().get(path).copied()
    }
}

/// Discover all `.ridl` files under `root`, load them into a workspace, and
/// run the initial analysis. Files are visited in sorted path order so
/// FileId assignment is deterministic.
pub fn load_directory(root: &Path) -> Result<(Workspace, Arc<ModulePathMap>), ProjectError> {
    if !root.is_dir() {
        return Err(ProjectError::NotADirectory(root.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "ridl")
        })
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(&path).map_err(|source| ProjectError::Io {
            path: path.clone(),
            source,
        })?;
        sources.push((path.to_string_lossy().into_owned(), text));
    }

    let map = ModulePathMap::new();
    let mut workspace = Workspace::new(map.clone());
    let ids = workspace.insert_sources(sources);
    for &file in &ids {
        if let Ok(ast) = workspace.file_ast(file) {
            map.record_modules(file, ast);
        }
    }
    workspace.analyze();
    debug!(files = ids.len(), root = %root.display(), "project loaded");
    Ok((workspace, map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_record_nested_module_paths() {
        let map = ModulePathMap::new();
        let file = FileId::new(3);
        let ast = parse("module a { module b { struct S { int32 v; } } } module c { }").ast;
        map.record_modules(file, &ast);
        assert_eq!(map.resolve("a"), Some(file));
        assert_eq!(map.resolve("a.b"), Some(file));
        assert_eq!(map.resolve("c"), Some(file));
        assert_eq!(map.resolve("a.b.S"), None);
    }

    #[test]
    fn test_remove_file_clears_entries() {
        let map = ModulePathMap::new();
        map.insert("a", FileId::new(0));
        map.insert("b", FileId::new(1));
        map.remove_file(FileId::new(0));
        assert_eq!(map.resolve("a"), None);
        assert_eq!(map.resolve("b"), Some(FileId::new(1)));
    }

    #[test]
    fn test_load_directory_rejects_missing_root() {
        let err = load_directory(Path::new("/nonexistent/ridl/project")).unwrap_err();
        assert!(matches!(err, ProjectError::NotADirectory(_)));
    }
}
