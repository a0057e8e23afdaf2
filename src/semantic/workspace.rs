//! Incremental workspace analyzer.
//!
//! The workspace owns every file's text, AST, symbols, and revision, plus
//! the dependency graph, type registry, and the published diagnostics
//! store. An edit re-parses only the edited file; transitive dependents are
//! re-resolved (not re-parsed) in topological order, and untouched
//! subgraphs keep their results. The invariant this module is tested
//! against: incremental re-analysis produces the same state as a full
//! from-scratch analysis of the same texts.
//!
//! Commits are revision-stamped. Each resolve batch records the revision of
//! every file it read; publication is refused if any stamp is stale by
//! commit time, so results of superseded work are discarded rather than
//! published.

use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use text_size::TextRange;
use thiserror::Error;
use tracing::{debug, warn};

use crate::base::{FileId, LineIndex, Position, Span};
use crate::parser::parse;
use crate::syntax::ast::SourceUnit;

use super::diagnostics::{Diagnostic, DiagnosticStore};
use super::imports::{DependencyGraph, ImportMap};
use super::symbols::{Symbol, SymbolTable};
use super::types::{FileView, TypeDefinition, TypeRegistry};

/// A host-delivered text change: whole-file replacement or a ranged splice.
#[derive(Debug, Clone)]
pub struct TextEdit {
    pub range: Option<TextRange>,
    pub text: String,
}

impl TextEdit {
    /// Replace the entire file content.
    pub fn replace(text: impl Into<String>) -> Self {
        Self {
            range: None,
            text: text.into(),
        }
    }

    /// Splice `text` over a byte range of the current content.
    pub fn splice(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range: Some(range),
            text: text.into(),
        }
    }
}

/// Analysis progress for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Unparsed,
    Parsed,
    SymbolsBuilt,
    Resolved,
}

/// Host contract violations. Never mixed into the diagnostic stream.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("unknown file {0}")]
    UnknownFile(FileId),
    #[error("edit range {range:?} is out of bounds or splits a character in {file}")]
    InvalidRange { file: FileId, range: TextRange },
}

type DiagnosticsListener = Box<dyn Fn(&[FileId]) + Send + Sync>;

struct FileEntry {
    path: String,
    text: String,
    revision: u64,
    state: FileState,
    ast: SourceUnit,
    line_index: LineIndex,
    symbols: SymbolTable,
    syntax_diags: Vec<Diagnostic>,
    symbol_diags: Vec<Diagnostic>,
}

/// Revision stamps for every file a resolve batch read.
struct ResolveBatch {
    stamps: FxHashMap<FileId, u64>,
}

/// The root aggregate: all files plus their derived analysis state.
pub struct Workspace {
    files: FxHashMap<FileId, FileEntry>,
    next_file: u32,
    revision: u64,
    import_map: Arc<dyn ImportMap>,
    graph: DependencyGraph,
    import_diags: FxHashMap<FileId, Vec<Diagnostic>>,
    registry: TypeRegistry,
    type_diags: FxHashMap<FileId, Vec<Diagnostic>>,
    store: RwLock<DiagnosticStore>,
    listeners: Vec<DiagnosticsListener>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Create an empty workspace with the host's import resolution policy.
    pub fn new(import_map: Arc<dyn ImportMap>) -> Self {
        Self {
            files: FxHashMap::default(),
            next_file: 0,
            revision: 0,
            import_map,
            graph: DependencyGraph::default(),
            import_diags: FxHashMap::default(),
            registry: TypeRegistry::new(),
            type_diags: FxHashMap::default(),
            store: RwLock::new(DiagnosticStore::new()),
            listeners: Vec::new(),
        }
    }

    // =========================================================================
    // File registration
    // =========================================================================

    /// Register a file and parse it. Resolution is deferred until
    /// [`Workspace::analyze`] or the next edit, so callers can register a
    /// whole project before the first resolve.
    pub fn insert_source(&mut self, path: impl Into<String>, text: impl Into<String>) -> FileId {
        let file = self.alloc_file(path.into(), text.into());
        self.reparse(file);
        file
    }

    /// Register many files at once; parsing and symbol building run in
    /// parallel since files are independent until resolution.
    pub fn insert_sources(&mut self, sources: Vec<(String, String)>) -> Vec<FileId> {
        let ids: Vec<FileId> = sources
            .iter()
            .map(|(path, text)| self.alloc_file(path.clone(), text.clone()))
            .collect();

        let parsed: Vec<(FileId, ParsedFile)> = ids
            .par_iter()
            .map(|&file| {
                let text = &self.files[&file].text;
                (file, parse_text(file, text))
            })
            .collect();
        for (file, result) in parsed {
            if let Some(entry) = self.files.get_mut(&file) {
                install(entry, result);
            }
        }

        let built: Vec<(FileId, SymbolTable, Vec<Diagnostic>)> = ids
            .par_iter()
            .map(|&file| {
                let entry = &self.files[&file];
                let (symbols, diags) = SymbolTable::build(file, &entry.ast);
                (file, symbols, diags)
            })
            .collect();
        for (file, symbols, diags) in built {
            if let Some(entry) = self.files.get_mut(&file) {
                install_symbols(entry, symbols, diags);
            }
        }
        ids
    }

    fn alloc_file(&mut self, path: String, text: String) -> FileId {
        let file = FileId::new(self.next_file);
        self.next_file += 1;
        self.revision += 1;
        self.files.insert(
            file,
            FileEntry {
                path,
                line_index: LineIndex::new(&text),
                text,
                revision: 1,
                state: FileState::Unparsed,
                ast: SourceUnit::default(),
                symbols: SymbolTable::default(),
                syntax_diags: Vec::new(),
                symbol_diags: Vec::new(),
            },
        );
        file
    }

    // =========================================================================
    // Analysis entry points
    // =========================================================================

    /// Full analysis of every registered file.
    pub fn analyze(&mut self) {
        let affected: FxHashSet<FileId> = self.files.keys().copied().collect();
        debug!(files = affected.len(), "full analysis");
        self.reanalyze(affected);
    }

    /// Apply one edit and re-analyze the affected subset: the edited file is
    /// re-parsed, its transitive dependents are re-resolved only.
    pub fn apply_edit(&mut self, file: FileId, edit: TextEdit) -> Result<(), WorkspaceError> {
        let entry = self
            .files
            .get_mut(&file)
            .ok_or(WorkspaceError::UnknownFile(file))?;

        match edit.range {
            None => entry.text = edit.text,
            Some(range) => {
                let start = usize::from(range.start());
                let end = usize::from(range.end());
                let valid = start <= end
                    && end <= entry.text.len()
                    && entry.text.is_char_boundary(start)
                    && entry.text.is_char_boundary(end);
                if !valid {
                    return Err(WorkspaceError::InvalidRange { file, range });
                }
                entry.text.replace_range(start..end, &edit.text);
            }
        }
        entry.revision += 1;
        entry.state = FileState::Unparsed;
        self.revision += 1;

        // Dependents under the pre-edit graph still matter: a removed import
        // can dissolve a cycle they were part of.
        let mut affected = self.graph.dependents_of(file);
        affected.insert(file);

        self.reparse(file);
        debug!(%file, affected = affected.len(), "incremental re-analysis");
        self.reanalyze(affected);
        Ok(())
    }

    /// Remove a file. Its derived state is retracted and its dependents are
    /// re-resolved against the file's absence.
    pub fn remove_file(&mut self, file: FileId) -> Result<(), WorkspaceError> {
        if !self.files.contains_key(&file) {
            return Err(WorkspaceError::UnknownFile(file));
        }
        let affected = self.graph.dependents_of(file);
        self.files.remove(&file);
        self.registry.retract(file);
        self.type_diags.remove(&file);
        self.import_diags.remove(&file);
        self.revision += 1;

        let removed_had_diags = self.store.write().remove(file);
        debug!(%file, dependents = affected.len(), "file removed");
        self.reanalyze(affected);
        if removed_had_diags {
            self.notify(&[file]);
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Look up a resolved type by fully qualified name.
    pub fn get_type(&self, qualified_name: &str) -> Option<&TypeDefinition> {
        self.registry.get(qualified_name)
    }

    /// The symbol declared or referenced at a position, for navigation.
    /// Positions outside any symbol are a soft miss, not an error.
    pub fn get_symbol_at(
        &self,
        file: FileId,
        position: Position,
    ) -> Result<Option<Symbol>, WorkspaceError> {
        let entry = self
            .files
            .get(&file)
            .ok_or(WorkspaceError::UnknownFile(file))?;
        let Some(offset) = entry.line_index.offset(position) else {
            return Ok(None);
        };

        if let Some(id) = entry.symbols.symbol_at(offset) {
            return Ok(Some(entry.symbols.get(id).clone()));
        }

        // Not a declaration name: try resolved type references
        if let Some(reference) = self.registry.reference_at(file, offset) {
            if let Some(target) = self.files.get(&reference.target_file) {
                if let Some(id) = target.symbols.lookup(&reference.qualified_name) {
                    return Ok(Some(target.symbols.get(id).clone()));
                }
            }
        }
        Ok(None)
    }

    /// Files whose analysis depends, transitively, on `file`.
    pub fn get_dependents(&self, file: FileId) -> Result<FxHashSet<FileId>, WorkspaceError> {
        if !self.files.contains_key(&file) {
            return Err(WorkspaceError::UnknownFile(file));
        }
        Ok(self.graph.dependents_of(file))
    }

    /// Current diagnostics for a file, ordered by span start then stage.
    pub fn get_diagnostics(&self, file: FileId) -> Vec<Diagnostic> {
        self.store.read().get(file).to_vec()
    }

    /// Line/column span for a byte range of a file, against the file's
    /// current revision. Hosts use this to present diagnostic and symbol
    /// ranges.
    pub fn span(&self, file: FileId, range: TextRange) -> Result<Span, WorkspaceError> {
        self.entry(file).map(|e| e.line_index.span(range))
    }

    /// Called with the sorted set of files whose diagnostics changed after
    /// each analysis commit.
    pub fn subscribe(&mut self, listener: impl Fn(&[FileId]) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn files(&self) -> Vec<FileId> {
        let mut ids: Vec<FileId> = self.files.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn contains(&self, file: FileId) -> bool {
        self.files.contains_key(&file)
    }

    pub fn path(&self, file: FileId) -> Result<&str, WorkspaceError> {
        self.entry(file).map(|e| e.path.as_str())
    }

    pub fn text(&self, file: FileId) -> Result<&str, WorkspaceError> {
        self.entry(file).map(|e| e.text.as_str())
    }

    pub fn file_ast(&self, file: FileId) -> Result<&SourceUnit, WorkspaceError> {
        self.entry(file).map(|e| &e.ast)
    }

    pub fn file_state(&self, file: FileId) -> Result<FileState, WorkspaceError> {
        self.entry(file).map(|e| e.state)
    }

    pub fn file_revision(&self, file: FileId) -> Result<u64, WorkspaceError> {
        self.entry(file).map(|e| e.revision)
    }

    /// Workspace-wide revision, bumped on every registration, edit, or
    /// removal.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn entry(&self, file: FileId) -> Result<&FileEntry, WorkspaceError> {
        self.files.get(&file).ok_or(WorkspaceError::UnknownFile(file))
    }

    // =========================================================================
    // Analysis internals
    // =========================================================================

    fn reparse(&mut self, file: FileId) {
        if let Some(entry) = self.files.get_mut(&file) {
            let result = parse_text(file, &entry.text);
            install(entry, result);
            let (symbols, diags) = SymbolTable::build(file, &entry.ast);
            install_symbols(entry, symbols, diags);
        }
    }

    /// Rebuild the graph, re-resolve `affected` in topological order, and
    /// publish. The batch is stamped with the revision of every file read;
    /// a stale stamp at commit time discards the batch.
    fn reanalyze(&mut self, affected: FxHashSet<FileId>) {
        let asts: Vec<(FileId, &SourceUnit)> = {
            let mut ids: Vec<FileId> = self.files.keys().copied().collect();
            ids.sort_unstable();
            ids.iter().map(|&f| (f, &self.files[&f].ast)).collect()
        };
        let (graph, import_diags) = DependencyGraph::build(&asts, &*self.import_map);
        self.graph = graph;
        self.import_diags.clear();
        for diag in import_diags {
            self.import_diags.entry(diag.file).or_default().push(diag);
        }

        // A new import edge can pull new dependents into the affected set
        let mut affected = affected;
        for file in affected.clone() {
            affected.extend(self.graph.dependents_of(file));
        }
        affected.retain(|f| self.files.contains_key(f));

        let batch = self.stamp(&affected);
        let order: Vec<FileId> = self
            .graph
            .resolution_order()
            .into_iter()
            .filter(|f| affected.contains(f))
            .collect();

        {
            let files = &self.files;
            let graph = &self.graph;
            let registry = &mut self.registry;
            let type_diags = &mut self.type_diags;
            // Retract the whole batch up front: layout checks must not see a
            // batch member's definitions from the previous commit before that
            // member has been re-resolved in this pass.
            for &file in &order {
                registry.retract(file);
            }
            for &file in &order {
                let Some(entry) = files.get(&file) else {
                    continue;
                };
                let view = FileView {
                    file,
                    ast: &entry.ast,
                    symbols: &entry.symbols,
                };
                // Import targets were all parsed before resolution started,
                // so their symbol tables are current.
                let views: Vec<FileView<'_>> = graph
                    .imports_of(file)
                    .iter()
                    .filter_map(|edge| {
                        files.get(&edge.target).map(|target| FileView {
                            file: edge.target,
                            ast: &target.ast,
                            symbols: &target.symbols,
                        })
                    })
                    .collect();
                let diags = registry.resolve_file(view, &views);
                type_diags.insert(file, diags);
            }
        }
        for &file in &order {
            if let Some(entry) = self.files.get_mut(&file) {
                entry.state = FileState::Resolved;
            }
        }

        self.commit(&batch);
    }

    fn stamp(&self, affected: &FxHashSet<FileId>) -> ResolveBatch {
        let mut stamps = FxHashMap::default();
        for &file in affected {
            if let Some(entry) = self.files.get(&file) {
                stamps.insert(file, entry.revision);
            }
            for &dep in self.graph.dependencies_of(file) {
                if let Some(entry) = self.files.get(&dep) {
                    stamps.insert(dep, entry.revision);
                }
            }
        }
        ResolveBatch { stamps }
    }

    fn batch_is_current(&self, batch: &ResolveBatch) -> bool {
        batch
            .stamps
            .iter()
            .all(|(file, &revision)| match self.files.get(file) {
                Some(entry) => entry.revision == revision,
                None => false,
            })
    }

    /// Publish the merged per-file diagnostics atomically and notify
    /// listeners with the files that actually changed.
    fn commit(&mut self, batch: &ResolveBatch) {
        if !self.batch_is_current(batch) {
            warn!("discarding resolve batch with stale revision stamps");
            return;
        }

        let mut changed = Vec::new();
        {
            let mut store = self.store.write();
            let mut ids: Vec<FileId> = self.files.keys().copied().collect();
            ids.sort_unstable();
            for file in ids {
                let mut merged = Vec::new();
                if let Some(entry) = self.files.get(&file) {
                    merged.extend(entry.syntax_diags.iter().cloned());
                    merged.extend(entry.symbol_diags.iter().cloned());
                }
                if let Some(diags) = self.import_diags.get(&file) {
                    merged.extend(diags.iter().cloned());
                }
                if let Some(diags) = self.type_diags.get(&file) {
                    merged.extend(diags.iter().cloned());
                }
                if store.replace(file, merged) {
                    changed.push(file);
                }
            }
        }
        if !changed.is_empty() {
            changed.sort_unstable();
            self.notify(&changed);
        }
    }

    fn notify(&self, changed: &[FileId]) {
        for listener in &self.listeners {
            listener(changed);
        }
    }

    #[cfg(test)]
    pub(crate) fn commit_with_stale_stamp(&mut self, file: FileId) -> bool {
        let mut stamps = FxHashMap::default();
        if let Some(entry) = self.files.get(&file) {
            stamps.insert(file, entry.revision + 1);
        }
        let batch = ResolveBatch { stamps };
        let current = self.batch_is_current(&batch);
        self.commit(&batch);
        current
    }
}

struct ParsedFile {
    ast: SourceUnit,
    line_index: LineIndex,
    syntax_diags: Vec<Diagnostic>,
}

fn parse_text(file: FileId, text: &str) -> ParsedFile {
    let result = parse(text);
    let syntax_diags = result
        .errors
        .iter()
        .map(|e| Diagnostic::from_syntax(file, e))
        .collect();
    ParsedFile {
        ast: result.ast,
        line_index: LineIndex::new(text),
        syntax_diags,
    }
}

fn install(entry: &mut FileEntry, parsed: ParsedFile) {
    entry.ast = parsed.ast;
    entry.line_index = parsed.line_index;
    entry.syntax_diags = parsed.syntax_diags;
    entry.state = FileState::Parsed;
}

fn install_symbols(entry: &mut FileEntry, symbols: SymbolTable, diags: Vec<Diagnostic>) {
    entry.symbols = symbols;
    entry.symbol_diags = diags;
    entry.state = FileState::SymbolsBuilt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::diagnostics::DiagnosticCode;
    use parking_lot::Mutex;

    struct MapByModule(Mutex<FxHashMap<String, FileId>>);

    impl MapByModule {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(FxHashMap::default())))
        }

        fn set(&self, path: &str, file: FileId) {
            self.0.lock().insert(path.to_string(), file);
        }
    }

    impl ImportMap for MapByModule {
        fn resolve(&self, path: &str) -> Option<FileId> {
            self.0.lock().get(path).copied()
        }
    }

    #[test]
    fn test_single_file_analysis() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map);
        let file = ws.insert_source("point.ridl", "struct Point { float x; float y; }");
        ws.analyze();
        assert_eq!(ws.file_state(file).unwrap(), FileState::Resolved);
        assert!(ws.get_diagnostics(file).is_empty());
        assert!(ws.get_type("Point").is_some());
    }

    #[test]
    fn test_edit_reparses_only_target() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map.clone());
        let a = ws.insert_source("a.ridl", "module a { struct P { int32 v; } }");
        let b = ws.insert_source("b.ridl", "import a; struct Q { a.P p; }");
        map.set("a", a);
        ws.analyze();
        assert!(ws.get_diagnostics(b).is_empty());

        let rev_b = ws.file_revision(b).unwrap();
        ws.apply_edit(a, TextEdit::replace("module a { struct R { int32 v; } }"))
            .unwrap();
        // b was re-resolved but not re-parsed
        assert_eq!(ws.file_revision(b).unwrap(), rev_b);
        let diags = ws.get_diagnostics(b);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UnresolvedType);
    }

    #[test]
    fn test_typo_edit_adds_one_diagnostic() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map);
        let file = ws.insert_source(
            "s.ridl",
            "struct Point { float x; }\nstruct Line { Point a; void bad; }",
        );
        ws.analyze();
        let before = ws.get_diagnostics(file);
        assert_eq!(before.len(), 1); // the void field

        let text = ws.text(file).unwrap().replace("Point a;", "Pont a;");
        ws.apply_edit(file, TextEdit::replace(text)).unwrap();
        let after = ws.get_diagnostics(file);
        assert_eq!(after.len(), 2);
        assert!(after.iter().any(|d| d.code == DiagnosticCode::UnresolvedType));
        assert!(after.iter().any(|d| d.code == DiagnosticCode::FieldTypeMismatch));
    }

    #[test]
    fn test_ranged_splice() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map);
        let file = ws.insert_source("s.ridl", "struct A { int32 x; }");
        ws.analyze();
        // Replace "A" with "B"
        let offset = ws.text(file).unwrap().find('A').unwrap() as u32;
        let range = TextRange::new(offset.into(), (offset + 1).into());
        ws.apply_edit(file, TextEdit::splice(range, "B")).unwrap();
        assert!(ws.get_type("A").is_none());
        assert!(ws.get_type("B").is_some());
    }

    #[test]
    fn test_invalid_splice_rejected() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map);
        let file = ws.insert_source("s.ridl", "struct A { }");
        let range = TextRange::new(5.into(), 999.into());
        let err = ws.apply_edit(file, TextEdit::splice(range, "x")).unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidRange { .. }));
        // Text unchanged
        assert_eq!(ws.text(file).unwrap(), "struct A { }");
    }

    #[test]
    fn test_unknown_file_is_error_not_diagnostic() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map);
        let missing = FileId::new(42);
        assert!(matches!(
            ws.apply_edit(missing, TextEdit::replace("")),
            Err(WorkspaceError::UnknownFile(_))
        ));
        assert!(matches!(
            ws.get_dependents(missing),
            Err(WorkspaceError::UnknownFile(_))
        ));
    }

    #[test]
    fn test_remove_file_cascades() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map.clone());
        let a = ws.insert_source("a.ridl", "module a { struct P { int32 v; } }");
        let b = ws.insert_source("b.ridl", "import a; struct Q { a.P p; }");
        map.set("a", a);
        ws.analyze();
        assert!(ws.get_diagnostics(b).is_empty());

        ws.remove_file(a).unwrap();
        assert!(!ws.contains(a));
        assert!(ws.get_type("a.P").is_none());
        let diags = ws.get_diagnostics(b);
        assert!(diags.iter().any(|d| d.code == DiagnosticCode::UnresolvedImport));
    }

    #[test]
    fn test_cycle_keeps_local_resolution() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map.clone());
        let x = ws.insert_source("x.ridl", "module x { struct A { int32 v; } } import y;");
        let y = ws.insert_source("y.ridl", "module y { struct B { x.A a; } } import x;");
        map.set("x", x);
        map.set("y", y);
        ws.analyze();

        for file in [x, y] {
            let diags = ws.get_diagnostics(file);
            assert!(
                diags.iter().any(|d| d.code == DiagnosticCode::CyclicImport),
                "{file} missing cycle diagnostic: {diags:?}"
            );
        }
        // Local and cross-file resolution still succeeded
        assert!(ws.get_type("x.A").is_some());
        assert!(ws.get_type("y.B").is_some());
    }

    #[test]
    fn test_subscriber_notified_with_changed_files() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map);
        let seen: Arc<Mutex<Vec<Vec<FileId>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ws.subscribe(move |files| sink.lock().push(files.to_vec()));

        let file = ws.insert_source("s.ridl", "struct A { Missing m; }");
        ws.analyze();
        assert_eq!(seen.lock().last().unwrap(), &vec![file]);

        // Fixing the file changes its diagnostics again
        ws.apply_edit(file, TextEdit::replace("struct A { int32 m; }"))
            .unwrap();
        assert_eq!(seen.lock().len(), 2);

        // A no-op analysis changes nothing and stays silent
        ws.analyze();
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_stale_batch_discarded() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map);
        let file = ws.insert_source("s.ridl", "struct A { }");
        ws.analyze();
        assert!(!ws.commit_with_stale_stamp(file));
    }

    #[test]
    fn test_get_symbol_at_declaration_and_reference() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map);
        let source = "struct Point { float x; }\nstruct Line { Point a; }";
        let file = ws.insert_source("s.ridl", source);
        ws.analyze();

        // On the declaration name
        let decl = ws.get_symbol_at(file, Position::new(0, 8)).unwrap().unwrap();
        assert_eq!(&*decl.qualified_name, "Point");

        // On the reference inside Line's field type
        let reference = ws.get_symbol_at(file, Position::new(1, 15)).unwrap().unwrap();
        assert_eq!(&*reference.qualified_name, "Point");

        // Whitespace resolves to nothing
        assert!(ws.get_symbol_at(file, Position::new(0, 13)).unwrap().is_none());
    }

    #[test]
    fn test_noop_edit_preserves_cycle_layout_diagnostics() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map.clone());
        let x = ws.insert_source("x.ridl", "import y; module x { struct A { y.B b; } }");
        let y = ws.insert_source("y.ridl", "import x; module y { struct B { x.A a; } }");
        map.set("x", x);
        map.set("y", y);
        ws.analyze();

        let codes = |ws: &Workspace| -> Vec<Vec<DiagnosticCode>> {
            [x, y]
                .iter()
                .map(|&f| ws.get_diagnostics(f).iter().map(|d| d.code).collect())
                .collect()
        };
        let before = codes(&ws);
        let layout_count = before
            .iter()
            .flatten()
            .filter(|&&c| c == DiagnosticCode::CyclicLayout)
            .count();
        assert_eq!(layout_count, 1, "{before:?}");

        // Replacing a cycle member with identical text must not change what
        // the other member's layout check can see.
        let text = ws.text(x).unwrap().to_string();
        ws.apply_edit(x, TextEdit::replace(text)).unwrap();
        assert_eq!(codes(&ws), before);
    }

    #[test]
    fn test_file_state_ladder() {
        let source = "struct A { int32 v; }";
        let map = MapByModule::new();
        let mut ws = Workspace::new(map);
        let file = ws.alloc_file("s.ridl".to_string(), source.to_string());
        assert_eq!(ws.file_state(file).unwrap(), FileState::Unparsed);

        let parsed = parse_text(file, source);
        let entry = ws.files.get_mut(&file).unwrap();
        install(entry, parsed);
        assert_eq!(ws.file_state(file).unwrap(), FileState::Parsed);

        let entry = ws.files.get_mut(&file).unwrap();
        let (symbols, diags) = SymbolTable::build(file, &entry.ast);
        install_symbols(entry, symbols, diags);
        assert_eq!(ws.file_state(file).unwrap(), FileState::SymbolsBuilt);

        ws.analyze();
        assert_eq!(ws.file_state(file).unwrap(), FileState::Resolved);
    }

    #[test]
    fn test_span_query_converts_diagnostic_ranges() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map);
        let file = ws.insert_source("s.ridl", "struct A { int32 v; }\nstruct B { void w; }");
        ws.analyze();

        let diags = ws.get_diagnostics(file);
        assert_eq!(diags.len(), 1);
        let span = ws.span(file, diags[0].range).unwrap();
        assert_eq!(span.start.line, 1);
        assert_eq!(span.end.line, 1);
        assert!(span.contains(span.start));

        assert!(matches!(
            ws.span(FileId::new(42), diags[0].range),
            Err(WorkspaceError::UnknownFile(_))
        ));
    }

    #[test]
    fn test_bulk_insert_parses_all() {
        let map = MapByModule::new();
        let mut ws = Workspace::new(map);
        let ids = ws.insert_sources(vec![
            ("a.ridl".to_string(), "struct A { int32 v; }".to_string()),
            ("b.ridl".to_string(), "struct B { float v; }".to_string()),
        ]);
        assert_eq!(ids.len(), 2);
        for id in &ids {
            assert_eq!(ws.file_state(*id).unwrap(), FileState::SymbolsBuilt);
        }
        ws.analyze();
        assert!(ws.get_type("A").is_some());
        assert!(ws.get_type("B").is_some());
    }
}
