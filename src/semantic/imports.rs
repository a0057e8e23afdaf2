//! Import resolution and the workspace dependency graph.
//!
//! How a declared import path maps to a file is host policy, injected as an
//! [`ImportMap`]. The graph is rebuilt from the current ASTs on each commit;
//! unresolvable imports are diagnosed and left out of the graph (absent, not
//! cyclic). Cycle detection is an iterative depth-first walk with
//! white/grey/black coloring; every file on a cycle gets exactly one
//! `cyclic-import` diagnostic naming a representative cycle path.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};
use text_size::TextRange;
use tracing::trace;

use crate::base::FileId;
use crate::syntax::ast::{ImportDecl, Item, SourceUnit};

use super::diagnostics::{Diagnostic, DiagnosticCode};

/// Host policy mapping a declared import path to a file.
pub trait ImportMap: Send + Sync {
    fn resolve(&self, path: &str) -> Option<FileId>;
}

/// An import that resolved to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEdge {
    pub path: String,
    pub range: TextRange,
    pub target: FileId,
}

/// The workspace import graph: which file depends on which.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// All files, sorted, for deterministic traversal.
    files: Vec<FileId>,
    /// Resolved imports per file, in declaration order.
    imports: FxHashMap<FileId, Vec<ImportEdge>>,
    /// Deduplicated dependency edges per file.
    edges: FxHashMap<FileId, Vec<FileId>>,
    /// Reverse edges: target -> importers.
    reverse: FxHashMap<FileId, Vec<FileId>>,
    /// Files on at least one cycle, with a representative cycle path
    /// starting and ending at the file itself.
    cycles: FxHashMap<FileId, Vec<FileId>>,
}

impl DependencyGraph {
    /// Build the graph from every file's import declarations.
    pub fn build(
        files: &[(FileId, &SourceUnit)],
        map: &dyn ImportMap,
    ) -> (DependencyGraph, Vec<Diagnostic>) {
        let mut graph = DependencyGraph {
            files: files.iter().map(|(f, _)| *f).collect(),
            ..DependencyGraph::default()
        };
        graph.files.sort_unstable_by_key(|f| f.0);
        let known: FxHashSet<FileId> = graph.files.iter().copied().collect();

        let mut diagnostics = Vec::new();
        for &(file, unit) in files {
            let mut resolved = Vec::new();
            let mut targets = Vec::new();
            for import in collect_imports(unit) {
                let path = import.path_text();
                match map.resolve(&path).filter(|t| known.contains(t)) {
                    Some(target) => {
                        resolved.push(ImportEdge {
                            path,
                            range: import.range,
                            target,
                        });
                        targets.push(target);
                    }
                    None => {
                        diagnostics.push(Diagnostic::error(
                            file,
                            import.range,
                            DiagnosticCode::UnresolvedImport,
                            format!("cannot resolve import `{path}`"),
                        ));
                    }
                }
            }
            targets.sort_unstable_by_key(|f| f.0);
            targets.dedup();
            for &target in &targets {
                graph.reverse.entry(target).or_default().push(file);
            }
            graph.edges.insert(file, targets);
            graph.imports.insert(file, resolved);
        }

        graph.detect_cycles();
        for &file in &graph.files {
            if let Some(cycle) = graph.cycles.get(&file) {
                let path_names: Vec<String> = cycle.iter().map(|f| f.to_string()).collect();
                // Point at the import that continues the cycle
                let range = graph
                    .imports
                    .get(&file)
                    .and_then(|imports| {
                        imports
                            .iter()
                            .find(|e| cycle.get(1) == Some(&e.target))
                            .map(|e| e.range)
                    })
                    .unwrap_or_else(|| TextRange::empty(0.into()));
                diagnostics.push(Diagnostic::error(
                    file,
                    range,
                    DiagnosticCode::CyclicImport,
                    format!("import cycle: {}", path_names.join(" -> ")),
                ));
            }
        }

        trace!(
            files = graph.files.len(),
            cyclic = graph.cycles.len(),
            "dependency graph built"
        );
        (graph, diagnostics)
    }

    /// Direct dependencies of a file.
    pub fn dependencies_of(&self, file: FileId) -> &[FileId] {
        self.edges.get(&file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolved imports of a file, in declaration order.
    pub fn imports_of(&self, file: FileId) -> &[ImportEdge] {
        self.imports.get(&file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn in_cycle(&self, file: FileId) -> bool {
        self.cycles.contains_key(&file)
    }

    /// Transitive reverse reachability: every file whose analysis can be
    /// affected by a change to `file`. Does not include `file` itself.
    pub fn dependents_of(&self, file: FileId) -> FxHashSet<FileId> {
        let mut seen = FxHashSet::default();
        let mut queue = vec![file];
        while let Some(current) = queue.pop() {
            if let Some(importers) = self.reverse.get(&current) {
                for &importer in importers {
                    if importer != file && seen.insert(importer) {
                        queue.push(importer);
                    }
                }
            }
        }
        seen
    }

    /// Topological order of the acyclic portion (dependencies before
    /// dependents); files stuck behind a cycle are appended in FileId order
    /// so resolution never blocks.
    pub fn resolution_order(&self) -> Vec<FileId> {
        let mut remaining: FxHashMap<FileId, usize> = self
            .files
            .iter()
            .map(|&f| (f, self.dependencies_of(f).len()))
            .collect();

        let mut ready: BinaryHeap<Reverse<FileId>> = self
            .files
            .iter()
            .filter(|&&f| remaining[&f] == 0)
            .map(|&f| Reverse(f))
            .collect();

        let mut order = Vec::with_capacity(self.files.len());
        let mut emitted = FxHashSet::default();
        while let Some(Reverse(file)) = ready.pop() {
            order.push(file);
            emitted.insert(file);
            if let Some(importers) = self.reverse.get(&file) {
                for &importer in importers {
                    if let Some(count) = remaining.get_mut(&importer) {
                        *count = count.saturating_sub(1);
                        if *count == 0 && !emitted.contains(&importer) {
                            ready.push(Reverse(importer));
                        }
                    }
                }
            }
        }

        // Cyclic files and anything downstream of them, fixed fallback order
        for &file in &self.files {
            if !emitted.contains(&file) {
                order.push(file);
            }
        }
        order
    }

    fn detect_cycles(&mut self) {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Grey,
            Black,
        }

        let mut color: FxHashMap<FileId, Color> =
            self.files.iter().map(|&f| (f, Color::White)).collect();

        for &root in &self.files {
            if color[&root] != Color::White {
                continue;
            }
            // (node, next dependency index)
            let mut stack: Vec<(FileId, usize)> = vec![(root, 0)];
            let mut path: Vec<FileId> = vec![root];
            color.insert(root, Color::Grey);

            while let Some(&mut (node, ref mut index)) = stack.last_mut() {
                let deps = self.edges.get(&node).map(Vec::as_slice).unwrap_or(&[]);
                if *index < deps.len() {
                    let next = deps[*index];
                    *index += 1;
                    match color.get(&next).copied().unwrap_or(Color::Black) {
                        Color::White => {
                            color.insert(next, Color::Grey);
                            stack.push((next, 0));
                            path.push(next);
                        }
                        Color::Grey => {
                            // Back edge: path from `next` to the top is a cycle
                            let pos = path.iter().position(|&f| f == next).unwrap_or(0);
                            let cycle = &path[pos..];
                            for (i, &member) in cycle.iter().enumerate() {
                                self.cycles.entry(member).or_insert_with(|| {
                                    let mut rep: Vec<FileId> = cycle[i..].to_vec();
                                    rep.extend_from_slice(&cycle[..i]);
                                    rep.push(member);
                                    rep
                                });
                            }
                        }
                        Color::Black => {}
                    }
                } else {
                    color.insert(node, Color::Black);
                    stack.pop();
                    path.pop();
                }
            }
        }
    }
}

/// Imports can appear at the top level or inside modules.
fn collect_imports(unit: &SourceUnit) -> Vec<&ImportDecl> {
    fn walk<'a>(items: &'a [Item], out: &mut Vec<&'a ImportDecl>) {
        for item in items {
            match item {
                Item::Import(import) => out.push(import),
                Item::Module(module) => walk(&module.items, out),
                _ => {}
            }
        }
    }
    let mut imports = Vec::new();
    walk(&unit.items, &mut imports);
    imports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    struct TestMap(FxHashMap<String, FileId>);

    impl TestMap {
        fn new(entries: &[(&str, u32)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|&(p, f)| (p.to_string(), FileId::new(f)))
                    .collect(),
            )
        }
    }

    impl ImportMap for TestMap {
        fn resolve(&self, path: &str) -> Option<FileId> {
            self.0.get(path).copied()
        }
    }

    fn graph_of(
        sources: &[&str],
        map: &dyn ImportMap,
    ) -> (DependencyGraph, Vec<Diagnostic>) {
        let parsed: Vec<_> = sources.iter().map(|s| parse(s).ast).collect();
        let files: Vec<_> = parsed
            .iter()
            .enumerate()
            .map(|(i, ast)| (FileId::new(i as u32), ast))
            .collect();
        DependencyGraph::build(&files, map)
    }

    #[test]
    fn test_unresolved_import_diagnosed_and_omitted() {
        let map = TestMap::new(&[]);
        let (graph, diags) = graph_of(&["import missing.mod;"], &map);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UnresolvedImport);
        assert!(graph.dependencies_of(FileId::new(0)).is_empty());
    }

    #[test]
    fn test_two_file_cycle_flags_both_once() {
        let map = TestMap::new(&[("a", 0), ("b", 1)]);
        let (graph, diags) = graph_of(
            &["module a { } import b;", "module b { } import a;"],
            &map,
        );
        let cyclic: Vec<_> = diags
            .iter()
            .filter(|d| d.code == DiagnosticCode::CyclicImport)
            .collect();
        assert_eq!(cyclic.len(), 2);
        assert!(graph.in_cycle(FileId::new(0)));
        assert!(graph.in_cycle(FileId::new(1)));
        // Representative path starts and ends at the diagnosed file
        assert!(cyclic[0].message.contains("->"));
    }

    #[test]
    fn test_acyclic_chain_not_flagged() {
        let map = TestMap::new(&[("a", 0), ("b", 1)]);
        let (graph, diags) = graph_of(
            &["module a { }", "module b { } import a;", "import b;"],
            &map,
        );
        assert!(diags.is_empty());
        assert!(!graph.in_cycle(FileId::new(1)));
    }

    #[test]
    fn test_resolution_order_dependencies_first() {
        let map = TestMap::new(&[("a", 0), ("b", 1)]);
        let (graph, _) = graph_of(
            &["module a { }", "module b { } import a;", "import b;"],
            &map,
        );
        let order = graph.resolution_order();
        let pos = |f: u32| order.iter().position(|&x| x == FileId::new(f)).unwrap();
        assert!(pos(0) < pos(1));
        assert!(pos(1) < pos(2));
    }

    #[test]
    fn test_cyclic_files_still_ordered() {
        let map = TestMap::new(&[("a", 0), ("b", 1)]);
        let (graph, _) = graph_of(
            &["module a { } import b;", "module b { } import a;"],
            &map,
        );
        let order = graph.resolution_order();
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_dependents_transitive() {
        let map = TestMap::new(&[("a", 0), ("b", 1)]);
        let (graph, _) = graph_of(
            &["module a { }", "module b { } import a;", "import b;"],
            &map,
        );
        let dependents = graph.dependents_of(FileId::new(0));
        assert!(dependents.contains(&FileId::new(1)));
        assert!(dependents.contains(&FileId::new(2)));
        assert!(!dependents.contains(&FileId::new(0)));
    }

    #[test]
    fn test_nested_imports_collected() {
        let map = TestMap::new(&[("a", 0)]);
        let (graph, diags) = graph_of(&["module a { }", "module x { import a; }"], &map);
        assert!(diags.is_empty());
        assert_eq!(graph.dependencies_of(FileId::new(1)), &[FileId::new(0)]);
    }

    #[test]
    fn test_self_import_is_a_cycle() {
        let map = TestMap::new(&[("a", 0)]);
        let (graph, diags) = graph_of(&["module a { } import a;"], &map);
        assert!(graph.in_cycle(FileId::new(0)));
        assert_eq!(
            diags
                .iter()
                .filter(|d| d.code == DiagnosticCode::CyclicImport)
                .count(),
            1
        );
    }
}
