//! Symbol table: per-file declared names with qualified-name indexing.
//!
//! The builder walks one file's AST and records every declared name in an
//! arena. Nested modules form a tree; qualified names are the dot-joined
//! ancestor module names plus the declaration name. Duplicate names in the
//! same scope are all recorded (later stages still see both declarations)
//! and the second and later occurrences carry a `duplicate-symbol`
//! diagnostic pointing back at the first.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::base::FileId;
use crate::syntax::ast::{Item, SourceUnit};

use super::diagnostics::{Diagnostic, DiagnosticCode};

/// Unique identifier for a symbol in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The closed set of declaration kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Module,
    Struct,
    Enum,
    EnumMember,
    Union,
    Service,
    Field,
    Method,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Module => "module",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::EnumMember => "enum member",
            SymbolKind::Union => "union",
            SymbolKind::Service => "service",
            SymbolKind::Field => "field",
            SymbolKind::Method => "method",
        }
    }

    /// Kinds a type reference may resolve to.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            SymbolKind::Struct | SymbolKind::Enum | SymbolKind::Union | SymbolKind::Service
        )
    }
}

/// A declared name in one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: SmolStr,
    /// Dot-joined ancestor names plus `name`.
    pub qualified_name: SmolStr,
    pub kind: SymbolKind,
    pub file: FileId,
    /// Range of the declared name itself.
    pub name_range: TextRange,
    /// Range of the whole declaration.
    pub decl_range: TextRange,
    /// `///` text attached to the declaration.
    pub doc: Option<String>,
}

/// All symbols declared in one file.
#[derive(Debug, Default)]
pub struct SymbolTable {
    arena: Vec<Symbol>,
    by_qname: FxHashMap<SmolStr, SymbolId>,
}

impl SymbolTable {
    /// Walk a file's AST and collect its declarations.
    pub fn build(file: FileId, unit: &SourceUnit) -> (SymbolTable, Vec<Diagnostic>) {
        let mut builder = Builder {
            file,
            table: SymbolTable::default(),
            diagnostics: Vec::new(),
            module_path: Vec::new(),
        };
        builder.items(&unit.items);
        (builder.table, builder.diagnostics)
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.arena[id.index()]
    }

    /// First declaration with this qualified name, if any.
    pub fn lookup(&self, qualified_name: &str) -> Option<SymbolId> {
        self.by_qname.get(qualified_name).copied()
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.arena
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId::new(i), s))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Innermost symbol whose declared name contains `offset`.
    pub fn symbol_at(&self, offset: TextSize) -> Option<SymbolId> {
        self.arena
            .iter()
            .enumerate()
            .filter(|(_, s)| s.name_range.contains(offset))
            .min_by_key(|(_, s)| s.name_range.len())
            .map(|(i, _)| SymbolId::new(i))
    }

    fn insert(&mut self, symbol: Symbol) -> (SymbolId, Option<SymbolId>) {
        let id = SymbolId::new(self.arena.len());
        let first = match self.by_qname.get(&*symbol.qualified_name) {
            Some(&existing) => Some(existing),
            None => {
                self.by_qname.insert(symbol.qualified_name.clone(), id);
                None
            }
        };
        self.arena.push(symbol);
        (id, first)
    }
}

struct Builder {
    file: FileId,
    table: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    module_path: Vec<SmolStr>,
}

impl Builder {
    fn items(&mut self, items: &[Item]) {
        for item in items {
            match item {
                Item::Module(m) => {
                    self.declare(
                        &m.name.text,
                        SymbolKind::Module,
                        m.name.range,
                        m.range,
                        m.doc.clone(),
                    );
                    self.module_path.push(m.name.text.clone());
                    self.items(&m.items);
                    self.module_path.pop();
                }
                Item::Struct(s) => {
                    self.declare(
                        &s.name.text,
                        SymbolKind::Struct,
                        s.name.range,
                        s.range,
                        s.doc.clone(),
                    );
                    self.scoped(&s.name.text, |b| {
                        for field in &s.fields {
                            b.declare(
                                &field.name.text,
                                SymbolKind::Field,
                                field.name.range,
                                field.range,
                                field.doc.clone(),
                            );
                        }
                    });
                }
                Item::Enum(e) => {
                    self.declare(
                        &e.name.text,
                        SymbolKind::Enum,
                        e.name.range,
                        e.range,
                        e.doc.clone(),
                    );
                    self.scoped(&e.name.text, |b| {
                        for member in &e.members {
                            b.declare(
                                &member.name.text,
                                SymbolKind::EnumMember,
                                member.name.range,
                                member.range,
                                member.doc.clone(),
                            );
                        }
                    });
                }
                Item::Union(u) => {
                    self.declare(
                        &u.name.text,
                        SymbolKind::Union,
                        u.name.range,
                        u.range,
                        u.doc.clone(),
                    );
                    self.scoped(&u.name.text, |b| {
                        for arm in &u.arms {
                            b.declare(
                                &arm.name.text,
                                SymbolKind::Field,
                                arm.name.range,
                                arm.range,
                                arm.doc.clone(),
                            );
                        }
                    });
                }
                Item::Service(s) => {
                    self.declare(
                        &s.name.text,
                        SymbolKind::Service,
                        s.name.range,
                        s.range,
                        s.doc.clone(),
                    );
                    self.scoped(&s.name.text, |b| {
                        for method in &s.methods {
                            b.declare(
                                &method.name.text,
                                SymbolKind::Method,
                                method.name.range,
                                method.range,
                                method.doc.clone(),
                            );
                        }
                    });
                }
                // Imports and error nodes declare nothing
                Item::Import(_) | Item::Error(_) => {}
            }
        }
    }

    fn scoped(&mut self, name: &SmolStr, f: impl FnOnce(&mut Self)) {
        self.module_path.push(name.clone());
        f(self);
        self.module_path.pop();
    }

    fn declare(
        &mut self,
        name: &SmolStr,
        kind: SymbolKind,
        name_range: TextRange,
        decl_range: TextRange,
        doc: Option<String>,
    ) {
        let qualified_name = SmolStr::from(self.qualify(name));
        let symbol = Symbol {
            name: name.clone(),
            qualified_name: qualified_name.clone(),
            kind,
            file: self.file,
            name_range,
            decl_range,
            doc,
        };
        let (_, first) = self.table.insert(symbol);
        if let Some(first) = first {
            let original = self.table.get(first);
            self.diagnostics.push(
                Diagnostic::error(
                    self.file,
                    name_range,
                    DiagnosticCode::DuplicateSymbol,
                    format!("`{qualified_name}` is declared more than once"),
                )
                .with_related(
                    self.file,
                    original.name_range,
                    "first declared here".to_string(),
                ),
            );
        }
    }

    fn qualify(&self, name: &str) -> String {
        if self.module_path.is_empty() {
            name.to_string()
        } else {
            let mut qualified = String::new();
            for part in &self.module_path {
                qualified.push_str(part);
                qualified.push('.');
            }
            qualified.push_str(name);
            qualified
        }
    }
}
