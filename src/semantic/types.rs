//! Type registry: resolved type definitions and reference resolution.
//!
//! Files are resolved in the order produced by the dependency graph, so an
//! imported file's symbols are available before its importers (outside of
//! diagnosed cycles, which resolve with whatever partial information
//! exists). Resolution never fails hard: a reference that cannot be
//! resolved becomes [`TypeReference::Unresolved`] inside an otherwise
//! complete definition, so consumers always get partial information.
//!
//! Lookup order for a written name: the file's own module chain from the
//! innermost scope outward, then explicitly imported files. A name found in
//! more than one imported file is ambiguous and diagnosed, not picked
//! arbitrarily.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use tracing::trace;

use crate::base::FileId;
use crate::syntax::ast::{
    EnumDecl, Item, PrimitiveType, ServiceDecl, SourceUnit, StructDecl, TypeExpr, UnionDecl,
};

use super::diagnostics::{Diagnostic, DiagnosticCode};
use super::symbols::{SymbolKind, SymbolTable};

/// A type reference after resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeReference {
    Primitive(PrimitiveType),
    /// Resolved to a declared type.
    Resolved {
        qualified_name: String,
        file: FileId,
    },
    /// Could not be resolved; the written name and its span are kept for
    /// diagnostics and navigation.
    Unresolved {
        name: String,
        range: TextRange,
    },
    Sequence(Box<TypeReference>),
    Optional(Box<TypeReference>),
    Array {
        elem: Box<TypeReference>,
        len: u64,
    },
}

impl TypeReference {
    /// True if no unresolved marker appears anywhere in this reference.
    pub fn is_fully_resolved(&self) -> bool {
        match self {
            TypeReference::Primitive(_) | TypeReference::Resolved { .. } => true,
            TypeReference::Unresolved { .. } => false,
            TypeReference::Sequence(elem) | TypeReference::Optional(elem) => {
                elem.is_fully_resolved()
            }
            TypeReference::Array { elem, .. } => elem.is_fully_resolved(),
        }
    }

    fn contains_void(&self) -> bool {
        match self {
            TypeReference::Primitive(prim) => *prim == PrimitiveType::Void,
            TypeReference::Resolved { .. } | TypeReference::Unresolved { .. } => false,
            TypeReference::Sequence(elem) | TypeReference::Optional(elem) => elem.contains_void(),
            TypeReference::Array { elem, .. } => elem.contains_void(),
        }
    }
}

/// A resolved field or union arm.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: SmolStr,
    pub ty: TypeReference,
    pub range: TextRange,
}

/// An enum member with its assigned tag.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumTagDef {
    pub name: SmolStr,
    pub tag: i64,
    pub range: TextRange,
}

/// A resolved service method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub name: SmolStr,
    pub return_ty: TypeReference,
    pub params: Vec<FieldDef>,
    pub range: TextRange,
}

/// The kind-specific shape of a definition.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    Struct { fields: Vec<FieldDef> },
    Enum { members: Vec<EnumTagDef> },
    Union { discriminant: Option<TypeReference>, arms: Vec<FieldDef> },
    Service { methods: Vec<MethodDef> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Struct,
    Enum,
    Union,
    Service,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Struct => "struct",
            TypeKind::Enum => "enum",
            TypeKind::Union => "union",
            TypeKind::Service => "service",
        }
    }
}

/// A fully assembled (possibly partial) type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub qualified_name: String,
    pub file: FileId,
    /// Range of the declared name.
    pub name_range: TextRange,
    pub shape: TypeShape,
}

impl TypeDefinition {
    pub fn kind(&self) -> TypeKind {
        match self.shape {
            TypeShape::Struct { .. } => TypeKind::Struct,
            TypeShape::Enum { .. } => TypeKind::Enum,
            TypeShape::Union { .. } => TypeKind::Union,
            TypeShape::Service { .. } => TypeKind::Service,
        }
    }
}

/// One file's view during resolution: its AST and local symbols.
#[derive(Clone, Copy)]
pub struct FileView<'a> {
    pub file: FileId,
    pub ast: &'a SourceUnit,
    pub symbols: &'a SymbolTable,
}

/// A resolved type reference span, kept for navigation queries.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSpan {
    pub range: TextRange,
    pub qualified_name: String,
    pub target_file: FileId,
}

/// The workspace type graph, keyed by fully qualified name per file.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    /// Per-file definitions in declaration order.
    by_file: FxHashMap<FileId, IndexMap<String, TypeDefinition>>,
    /// Resolved reference spans per file, for `get_symbol_at`.
    refs_by_file: FxHashMap<FileId, Vec<ReferenceSpan>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything derived from a file.
    pub fn retract(&mut self, file: FileId) {
        self.by_file.remove(&file);
        self.refs_by_file.remove(&file);
    }

    /// Look up a definition by fully qualified name. If more than one file
    /// declares the name, the lowest FileId wins, independent of resolution
    /// order.
    pub fn get(&self, qualified_name: &str) -> Option<&TypeDefinition> {
        self.by_file
            .iter()
            .filter_map(|(_, types)| types.get(qualified_name))
            .min_by_key(|def| def.file)
    }

    /// Definitions declared by one file, in declaration order.
    pub fn types_in(&self, file: FileId) -> impl Iterator<Item = &TypeDefinition> {
        self.by_file.get(&file).into_iter().flat_map(|m| m.values())
    }

    pub fn len(&self) -> usize {
        self.by_file.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The resolved reference containing `offset` in `file`, if any.
    pub fn reference_at(&self, file: FileId, offset: TextSize) -> Option<&ReferenceSpan> {
        self.refs_by_file
            .get(&file)?
            .iter()
            .filter(|r| r.range.contains(offset))
            .min_by_key(|r| r.range.len())
    }

    /// Re-resolve one file against its imports. Replaces the file's previous
    /// definitions and returns the file's type diagnostics, including
    /// structural layout checks.
    pub fn resolve_file(
        &mut self,
        view: FileView<'_>,
        imports: &[FileView<'_>],
    ) -> Vec<Diagnostic> {
        self.retract(view.file);

        let mut resolver = Resolver {
            view,
            imports,
            diagnostics: Vec::new(),
            refs: Vec::new(),
            types: IndexMap::new(),
            module_chain: Vec::new(),
        };
        resolver.items(&view.ast.items);

        let Resolver {
            diagnostics: mut out,
            refs,
            types,
            ..
        } = resolver;

        self.by_file.insert(view.file, types);
        self.refs_by_file.insert(view.file, refs);
        out.extend(self.check_layout(view.file));

        trace!(file = %view.file, diagnostics = out.len(), "types resolved");
        out
    }

    /// Recursive-by-value layout check for a file's structs and unions.
    ///
    /// A field participates in a cycle when following by-value edges
    /// (struct/union fields and fixed arrays; sequences and optionals are
    /// indirection) leads back to the owning type.
    fn check_layout(&self, file: FileId) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for def in self.types_in(file) {
            let arms = match &def.shape {
                TypeShape::Struct { fields } => fields,
                TypeShape::Union { arms, .. } => arms,
                _ => continue,
            };
            let owner = (def.file, def.qualified_name.as_str());
            for field in arms {
                if self.reaches_by_value(&field.ty, owner, &mut FxHashSet::default()) {
                    diagnostics.push(Diagnostic::error(
                        file,
                        field.range,
                        DiagnosticCode::CyclicLayout,
                        format!(
                            "field `{}` makes `{}` contain itself by value",
                            field.name, def.qualified_name
                        ),
                    ));
                }
            }
        }
        diagnostics
    }

    fn reaches_by_value(
        &self,
        ty: &TypeReference,
        owner: (FileId, &str),
        visited: &mut FxHashSet<(FileId, String)>,
    ) -> bool {
        match ty {
            TypeReference::Resolved {
                qualified_name,
                file,
            } => {
                if (*file, qualified_name.as_str()) == owner {
                    return true;
                }
                if !visited.insert((*file, qualified_name.clone())) {
                    return false;
                }
                let Some(def) = self
                    .by_file
                    .get(file)
                    .and_then(|types| types.get(qualified_name))
                else {
                    return false;
                };
                let arms = match &def.shape {
                    TypeShape::Struct { fields } => fields,
                    TypeShape::Union { arms, .. } => arms,
                    _ => return false,
                };
                arms.iter()
                    .any(|f| self.reaches_by_value(&f.ty, owner, visited))
            }
            TypeReference::Array { elem, .. } => self.reaches_by_value(elem, owner, visited),
            // Indirection breaks the by-value chain
            TypeReference::Sequence(_) | TypeReference::Optional(_) => false,
            TypeReference::Primitive(_) | TypeReference::Unresolved { .. } => false,
        }
    }
}

enum Lookup {
    Found { qualified_name: String, file: FileId },
    Ambiguous(Vec<String>),
    NotFound,
}

struct Resolver<'a> {
    view: FileView<'a>,
    imports: &'a [FileView<'a>],
    diagnostics: Vec<Diagnostic>,
    refs: Vec<ReferenceSpan>,
    types: IndexMap<String, TypeDefinition>,
    module_chain: Vec<SmolStr>,
}

impl Resolver<'_> {
    fn items(&mut self, items: &[Item]) {
        for item in items {
            match item {
                Item::Module(m) => {
                    self.module_chain.push(m.name.text.clone());
                    self.items(&m.items);
                    self.module_chain.pop();
                }
                Item::Struct(s) => self.struct_decl(s),
                Item::Enum(e) => self.enum_decl(e),
                Item::Union(u) => self.union_decl(u),
                Item::Service(s) => self.service_decl(s),
                Item::Import(_) | Item::Error(_) => {}
            }
        }
    }

    fn define(&mut self, name: &SmolStr, name_range: TextRange, shape: TypeShape) {
        let qualified_name = self.qualify(name);
        // First declaration wins; duplicates were already diagnosed by the
        // symbol builder.
        self.types
            .entry(qualified_name.clone())
            .or_insert(TypeDefinition {
                qualified_name,
                file: self.view.file,
                name_range,
                shape,
            });
    }

    fn struct_decl(&mut self, decl: &StructDecl) {
        let fields = self.fields(&decl.fields);
        self.define(&decl.name.text, decl.name.range, TypeShape::Struct { fields });
    }

    fn union_decl(&mut self, decl: &UnionDecl) {
        let discriminant = decl.discriminant.as_ref().map(|ty| self.type_ref(ty));
        if let (Some(disc), Some(expr)) = (&discriminant, &decl.discriminant) {
            self.check_discriminant(disc, expr.range());
        }
        let arms = self.fields(&decl.arms);
        self.define(
            &decl.name.text,
            decl.name.range,
            TypeShape::Union { discriminant, arms },
        );
    }

    fn enum_decl(&mut self, decl: &EnumDecl) {
        let mut members = Vec::with_capacity(decl.members.len());
        let mut seen: FxHashMap<i64, SmolStr> = FxHashMap::default();
        let mut next_tag: i64 = 0;
        for member in &decl.members {
            let tag = member.tag.unwrap_or(next_tag);
            next_tag = tag.wrapping_add(1);
            match seen.get(&tag) {
                Some(first) => {
                    self.diagnostics.push(Diagnostic::error(
                        self.view.file,
                        member.range,
                        DiagnosticCode::DuplicateEnumTag,
                        format!(
                            "tag {tag} of `{}` is already used by `{first}`",
                            member.name.text
                        ),
                    ));
                }
                None => {
                    seen.insert(tag, member.name.text.clone());
                }
            }
            members.push(EnumTagDef {
                name: member.name.text.clone(),
                tag,
                range: member.range,
            });
        }
        self.define(&decl.name.text, decl.name.range, TypeShape::Enum { members });
    }

    fn service_decl(&mut self, decl: &ServiceDecl) {
        let mut methods = Vec::with_capacity(decl.methods.len());
        for method in &decl.methods {
            let return_ty = self.type_ref(&method.return_ty);
            let params = method
                .params
                .iter()
                .map(|p| {
                    let ty = self.type_ref(&p.ty);
                    self.reject_void(&ty, p.range, "parameter", &p.name.text);
                    FieldDef {
                        name: p.name.text.clone(),
                        ty,
                        range: p.range,
                    }
                })
                .collect();
            methods.push(MethodDef {
                name: method.name.text.clone(),
                return_ty,
                params,
                range: method.range,
            });
        }
        self.define(&decl.name.text, decl.name.range, TypeShape::Service { methods });
    }

    fn fields(&mut self, fields: &[crate::syntax::ast::FieldDecl]) -> Vec<FieldDef> {
        fields
            .iter()
            .map(|field| {
                let ty = self.type_ref(&field.ty);
                self.reject_void(&ty, field.range, "field", &field.name.text);
                FieldDef {
                    name: field.name.text.clone(),
                    ty,
                    range: field.range,
                }
            })
            .collect()
    }

    /// `void` is a return type, not a member type.
    fn reject_void(&mut self, ty: &TypeReference, range: TextRange, what: &str, name: &str) {
        if ty.contains_void() {
            self.diagnostics.push(Diagnostic::error(
                self.view.file,
                range,
                DiagnosticCode::FieldTypeMismatch,
                format!("{what} `{name}` may not have type `void`"),
            ));
        }
    }

    fn check_discriminant(&mut self, disc: &TypeReference, range: TextRange) {
        let valid = match disc {
            TypeReference::Primitive(prim) => prim.is_integer() || *prim == PrimitiveType::Bool,
            TypeReference::Resolved {
                qualified_name,
                file,
            } => self.symbol_kind(*file, qualified_name) == Some(SymbolKind::Enum),
            // Unresolved discriminants already carry an unresolved-type
            TypeReference::Unresolved { .. } => true,
            _ => false,
        };
        if !valid {
            self.diagnostics.push(Diagnostic::error(
                self.view.file,
                range,
                DiagnosticCode::InvalidDiscriminant,
                "union discriminant must be an integer, bool, or enum type",
            ));
        }
    }

    fn symbol_kind(&self, file: FileId, qualified_name: &str) -> Option<SymbolKind> {
        let table = if file == self.view.file {
            self.view.symbols
        } else {
            self.imports.iter().find(|v| v.file == file)?.symbols
        };
        table.lookup(qualified_name).map(|id| table.get(id).kind)
    }

    fn type_ref(&mut self, ty: &TypeExpr) -> TypeReference {
        match ty {
            TypeExpr::Primitive { prim, .. } => TypeReference::Primitive(*prim),
            TypeExpr::Sequence { elem, .. } => {
                TypeReference::Sequence(Box::new(self.type_ref(elem)))
            }
            TypeExpr::Optional { elem, .. } => {
                TypeReference::Optional(Box::new(self.type_ref(elem)))
            }
            TypeExpr::Array { elem, len, .. } => TypeReference::Array {
                elem: Box::new(self.type_ref(elem)),
                len: *len,
            },
            TypeExpr::Named { range, .. } => {
                let written = ty.path_text().unwrap_or_default();
                match self.lookup(&written) {
                    Lookup::Found {
                        qualified_name,
                        file,
                    } => {
                        self.refs.push(ReferenceSpan {
                            range: *range,
                            qualified_name: qualified_name.clone(),
                            target_file: file,
                        });
                        TypeReference::Resolved {
                            qualified_name,
                            file,
                        }
                    }
                    Lookup::Ambiguous(candidates) => {
                        self.diagnostics.push(Diagnostic::error(
                            self.view.file,
                            *range,
                            DiagnosticCode::UnresolvedType,
                            format!(
                                "`{written}` is ambiguous: found in {}",
                                candidates.join(" and ")
                            ),
                        ));
                        TypeReference::Unresolved {
                            name: written,
                            range: *range,
                        }
                    }
                    Lookup::NotFound => {
                        self.diagnostics.push(Diagnostic::error(
                            self.view.file,
                            *range,
                            DiagnosticCode::UnresolvedType,
                            format!("cannot resolve type `{written}`"),
                        ));
                        TypeReference::Unresolved {
                            name: written,
                            range: *range,
                        }
                    }
                }
            }
        }
    }

    /// Own module chain from the innermost scope outward, then imports.
    fn lookup(&self, written: &str) -> Lookup {
        for candidate in self.candidates(written) {
            if let Some(id) = self.view.symbols.lookup(&candidate) {
                let symbol = self.view.symbols.get(id);
                if symbol.kind.is_type() {
                    return Lookup::Found {
                        qualified_name: candidate,
                        file: self.view.file,
                    };
                }
            }
        }

        for candidate in self.candidates(written) {
            let mut matches: Vec<FileId> = Vec::new();
            for import in self.imports {
                if let Some(id) = import.symbols.lookup(&candidate) {
                    let symbol = import.symbols.get(id);
                    if symbol.kind.is_type() && !matches.contains(&import.file) {
                        matches.push(import.file);
                    }
                }
            }
            match matches.len() {
                0 => {}
                1 => {
                    return Lookup::Found {
                        qualified_name: candidate,
                        file: matches[0],
                    };
                }
                _ => return Lookup::Ambiguous(matches.iter().map(|f| f.to_string()).collect()),
            }
        }

        Lookup::NotFound
    }

    /// Candidate qualified names for a written path, innermost scope first:
    /// `a.b.W`, `a.W`, `W` for a reference written `W` inside `module a.b`.
    fn candidates(&self, written: &str) -> Vec<String> {
        let mut out = Vec::with_capacity(self.module_chain.len() + 1);
        for depth in (0..=self.module_chain.len()).rev() {
            let mut candidate = String::new();
            for part in &self.module_chain[..depth] {
                candidate.push_str(part);
                candidate.push('.');
            }
            candidate.push_str(written);
            out.push(candidate);
        }
        out
    }

    fn qualify(&self, name: &str) -> String {
        let mut qualified = String::new();
        for part in &self.module_chain {
            qualified.push_str(part);
            qualified.push('.');
        }
        qualified.push_str(name);
        qualified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::syntax::ast::SourceUnit;

    struct Parsed {
        file: FileId,
        ast: SourceUnit,
        symbols: SymbolTable,
    }

    fn prepare(index: u32, source: &str) -> Parsed {
        let file = FileId::new(index);
        let result = parse(source);
        assert!(result.ok(), "parse errors: {:?}", result.errors);
        let (symbols, _) = SymbolTable::build(file, &result.ast);
        Parsed {
            file,
            ast: result.ast,
            symbols,
        }
    }

    fn view(p: &Parsed) -> FileView<'_> {
        FileView {
            file: p.file,
            ast: &p.ast,
            symbols: &p.symbols,
        }
    }

    #[test]
    fn test_resolve_local_struct_reference() {
        let p = prepare(0, "struct Point { float x; } struct Line { Point a; Point b; }");
        let mut registry = TypeRegistry::new();
        let diags = registry.resolve_file(view(&p), &[]);
        assert!(diags.is_empty(), "{diags:?}");
        let line = registry.get("Line").unwrap();
        match &line.shape {
            TypeShape::Struct { fields } => {
                assert!(matches!(
                    &fields[0].ty,
                    TypeReference::Resolved { qualified_name, .. } if qualified_name == "Point"
                ));
            }
            other => panic!("expected struct shape, got {other:?}"),
        }
    }

    #[test]
    fn test_module_chain_lookup_innermost_out() {
        let source = "module a { struct P { int32 v; } module b { struct P { float v; } struct Q { P p; } } }";
        let p = prepare(0, source);
        let mut registry = TypeRegistry::new();
        let diags = registry.resolve_file(view(&p), &[]);
        assert!(diags.is_empty(), "{diags:?}");
        let q = registry.get("a.b.Q").unwrap();
        match &q.shape {
            TypeShape::Struct { fields } => {
                // Innermost scope shadows the outer declaration
                assert!(matches!(
                    &fields[0].ty,
                    TypeReference::Resolved { qualified_name, .. } if qualified_name == "a.b.P"
                ));
            }
            other => panic!("expected struct shape, got {other:?}"),
        }
    }

    #[test]
    fn test_unresolved_type_produces_partial_definition() {
        let p = prepare(0, "struct S { Missing m; int32 ok; }");
        let mut registry = TypeRegistry::new();
        let diags = registry.resolve_file(view(&p), &[]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UnresolvedType);
        let s = registry.get("S").unwrap();
        match &s.shape {
            TypeShape::Struct { fields } => {
                assert!(!fields[0].ty.is_fully_resolved());
                assert!(fields[1].ty.is_fully_resolved());
            }
            other => panic!("expected struct shape, got {other:?}"),
        }
    }

    #[test]
    fn test_imported_type_resolves() {
        let dep = prepare(0, "module geometry { struct Point { float x; } }");
        let user = prepare(1, "import geometry; struct S { geometry.Point p; }");
        let mut registry = TypeRegistry::new();
        registry.resolve_file(view(&dep), &[]);
        let diags = registry.resolve_file(view(&user), &[view(&dep)]);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_ambiguous_across_imports() {
        let a = prepare(0, "struct P { int32 v; }");
        let b = prepare(1, "struct P { float v; }");
        let user = prepare(2, "struct S { P p; }");
        let mut registry = TypeRegistry::new();
        registry.resolve_file(view(&a), &[]);
        registry.resolve_file(view(&b), &[]);
        let diags = registry.resolve_file(view(&user), &[view(&a), view(&b)]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UnresolvedType);
        assert!(diags[0].message.contains("ambiguous"));
    }

    #[test]
    fn test_void_field_rejected() {
        let p = prepare(0, "struct S { void v; }");
        let mut registry = TypeRegistry::new();
        let diags = registry.resolve_file(view(&p), &[]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::FieldTypeMismatch);
    }

    #[test]
    fn test_void_return_allowed() {
        let p = prepare(0, "interface I { void ping(); }");
        let mut registry = TypeRegistry::new();
        let diags = registry.resolve_file(view(&p), &[]);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_self_recursive_struct_is_cyclic_layout() {
        let p = prepare(0, "struct A { A self; }");
        let mut registry = TypeRegistry::new();
        let diags = registry.resolve_file(view(&p), &[]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::CyclicLayout);
        // The definition still exists with a resolved field
        assert!(registry.get("A").is_some());
    }

    #[test]
    fn test_recursion_through_sequence_is_fine() {
        let p = prepare(0, "struct Tree { int32 value; list<Tree> children; optional<int32> tag; }");
        let mut registry = TypeRegistry::new();
        let diags = registry.resolve_file(view(&p), &[]);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_mutual_recursion_by_value_flagged() {
        let p = prepare(0, "struct A { B b; } struct B { A a; }");
        let mut registry = TypeRegistry::new();
        let diags = registry.resolve_file(view(&p), &[]);
        let cyclic = diags
            .iter()
            .filter(|d| d.code == DiagnosticCode::CyclicLayout)
            .count();
        assert_eq!(cyclic, 2);
    }

    #[test]
    fn test_recursion_through_array_flagged() {
        let p = prepare(0, "struct A { A[2] pair; }");
        let mut registry = TypeRegistry::new();
        let diags = registry.resolve_file(view(&p), &[]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::CyclicLayout);
    }

    #[test]
    fn test_enum_tags_implicit_and_duplicate() {
        let p = prepare(0, "enum E { A, B = 5, C, D = 6 }");
        let mut registry = TypeRegistry::new();
        let diags = registry.resolve_file(view(&p), &[]);
        // C gets 6 implicitly, so D = 6 collides
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::DuplicateEnumTag);
        let e = registry.get("E").unwrap();
        match &e.shape {
            TypeShape::Enum { members } => {
                let tags: Vec<i64> = members.iter().map(|m| m.tag).collect();
                assert_eq!(tags, vec![0, 5, 6, 6]);
            }
            other => panic!("expected enum shape, got {other:?}"),
        }
    }

    #[test]
    fn test_union_discriminant_validation() {
        let mut registry = TypeRegistry::new();
        let good = prepare(0, "enum Kind { A } union U : Kind { int32 i; } union V : uint8 { int32 i; }");
        let diags = registry.resolve_file(view(&good), &[]);
        assert!(diags.is_empty(), "{diags:?}");

        let bad = prepare(1, "union W : string { int32 i; }");
        let diags = registry.resolve_file(view(&bad), &[]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::InvalidDiscriminant);
    }

    #[test]
    fn test_reference_at_navigation() {
        let source = "struct Point { float x; } struct Line { Point a; }";
        let p = prepare(0, source);
        let mut registry = TypeRegistry::new();
        registry.resolve_file(view(&p), &[]);
        let offset = TextSize::new(source.rfind("Point").unwrap() as u32 + 1);
        let found = registry.reference_at(p.file, offset).unwrap();
        assert_eq!(found.qualified_name, "Point");
    }

    #[test]
    fn test_retract_removes_definitions() {
        let p = prepare(0, "struct S { int32 v; }");
        let mut registry = TypeRegistry::new();
        registry.resolve_file(view(&p), &[]);
        assert!(registry.get("S").is_some());
        registry.retract(p.file);
        assert!(registry.get("S").is_none());
        assert!(registry.is_empty());
    }
}
