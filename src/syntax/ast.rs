//! AST types for RIDL declarations.
//!
//! A [`SourceUnit`] is the parse result for one file: a list of items, where
//! an item is a module (nestable), import, struct, enum, union, or
//! service/interface declaration. Malformed regions become [`ErrorItem`]s so
//! one bad construct never suppresses its neighbors.
//!
//! Every node owns its children and carries a byte [`TextRange`] into the
//! source it was parsed from. Doc comments (`///`) are attached as plain
//! text to the declaration that follows them.

use smol_str::SmolStr;
use text_size::TextRange;

use crate::parser::TokenKind;

/// An identifier with its source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub text: SmolStr,
    pub range: TextRange,
}

impl Ident {
    pub fn new(text: impl Into<SmolStr>, range: TextRange) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// The parsed contents of a single file.
#[derive(Debug, Clone, Default)]
pub struct SourceUnit {
    pub items: Vec<Item>,
}

/// A top-level or module-level declaration.
#[derive(Debug, Clone)]
pub enum Item {
    Module(ModuleDecl),
    Import(ImportDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Union(UnionDecl),
    Service(ServiceDecl),
    /// A region the parser could not make sense of; spans the skipped tokens.
    Error(ErrorItem),
}

impl Item {
    pub fn range(&self) -> TextRange {
        match self {
            Item::Module(m) => m.range,
            Item::Import(i) => i.range,
            Item::Struct(s) => s.range,
            Item::Enum(e) => e.range,
            Item::Union(u) => u.range,
            Item::Service(s) => s.range,
            Item::Error(e) => e.range,
        }
    }

    /// The declared name, if this item kind has one.
    pub fn name(&self) -> Option<&Ident> {
        match self {
            Item::Module(m) => Some(&m.name),
            Item::Struct(s) => Some(&s.name),
            Item::Enum(e) => Some(&e.name),
            Item::Union(u) => Some(&u.name),
            Item::Service(s) => Some(&s.name),
            Item::Import(_) | Item::Error(_) => None,
        }
    }
}

/// `module Name { items }`
#[derive(Debug, Clone)]
pub struct ModuleDecl {
    pub name: Ident,
    pub items: Vec<Item>,
    pub range: TextRange,
    pub doc: Option<String>,
}

/// `import a.b.c;`
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub path: Vec<Ident>,
    pub range: TextRange,
}

impl ImportDecl {
    /// The dotted import path as written (`a.b.c`).
    pub fn path_text(&self) -> String {
        let parts: Vec<&str> = self.path.iter().map(Ident::as_str).collect();
        parts.join(".")
    }
}

/// `struct Name { fields }`
#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: Ident,
    pub fields: Vec<FieldDecl>,
    pub range: TextRange,
    pub doc: Option<String>,
}

/// `Type name;` inside a struct or union body.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub ty: TypeExpr,
    pub name: Ident,
    pub range: TextRange,
    pub doc: Option<String>,
}

/// `enum Name { members }`
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: Ident,
    pub members: Vec<EnumMember>,
    pub range: TextRange,
    pub doc: Option<String>,
}

/// `NAME` or `NAME = tag` inside an enum body.
#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: Ident,
    /// Explicit tag if written; implicit tags are assigned during resolution.
    pub tag: Option<i64>,
    pub range: TextRange,
    pub doc: Option<String>,
}

/// `union Name : DiscriminantType { arms }`
#[derive(Debug, Clone)]
pub struct UnionDecl {
    pub name: Ident,
    /// The discriminant clause is optional syntax; checked semantically.
    pub discriminant: Option<TypeExpr>,
    pub arms: Vec<FieldDecl>,
    pub range: TextRange,
    pub doc: Option<String>,
}

/// Which keyword introduced a service declaration.
///
/// `interface` and `service` are interchangeable; the spelling is kept for
/// round-trip printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKeyword {
    Interface,
    Service,
}

impl ServiceKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKeyword::Interface => "interface",
            ServiceKeyword::Service => "service",
        }
    }
}

/// `interface Name { methods }` / `service Name { methods }`
#[derive(Debug, Clone)]
pub struct ServiceDecl {
    pub keyword: ServiceKeyword,
    pub name: Ident,
    pub methods: Vec<MethodDecl>,
    pub range: TextRange,
    pub doc: Option<String>,
}

/// `ReturnType name(params);`
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub return_ty: TypeExpr,
    pub name: Ident,
    pub params: Vec<ParamDecl>,
    pub range: TextRange,
    pub doc: Option<String>,
}

/// `Type name` inside a method parameter list.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub ty: TypeExpr,
    pub name: Ident,
    pub range: TextRange,
}

/// Placeholder for a malformed region.
#[derive(Debug, Clone)]
pub struct ErrorItem {
    pub range: TextRange,
}

// ============================================================================
// TYPE EXPRESSIONS
// ============================================================================

/// The fixed builtin primitive set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    String,
    Bytes,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Void,
}

impl PrimitiveType {
    /// The keyword spelling of this primitive.
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::String => "string",
            PrimitiveType::Bytes => "bytes",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt8 => "uint8",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Void => "void",
        }
    }

    /// Map a primitive-type keyword token to its primitive.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::BOOL_KW => PrimitiveType::Bool,
            TokenKind::STRING_KW => PrimitiveType::String,
            TokenKind::BYTES_KW => PrimitiveType::Bytes,
            TokenKind::INT8_KW => PrimitiveType::Int8,
            TokenKind::INT16_KW => PrimitiveType::Int16,
            TokenKind::INT32_KW => PrimitiveType::Int32,
            TokenKind::INT64_KW => PrimitiveType::Int64,
            TokenKind::UINT8_KW => PrimitiveType::UInt8,
            TokenKind::UINT16_KW => PrimitiveType::UInt16,
            TokenKind::UINT32_KW => PrimitiveType::UInt32,
            TokenKind::UINT64_KW => PrimitiveType::UInt64,
            TokenKind::FLOAT_KW => PrimitiveType::Float,
            TokenKind::DOUBLE_KW => PrimitiveType::Double,
            TokenKind::VOID_KW => PrimitiveType::Void,
            _ => return None,
        })
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveType::Int8
                | PrimitiveType::Int16
                | PrimitiveType::Int32
                | PrimitiveType::Int64
                | PrimitiveType::UInt8
                | PrimitiveType::UInt16
                | PrimitiveType::UInt32
                | PrimitiveType::UInt64
        )
    }
}

/// Which keyword introduced a sequence type (`list<T>` vs `sequence<T>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKeyword {
    List,
    Sequence,
}

impl SequenceKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            SequenceKeyword::List => "list",
            SequenceKeyword::Sequence => "sequence",
        }
    }
}

/// A type as written in source; resolution happens in the type registry.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// `int32`, `string`, ...
    Primitive {
        prim: PrimitiveType,
        range: TextRange,
    },
    /// `Point` or `geometry.shapes.Point`
    Named { path: Vec<Ident>, range: TextRange },
    /// `list<T>` / `sequence<T>`
    Sequence {
        keyword: SequenceKeyword,
        elem: Box<TypeExpr>,
        range: TextRange,
    },
    /// `optional<T>`
    Optional {
        elem: Box<TypeExpr>,
        range: TextRange,
    },
    /// Bounded array `T[N]`
    Array {
        elem: Box<TypeExpr>,
        len: u64,
        range: TextRange,
    },
}

impl TypeExpr {
    pub fn range(&self) -> TextRange {
        match self {
            TypeExpr::Primitive { range, .. }
            | TypeExpr::Named { range, .. }
            | TypeExpr::Sequence { range, .. }
            | TypeExpr::Optional { range, .. }
            | TypeExpr::Array { range, .. } => *range,
        }
    }

    /// Dotted path text for a named type reference.
    pub fn path_text(&self) -> Option<String> {
        match self {
            TypeExpr::Named { path, .. } => {
                let parts: Vec<&str> = path.iter().map(Ident::as_str).collect();
                Some(parts.join("."))
            }
            _ => None,
        }
    }
}

// ============================================================================
// STRUCTURAL EQUALITY (ignores ranges and doc trivia)
// ============================================================================

impl SourceUnit {
    /// Compare two parse trees ignoring source ranges and attached trivia.
    ///
    /// This is the equality the round-trip property is stated over: printing
    /// and re-parsing must preserve this, not byte positions.
    pub fn structural_eq(&self, other: &SourceUnit) -> bool {
        items_eq(&self.items, &other.items)
    }
}

fn items_eq(a: &[Item], b: &[Item]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| item_eq(x, y))
}

fn item_eq(a: &Item, b: &Item) -> bool {
    match (a, b) {
        (Item::Module(a), Item::Module(b)) => {
            a.name.text == b.name.text && items_eq(&a.items, &b.items)
        }
        (Item::Import(a), Item::Import(b)) => a.path_text() == b.path_text(),
        (Item::Struct(a), Item::Struct(b)) => {
            a.name.text == b.name.text && fields_eq(&a.fields, &b.fields)
        }
        (Item::Enum(a), Item::Enum(b)) => {
            a.name.text == b.name.text
                && a.members.len() == b.members.len()
                && a.members
                    .iter()
                    .zip(&b.members)
                    .all(|(x, y)| x.name.text == y.name.text && x.tag == y.tag)
        }
        (Item::Union(a), Item::Union(b)) => {
            a.name.text == b.name.text
                && opt_type_eq(a.discriminant.as_ref(), b.discriminant.as_ref())
                && fields_eq(&a.arms, &b.arms)
        }
        (Item::Service(a), Item::Service(b)) => {
            a.keyword == b.keyword
                && a.name.text == b.name.text
                && a.methods.len() == b.methods.len()
                && a.methods.iter().zip(&b.methods).all(|(x, y)| {
                    x.name.text == y.name.text
                        && type_eq(&x.return_ty, &y.return_ty)
                        && x.params.len() == y.params.len()
                        && x.params
                            .iter()
                            .zip(&y.params)
                            .all(|(p, q)| p.name.text == q.name.text && type_eq(&p.ty, &q.ty))
                })
        }
        (Item::Error(_), Item::Error(_)) => true,
        _ => false,
    }
}

fn fields_eq(a: &[FieldDecl], b: &[FieldDecl]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.name.text == y.name.text && type_eq(&x.ty, &y.ty))
}

fn opt_type_eq(a: Option<&TypeExpr>, b: Option<&TypeExpr>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => type_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn type_eq(a: &TypeExpr, b: &TypeExpr) -> bool {
    match (a, b) {
        (TypeExpr::Primitive { prim: a, .. }, TypeExpr::Primitive { prim: b, .. }) => a == b,
        (TypeExpr::Named { .. }, TypeExpr::Named { .. }) => a.path_text() == b.path_text(),
        (
            TypeExpr::Sequence {
                keyword: ka,
                elem: ea,
                ..
            },
            TypeExpr::Sequence {
                keyword: kb,
                elem: eb,
                ..
            },
        ) => ka == kb && type_eq(ea, eb),
        (TypeExpr::Optional { elem: ea, .. }, TypeExpr::Optional { elem: eb, .. }) => {
            type_eq(ea, eb)
        }
        (
            TypeExpr::Array {
                elem: ea, len: la, ..
            },
            TypeExpr::Array {
                elem: eb, len: lb, ..
            },
        ) => la == lb && type_eq(ea, eb),
        _ => false,
    }
}
