//! Canonical source printer.
//!
//! Renders an AST back to RIDL text in a fixed layout: four-space
//! indentation, one declaration per line, `}` on its own line. Original
//! whitespace and non-doc comments are not preserved; doc comments are
//! re-emitted above their declaration. Re-parsing the output yields a
//! structurally equal tree.

use std::fmt::Write;

use super::ast::{
    EnumDecl, FieldDecl, Item, MethodDecl, ModuleDecl, ServiceDecl, SourceUnit, StructDecl,
    TypeExpr, UnionDecl,
};

/// Print a source unit in canonical form.
pub fn print(unit: &SourceUnit) -> String {
    let mut out = String::new();
    let mut printer = Printer { out: &mut out };
    printer.items(&unit.items, 0);
    out
}

struct Printer<'a> {
    out: &'a mut String,
}

impl Printer<'_> {
    fn items(&mut self, items: &[Item], indent: usize) {
        let mut first = true;
        for item in items {
            // Error items have no canonical form; they are dropped.
            if matches!(item, Item::Error(_)) {
                continue;
            }
            if !first {
                self.out.push('\n');
            }
            first = false;
            self.item(item, indent);
        }
    }

    fn item(&mut self, item: &Item, indent: usize) {
        match item {
            Item::Module(m) => self.module(m, indent),
            Item::Import(i) => {
                self.line(indent, &format!("import {};", i.path_text()));
            }
            Item::Struct(s) => self.strukt(s, indent),
            Item::Enum(e) => self.enumeration(e, indent),
            Item::Union(u) => self.union(u, indent),
            Item::Service(s) => self.service(s, indent),
            Item::Error(_) => {}
        }
    }

    fn module(&mut self, m: &ModuleDecl, indent: usize) {
        self.doc(m.doc.as_deref(), indent);
        self.line(indent, &format!("module {} {{", m.name.as_str()));
        self.items(&m.items, indent + 1);
        self.line(indent, "}");
    }

    fn strukt(&mut self, s: &StructDecl, indent: usize) {
        self.doc(s.doc.as_deref(), indent);
        self.line(indent, &format!("struct {} {{", s.name.as_str()));
        for field in &s.fields {
            self.field(field, indent + 1);
        }
        self.line(indent, "}");
    }

    fn enumeration(&mut self, e: &EnumDecl, indent: usize) {
        self.doc(e.doc.as_deref(), indent);
        self.line(indent, &format!("enum {} {{", e.name.as_str()));
        for (i, member) in e.members.iter().enumerate() {
            self.doc(member.doc.as_deref(), indent + 1);
            let sep = if i + 1 < e.members.len() { "," } else { "" };
            match member.tag {
                Some(tag) => self.line(
                    indent + 1,
                    &format!("{} = {}{}", member.name.as_str(), tag, sep),
                ),
                None => self.line(indent + 1, &format!("{}{}", member.name.as_str(), sep)),
            }
        }
        self.line(indent, "}");
    }

    fn union(&mut self, u: &UnionDecl, indent: usize) {
        self.doc(u.doc.as_deref(), indent);
        match &u.discriminant {
            Some(disc) => self.line(
                indent,
                &format!("union {} : {} {{", u.name.as_str(), type_text(disc)),
            ),
            None => self.line(indent, &format!("union {} {{", u.name.as_str())),
        }
        for arm in &u.arms {
            self.field(arm, indent + 1);
        }
        self.line(indent, "}");
    }

    fn service(&mut self, s: &ServiceDecl, indent: usize) {
        self.doc(s.doc.as_deref(), indent);
        self.line(
            indent,
            &format!("{} {} {{", s.keyword.as_str(), s.name.as_str()),
        );
        for method in &s.methods {
            self.method(method, indent + 1);
        }
        self.line(indent, "}");
    }

    fn method(&mut self, m: &MethodDecl, indent: usize) {
        self.doc(m.doc.as_deref(), indent);
        let params: Vec<String> = m
            .params
            .iter()
            .map(|p| format!("{} {}", type_text(&p.ty), p.name.as_str()))
            .collect();
        self.line(
            indent,
            &format!(
                "{} {}({});",
                type_text(&m.return_ty),
                m.name.as_str(),
                params.join(", ")
            ),
        );
    }

    fn field(&mut self, f: &FieldDecl, indent: usize) {
        self.doc(f.doc.as_deref(), indent);
        self.line(indent, &format!("{} {};", type_text(&f.ty), f.name.as_str()));
    }

    fn doc(&mut self, doc: Option<&str>, indent: usize) {
        if let Some(doc) = doc {
            for line in doc.lines() {
                if line.is_empty() {
                    self.line(indent, "///");
                } else {
                    self.line(indent, &format!("/// {line}"));
                }
            }
        }
    }

    fn line(&mut self, indent: usize, text: &str) {
        for _ in 0..indent {
            self.out.push_str("    ");
        }
        // Writing to a String cannot fail
        let _ = writeln!(self.out, "{text}");
    }
}

/// Render a type expression in canonical form.
pub fn type_text(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Primitive { prim, .. } => prim.keyword().to_string(),
        TypeExpr::Named { .. } => ty.path_text().unwrap_or_default(),
        TypeExpr::Sequence { keyword, elem, .. } => {
            format!("{}<{}>", keyword.as_str(), type_text(elem))
        }
        TypeExpr::Optional { elem, .. } => format!("optional<{}>", type_text(elem)),
        TypeExpr::Array { elem, len, .. } => format!("{}[{}]", type_text(elem), len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn roundtrip(source: &str) {
        let first = parse(source);
        assert!(first.ok(), "parse errors: {:?}", first.errors);
        let printed = print(&first.ast);
        let second = parse(&printed);
        assert!(second.ok(), "reparse errors: {:?}\n{printed}", second.errors);
        assert!(
            first.ast.structural_eq(&second.ast),
            "round trip changed structure:\n{printed}"
        );
    }

    #[test]
    fn test_roundtrip_struct() {
        roundtrip("struct Point { float x; float y; }");
    }

    #[test]
    fn test_roundtrip_nested_modules() {
        roundtrip(
            "module a { module b { struct S { int32 v; } enum E { X = 1, Y } } import c.d; }",
        );
    }

    #[test]
    fn test_roundtrip_union_and_service() {
        roundtrip(
            "union V : uint8 { int32 i; string s; } \
             interface Svc { list<V> all(); void put(optional<V> v, uint8[4] key); }",
        );
    }

    #[test]
    fn test_roundtrip_preserves_doc_comments() {
        let source = "/// A point.\nstruct Point { /// Horizontal.\n float x; }";
        let first = parse(source);
        assert!(first.ok());
        let printed = print(&first.ast);
        let second = parse(&printed);
        match (&second.ast.items[0], &first.ast.items[0]) {
            (crate::syntax::ast::Item::Struct(b), crate::syntax::ast::Item::Struct(a)) => {
                assert_eq!(a.doc, b.doc);
                assert_eq!(a.fields[0].doc, b.fields[0].doc);
            }
            _ => panic!("expected structs"),
        }
    }

    #[test]
    fn test_print_layout() {
        let result = parse("module m{struct S{int32 a;}}");
        let printed = print(&result.ast);
        assert_eq!(
            printed,
            "module m {\n    struct S {\n        int32 a;\n    }\n}\n"
        );
    }

    #[test]
    fn test_type_text() {
        let result = parse("struct S { sequence<list<geometry.Point>> xs; }");
        match &result.ast.items[0] {
            crate::syntax::ast::Item::Struct(s) => {
                assert_eq!(type_text(&s.fields[0].ty), "sequence<list<geometry.Point>>");
            }
            _ => panic!("expected struct"),
        }
    }
}
