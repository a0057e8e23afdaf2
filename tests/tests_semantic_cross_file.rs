//! Cross-file semantics end to end: imports, qualified references,
//! ambiguity, cycles, and duplicate declarations through the workspace API.

mod helpers;

use helpers::source_fixtures::{CYCLE_X, CYCLE_Y, SHAPES_WORKSPACE};
use helpers::{all_diagnostics, assert_has_code, count_code, workspace_from};
use ridl::semantic::{DiagnosticCode, TypeKind, TypeReference, TypeShape};

#[test]
fn shapes_workspace_is_clean() {
    let (ws, files, _) = workspace_from(&SHAPES_WORKSPACE);
    for (file, diags) in files.iter().zip(all_diagnostics(&ws, &files)) {
        assert!(diags.is_empty(), "{file}: {diags:?}");
    }
}

#[test]
fn imported_reference_resolves_to_declaring_file() {
    let (ws, files, _) = workspace_from(&SHAPES_WORKSPACE);
    let circle = ws.get_type("shapes.Circle").unwrap();
    assert_eq!(circle.kind(), TypeKind::Struct);
    assert_eq!(circle.file, files[1]);
    let TypeShape::Struct { fields } = &circle.shape else {
        panic!("expected struct shape");
    };
    match &fields[0].ty {
        TypeReference::Resolved {
            qualified_name,
            file,
        } => {
            assert_eq!(qualified_name, "geometry.Point");
            assert_eq!(*file, files[0]);
        }
        other => panic!("center not resolved: {other:?}"),
    }
}

#[test]
fn union_and_service_shapes_assemble() {
    let (ws, _, _) = workspace_from(&SHAPES_WORKSPACE);

    let drawable = ws.get_type("render.Drawable").unwrap();
    assert_eq!(drawable.kind(), TypeKind::Union);
    let TypeShape::Union { discriminant, arms } = &drawable.shape else {
        panic!("expected union shape");
    };
    assert!(discriminant.is_some());
    assert_eq!(arms.len(), 2);
    assert!(arms.iter().all(|a| a.ty.is_fully_resolved()));

    let renderer = ws.get_type("render.Renderer").unwrap();
    assert_eq!(renderer.kind(), TypeKind::Service);
    let TypeShape::Service { methods } = &renderer.shape else {
        panic!("expected service shape");
    };
    assert_eq!(methods.len(), 2);
    assert!(methods.iter().all(|m| m.return_ty.is_fully_resolved()));
}

#[test]
fn transitive_dependents_follow_import_chain() {
    let (ws, files, _) = workspace_from(&SHAPES_WORKSPACE);
    let dependents = ws.get_dependents(files[0]).unwrap();
    assert!(dependents.contains(&files[1]));
    assert!(dependents.contains(&files[2]));
    assert!(ws.get_dependents(files[2]).unwrap().is_empty());
}

#[test]
fn import_cycle_diagnosed_on_every_member_resolution_continues() {
    let (ws, files, _) = workspace_from(&[CYCLE_X, CYCLE_Y]);
    for &file in &files {
        assert_eq!(
            count_code(&ws.get_diagnostics(file), DiagnosticCode::CyclicImport),
            1,
            "{file}"
        );
    }
    // Cycle members still resolve their own declarations
    assert!(ws.get_type("x.A").is_some());
    assert!(ws.get_type("y.B").is_some());
}

#[test]
fn same_name_in_two_imports_is_ambiguous() {
    let (mut ws, files, map) = workspace_from(&[
        "struct P { int32 v; }",
        "struct P { float v; }",
        "import a; import b; struct S { P p; }",
    ]);
    // Top-level declarations register no module paths; bind them by hand
    map.insert("a", files[0]);
    map.insert("b", files[1]);
    ws.analyze();

    let diags = ws.get_diagnostics(files[2]);
    assert_has_code(&diags, DiagnosticCode::UnresolvedType);
    assert!(diags
        .iter()
        .any(|d| d.message.contains("ambiguous")), "{diags:?}");
    // The other two files stay clean
    assert!(ws.get_diagnostics(files[0]).is_empty());
    assert!(ws.get_diagnostics(files[1]).is_empty());
}

#[test]
fn duplicate_enum_member_diagnosed_once_with_related() {
    let (ws, files, _) = workspace_from(&["enum Color { RED, GREEN, RED }"]);
    let diags = ws.get_diagnostics(files[0]);
    assert_eq!(
        count_code(&diags, DiagnosticCode::DuplicateSymbol),
        1,
        "{diags:?}"
    );
    let dup = diags
        .iter()
        .find(|d| d.code == DiagnosticCode::DuplicateSymbol)
        .unwrap();
    assert_eq!(dup.related.len(), 1);
    assert_eq!(dup.related[0].file, files[0]);
}

#[test]
fn unresolved_import_does_not_block_local_analysis() {
    let (ws, files, _) = workspace_from(&["import nowhere; struct S { int32 v; }"]);
    let diags = ws.get_diagnostics(files[0]);
    assert_has_code(&diags, DiagnosticCode::UnresolvedImport);
    assert!(ws.get_type("S").is_some());
}
