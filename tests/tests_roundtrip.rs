//! Printer round trips: canonical output re-parses to a structurally equal
//! tree, and printing canonical output again changes nothing.

mod helpers;

use helpers::source_fixtures::{COLOR_ENUM, GEOMETRY_MODULE, SHAPES_WORKSPACE, SIMPLE_POINT};
use ridl::parser::parse;
use ridl::syntax::print;
use rstest::rstest;

#[rstest]
#[case::simple_point(SIMPLE_POINT)]
#[case::geometry_module(GEOMETRY_MODULE)]
#[case::color_enum(COLOR_ENUM)]
#[case::shapes_geometry(SHAPES_WORKSPACE[0])]
#[case::shapes_shapes(SHAPES_WORKSPACE[1])]
#[case::shapes_render(SHAPES_WORKSPACE[2])]
#[case::enum_tags("enum E { A = -1, B, C = 10 }")]
#[case::arrays_and_generics("struct S { uint8[16] key; sequence<optional<int32>> xs; }")]
#[case::documented("/// Top.\nmodule m { /// Inner.\nstruct S { /// Field.\nint32 v; } }")]
fn reparse_of_printed_output_is_structurally_equal(#[case] source: &str) {
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

#[rstest]
#[case::geometry_module(GEOMETRY_MODULE)]
#[case::shapes_render(SHAPES_WORKSPACE[2])]
fn printing_is_idempotent_on_canonical_output(#[case] source: &str) {
    let canonical = print(&parse(source).ast);
    let again = print(&parse(&canonical).ast);
    assert_eq!(canonical, again);
}

#[test]
fn malformed_regions_are_dropped_but_neighbors_survive() {
    let result = parse("struct Good { int32 v; } ??? struct AlsoGood { float w; }");
    assert!(!result.ok());
    let printed = print(&result.ast);
    assert!(printed.contains("struct Good"));
    assert!(printed.contains("struct AlsoGood"));
    // The printed form of a recovered tree is itself valid
    assert!(parse(&printed).ok(), "{printed}");
}
