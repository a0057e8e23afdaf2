//! Common source fixtures for tests.

pub const SIMPLE_POINT: &str = "struct Point { float x; float y; }";

pub const GEOMETRY_MODULE: &str = r#"
module geometry {
    struct Point { float x; float y; }
    struct Line { Point a; Point b; }
}
"#;

pub const COLOR_ENUM: &str = "enum Color { RED, GREEN, BLUE }";

pub const SHAPES_WORKSPACE: [&str; 3] = [
    r#"
module geometry {
    struct Point { float x; float y; }
}
"#,
    r#"
import geometry;
module shapes {
    struct Circle { geometry.Point center; double radius; }
    struct Polygon { list<geometry.Point> vertices; }
}
"#,
    r#"
import shapes;
module render {
    union Drawable : uint8 {
        shapes.Circle circle;
        shapes.Polygon polygon;
    }
    interface Renderer {
        void draw(shapes.Circle c);
        list<shapes.Polygon> visible();
    }
}
"#,
];

pub const CYCLE_X: &str = "module x { struct A { int32 v; } } import y;";
pub const CYCLE_Y: &str = "module y { struct B { int32 v; } } import x;";
