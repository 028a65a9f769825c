use crate::{Error, Position, qualify, qualify_path};

#[test]
fn position_displays_source_line_column() {
    let p = Position::new("main.sk", 3, 14);
    assert_eq!(p.to_string(), "main.sk:3:14");
}

#[test]
fn position_equality_compares_contents() {
    assert_eq!(Position::new("a", 1, 1), Position::new("a", 1, 1));
    assert_ne!(Position::new("a", 1, 1), Position::new("a", 1, 2));
}

#[test]
fn error_renders_category_between_position_and_message() {
    let e = Error::semantical(Position::new("m.sk", 2, 5), "redeclaration of k");
    assert_eq!(e.to_string(), "m.sk:2:5: semantical: redeclaration of k");
    assert_eq!(e.category(), "semantical");
}

#[test]
fn error_accessors_expose_position_and_message() {
    let p = Position::new("m.sk", 7, 1);
    let e = Error::identification(p.clone(), "variable expected");
    assert_eq!(e.position(), &p);
    assert_eq!(e.message(), "variable expected");
}

#[test]
fn qualify_joins_with_double_colon() {
    let path = vec!["a".to_string(), "b".to_string()];
    assert_eq!(qualify(&path, "c"), "a::b::c");
    assert_eq!(qualify(&[], "c"), "c");
    assert_eq!(qualify_path(&path), "a::b");
}
