use indoc::indoc;

use crate::ast::{Ast, AstRef};
use crate::parser::parse_module;

fn parse(text: &str) -> AstRef {
    parse_module("m.sk", text).unwrap()
}

fn only_decl(module: &AstRef) -> AstRef {
    let Ast::Wrapper { decls, .. } = module.as_ref() else {
        panic!("expected module wrapper");
    };
    assert_eq!(decls.len(), 1);
    decls[0].clone()
}

#[test]
fn parses_definitions_and_literals() {
    let m = parse("def f = 42");
    assert_eq!(only_decl(&m).to_string(), "def f = 42");
}

#[test]
fn parses_if_let_try_throw() {
    let m = parse("def f = if c then 1 else 2");
    assert_eq!(only_decl(&m).to_string(), "def f = if c then 1 else 2");

    let m = parse("def h = let X = 1 in X");
    assert_eq!(only_decl(&m).to_string(), "def h = let X = 1 in X");

    let m = parse("def t = try f 1 catch h");
    assert_eq!(only_decl(&m).to_string(), "def t = try (f 1) catch h");

    let m = parse("def e = throw boom");
    assert_eq!(only_decl(&m).to_string(), "def e = throw boom");
}

#[test]
fn parses_blocks_with_clauses_and_tuple_patterns() {
    let m = parse("def swap = [ (X, Y) -> (Y, X) ]");
    assert_eq!(only_decl(&m).to_string(), "def swap = [(X, Y) -> (Y, X)]");

    let m = parse("def g = [ 0 -> 1 | N -> N ]");
    assert_eq!(only_decl(&m).to_string(), "def g = [0 -> 1 | N -> N]");

    let m = parse("def k = [ -> 1 ]");
    assert_eq!(only_decl(&m).to_string(), "def k = [-> 1]");
}

#[test]
fn parses_application_pattern_and_tag() {
    let m = parse("def head = [ (cons X XX) -> X ]");
    assert_eq!(only_decl(&m).to_string(), "def head = [(cons X XX) -> X]");

    let m = parse("def tagged = [ X : c -> X ]");
    assert_eq!(only_decl(&m).to_string(), "def tagged = [X : c -> X]");
}

#[test]
fn parses_lists_statements_lambda_do() {
    let m = parse("def l = {1, 2 | XX}");
    assert_eq!(only_decl(&m).to_string(), "def l = {1, 2|XX}");

    let m = parse("def s = f 1; g 2");
    assert_eq!(only_decl(&m).to_string(), "def s = (f 1); (g 2)");

    let m = parse("def i = \\X -> X");
    assert_eq!(only_decl(&m).to_string(), "def i = \\X -> X");

    let m = parse("def d = do f |> g");
    assert_eq!(only_decl(&m).to_string(), "def d = do (|> f g)");
}

#[test]
fn operator_precedence_nests_tighter_levels_first() {
    let m = parse("def a = 1 + 2 * 3");
    assert_eq!(only_decl(&m).to_string(), "def a = (+ 1 (* 2 3))");

    let m = parse("def b = 1 < 2 && 3 < 4");
    assert_eq!(only_decl(&m).to_string(), "def b = (&& (< 1 2) (< 3 4))");

    let m = parse("def c = f 1 + g 2");
    assert_eq!(only_decl(&m).to_string(), "def c = (+ (f 1) (g 2))");

    let m = parse("def u = -x");
    assert_eq!(only_decl(&m).to_string(), "def u = (neg x)");
}

#[test]
fn parses_namespace_using_data_val() {
    let m = parse(indoc! {"
        using System
        namespace A (
            data red, green
            def x = 1
        )
        val v = 2
    "});
    let Ast::Wrapper { decls, .. } = m.as_ref() else {
        panic!("expected module wrapper");
    };
    assert_eq!(decls.len(), 3);
    assert_eq!(decls[0].to_string(), "using System");
    assert_eq!(decls[1].to_string(), "namespace A (data red, green def x = 1)");
    assert_eq!(decls[2].to_string(), "val v = 2");
}

#[test]
fn parses_qualified_names() {
    let m = parse("def y = A::x + A::B::y");
    assert_eq!(only_decl(&m).to_string(), "def y = (+ A::x A::B::y)");
}

#[test]
fn parses_objects() {
    let m = parse("object point X Y ( def getx = X def gety = Y )");
    assert_eq!(
        only_decl(&m).to_string(),
        "object point X Y (def getx = X def gety = Y)"
    );

    let m = parse("object colored ( def color = red ) extends base");
    assert_eq!(
        only_decl(&m).to_string(),
        "object colored (def color = red) extends base"
    );
}

#[test]
fn parses_import() {
    let m = parse(r#"import "prelude.sk""#);
    assert_eq!(only_decl(&m).to_string(), "import \"prelude.sk\"");
}

#[test]
fn rejects_malformed_input() {
    for (text, fragment) in [
        ("def = 1", "combinator name"),
        ("def f 1", "expected `=`"),
        ("def f = [ X -> ", "expected expression"),
        ("def f = (1", "expected `)`"),
        ("val", "combinator name"),
        ("1 + 2", "expected declaration"),
    ] {
        let err = parse_module("m.sk", text).unwrap_err();
        assert_eq!(err.category(), "syntactical", "input: {text}");
        assert!(
            err.message().contains(fragment),
            "input: {text}, message: {}",
            err.message()
        );
    }
}

#[test]
fn positions_point_at_the_offending_token() {
    let err = parse_module("m.sk", "def f =\n  )").unwrap_err();
    assert_eq!(err.position().to_string(), "m.sk:2:3");
}
