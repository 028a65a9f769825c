use indoc::indoc;

use skein_core::{Position, Result};
use skein_vm::Machine;

use crate::ast::{Ast, AstRef};
use crate::environment::{Namespace, NamespaceRef, lookup};
use crate::parser::parse_module;
use crate::prelude;
use crate::semantic::{declare, identify};
use crate::walk::Visit;

fn seeded_env() -> NamespaceRef {
    let env = Namespace::shared();
    let mut machine = Machine::new();
    prelude::install(&mut machine, &env);
    env
}

fn identified(text: &str) -> AstRef {
    let env = seeded_env();
    let module = parse_module("m.sk", text).unwrap();
    declare(&env, &module).unwrap();
    identify(&env, &module).unwrap()
}

/// Property check: no namespace, import or using nodes survive identify and
/// every combinator is flat (empty path, fully qualified name).
#[derive(Default)]
struct Flattened {
    qualified: Vec<String>,
}

impl Visit for Flattened {
    fn visit_combinator(&mut self, _pos: &Position, path: &[String], name: &str) -> Result<()> {
        assert!(path.is_empty(), "combinator {name} kept a path");
        self.qualified.push(name.to_string());
        Ok(())
    }

    fn visit_operator(&mut self, pos: &Position, path: &[String], name: &str) -> Result<()> {
        self.visit_combinator(pos, path, name)
    }

    fn visit_namespace(&mut self, _pos: &Position, path: &[String], _decls: &[AstRef]) -> Result<()> {
        panic!("namespace {} survived identify", path.join("::"));
    }

    fn visit_import(&mut self, _pos: &Position, file: &str) -> Result<()> {
        panic!("import {file} survived identify");
    }

    fn visit_using(&mut self, _pos: &Position, path: &[String]) -> Result<()> {
        panic!("using {} survived identify", path.join("::"));
    }
}

#[test]
fn identify_flattens_namespaces_and_qualifies_names() {
    let module = identified(indoc! {"
        namespace A ( def x = 1 )
        namespace B ( def x = 2 )
        def y = A::x + B::x
    "});
    assert_eq!(
        module.to_string(),
        "def A::x = 1\ndef B::x = 2\ndef y = (System::+ A::x B::x)"
    );

    let mut check = Flattened::default();
    check.visit(&module).unwrap();
    assert!(check.qualified.contains(&"A::x".to_string()));
    assert!(check.qualified.contains(&"B::x".to_string()));
}

#[test]
fn identified_names_resolve_in_the_namespace_tree() {
    let env = seeded_env();
    let module = parse_module("m.sk", "namespace A ( def x = 1 )").unwrap();
    declare(&env, &module).unwrap();
    let module = identify(&env, &module).unwrap();

    let mut check = Flattened::default();
    check.visit(&module).unwrap();
    for qualified in &check.qualified {
        let mut segments: Vec<String> = qualified.split("::").map(String::from).collect();
        let name = segments.pop().unwrap();
        assert_eq!(
            lookup(&env, &segments, &name).as_deref(),
            Some(qualified.as_str()),
            "{qualified} is not a key in the flattened namespace"
        );
    }
}

#[test]
fn redeclaration_is_a_semantical_error() {
    let env = seeded_env();
    let module = parse_module("m.sk", "def k = 1 def k = 2").unwrap();
    let err = declare(&env, &module).unwrap_err();
    assert_eq!(err.to_string(), "m.sk:1:15: semantical: redeclaration of k");
}

#[test]
fn undeclared_names_are_rejected() {
    let env = seeded_env();
    let module = parse_module("m.sk", "def f = g").unwrap();
    declare(&env, &module).unwrap();
    let err = identify(&env, &module).unwrap_err();
    assert_eq!(err.category(), "semantical");
    assert_eq!(err.message(), "undeclared g");
}

#[test]
fn self_reference_resolves() {
    let module = identified("def g = [ 0 -> 1 | N -> N * (g (N - 1)) ]");
    assert_eq!(
        module.to_string(),
        "def g = [0 -> 1 | V_0 -> (System::* V_0 (g (System::- V_0 1)))]"
    );
}

#[test]
fn pattern_variables_are_alpha_renamed() {
    let module = identified("def f = [ X -> X ]\ndef h = [ X -> X ]");
    // bindings are unique across the whole module
    assert_eq!(module.to_string(), "def f = [V_0 -> V_0]\ndef h = [V_1 -> V_1]");
}

#[test]
fn pattern_combinators_resolve_against_the_prelude() {
    let module = identified("def head = [ (cons X XX) -> X ]");
    assert_eq!(
        module.to_string(),
        "def head = [(System::cons V_0 V_1) -> V_0]"
    );
}

#[test]
fn duplicate_pattern_variable_is_rejected() {
    let env = seeded_env();
    let module = parse_module("m.sk", "def f = [ X X -> X ]").unwrap();
    declare(&env, &module).unwrap();
    let err = identify(&env, &module).unwrap_err();
    assert_eq!(err.message(), "redeclaration of X");
}

#[test]
fn using_brings_a_namespace_into_scope() {
    let module = identified(indoc! {"
        namespace A ( def x = 1 )
        using A
        def y = x
    "});
    assert_eq!(module.to_string(), "def A::x = 1\ndef y = A::x");
}

#[test]
fn let_bindings_are_not_recursive() {
    let env = seeded_env();
    let module = parse_module("m.sk", "def f = let X = X in X").unwrap();
    declare(&env, &module).unwrap();
    let err = identify(&env, &module).unwrap_err();
    assert_eq!(err.message(), "undeclared X");
}

#[test]
fn tag_patterns_bind_and_resolve() {
    let module = identified("data c\ndef f = [ X : c -> X ]");
    assert_eq!(module.to_string(), "data c\ndef f = [V_0 : c -> V_0]");
}

#[test]
fn imports_are_flattened_out() {
    let module = identified("import \"prelude.sk\"\ndef f = 1");
    assert_eq!(module.to_string(), "def f = 1");
}

#[test]
fn object_fields_are_declared_implicitly_and_resolved() {
    let module = identified(indoc! {"
        object point X Y ( def getx = X def gety = Y )
        object other ( def getx = 1 )
    "});
    assert_eq!(
        module.to_string(),
        "object point V_0 V_1 (def Fields::getx = V_0 def Fields::gety = V_1)\n\
         object other (def Fields::getx = 1)"
    );
}

#[test]
fn blocks_are_illegal_in_patterns() {
    let p = Position::new("m.sk", 1, 1);
    let inner = Ast::block(
        p.clone(),
        vec![Ast::match_clause(
            p.clone(),
            vec![],
            Ast::empty(),
            Ast::integer(p.clone(), "1"),
        )],
    );
    let clause = Ast::match_clause(p.clone(), vec![inner], Ast::empty(), Ast::integer(p.clone(), "2"));
    let body = Ast::block(p.clone(), vec![clause]);
    let def = Ast::def(p.clone(), Ast::combinator(p.clone(), vec![], "f"), body);
    let module = Ast::wrapper(p, vec![def]);

    let env = seeded_env();
    declare(&env, &module).unwrap();
    let err = identify(&env, &module).unwrap_err();
    assert_eq!(err.category(), "identification");
    assert_eq!(err.message(), "block expression not allowed in pattern");
}
