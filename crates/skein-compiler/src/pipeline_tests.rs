use indoc::indoc;

use skein_bytecode::dump;
use skein_vm::Machine;

use crate::ast::Ast;
use crate::desugar::desugar;
use crate::environment::{Namespace, NamespaceRef};
use crate::parser::parse_module;
use crate::semantic::{declare, identify};
use crate::{compile_source, prelude};

fn session() -> (Machine, NamespaceRef) {
    let env = Namespace::shared();
    let mut machine = Machine::new();
    prelude::install(&mut machine, &env);
    (machine, env)
}

#[test]
fn conditional_definition_compiles_to_helper_and_wrapper() {
    let (mut machine, env) = session();
    let out = compile_source(&mut machine, &env, "m.sk", "def f = if true then 1 else 2").unwrap();
    assert_eq!(out.len(), 2);
    assert!(machine.find_combinator("f::local::0").unwrap().is_bytecode());
    assert!(machine.find_combinator("f").unwrap().is_bytecode());
}

#[test]
fn tuple_swap_compiles_to_a_single_definition() {
    let (mut machine, env) = session();
    let out = compile_source(&mut machine, &env, "m.sk", "def swap = [ (X, Y) -> (Y, X) ]").unwrap();
    assert_eq!(out.len(), 1);
    assert!(machine.find_combinator("swap").unwrap().is_bytecode());
    assert!(machine.find_combinator("swap::local::0").is_none());
}

#[test]
fn namespaces_flatten_and_resolve_across_modules() {
    let (mut machine, env) = session();
    compile_source(
        &mut machine,
        &env,
        "m1.sk",
        indoc! {"
            namespace A ( def x = 1 )
            namespace B ( def x = 2 )
        "},
    )
    .unwrap();
    assert!(machine.find_combinator("A::x").unwrap().is_bytecode());
    assert!(machine.find_combinator("B::x").unwrap().is_bytecode());

    // a later module resolves both qualified names against the same tree
    let out = compile_source(&mut machine, &env, "m2.sk", "def y = A::x + B::x").unwrap();
    assert_eq!(out.len(), 1);
    assert!(machine.find_combinator("y").unwrap().is_bytecode());
}

#[test]
fn recursive_factorial_style_definition_compiles() {
    let (mut machine, env) = session();
    compile_source(
        &mut machine,
        &env,
        "m.sk",
        "def g = [ 0 -> 1 | N -> N * (g (N - 1)) ]",
    )
    .unwrap();
    let g = machine.find_combinator("g").unwrap();
    let text = dump(g.code().unwrap());
    let lines: Vec<&str> = text.lines().collect();
    // prologue, then the first clause takes its argument and matches 0 by
    // data/test/fail
    assert_eq!(lines[0], "   0: takex r1, r5, r0, 0");
    assert_eq!(lines[2], "   2: takex r6, r6, r0, 5");
    assert_eq!(lines[4], "   4: data r7, d0");
    assert_eq!(lines[5], "   5: test r6, r7");
    assert!(lines[6].contains("fail"));
}

#[test]
fn let_over_tuple_compiles_through_the_lifted_helper() {
    let (mut machine, env) = session();
    let out = compile_source(
        &mut machine,
        &env,
        "m.sk",
        "def h = let (A, B) = (1, 2) in A",
    )
    .unwrap();
    assert_eq!(out.len(), 2);
    assert!(machine.find_combinator("h::local::0").unwrap().is_bytecode());
    assert!(machine.find_combinator("h").unwrap().is_bytecode());
}

#[test]
fn redeclaration_aborts_the_module() {
    let (mut machine, env) = session();
    let err = compile_source(&mut machine, &env, "m.sk", "def k = 1 def k = 2").unwrap_err();
    assert_eq!(err.to_string(), "m.sk:1:15: semantical: redeclaration of k");
    // nothing was emitted for the module
    assert!(machine.find_combinator("k").is_none());
}

#[test]
fn errors_render_in_the_diagnostic_format() {
    let (mut machine, env) = session();
    let err = compile_source(&mut machine, &env, "m.sk", "def f = g").unwrap_err();
    assert_eq!(err.to_string(), "m.sk:1:9: semantical: undeclared g");
}

#[test]
fn data_objects_come_before_code_objects() {
    let (mut machine, env) = session();
    let out = compile_source(&mut machine, &env, "m.sk", "data c\ndef f = c").unwrap();
    assert_eq!(out.len(), 2);
    assert!(out[0].is_data());
    assert!(out[1].is_bytecode());
}

#[test]
fn synthesized_nodes_inherit_source_positions() {
    let env = Namespace::shared();
    let mut machine = Machine::new();
    prelude::install(&mut machine, &env);

    let module = parse_module("m.sk", "def f = if true then 1 else 2").unwrap();
    declare(&env, &module).unwrap();
    let module = identify(&env, &module).unwrap();

    let if_position = {
        let Ast::Wrapper { decls, .. } = module.as_ref() else {
            panic!("expected module wrapper");
        };
        let Ast::Def { body, .. } = decls[0].as_ref() else {
            panic!("expected definition");
        };
        body.position()
    };
    assert_eq!(if_position.to_string(), "m.sk:1:9");

    let module = desugar(&module).unwrap();
    let Ast::Wrapper { decls, .. } = module.as_ref() else {
        panic!("expected module wrapper");
    };
    let Ast::Def { body, .. } = decls[0].as_ref() else {
        panic!("expected definition");
    };
    // the block application that replaced the conditional sits where the
    // conditional was
    assert_eq!(body.position(), if_position);
    let Ast::Apply { terms, .. } = body.as_ref() else {
        panic!("expected applied block, got {body}");
    };
    assert_eq!(terms[0].position(), if_position);
}

#[test]
fn objects_compile_end_to_end() {
    let (mut machine, env) = session();
    let out = compile_source(
        &mut machine,
        &env,
        "m.sk",
        "object point X Y ( def getx = X def gety = Y )",
    )
    .unwrap();
    // two field data objects plus the constructor definition
    assert_eq!(out.len(), 3);
    assert!(machine.find_combinator("Fields::getx").unwrap().is_data());
    assert!(machine.find_combinator("Fields::gety").unwrap().is_data());
    assert!(machine.find_combinator("point").unwrap().is_bytecode());
}

#[test]
fn values_and_statements_compile_end_to_end() {
    let (mut machine, env) = session();
    let out = compile_source(
        &mut machine,
        &env,
        "m.sk",
        "def f = [ X -> X ]\nval v = f 1; f 2",
    )
    .unwrap();
    // the statement lifts one helper next to f and v
    assert_eq!(out.len(), 3);
    assert!(machine.find_combinator("v").unwrap().is_bytecode());
    assert!(machine.find_combinator("v::local::0").unwrap().is_bytecode());
}
