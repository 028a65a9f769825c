use skein_bytecode::{Label, Op};
use skein_core::Position;
use skein_vm::{Machine, Object, ObjectRef};

use crate::ast::Ast;
use crate::desugar::desugar;
use crate::emit::{emit_code, emit_data};
use crate::environment::Namespace;
use crate::lift::lift;
use crate::parser::parse_module;
use crate::prelude;
use crate::semantic::{declare, identify};

fn emitted(text: &str) -> (Machine, Vec<ObjectRef>) {
    let env = Namespace::shared();
    let mut machine = Machine::new();
    prelude::install(&mut machine, &env);
    let module = parse_module("m.sk", text).unwrap();
    declare(&env, &module).unwrap();
    let module = identify(&env, &module).unwrap();
    let module = desugar(&module).unwrap();
    let module = lift(&module).unwrap();
    let mut out = emit_data(&mut machine, &module).unwrap();
    out.extend(emit_code(&mut machine, &module).unwrap());
    (machine, out)
}

fn code_of<'m>(machine: &'m Machine, symbol: &str) -> &'m [Op] {
    machine
        .find_combinator(symbol)
        .unwrap_or_else(|| panic!("{symbol} not registered"))
        .code()
        .unwrap_or_else(|| panic!("{symbol} is not bytecode"))
}

#[test]
fn emit_data_registers_data_combinators() {
    let (machine, out) = emitted("data red, green");
    assert!(machine.find_combinator("red").unwrap().is_data());
    assert!(machine.find_combinator("green").unwrap().is_data());
    assert_eq!(out.len(), 2);
}

#[test]
fn constant_definition_compiles_to_the_expected_stream() {
    let (machine, _) = emitted("def f = 1");
    let code = code_of(&machine, "f");
    assert_eq!(
        code,
        &[
            // prologue: load (rt, rti, k, exc, c) from the frame
            Op::Takex { first: 1, last: 5, frame: 0, offset: 0 },
            Op::Fail { target: Label(10) },
            // the constant thunk
            Op::Mov { dst: 6, src: 1 },
            Op::Mov { dst: 7, src: 2 },
            Op::Mov { dst: 8, src: 3 },
            Op::Mov { dst: 9, src: 4 },
            Op::Data { dst: 10, idx: 0 },
            Op::Array { dst: 11, first: 6, last: 10 },
            Op::Concatx { dst: 12, src: 11, frame: 0, offset: 5 },
            Op::Return { src: 12 },
            // no clause matched: rebuild the redex and give it back
            Op::Array { dst: 6, first: 2, last: 1 },
            Op::Concatx { dst: 7, src: 6, frame: 0, offset: 4 },
            Op::Set { rt: 1, rti: 2, src: 7 },
            Op::Return { src: 3 },
        ]
    );
    let data = machine.find_combinator("f").unwrap();
    assert_eq!(*data.data_table().unwrap()[0], Object::Integer(1));
}

#[test]
fn literal_patterns_test_against_interned_data() {
    let (machine, _) = emitted("def g = [ 0 -> 1 | N -> N ]");
    let code = code_of(&machine, "g");
    // first clause: take the argument, then data/test/fail the literal
    assert_eq!(code[0], Op::Takex { first: 1, last: 5, frame: 0, offset: 0 });
    assert_eq!(code[2], Op::Takex { first: 6, last: 6, frame: 0, offset: 5 });
    assert!(matches!(code[3], Op::Fail { .. }));
    assert_eq!(code[4], Op::Data { dst: 7, idx: 0 });
    assert_eq!(code[5], Op::Test { lhs: 6, rhs: 7 });
    assert!(matches!(code[6], Op::Fail { .. }));
}

#[test]
fn sibling_clauses_share_the_register_space() {
    let (machine, _) = emitted("def g = [ 0 -> 1 | N -> N ]");
    let code = code_of(&machine, "g");
    let takes: Vec<&Op> = code
        .iter()
        .filter(|op| matches!(op, Op::Takex { offset: 5, .. }))
        .collect();
    assert_eq!(takes.len(), 2);
    // the register counter was rolled back between the clauses
    assert_eq!(takes[0], takes[1]);
}

#[test]
fn every_clause_returns_to_its_continuation() {
    let (machine, _) = emitted("def g = [ 0 -> 1 | N -> N | _ -> 2 ]");
    let code = code_of(&machine, "g");
    let returns = code.iter().filter(|op| matches!(op, Op::Return { .. })).count();
    // one per clause plus the shared fail epilogue
    assert_eq!(returns, 4);
}

#[test]
fn applications_assemble_thunks_head_first() {
    let (machine, _) = emitted("def f = [ X -> g X ]\ndef g = [ X -> X ]");
    let code = code_of(&machine, "f");
    // somewhere in the stream: the head is loaded as data, the argument slot
    // nil'd, the thunk array built and installed as continuation
    assert!(code.iter().any(|op| matches!(op, Op::Data { .. })));
    assert!(code.iter().any(|op| matches!(op, Op::Nil { .. })));
    assert!(code.iter().any(|op| matches!(op, Op::Array { .. })));
    assert!(code.iter().any(|op| matches!(op, Op::Concatx { offset: 6, .. })));
}

#[test]
fn tuple_patterns_split_the_scrutinee() {
    let (machine, _) = emitted("def swap = [ (X, Y) -> (Y, X) ]");
    let code = code_of(&machine, "swap");
    assert!(code.iter().any(|op| matches!(op, Op::Split { .. })));
    // the pattern head System::tuple is tested as data
    assert!(code.iter().any(|op| matches!(op, Op::Test { .. })));
}

#[test]
fn tag_patterns_emit_head_symbol_tests() {
    let (machine, _) = emitted("data c\ndef f = [ X : c -> X ]");
    let code = code_of(&machine, "f");
    assert!(code.iter().any(|op| matches!(op, Op::Tag { .. })));
}

#[test]
fn try_installs_an_exception_thunk() {
    let (machine, _) = emitted("def t = try 1 catch h\ndef h = [ X -> X ]");
    let code = code_of(&machine, "t");
    // six registers are nil'd/moved and gathered for the handler thunk
    let arrays = code.iter().filter(|op| matches!(op, Op::Array { .. })).count();
    assert!(arrays >= 2, "expected handler and body thunks, got {arrays}");
    let nils = code.iter().filter(|op| matches!(op, Op::Nil { .. })).count();
    assert!(nils >= 2);
}

#[test]
fn recursive_references_resolve_through_forward_stubs() {
    let (machine, out) = emitted("def g = [ 0 -> 1 | N -> N * (g (N - 1)) ]");
    // the self-reference interned a stub during emission, then the real
    // bytecode replaced it under the same symbol
    assert!(machine.find_combinator("g").unwrap().is_bytecode());
    assert_eq!(out.len(), 1);
    let data = machine.find_combinator("g").unwrap();
    let table = data.data_table().unwrap();
    assert!(table.iter().any(|o| o.symbol() == Some("g")));
}

#[test]
fn operators_and_values_emit_like_definitions() {
    let (machine, out) = emitted("val v = 1");
    assert!(machine.find_combinator("v").unwrap().is_bytecode());
    assert_eq!(out.len(), 1);

    // operator declarations take the same path as definitions
    let p = Position::new("m.sk", 1, 1);
    let body = Ast::block(
        p.clone(),
        vec![Ast::match_clause(
            p.clone(),
            vec![],
            Ast::empty(),
            Ast::integer(p.clone(), "1"),
        )],
    );
    let decl = Ast::op_def(p.clone(), Ast::operator(p.clone(), vec![], "plus"), body);
    let module = Ast::wrapper(p, vec![decl]);
    let mut machine = Machine::new();
    let out = emit_code(&mut machine, &module).unwrap();
    assert_eq!(out.len(), 1);
    assert!(machine.find_combinator("plus").unwrap().is_bytecode());
}

#[test]
#[should_panic(expected = "throw reached the emitter")]
fn a_throw_surviving_to_emission_is_an_internal_error() {
    let p = Position::new("m.sk", 1, 1);
    let body = Ast::block(
        p.clone(),
        vec![Ast::match_clause(
            p.clone(),
            vec![],
            Ast::empty(),
            Ast::throw(p.clone(), Ast::integer(p.clone(), "1")),
        )],
    );
    let def = Ast::def(p.clone(), Ast::combinator(p.clone(), vec![], "f"), body);
    let module = Ast::wrapper(p, vec![def]);
    let mut machine = Machine::new();
    let _ = emit_code(&mut machine, &module);
}

#[test]
fn registers_stay_monotonic_within_a_clause() {
    let (machine, _) = emitted("def f = [ X Y -> (X, Y) ]");
    let code = code_of(&machine, "f");
    // no destination register below the prologue allocations
    for op in code {
        if let Op::Mov { dst, .. } | Op::Data { dst, .. } | Op::Array { dst, .. } = op {
            assert!(*dst >= 1, "destination clobbered the frame register");
        }
    }
}
