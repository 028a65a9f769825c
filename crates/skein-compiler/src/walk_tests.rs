use std::rc::Rc;

use skein_core::{Position, Result};

use crate::ast::{Ast, AstRef};
use crate::walk::{Rewrite, Transform, Visit, free_vars, occurs, substitute};

fn at(line: u32, column: u32) -> Position {
    Position::new("m.sk", line, column)
}

fn sample_if() -> AstRef {
    let p = at(1, 1);
    Ast::if_(
        p.clone(),
        Ast::combinator(p.clone(), vec!["System".into()], "true"),
        Ast::integer(p.clone(), "1"),
        Ast::integer(p, "2"),
    )
}

#[test]
fn rewrite_default_reconstructs_an_equal_tree() {
    struct Id;
    impl Rewrite for Id {}

    let a = sample_if();
    let b = Id.rewrite(&a).unwrap();
    assert_eq!(a, b);
    // rewrite rebuilds, it does not share
    assert!(!Rc::ptr_eq(&a, &b));
}

#[test]
fn transform_default_keeps_leaf_sharing() {
    struct Id;
    impl Transform for Id {}

    let a = sample_if();
    let b = Id.transform(&a).unwrap();
    assert_eq!(a, b);
    let (Ast::If { cond: ca, .. }, Ast::If { cond: cb, .. }) = (a.as_ref(), b.as_ref()) else {
        panic!("expected if nodes");
    };
    assert!(Rc::ptr_eq(ca, cb));
}

#[test]
fn visit_reaches_every_variable() {
    #[derive(Default)]
    struct Collect {
        names: Vec<String>,
    }
    impl Visit for Collect {
        fn visit_variable(&mut self, _pos: &Position, name: &str) -> Result<()> {
            self.names.push(name.to_string());
            Ok(())
        }
    }

    let p = at(1, 1);
    let clause = Ast::match_clause(
        p.clone(),
        vec![Ast::variable(p.clone(), "X"), Ast::variable(p.clone(), "Y")],
        Ast::empty(),
        Ast::apply(
            p.clone(),
            vec![Ast::variable(p.clone(), "Y"), Ast::variable(p, "X")],
        ),
    );
    let mut collect = Collect::default();
    collect.visit(&clause).unwrap();
    assert_eq!(collect.names, vec!["X", "Y", "Y", "X"]);
}

#[test]
fn hook_errors_abort_the_walk() {
    struct Reject;
    impl Visit for Reject {
        fn visit_integer(&mut self, pos: &Position, _text: &str) -> Result<()> {
            Err(skein_core::Error::semantical(pos.clone(), "no integers"))
        }
    }

    let err = Reject.visit(&sample_if()).unwrap_err();
    assert_eq!(err.category(), "semantical");
}

#[test]
fn occurs_finds_structurally_equal_subterms() {
    let a = sample_if();
    let one = Ast::integer(at(9, 9), "1");
    let three = Ast::integer(at(9, 9), "3");
    assert!(occurs(&one, &a));
    assert!(!occurs(&three, &a));
}

#[test]
fn substitute_replaces_unshadowed_occurrences() {
    let p = at(1, 1);
    let x = Ast::variable(p.clone(), "X");
    let y = Ast::variable(p.clone(), "Y");
    let body = Ast::apply(p.clone(), vec![x.clone(), Ast::integer(p, "1")]);
    let out = substitute(&body, &x, &y).unwrap();
    assert!(occurs(&y, &out));
    assert!(!occurs(&x, &out));
}

#[test]
fn substitute_respects_pattern_binders() {
    let p = at(1, 1);
    let x = Ast::variable(p.clone(), "X");
    let y = Ast::variable(p.clone(), "Y");
    // [ X -> X ]: the pattern binds X, so the body occurrence is shadowed
    let clause = Ast::match_clause(p.clone(), vec![x.clone()], Ast::empty(), x.clone());
    let block = Ast::block(p, vec![clause]);
    let out = substitute(&block, &x, &y).unwrap();
    assert_eq!(out, block);
}

#[test]
fn free_vars_removes_match_binders() {
    let p = at(1, 1);
    // [ X -> X Y ]: X is bound, Y is free
    let clause = Ast::match_clause(
        p.clone(),
        vec![Ast::variable(p.clone(), "X")],
        Ast::empty(),
        Ast::apply(
            p.clone(),
            vec![Ast::variable(p.clone(), "X"), Ast::variable(p.clone(), "Y")],
        ),
    );
    let block = Ast::block(p.clone(), vec![clause]);
    let fv = free_vars(&block);
    assert_eq!(fv.len(), 1);
    assert!(fv.contains(&Ast::variable(p, "Y")));
}

#[test]
fn free_vars_removes_let_binders() {
    let p = at(1, 1);
    // let X = Z in X W: Z and W are free
    let l = Ast::let_(
        p.clone(),
        vec![Ast::variable(p.clone(), "X")],
        Ast::variable(p.clone(), "Z"),
        Ast::apply(
            p.clone(),
            vec![Ast::variable(p.clone(), "X"), Ast::variable(p.clone(), "W")],
        ),
    );
    let fv = free_vars(&l);
    let names: Vec<String> = fv.iter().map(|v| v.to_string()).collect();
    assert_eq!(names, vec!["W", "Z"]);
}

#[test]
fn free_vars_order_is_deterministic() {
    let p = at(1, 1);
    let e = Ast::apply(
        p.clone(),
        vec![
            Ast::variable(p.clone(), "B"),
            Ast::variable(p.clone(), "A"),
            Ast::variable(p, "C"),
        ],
    );
    let names: Vec<String> = free_vars(&e).iter().map(|v| v.to_string()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}
