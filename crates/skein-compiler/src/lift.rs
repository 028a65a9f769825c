//! Combinator lifting: eta expansion, application flattening, hoisting of
//! nested blocks into fresh top-level definitions, and wrapping of bare
//! definition bodies in nullary blocks.
//!
//! After this chain every definition body is a block whose matches reference
//! only pattern-bound variables and top-level combinators.

use skein_core::{Error, Position, Result};

use crate::ast::{Ast, AstRef};
use crate::walk::{Rewrite, free_vars};

pub fn lift(a: &AstRef) -> Result<AstRef> {
    let a = pass_eta(a)?;
    let a = pass_deapply(&a)?;
    let a = pass_lift(&a)?;
    pass_relambda(&a)
}

//  prefix every match of a block with the block's free variables and apply
//  the now-closed block to them; closed blocks are left alone
struct Eta;

fn push_front(vars: &[AstRef], clause: &AstRef) -> AstRef {
    match clause.as_ref() {
        Ast::Match { pos, patterns, guard, result } => {
            let mut prefixed: Vec<AstRef> = vars.to_vec();
            prefixed.extend(patterns.iter().cloned());
            Ast::match_clause(pos.clone(), prefixed, guard.clone(), result.clone())
        }
        _ => panic!(
            "{}",
            Error::internal(clause.position(), "match expected in block")
        ),
    }
}

impl Rewrite for Eta {
    fn rewrite_block(&mut self, pos: &Position, clauses: &[AstRef]) -> Result<AstRef> {
        let clauses = self.rewrites(clauses)?;
        let block = Ast::block(pos.clone(), clauses);
        let fv: Vec<AstRef> = free_vars(&block).into_iter().collect();
        if fv.is_empty() {
            return Ok(block);
        }
        let Ast::Block { clauses, .. } = block.as_ref() else {
            unreachable!()
        };
        let prefixed: Vec<AstRef> = clauses.iter().map(|m| push_front(&fv, m)).collect();
        let closed = Ast::block(pos.clone(), prefixed);
        let mut applied = vec![closed];
        applied.extend(fv);
        Ok(Ast::apply(pos.clone(), applied))
    }
}

pub fn pass_eta(a: &AstRef) -> Result<AstRef> {
    Eta.rewrite(a)
}

//  App(App(f, a..), b..)  ~>  App(f, a.., b..);  App(e)  ~>  e
struct Deapply;

impl Rewrite for Deapply {
    fn rewrite_apply(&mut self, pos: &Position, terms: &[AstRef]) -> Result<AstRef> {
        match terms.first().map(|t| t.as_ref()) {
            Some(Ast::Apply { pos: inner_pos, terms: inner }) => {
                let mut merged = inner.clone();
                merged.extend(terms[1..].iter().cloned());
                self.rewrite(&Ast::apply(inner_pos.clone(), merged))
            }
            _ if terms.len() == 1 => self.rewrite(&terms[0]),
            _ => Ok(Ast::apply(pos.clone(), self.rewrites(terms)?)),
        }
    }
}

pub fn pass_deapply(a: &AstRef) -> Result<AstRef> {
    Deapply.rewrite(a)
}

//  hoist every block that is not the direct body of a declaration into a
//  fresh top-level definition named <scope>::local::<counter>
#[derive(Default)]
struct Lift {
    scope: Option<AstRef>,
    counter: u32,
    lifted: Vec<AstRef>,
}

impl Lift {
    fn set_scope(&mut self, name: &AstRef) {
        self.scope = Some(name.clone());
        self.counter = 0;
        self.lifted = Vec::new();
    }

    fn fresh_combinator(&mut self) -> AstRef {
        let scope = self.scope.as_ref().expect("lift outside a declaration");
        let tick = self.counter;
        self.counter += 1;
        match scope.as_ref() {
            Ast::Combinator { pos, path, name } => {
                Ast::combinator(pos.clone(), path.clone(), format!("{name}::local::{tick}"))
            }
            Ast::Operator { pos, path, name } => {
                Ast::operator(pos.clone(), path.clone(), format!("{name}::local::{tick}"))
            }
            _ => panic!(
                "{}",
                Error::internal(scope.position(), "combinator expected as scope")
            ),
        }
    }

    /// Rewrite a declaration body, keeping a root block in place, and wrap
    /// the result with the lifted helpers when there are any.
    fn lift_decl(
        &mut self,
        pos: &Position,
        name: &AstRef,
        body: &AstRef,
        make: fn(Position, AstRef, AstRef) -> AstRef,
    ) -> Result<AstRef> {
        self.set_scope(name);
        let body = match body.as_ref() {
            Ast::Block { pos: bpos, clauses } => {
                let clauses = self.rewrites(clauses)?;
                Ast::block(bpos.clone(), clauses)
            }
            _ => self.rewrite(body)?,
        };
        let decl = make(pos.clone(), name.clone(), body);
        let mut lifted = std::mem::take(&mut self.lifted);
        if lifted.is_empty() {
            Ok(decl)
        } else {
            lifted.push(decl);
            Ok(Ast::wrapper(pos.clone(), lifted))
        }
    }
}

impl Rewrite for Lift {
    fn rewrite_block(&mut self, pos: &Position, clauses: &[AstRef]) -> Result<AstRef> {
        let clauses = self.rewrites(clauses)?;
        let block = Ast::block(pos.clone(), clauses);
        let name = self.fresh_combinator();
        self.lifted.push(Ast::def(pos.clone(), name.clone(), block));
        Ok(name)
    }

    fn rewrite_def(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        self.lift_decl(pos, name, body, Ast::def)
    }

    fn rewrite_op_def(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        self.lift_decl(pos, name, body, Ast::op_def)
    }

    fn rewrite_value(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        self.lift_decl(pos, name, body, Ast::value)
    }
}

pub fn pass_lift(a: &AstRef) -> Result<AstRef> {
    Lift::default().rewrite(a)
}

//  wrap any definition body that is not already a block in a nullary block,
//  so the emitter always sees a block at the root of a definition
struct Relambda;

fn relambda_body(pos: &Position, body: AstRef) -> AstRef {
    if body.is_block() {
        return body;
    }
    let clause = Ast::match_clause(pos.clone(), vec![], Ast::empty(), body);
    Ast::block(pos.clone(), vec![clause])
}

impl Rewrite for Relambda {
    fn rewrite_def(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        Ok(Ast::def(
            pos.clone(),
            name.clone(),
            relambda_body(pos, body.clone()),
        ))
    }

    fn rewrite_op_def(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        Ok(Ast::op_def(
            pos.clone(),
            name.clone(),
            relambda_body(pos, body.clone()),
        ))
    }

    fn rewrite_value(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        Ok(Ast::value(
            pos.clone(),
            name.clone(),
            relambda_body(pos, body.clone()),
        ))
    }
}

pub fn pass_relambda(a: &AstRef) -> Result<AstRef> {
    Relambda.rewrite(a)
}
