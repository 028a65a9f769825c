//! The desugaring pipeline: an ordered sequence of small rewrites that
//! eliminates surface-only constructs in favor of the minimal core (blocks
//! of matches, applications, combinators, literals, try, tag).
//!
//! The order matters: conditions introduce wildcards that the wildcard pass
//! renames, statements introduce lets that the let pass eliminates, and the
//! lazy-operator pass matches fully qualified names so identify must already
//! have run. Every synthesized node inherits the position of the construct
//! it replaces.

use skein_core::{Error, Position, Result};

use crate::ast::{Ast, AstRef};
use crate::walk::{Rewrite, Transform};

fn system() -> Vec<String> {
    vec!["System".to_string()]
}

/// Run the whole pipeline.
pub fn desugar(a: &AstRef) -> Result<AstRef> {
    let a = pass_condition(a)?;
    let a = pass_wildcard(&a)?;
    let a = pass_tuple(&a)?;
    let a = pass_list(&a)?;
    let a = pass_do(&a)?;
    let a = pass_statement(&a)?;
    let a = pass_let(&a)?;
    let a = pass_lambda(&a)?;
    let a = pass_object(&a)?;
    let a = pass_throw(&a)?;
    let a = pass_try(&a)?;
    let a = pass_lazyop(&a)?;
    pass_monmin(&a)
}

//  if i then t else e  ~>  [ true -> t | _ -> e ] i
struct Condition;

impl Rewrite for Condition {
    fn rewrite_if(
        &mut self,
        pos: &Position,
        cond: &AstRef,
        then: &AstRef,
        otherwise: &AstRef,
    ) -> Result<AstRef> {
        let cond = self.rewrite(cond)?;
        let then = self.rewrite(then)?;
        let otherwise = self.rewrite(otherwise)?;

        let true_clause = Ast::match_clause(
            pos.clone(),
            vec![Ast::combinator(pos.clone(), system(), "true")],
            Ast::empty(),
            then,
        );
        let else_clause = Ast::match_clause(
            pos.clone(),
            vec![Ast::wildcard(pos.clone(), "_")],
            Ast::empty(),
            otherwise,
        );
        let block = Ast::block(pos.clone(), vec![true_clause, else_clause]);
        Ok(Ast::apply(pos.clone(), vec![block, cond]))
    }
}

pub fn pass_condition(a: &AstRef) -> Result<AstRef> {
    Condition.rewrite(a)
}

//  _  ~>  WILD<tick>
#[derive(Default)]
struct Wildcard {
    tick: u32,
}

impl Rewrite for Wildcard {
    fn rewrite_wildcard(&mut self, pos: &Position, _name: &str) -> Result<AstRef> {
        let name = format!("WILD{}", self.tick);
        self.tick += 1;
        Ok(Ast::variable(pos.clone(), name))
    }
}

pub fn pass_wildcard(a: &AstRef) -> Result<AstRef> {
    Wildcard::default().rewrite(a)
}

//  (e0, .., en)  ~>  tuple e0 .. en
struct TuplePass;

impl Rewrite for TuplePass {
    fn rewrite_tuple(&mut self, pos: &Position, items: &[AstRef]) -> Result<AstRef> {
        let mut t = Ast::combinator(pos.clone(), system(), "tuple");
        for item in items {
            let item = self.rewrite(item)?;
            t = Ast::apply(pos.clone(), vec![t, item]);
        }
        Ok(t)
    }
}

pub fn pass_tuple(a: &AstRef) -> Result<AstRef> {
    TuplePass.rewrite(a)
}

//  {e0, .., en|tl}  ~>  cons e0 (.. (cons en tl)), tl defaulting to nil
struct ListPass;

impl Rewrite for ListPass {
    fn rewrite_list(
        &mut self,
        pos: &Position,
        items: &[AstRef],
        tail: Option<&AstRef>,
    ) -> Result<AstRef> {
        let cons = Ast::combinator(pos.clone(), system(), "cons");
        let mut l = match tail {
            Some(tail) => self.rewrite(tail)?,
            None => Ast::combinator(pos.clone(), system(), "nil"),
        };
        for item in items.iter().rev() {
            let item = self.rewrite(item)?;
            l = Ast::apply(pos.clone(), vec![cons.clone(), item, l]);
        }
        Ok(l)
    }
}

pub fn pass_list(a: &AstRef) -> Result<AstRef> {
    ListPass.rewrite(a)
}

//  do e  ~>  [ DOVAR<tick> -> e DOVAR<tick> ], threading the fresh variable
//  down the right spine of a |> chain
#[derive(Default)]
struct DoPass {
    tick: u32,
}

impl DoPass {
    fn fresh_do_var(&mut self, pos: &Position) -> AstRef {
        let name = format!("DOVAR{}", self.tick);
        self.tick += 1;
        Ast::variable(pos.clone(), name)
    }
}

fn add_var(e: &AstRef, v: &AstRef) -> AstRef {
    if let Ast::Apply { pos, terms } = e.as_ref()
        && terms.len() > 2
        && terms[0].qualified_name().as_deref() == Some("System::|>")
    {
        let mut threaded = vec![terms[0].clone(), add_var(&terms[1], v)];
        threaded.extend(terms[2..].iter().cloned());
        return Ast::apply(pos.clone(), threaded);
    }
    Ast::apply(e.position(), vec![e.clone(), v.clone()])
}

impl Rewrite for DoPass {
    fn rewrite_do(&mut self, pos: &Position, expr: &AstRef) -> Result<AstRef> {
        let expr = self.rewrite(expr)?;
        let var = self.fresh_do_var(pos);
        let threaded = add_var(&expr, &var);
        let clause = Ast::match_clause(pos.clone(), vec![var], Ast::empty(), threaded);
        Ok(Ast::block(pos.clone(), vec![clause]))
    }
}

pub fn pass_do(a: &AstRef) -> Result<AstRef> {
    DoPass::default().rewrite(a)
}

//  r ; l  ~>  let _ = r in l
struct StatementPass;

impl Rewrite for StatementPass {
    fn rewrite_statement(&mut self, pos: &Position, first: &AstRef, rest: &AstRef) -> Result<AstRef> {
        let first = self.rewrite(first)?;
        let rest = self.rewrite(rest)?;
        // `_` here is a variable that nothing can reference, not a wildcard;
        // the wildcard pass has already run
        let discard = Ast::variable(pos.clone(), "_");
        Ok(Ast::let_(pos.clone(), vec![discard], first, rest))
    }
}

pub fn pass_statement(a: &AstRef) -> Result<AstRef> {
    StatementPass.rewrite(a)
}

//  let l = r in b  ~>  [ l -> b ] r
struct LetPass;

impl Rewrite for LetPass {
    fn rewrite_let(
        &mut self,
        pos: &Position,
        patterns: &[AstRef],
        value: &AstRef,
        body: &AstRef,
    ) -> Result<AstRef> {
        let value = self.rewrite(value)?;
        let body = self.rewrite(body)?;
        let clause = Ast::match_clause(pos.clone(), patterns.to_vec(), Ast::empty(), body);
        let block = Ast::block(pos.clone(), vec![clause]);
        Ok(Ast::apply(pos.clone(), vec![block, value]))
    }
}

pub fn pass_let(a: &AstRef) -> Result<AstRef> {
    LetPass.rewrite(a)
}

//  \m  ~>  [ m ]
struct LambdaPass;

impl Rewrite for LambdaPass {
    fn rewrite_lambda(&mut self, pos: &Position, clause: &AstRef) -> Result<AstRef> {
        let clause = self.rewrite(clause)?;
        Ok(Ast::block(pos.clone(), vec![clause]))
    }
}

pub fn pass_lambda(a: &AstRef) -> Result<AstRef> {
    LambdaPass.rewrite(a)
}

//  object c vv ( ff ) extends ee  ~>  a data declaration for the field names
//  plus a definition building the applied (name, value) tuple through the
//  object and extend combinators, abstracted over vv when present
struct ObjectPass;

impl Rewrite for ObjectPass {
    fn rewrite_def(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        // objects are declarations, no need to descend into bodies
        Ok(Ast::def(pos.clone(), name.clone(), body.clone()))
    }

    fn rewrite_op_def(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        Ok(Ast::op_def(pos.clone(), name.clone(), body.clone()))
    }

    fn rewrite_object(
        &mut self,
        pos: &Position,
        name: &AstRef,
        vars: &[AstRef],
        fields: &[AstRef],
        extends: &[AstRef],
    ) -> Result<AstRef> {
        let mut applied = vec![Ast::combinator(pos.clone(), system(), "object")];
        let mut data_items = Vec::new();
        for field in fields {
            match field.as_ref() {
                Ast::Data { items, .. } if items.len() == 2 => {
                    applied.push(items[0].clone());
                    applied.push(items[1].clone());
                    data_items.push(items[0].clone());
                }
                Ast::Def { name, body, .. } => {
                    applied.push(name.clone());
                    applied.push(body.clone());
                    data_items.push(name.clone());
                }
                _ => {
                    return Err(Error::semantical(field.position(), "malformed object field"));
                }
            }
        }
        let mut body = Ast::apply(pos.clone(), applied);
        for e in extends {
            body = Ast::apply(
                pos.clone(),
                vec![
                    Ast::combinator(pos.clone(), system(), "extend"),
                    e.clone(),
                    body,
                ],
            );
        }
        if !vars.is_empty() {
            let clause = Ast::match_clause(pos.clone(), vars.to_vec(), Ast::empty(), body);
            body = Ast::block(pos.clone(), vec![clause]);
        }
        let decls = vec![
            Ast::data(pos.clone(), data_items),
            Ast::def(pos.clone(), name.clone(), body),
        ];
        Ok(Ast::wrapper(pos.clone(), decls))
    }
}

pub fn pass_object(a: &AstRef) -> Result<AstRef> {
    ObjectPass.rewrite(a)
}

//  throw e  ~>  System::throw e
struct ThrowPass;

impl Rewrite for ThrowPass {
    fn rewrite_throw(&mut self, pos: &Position, expr: &AstRef) -> Result<AstRef> {
        let expr = self.rewrite(expr)?;
        let t = Ast::combinator(pos.clone(), system(), "throw");
        Ok(Ast::apply(pos.clone(), vec![t, expr]))
    }
}

pub fn pass_throw(a: &AstRef) -> Result<AstRef> {
    ThrowPass.rewrite(a)
}

//  try t catch c  ~>  id (try t catch c)
//  the id keeps the try off the head of an application, which simplifies
//  lifting
struct TryPass;

impl Rewrite for TryPass {
    fn rewrite_try(&mut self, pos: &Position, body: &AstRef, handler: &AstRef) -> Result<AstRef> {
        let body = self.rewrite(body)?;
        let handler = self.rewrite(handler)?;
        let id = Ast::combinator(pos.clone(), system(), "id");
        let t = Ast::try_(pos.clone(), body, handler);
        Ok(Ast::apply(pos.clone(), vec![id, t]))
    }
}

pub fn pass_try(a: &AstRef) -> Result<AstRef> {
    TryPass.rewrite(a)
}

//  e0 && e1  ~>  && e0 [ _ -> e1 ]   (and the same for ||)
struct LazyOp;

fn thunkify(e: AstRef) -> AstRef {
    let pos = e.position();
    let clause = Ast::match_clause(
        pos.clone(),
        vec![Ast::variable(pos.clone(), "_")],
        Ast::empty(),
        e,
    );
    Ast::block(pos, vec![clause])
}

impl Rewrite for LazyOp {
    fn rewrite_apply(&mut self, pos: &Position, terms: &[AstRef]) -> Result<AstRef> {
        if terms.len() == 3 {
            let head = terms[0].qualified_name();
            if matches!(head.as_deref(), Some("System::&&") | Some("System::||")) {
                let lhs = self.rewrite(&terms[1])?;
                let rhs = thunkify(self.rewrite(&terms[2])?);
                return Ok(Ast::apply(pos.clone(), vec![terms[0].clone(), lhs, rhs]));
            }
        }
        Ok(Ast::apply(pos.clone(), self.rewrites(terms)?))
    }
}

pub fn pass_lazyop(a: &AstRef) -> Result<AstRef> {
    LazyOp.rewrite(a)
}

//  neg i  ~>  -i  for decimal integer literals
struct Monmin;

impl Transform for Monmin {
    fn transform_apply(&mut self, _a: &AstRef, pos: &Position, terms: &[AstRef]) -> Result<AstRef> {
        if terms.len() == 2
            && terms[0].qualified_name().as_deref() == Some("System::neg")
            && let Ast::Integer { pos: ipos, text } = terms[1].as_ref()
        {
            return Ok(Ast::integer(ipos.clone(), format!("-{text}")));
        }
        Ok(Ast::apply(pos.clone(), self.transforms(terms)?))
    }
}

pub fn pass_monmin(a: &AstRef) -> Result<AstRef> {
    Monmin.transform(a)
}
