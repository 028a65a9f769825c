//! The traversal framework: three complementary walkers over the AST.
//!
//! - [`Transform`] - per-variant hooks that default to the identity on leaf
//!   nodes and to structural recursion on compound nodes; hooks receive the
//!   original node so untouched sub-trees keep their sharing.
//! - [`Rewrite`] - same dispatch, but every default reconstructs the node
//!   from rewritten children; the workhorse for bottom-up passes.
//! - [`Visit`] - non-returning traversal for analyses.
//!
//! Dispatch lives in the free functions [`transform_node`], [`rewrite_node`]
//! and [`visit_node`]; the trait drivers default to them, and an implementor
//! that overrides its driver (e.g. [`substitute`]) calls the free function to
//! resume the default behavior. Hooks receive the node payload already split,
//! so a pass never re-matches on the variant it hooked. Any hook may fail
//! with a compile error, aborting the pass.
//!
//! On top of the walkers: [`occurs`], [`substitute`] and [`free_vars`], the
//! binder-aware term utilities the lift passes rely on.

use std::collections::BTreeSet;

use skein_core::{Position, Result};

use crate::ast::{Ast, AstRef};

pub trait Transform: Sized {
    fn transforms(&mut self, aa: &[AstRef]) -> Result<Vec<AstRef>> {
        aa.iter().map(|a| self.transform(a)).collect()
    }

    fn transform_integer(&mut self, a: &AstRef, _pos: &Position, _text: &str) -> Result<AstRef> {
        Ok(a.clone())
    }

    fn transform_hex_integer(
        &mut self,
        a: &AstRef,
        _pos: &Position,
        _text: &str,
    ) -> Result<AstRef> {
        Ok(a.clone())
    }

    fn transform_float(&mut self, a: &AstRef, _pos: &Position, _text: &str) -> Result<AstRef> {
        Ok(a.clone())
    }

    fn transform_character(&mut self, a: &AstRef, _pos: &Position, _text: &str) -> Result<AstRef> {
        Ok(a.clone())
    }

    fn transform_text(&mut self, a: &AstRef, _pos: &Position, _text: &str) -> Result<AstRef> {
        Ok(a.clone())
    }

    fn transform_variable(&mut self, a: &AstRef, _pos: &Position, _name: &str) -> Result<AstRef> {
        Ok(a.clone())
    }

    fn transform_wildcard(&mut self, a: &AstRef, _pos: &Position, _name: &str) -> Result<AstRef> {
        Ok(a.clone())
    }

    fn transform_combinator(
        &mut self,
        a: &AstRef,
        _pos: &Position,
        _path: &[String],
        _name: &str,
    ) -> Result<AstRef> {
        Ok(a.clone())
    }

    fn transform_operator(
        &mut self,
        a: &AstRef,
        _pos: &Position,
        _path: &[String],
        _name: &str,
    ) -> Result<AstRef> {
        Ok(a.clone())
    }

    fn transform_import(&mut self, a: &AstRef, _pos: &Position, _file: &str) -> Result<AstRef> {
        Ok(a.clone())
    }

    fn transform_using(&mut self, a: &AstRef, _pos: &Position, _path: &[String]) -> Result<AstRef> {
        Ok(a.clone())
    }

    fn transform_tag(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        pattern: &AstRef,
        tag: &AstRef,
    ) -> Result<AstRef> {
        let pattern = self.transform(pattern)?;
        let tag = self.transform(tag)?;
        Ok(Ast::tag(pos.clone(), pattern, tag))
    }

    fn transform_list(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        items: &[AstRef],
        tail: Option<&AstRef>,
    ) -> Result<AstRef> {
        let items = self.transforms(items)?;
        let tail = tail.map(|t| self.transform(t)).transpose()?;
        Ok(Ast::list(pos.clone(), items, tail))
    }

    fn transform_tuple(&mut self, _a: &AstRef, pos: &Position, items: &[AstRef]) -> Result<AstRef> {
        Ok(Ast::tuple(pos.clone(), self.transforms(items)?))
    }

    fn transform_apply(&mut self, _a: &AstRef, pos: &Position, terms: &[AstRef]) -> Result<AstRef> {
        Ok(Ast::apply(pos.clone(), self.transforms(terms)?))
    }

    fn transform_match(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        patterns: &[AstRef],
        guard: &AstRef,
        result: &AstRef,
    ) -> Result<AstRef> {
        let patterns = self.transforms(patterns)?;
        let guard = self.transform(guard)?;
        let result = self.transform(result)?;
        Ok(Ast::match_clause(pos.clone(), patterns, guard, result))
    }

    fn transform_block(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        clauses: &[AstRef],
    ) -> Result<AstRef> {
        Ok(Ast::block(pos.clone(), self.transforms(clauses)?))
    }

    fn transform_lambda(&mut self, _a: &AstRef, pos: &Position, clause: &AstRef) -> Result<AstRef> {
        Ok(Ast::lambda(pos.clone(), self.transform(clause)?))
    }

    fn transform_let(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        patterns: &[AstRef],
        value: &AstRef,
        body: &AstRef,
    ) -> Result<AstRef> {
        let patterns = self.transforms(patterns)?;
        let value = self.transform(value)?;
        let body = self.transform(body)?;
        Ok(Ast::let_(pos.clone(), patterns, value, body))
    }

    fn transform_if(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        cond: &AstRef,
        then: &AstRef,
        otherwise: &AstRef,
    ) -> Result<AstRef> {
        let cond = self.transform(cond)?;
        let then = self.transform(then)?;
        let otherwise = self.transform(otherwise)?;
        Ok(Ast::if_(pos.clone(), cond, then, otherwise))
    }

    fn transform_statement(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        first: &AstRef,
        rest: &AstRef,
    ) -> Result<AstRef> {
        let first = self.transform(first)?;
        let rest = self.transform(rest)?;
        Ok(Ast::statement(pos.clone(), first, rest))
    }

    fn transform_try(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        body: &AstRef,
        handler: &AstRef,
    ) -> Result<AstRef> {
        let body = self.transform(body)?;
        let handler = self.transform(handler)?;
        Ok(Ast::try_(pos.clone(), body, handler))
    }

    fn transform_throw(&mut self, _a: &AstRef, pos: &Position, expr: &AstRef) -> Result<AstRef> {
        Ok(Ast::throw(pos.clone(), self.transform(expr)?))
    }

    fn transform_do(&mut self, _a: &AstRef, pos: &Position, expr: &AstRef) -> Result<AstRef> {
        Ok(Ast::do_(pos.clone(), self.transform(expr)?))
    }

    fn transform_namespace(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        path: &[String],
        decls: &[AstRef],
    ) -> Result<AstRef> {
        Ok(Ast::namespace(
            pos.clone(),
            path.to_vec(),
            self.transforms(decls)?,
        ))
    }

    fn transform_data(&mut self, _a: &AstRef, pos: &Position, items: &[AstRef]) -> Result<AstRef> {
        Ok(Ast::data(pos.clone(), self.transforms(items)?))
    }

    fn transform_def(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        name: &AstRef,
        body: &AstRef,
    ) -> Result<AstRef> {
        let name = self.transform(name)?;
        let body = self.transform(body)?;
        Ok(Ast::def(pos.clone(), name, body))
    }

    fn transform_op_def(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        name: &AstRef,
        body: &AstRef,
    ) -> Result<AstRef> {
        let name = self.transform(name)?;
        let body = self.transform(body)?;
        Ok(Ast::op_def(pos.clone(), name, body))
    }

    fn transform_object(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        name: &AstRef,
        vars: &[AstRef],
        fields: &[AstRef],
        extends: &[AstRef],
    ) -> Result<AstRef> {
        let name = self.transform(name)?;
        let vars = self.transforms(vars)?;
        let fields = self.transforms(fields)?;
        let extends = self.transforms(extends)?;
        Ok(Ast::object(pos.clone(), name, vars, fields, extends))
    }

    fn transform_value(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        name: &AstRef,
        body: &AstRef,
    ) -> Result<AstRef> {
        let name = self.transform(name)?;
        let body = self.transform(body)?;
        Ok(Ast::value(pos.clone(), name, body))
    }

    fn transform_wrapper(
        &mut self,
        _a: &AstRef,
        pos: &Position,
        decls: &[AstRef],
    ) -> Result<AstRef> {
        Ok(Ast::wrapper(pos.clone(), self.transforms(decls)?))
    }

    fn transform(&mut self, a: &AstRef) -> Result<AstRef> {
        transform_node(self, a)
    }
}

/// Default [`Transform`] dispatch: one `match` on the variant, splitting the
/// payload for the hook.
pub fn transform_node<T: Transform>(t: &mut T, a: &AstRef) -> Result<AstRef> {
    match a.as_ref() {
        Ast::Empty => Ok(a.clone()),
        Ast::Integer { pos, text } => t.transform_integer(a, pos, text),
        Ast::HexInteger { pos, text } => t.transform_hex_integer(a, pos, text),
        Ast::Float { pos, text } => t.transform_float(a, pos, text),
        Ast::Character { pos, text } => t.transform_character(a, pos, text),
        Ast::Text { pos, text } => t.transform_text(a, pos, text),
        Ast::Variable { pos, name } => t.transform_variable(a, pos, name),
        Ast::Wildcard { pos, name } => t.transform_wildcard(a, pos, name),
        Ast::Combinator { pos, path, name } => t.transform_combinator(a, pos, path, name),
        Ast::Operator { pos, path, name } => t.transform_operator(a, pos, path, name),
        Ast::Tag { pos, pattern, tag } => t.transform_tag(a, pos, pattern, tag),
        Ast::List { pos, items, tail } => t.transform_list(a, pos, items, tail.as_ref()),
        Ast::Tuple { pos, items } => t.transform_tuple(a, pos, items),
        Ast::Apply { pos, terms } => t.transform_apply(a, pos, terms),
        Ast::Match { pos, patterns, guard, result } => {
            t.transform_match(a, pos, patterns, guard, result)
        }
        Ast::Block { pos, clauses } => t.transform_block(a, pos, clauses),
        Ast::Lambda { pos, clause } => t.transform_lambda(a, pos, clause),
        Ast::Let { pos, patterns, value, body } => t.transform_let(a, pos, patterns, value, body),
        Ast::If { pos, cond, then, otherwise } => t.transform_if(a, pos, cond, then, otherwise),
        Ast::Statement { pos, first, rest } => t.transform_statement(a, pos, first, rest),
        Ast::Try { pos, body, handler } => t.transform_try(a, pos, body, handler),
        Ast::Throw { pos, expr } => t.transform_throw(a, pos, expr),
        Ast::Do { pos, expr } => t.transform_do(a, pos, expr),
        Ast::Import { pos, file } => t.transform_import(a, pos, file),
        Ast::Using { pos, path } => t.transform_using(a, pos, path),
        Ast::Namespace { pos, path, decls } => t.transform_namespace(a, pos, path, decls),
        Ast::Data { pos, items } => t.transform_data(a, pos, items),
        Ast::Def { pos, name, body } => t.transform_def(a, pos, name, body),
        Ast::OpDef { pos, name, body } => t.transform_op_def(a, pos, name, body),
        Ast::Object { pos, name, vars, fields, extends } => {
            t.transform_object(a, pos, name, vars, fields, extends)
        }
        Ast::Value { pos, name, body } => t.transform_value(a, pos, name, body),
        Ast::Wrapper { pos, decls } => t.transform_wrapper(a, pos, decls),
    }
}

pub trait Rewrite: Sized {
    fn rewrites(&mut self, aa: &[AstRef]) -> Result<Vec<AstRef>> {
        aa.iter().map(|a| self.rewrite(a)).collect()
    }

    fn rewrite_integer(&mut self, pos: &Position, text: &str) -> Result<AstRef> {
        Ok(Ast::integer(pos.clone(), text))
    }

    fn rewrite_hex_integer(&mut self, pos: &Position, text: &str) -> Result<AstRef> {
        Ok(Ast::hex_integer(pos.clone(), text))
    }

    fn rewrite_float(&mut self, pos: &Position, text: &str) -> Result<AstRef> {
        Ok(Ast::float(pos.clone(), text))
    }

    fn rewrite_character(&mut self, pos: &Position, text: &str) -> Result<AstRef> {
        Ok(Ast::character(pos.clone(), text))
    }

    fn rewrite_text(&mut self, pos: &Position, text: &str) -> Result<AstRef> {
        Ok(Ast::text(pos.clone(), text))
    }

    fn rewrite_variable(&mut self, pos: &Position, name: &str) -> Result<AstRef> {
        Ok(Ast::variable(pos.clone(), name))
    }

    fn rewrite_wildcard(&mut self, pos: &Position, name: &str) -> Result<AstRef> {
        Ok(Ast::wildcard(pos.clone(), name))
    }

    fn rewrite_combinator(&mut self, pos: &Position, path: &[String], name: &str) -> Result<AstRef> {
        Ok(Ast::combinator(pos.clone(), path.to_vec(), name))
    }

    fn rewrite_operator(&mut self, pos: &Position, path: &[String], name: &str) -> Result<AstRef> {
        Ok(Ast::operator(pos.clone(), path.to_vec(), name))
    }

    fn rewrite_tag(&mut self, pos: &Position, pattern: &AstRef, tag: &AstRef) -> Result<AstRef> {
        let pattern = self.rewrite(pattern)?;
        let tag = self.rewrite(tag)?;
        Ok(Ast::tag(pos.clone(), pattern, tag))
    }

    fn rewrite_list(
        &mut self,
        pos: &Position,
        items: &[AstRef],
        tail: Option<&AstRef>,
    ) -> Result<AstRef> {
        let items = self.rewrites(items)?;
        let tail = tail.map(|t| self.rewrite(t)).transpose()?;
        Ok(Ast::list(pos.clone(), items, tail))
    }

    fn rewrite_tuple(&mut self, pos: &Position, items: &[AstRef]) -> Result<AstRef> {
        Ok(Ast::tuple(pos.clone(), self.rewrites(items)?))
    }

    fn rewrite_apply(&mut self, pos: &Position, terms: &[AstRef]) -> Result<AstRef> {
        Ok(Ast::apply(pos.clone(), self.rewrites(terms)?))
    }

    fn rewrite_match(
        &mut self,
        pos: &Position,
        patterns: &[AstRef],
        guard: &AstRef,
        result: &AstRef,
    ) -> Result<AstRef> {
        let patterns = self.rewrites(patterns)?;
        let guard = self.rewrite(guard)?;
        let result = self.rewrite(result)?;
        Ok(Ast::match_clause(pos.clone(), patterns, guard, result))
    }

    fn rewrite_block(&mut self, pos: &Position, clauses: &[AstRef]) -> Result<AstRef> {
        Ok(Ast::block(pos.clone(), self.rewrites(clauses)?))
    }

    fn rewrite_lambda(&mut self, pos: &Position, clause: &AstRef) -> Result<AstRef> {
        Ok(Ast::lambda(pos.clone(), self.rewrite(clause)?))
    }

    fn rewrite_let(
        &mut self,
        pos: &Position,
        patterns: &[AstRef],
        value: &AstRef,
        body: &AstRef,
    ) -> Result<AstRef> {
        let patterns = self.rewrites(patterns)?;
        let value = self.rewrite(value)?;
        let body = self.rewrite(body)?;
        Ok(Ast::let_(pos.clone(), patterns, value, body))
    }

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
        Ok(Ast::if_(pos.clone(), cond, then, otherwise))
    }

    fn rewrite_statement(&mut self, pos: &Position, first: &AstRef, rest: &AstRef) -> Result<AstRef> {
        let first = self.rewrite(first)?;
        let rest = self.rewrite(rest)?;
        Ok(Ast::statement(pos.clone(), first, rest))
    }

    fn rewrite_try(&mut self, pos: &Position, body: &AstRef, handler: &AstRef) -> Result<AstRef> {
        let body = self.rewrite(body)?;
        let handler = self.rewrite(handler)?;
        Ok(Ast::try_(pos.clone(), body, handler))
    }

    fn rewrite_throw(&mut self, pos: &Position, expr: &AstRef) -> Result<AstRef> {
        Ok(Ast::throw(pos.clone(), self.rewrite(expr)?))
    }

    fn rewrite_do(&mut self, pos: &Position, expr: &AstRef) -> Result<AstRef> {
        Ok(Ast::do_(pos.clone(), self.rewrite(expr)?))
    }

    fn rewrite_import(&mut self, pos: &Position, file: &str) -> Result<AstRef> {
        Ok(Ast::import(pos.clone(), file))
    }

    fn rewrite_using(&mut self, pos: &Position, path: &[String]) -> Result<AstRef> {
        Ok(Ast::using(pos.clone(), path.to_vec()))
    }

    fn rewrite_namespace(
        &mut self,
        pos: &Position,
        path: &[String],
        decls: &[AstRef],
    ) -> Result<AstRef> {
        Ok(Ast::namespace(pos.clone(), path.to_vec(), self.rewrites(decls)?))
    }

    fn rewrite_data(&mut self, pos: &Position, items: &[AstRef]) -> Result<AstRef> {
        Ok(Ast::data(pos.clone(), self.rewrites(items)?))
    }

    fn rewrite_def(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        let name = self.rewrite(name)?;
        let body = self.rewrite(body)?;
        Ok(Ast::def(pos.clone(), name, body))
    }

    fn rewrite_op_def(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        let name = self.rewrite(name)?;
        let body = self.rewrite(body)?;
        Ok(Ast::op_def(pos.clone(), name, body))
    }

    fn rewrite_object(
        &mut self,
        pos: &Position,
        name: &AstRef,
        vars: &[AstRef],
        fields: &[AstRef],
        extends: &[AstRef],
    ) -> Result<AstRef> {
        let name = self.rewrite(name)?;
        let vars = self.rewrites(vars)?;
        let fields = self.rewrites(fields)?;
        let extends = self.rewrites(extends)?;
        Ok(Ast::object(pos.clone(), name, vars, fields, extends))
    }

    fn rewrite_value(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        let name = self.rewrite(name)?;
        let body = self.rewrite(body)?;
        Ok(Ast::value(pos.clone(), name, body))
    }

    fn rewrite_wrapper(&mut self, pos: &Position, decls: &[AstRef]) -> Result<AstRef> {
        Ok(Ast::wrapper(pos.clone(), self.rewrites(decls)?))
    }

    fn rewrite(&mut self, a: &AstRef) -> Result<AstRef> {
        rewrite_node(self, a)
    }
}

/// Default [`Rewrite`] dispatch.
pub fn rewrite_node<R: Rewrite>(r: &mut R, a: &AstRef) -> Result<AstRef> {
    match a.as_ref() {
        Ast::Empty => Ok(a.clone()),
        Ast::Integer { pos, text } => r.rewrite_integer(pos, text),
        Ast::HexInteger { pos, text } => r.rewrite_hex_integer(pos, text),
        Ast::Float { pos, text } => r.rewrite_float(pos, text),
        Ast::Character { pos, text } => r.rewrite_character(pos, text),
        Ast::Text { pos, text } => r.rewrite_text(pos, text),
        Ast::Variable { pos, name } => r.rewrite_variable(pos, name),
        Ast::Wildcard { pos, name } => r.rewrite_wildcard(pos, name),
        Ast::Combinator { pos, path, name } => r.rewrite_combinator(pos, path, name),
        Ast::Operator { pos, path, name } => r.rewrite_operator(pos, path, name),
        Ast::Tag { pos, pattern, tag } => r.rewrite_tag(pos, pattern, tag),
        Ast::List { pos, items, tail } => r.rewrite_list(pos, items, tail.as_ref()),
        Ast::Tuple { pos, items } => r.rewrite_tuple(pos, items),
        Ast::Apply { pos, terms } => r.rewrite_apply(pos, terms),
        Ast::Match { pos, patterns, guard, result } => {
            r.rewrite_match(pos, patterns, guard, result)
        }
        Ast::Block { pos, clauses } => r.rewrite_block(pos, clauses),
        Ast::Lambda { pos, clause } => r.rewrite_lambda(pos, clause),
        Ast::Let { pos, patterns, value, body } => r.rewrite_let(pos, patterns, value, body),
        Ast::If { pos, cond, then, otherwise } => r.rewrite_if(pos, cond, then, otherwise),
        Ast::Statement { pos, first, rest } => r.rewrite_statement(pos, first, rest),
        Ast::Try { pos, body, handler } => r.rewrite_try(pos, body, handler),
        Ast::Throw { pos, expr } => r.rewrite_throw(pos, expr),
        Ast::Do { pos, expr } => r.rewrite_do(pos, expr),
        Ast::Import { pos, file } => r.rewrite_import(pos, file),
        Ast::Using { pos, path } => r.rewrite_using(pos, path),
        Ast::Namespace { pos, path, decls } => r.rewrite_namespace(pos, path, decls),
        Ast::Data { pos, items } => r.rewrite_data(pos, items),
        Ast::Def { pos, name, body } => r.rewrite_def(pos, name, body),
        Ast::OpDef { pos, name, body } => r.rewrite_op_def(pos, name, body),
        Ast::Object { pos, name, vars, fields, extends } => {
            r.rewrite_object(pos, name, vars, fields, extends)
        }
        Ast::Value { pos, name, body } => r.rewrite_value(pos, name, body),
        Ast::Wrapper { pos, decls } => r.rewrite_wrapper(pos, decls),
    }
}

pub trait Visit: Sized {
    fn visits(&mut self, aa: &[AstRef]) -> Result<()> {
        for a in aa {
            self.visit(a)?;
        }
        Ok(())
    }

    fn visit_integer(&mut self, _pos: &Position, _text: &str) -> Result<()> {
        Ok(())
    }

    fn visit_hex_integer(&mut self, _pos: &Position, _text: &str) -> Result<()> {
        Ok(())
    }

    fn visit_float(&mut self, _pos: &Position, _text: &str) -> Result<()> {
        Ok(())
    }

    fn visit_character(&mut self, _pos: &Position, _text: &str) -> Result<()> {
        Ok(())
    }

    fn visit_text(&mut self, _pos: &Position, _text: &str) -> Result<()> {
        Ok(())
    }

    fn visit_variable(&mut self, _pos: &Position, _name: &str) -> Result<()> {
        Ok(())
    }

    fn visit_wildcard(&mut self, _pos: &Position, _name: &str) -> Result<()> {
        Ok(())
    }

    fn visit_combinator(&mut self, _pos: &Position, _path: &[String], _name: &str) -> Result<()> {
        Ok(())
    }

    fn visit_operator(&mut self, _pos: &Position, _path: &[String], _name: &str) -> Result<()> {
        Ok(())
    }

    fn visit_tag(&mut self, _pos: &Position, pattern: &AstRef, tag: &AstRef) -> Result<()> {
        self.visit(pattern)?;
        self.visit(tag)
    }

    fn visit_list(&mut self, _pos: &Position, items: &[AstRef], tail: Option<&AstRef>) -> Result<()> {
        self.visits(items)?;
        if let Some(tail) = tail {
            self.visit(tail)?;
        }
        Ok(())
    }

    fn visit_tuple(&mut self, _pos: &Position, items: &[AstRef]) -> Result<()> {
        self.visits(items)
    }

    fn visit_apply(&mut self, _pos: &Position, terms: &[AstRef]) -> Result<()> {
        self.visits(terms)
    }

    fn visit_match(
        &mut self,
        _pos: &Position,
        patterns: &[AstRef],
        guard: &AstRef,
        result: &AstRef,
    ) -> Result<()> {
        self.visits(patterns)?;
        self.visit(guard)?;
        self.visit(result)
    }

    fn visit_block(&mut self, _pos: &Position, clauses: &[AstRef]) -> Result<()> {
        self.visits(clauses)
    }

    fn visit_lambda(&mut self, _pos: &Position, clause: &AstRef) -> Result<()> {
        self.visit(clause)
    }

    fn visit_let(
        &mut self,
        _pos: &Position,
        patterns: &[AstRef],
        value: &AstRef,
        body: &AstRef,
    ) -> Result<()> {
        self.visits(patterns)?;
        self.visit(value)?;
        self.visit(body)
    }

    fn visit_if(
        &mut self,
        _pos: &Position,
        cond: &AstRef,
        then: &AstRef,
        otherwise: &AstRef,
    ) -> Result<()> {
        self.visit(cond)?;
        self.visit(then)?;
        self.visit(otherwise)
    }

    fn visit_statement(&mut self, _pos: &Position, first: &AstRef, rest: &AstRef) -> Result<()> {
        self.visit(first)?;
        self.visit(rest)
    }

    fn visit_try(&mut self, _pos: &Position, body: &AstRef, handler: &AstRef) -> Result<()> {
        self.visit(body)?;
        self.visit(handler)
    }

    fn visit_throw(&mut self, _pos: &Position, expr: &AstRef) -> Result<()> {
        self.visit(expr)
    }

    fn visit_do(&mut self, _pos: &Position, expr: &AstRef) -> Result<()> {
        self.visit(expr)
    }

    fn visit_import(&mut self, _pos: &Position, _file: &str) -> Result<()> {
        Ok(())
    }

    fn visit_using(&mut self, _pos: &Position, _path: &[String]) -> Result<()> {
        Ok(())
    }

    fn visit_namespace(&mut self, _pos: &Position, _path: &[String], decls: &[AstRef]) -> Result<()> {
        self.visits(decls)
    }

    fn visit_data(&mut self, _pos: &Position, items: &[AstRef]) -> Result<()> {
        self.visits(items)
    }

    fn visit_def(&mut self, _pos: &Position, name: &AstRef, body: &AstRef) -> Result<()> {
        self.visit(name)?;
        self.visit(body)
    }

    fn visit_op_def(&mut self, _pos: &Position, name: &AstRef, body: &AstRef) -> Result<()> {
        self.visit(name)?;
        self.visit(body)
    }

    fn visit_object(
        &mut self,
        _pos: &Position,
        name: &AstRef,
        vars: &[AstRef],
        fields: &[AstRef],
        extends: &[AstRef],
    ) -> Result<()> {
        self.visit(name)?;
        self.visits(vars)?;
        self.visits(fields)?;
        self.visits(extends)
    }

    fn visit_value(&mut self, _pos: &Position, name: &AstRef, body: &AstRef) -> Result<()> {
        self.visit(name)?;
        self.visit(body)
    }

    fn visit_wrapper(&mut self, _pos: &Position, decls: &[AstRef]) -> Result<()> {
        self.visits(decls)
    }

    fn visit(&mut self, a: &AstRef) -> Result<()> {
        visit_node(self, a)
    }
}

/// Default [`Visit`] dispatch.
pub fn visit_node<V: Visit>(v: &mut V, a: &AstRef) -> Result<()> {
    match a.as_ref() {
        Ast::Empty => Ok(()),
        Ast::Integer { pos, text } => v.visit_integer(pos, text),
        Ast::HexInteger { pos, text } => v.visit_hex_integer(pos, text),
        Ast::Float { pos, text } => v.visit_float(pos, text),
        Ast::Character { pos, text } => v.visit_character(pos, text),
        Ast::Text { pos, text } => v.visit_text(pos, text),
        Ast::Variable { pos, name } => v.visit_variable(pos, name),
        Ast::Wildcard { pos, name } => v.visit_wildcard(pos, name),
        Ast::Combinator { pos, path, name } => v.visit_combinator(pos, path, name),
        Ast::Operator { pos, path, name } => v.visit_operator(pos, path, name),
        Ast::Tag { pos, pattern, tag } => v.visit_tag(pos, pattern, tag),
        Ast::List { pos, items, tail } => v.visit_list(pos, items, tail.as_ref()),
        Ast::Tuple { pos, items } => v.visit_tuple(pos, items),
        Ast::Apply { pos, terms } => v.visit_apply(pos, terms),
        Ast::Match { pos, patterns, guard, result } => v.visit_match(pos, patterns, guard, result),
        Ast::Block { pos, clauses } => v.visit_block(pos, clauses),
        Ast::Lambda { pos, clause } => v.visit_lambda(pos, clause),
        Ast::Let { pos, patterns, value, body } => v.visit_let(pos, patterns, value, body),
        Ast::If { pos, cond, then, otherwise } => v.visit_if(pos, cond, then, otherwise),
        Ast::Statement { pos, first, rest } => v.visit_statement(pos, first, rest),
        Ast::Try { pos, body, handler } => v.visit_try(pos, body, handler),
        Ast::Throw { pos, expr } => v.visit_throw(pos, expr),
        Ast::Do { pos, expr } => v.visit_do(pos, expr),
        Ast::Import { pos, file } => v.visit_import(pos, file),
        Ast::Using { pos, path } => v.visit_using(pos, path),
        Ast::Namespace { pos, path, decls } => v.visit_namespace(pos, path, decls),
        Ast::Data { pos, items } => v.visit_data(pos, items),
        Ast::Def { pos, name, body } => v.visit_def(pos, name, body),
        Ast::OpDef { pos, name, body } => v.visit_op_def(pos, name, body),
        Ast::Object { pos, name, vars, fields, extends } => {
            v.visit_object(pos, name, vars, fields, extends)
        }
        Ast::Value { pos, name, body } => v.visit_value(pos, name, body),
        Ast::Wrapper { pos, decls } => v.visit_wrapper(pos, decls),
    }
}

struct Occurs<'a> {
    needle: &'a AstRef,
    found: bool,
}

impl Visit for Occurs<'_> {
    fn visit(&mut self, a: &AstRef) -> Result<()> {
        if self.found {
            return Ok(());
        }
        if a.as_ref() == self.needle.as_ref() {
            self.found = true;
            return Ok(());
        }
        visit_node(self, a)
    }
}

/// Does `needle` occur anywhere in `haystack`, under structural equality?
pub fn occurs(needle: &AstRef, haystack: &AstRef) -> bool {
    let mut o = Occurs { needle, found: false };
    // hooks are infallible
    let _ = o.visit(haystack);
    o.found
}

struct Substitute<'a> {
    from: &'a AstRef,
    to: &'a AstRef,
}

impl Rewrite for Substitute<'_> {
    fn rewrite_match(
        &mut self,
        pos: &Position,
        patterns: &[AstRef],
        guard: &AstRef,
        result: &AstRef,
    ) -> Result<AstRef> {
        // a pattern binding the term shadows it
        if patterns.iter().any(|p| occurs(self.from, p)) {
            return Ok(Ast::match_clause(
                pos.clone(),
                patterns.to_vec(),
                guard.clone(),
                result.clone(),
            ));
        }
        let guard = self.rewrite(guard)?;
        let result = self.rewrite(result)?;
        Ok(Ast::match_clause(pos.clone(), patterns.to_vec(), guard, result))
    }

    fn rewrite_let(
        &mut self,
        pos: &Position,
        patterns: &[AstRef],
        value: &AstRef,
        body: &AstRef,
    ) -> Result<AstRef> {
        if patterns.iter().any(|p| occurs(self.from, p)) {
            return Ok(Ast::let_(
                pos.clone(),
                patterns.to_vec(),
                value.clone(),
                body.clone(),
            ));
        }
        let value = self.rewrite(value)?;
        let body = self.rewrite(body)?;
        Ok(Ast::let_(pos.clone(), patterns.to_vec(), value, body))
    }

    fn rewrite(&mut self, a: &AstRef) -> Result<AstRef> {
        if a.as_ref() == self.from.as_ref() {
            return Ok(self.to.clone());
        }
        rewrite_node(self, a)
    }
}

/// Replace every unshadowed occurrence of `from` in `term` by `to`.
pub fn substitute(term: &AstRef, from: &AstRef, to: &AstRef) -> Result<AstRef> {
    Substitute { from, to }.rewrite(term)
}

#[derive(Default)]
struct FreeVars {
    vars: BTreeSet<AstRef>,
    removing: bool,
}

impl Visit for FreeVars {
    fn visit_variable(&mut self, pos: &Position, name: &str) -> Result<()> {
        let v = Ast::variable(pos.clone(), name);
        if self.removing {
            self.vars.remove(&v);
        } else {
            self.vars.insert(v);
        }
        Ok(())
    }

    fn visit_match(
        &mut self,
        _pos: &Position,
        patterns: &[AstRef],
        guard: &AstRef,
        result: &AstRef,
    ) -> Result<()> {
        self.visit(guard)?;
        self.visit(result)?;
        self.removing = true;
        self.visits(patterns)?;
        self.removing = false;
        Ok(())
    }

    fn visit_let(
        &mut self,
        _pos: &Position,
        patterns: &[AstRef],
        value: &AstRef,
        body: &AstRef,
    ) -> Result<()> {
        self.visit(value)?;
        self.visit(body)?;
        self.removing = true;
        self.visits(patterns)?;
        self.removing = false;
        Ok(())
    }

    fn visit_object(
        &mut self,
        _pos: &Position,
        _name: &AstRef,
        vars: &[AstRef],
        fields: &[AstRef],
        extends: &[AstRef],
    ) -> Result<()> {
        self.visits(fields)?;
        self.visits(extends)?;
        self.removing = true;
        self.visits(vars)?;
        self.removing = false;
        Ok(())
    }
}

/// The free variables of `a`, ordered structurally (deterministic).
pub fn free_vars(a: &AstRef) -> BTreeSet<AstRef> {
    let mut fv = FreeVars::default();
    // hooks are infallible
    let _ = fv.visit(a);
    fv.vars
}
