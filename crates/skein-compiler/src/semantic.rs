//! Name resolution: the declare and identify sub-passes.
//!
//! Declare walks the tree and populates the namespace tree with every
//! declared combinator. Identify then rewrites every occurrence of a name to
//! its fully qualified form, α-renames pattern variables to fresh `V_<n>`
//! names, flattens nested namespaces into a single top-level sequence and
//! drops the import/using directives. A name that resolves nowhere aborts
//! the module with a semantical error.

use skein_core::{Error, Position, Result, qualify};

use crate::ast::{Ast, AstRef};
use crate::environment::{NamespaceRef, Range, declare as ns_declare, declare_implicit};
use crate::walk::{Rewrite, Visit};

/// Namespace that object field names are implicitly declared under.
pub const FIELDS_NAMESPACE: &str = "Fields";

/// Populate `env` with every declaration in `a`.
pub fn declare(env: &NamespaceRef, a: &AstRef) -> Result<()> {
    let mut pass = Declare {
        spaces: env.clone(),
        qualifications: Vec::new(),
        field_state: false,
    };
    pass.visit(a)
}

struct Declare {
    spaces: NamespaceRef,
    qualifications: Vec<String>,
    field_state: bool,
}

impl Visit for Declare {
    fn visit_combinator(&mut self, pos: &Position, path: &[String], name: &str) -> Result<()> {
        if self.field_state {
            // object fields share names across objects, last write wins
            let mut full = vec![FIELDS_NAMESPACE.to_string()];
            full.extend(path.iter().cloned());
            let qualified = qualify(&full, name);
            declare_implicit(&self.spaces, &full, name, &qualified);
            return Ok(());
        }
        let mut full = self.qualifications.clone();
        full.extend(path.iter().cloned());
        let qualified = qualify(&full, name);
        ns_declare(&self.spaces, &full, name, &qualified)
            .map_err(|_| Error::semantical(pos.clone(), format!("redeclaration of {name}")))
    }

    fn visit_data(&mut self, _pos: &Position, items: &[AstRef]) -> Result<()> {
        if self.field_state {
            // a data field is a (name, value) pair; only the name declares
            if let Some(first) = items.first() {
                self.visit(first)?;
            }
            Ok(())
        } else {
            self.visits(items)
        }
    }

    fn visit_def(&mut self, _pos: &Position, name: &AstRef, _body: &AstRef) -> Result<()> {
        self.visit(name)
    }

    fn visit_op_def(&mut self, _pos: &Position, name: &AstRef, _body: &AstRef) -> Result<()> {
        self.visit(name)
    }

    fn visit_value(&mut self, _pos: &Position, name: &AstRef, _body: &AstRef) -> Result<()> {
        self.visit(name)
    }

    fn visit_object(
        &mut self,
        _pos: &Position,
        name: &AstRef,
        _vars: &[AstRef],
        fields: &[AstRef],
        _extends: &[AstRef],
    ) -> Result<()> {
        self.visit(name)?;
        self.field_state = true;
        let result = self.visits(fields);
        self.field_state = false;
        result
    }

    fn visit_namespace(&mut self, _pos: &Position, path: &[String], decls: &[AstRef]) -> Result<()> {
        let saved = self.qualifications.clone();
        self.qualifications.extend(path.iter().cloned());
        let result = self.visits(decls);
        self.qualifications = saved;
        result
    }
}

/// Rewrite `a` with every name resolved against `env`.
pub fn identify(env: &NamespaceRef, a: &AstRef) -> Result<AstRef> {
    let mut range = Range::new(env.clone());
    // the prelude namespace is in scope without an explicit `using`
    range.add_using(&["System".to_string()]);
    let mut pass = Identify {
        state: IdentifyState::Use,
        range,
        declarations: Vec::new(),
        namespace: Vec::new(),
        counter: 0,
    };
    pass.rewrite(a)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentifyState {
    Use,
    Pattern,
    Field,
}

struct Identify {
    state: IdentifyState,
    range: Range,
    declarations: Vec<AstRef>,
    namespace: Vec<String>,
    counter: u32,
}

impl Identify {
    fn fresh_variable(&mut self) -> String {
        let v = format!("V_{}", self.counter);
        self.counter += 1;
        v
    }

    fn lookup(&self, pos: &Position, name: &str) -> Result<String> {
        self.range
            .get(name)
            .ok_or_else(|| Error::semantical(pos.clone(), format!("undeclared {name}")))
    }

    fn lookup_qualified(&self, pos: &Position, path: &[String], name: &str) -> Result<String> {
        self.range
            .get_qualified(path, name)
            .ok_or_else(|| Error::semantical(pos.clone(), format!("undeclared {name}")))
    }

    /// Resolve an object field name against the implicit field namespace.
    fn identify_field_name(&mut self, item: &AstRef) -> Result<AstRef> {
        match item.as_ref() {
            Ast::Combinator { pos, path, name } => {
                let mut full = vec![FIELDS_NAMESPACE.to_string()];
                full.extend(path.iter().cloned());
                let qualified = self.lookup_qualified(pos, &full, name)?;
                Ok(Ast::combinator(pos.clone(), vec![], qualified))
            }
            _ => Err(Error::identification(
                item.position(),
                "combinator expected",
            )),
        }
    }

    fn reject_in_pattern(&self, pos: &Position, what: &str) -> Result<()> {
        if self.state == IdentifyState::Pattern {
            return Err(Error::identification(
                pos.clone(),
                format!("{what} expression not allowed in pattern"),
            ));
        }
        Ok(())
    }
}

impl Rewrite for Identify {
    fn rewrite_variable(&mut self, pos: &Position, name: &str) -> Result<AstRef> {
        match self.state {
            IdentifyState::Use => {
                let qualified = self.lookup(pos, name)?;
                Ok(Ast::variable(pos.clone(), qualified))
            }
            IdentifyState::Pattern => {
                let fresh = self.fresh_variable();
                self.range
                    .declare(name, &fresh)
                    .map_err(|_| Error::semantical(pos.clone(), format!("redeclaration of {name}")))?;
                Ok(Ast::variable(pos.clone(), fresh))
            }
            IdentifyState::Field => {
                panic!("{}", Error::internal(pos.clone(), "variable in field state"))
            }
        }
    }

    fn rewrite_combinator(&mut self, pos: &Position, path: &[String], name: &str) -> Result<AstRef> {
        match self.state {
            IdentifyState::Use | IdentifyState::Pattern => {
                let qualified = self.lookup_qualified(pos, path, name)?;
                Ok(Ast::combinator(pos.clone(), vec![], qualified))
            }
            IdentifyState::Field => {
                panic!("{}", Error::internal(pos.clone(), "combinator in field state"))
            }
        }
    }

    fn rewrite_operator(&mut self, pos: &Position, path: &[String], name: &str) -> Result<AstRef> {
        match self.state {
            IdentifyState::Use | IdentifyState::Pattern => {
                let qualified = self.lookup_qualified(pos, path, name)?;
                Ok(Ast::operator(pos.clone(), vec![], qualified))
            }
            IdentifyState::Field => {
                panic!("{}", Error::internal(pos.clone(), "operator in field state"))
            }
        }
    }

    fn rewrite_match(
        &mut self,
        pos: &Position,
        patterns: &[AstRef],
        guard: &AstRef,
        result: &AstRef,
    ) -> Result<AstRef> {
        self.range.enter();
        self.state = IdentifyState::Pattern;
        let patterns = self.rewrites(patterns)?;
        self.state = IdentifyState::Use;
        let guard = self.rewrite(guard)?;
        self.state = IdentifyState::Use;
        let result = self.rewrite(result)?;
        self.range.leave();
        Ok(Ast::match_clause(pos.clone(), patterns, guard, result))
    }

    fn rewrite_let(
        &mut self,
        pos: &Position,
        patterns: &[AstRef],
        value: &AstRef,
        body: &AstRef,
    ) -> Result<AstRef> {
        self.reject_in_pattern(pos, "let")?;
        // the binding is not recursive, resolve the value outside the range
        self.state = IdentifyState::Use;
        let value = self.rewrite(value)?;
        self.range.enter();
        self.state = IdentifyState::Pattern;
        let patterns = self.rewrites(patterns)?;
        self.state = IdentifyState::Use;
        let body = self.rewrite(body)?;
        self.range.leave();
        Ok(Ast::let_(pos.clone(), patterns, value, body))
    }

    fn rewrite_tag(&mut self, pos: &Position, pattern: &AstRef, tag: &AstRef) -> Result<AstRef> {
        self.state = IdentifyState::Pattern;
        let pattern = self.rewrite(pattern)?;
        self.state = IdentifyState::Use;
        let tag = self.rewrite(tag)?;
        self.state = IdentifyState::Pattern;
        Ok(Ast::tag(pos.clone(), pattern, tag))
    }

    fn rewrite_block(&mut self, pos: &Position, clauses: &[AstRef]) -> Result<AstRef> {
        self.reject_in_pattern(pos, "block")?;
        Ok(Ast::block(pos.clone(), self.rewrites(clauses)?))
    }

    fn rewrite_lambda(&mut self, pos: &Position, clause: &AstRef) -> Result<AstRef> {
        self.reject_in_pattern(pos, "lambda")?;
        Ok(Ast::lambda(pos.clone(), self.rewrite(clause)?))
    }

    fn rewrite_if(
        &mut self,
        pos: &Position,
        cond: &AstRef,
        then: &AstRef,
        otherwise: &AstRef,
    ) -> Result<AstRef> {
        self.reject_in_pattern(pos, "if")?;
        let cond = self.rewrite(cond)?;
        let then = self.rewrite(then)?;
        let otherwise = self.rewrite(otherwise)?;
        Ok(Ast::if_(pos.clone(), cond, then, otherwise))
    }

    fn rewrite_try(&mut self, pos: &Position, body: &AstRef, handler: &AstRef) -> Result<AstRef> {
        self.reject_in_pattern(pos, "try")?;
        let body = self.rewrite(body)?;
        let handler = self.rewrite(handler)?;
        Ok(Ast::try_(pos.clone(), body, handler))
    }

    fn rewrite_throw(&mut self, pos: &Position, expr: &AstRef) -> Result<AstRef> {
        self.reject_in_pattern(pos, "throw")?;
        Ok(Ast::throw(pos.clone(), self.rewrite(expr)?))
    }

    fn rewrite_using(&mut self, pos: &Position, path: &[String]) -> Result<AstRef> {
        self.range.add_using(path);
        Ok(Ast::using(pos.clone(), path.to_vec()))
    }

    fn rewrite_data(&mut self, pos: &Position, items: &[AstRef]) -> Result<AstRef> {
        if self.state == IdentifyState::Field {
            // (name, value) pair: the name resolves in the field namespace
            let mut resolved = Vec::with_capacity(items.len());
            let mut iter = items.iter();
            if let Some(first) = iter.next() {
                resolved.push(self.identify_field_name(first)?);
            }
            self.state = IdentifyState::Use;
            for item in iter {
                resolved.push(self.rewrite(item)?);
            }
            self.state = IdentifyState::Field;
            Ok(Ast::data(pos.clone(), resolved))
        } else {
            self.state = IdentifyState::Use;
            let items = self.rewrites(items)?;
            let a = Ast::data(pos.clone(), items);
            self.declarations.push(a.clone());
            Ok(a)
        }
    }

    fn rewrite_def(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        if self.state == IdentifyState::Field {
            let name = self.identify_field_name(name)?;
            self.state = IdentifyState::Use;
            let body = self.rewrite(body)?;
            self.state = IdentifyState::Field;
            Ok(Ast::def(pos.clone(), name, body))
        } else {
            let name = self.rewrite(name)?;
            let body = self.rewrite(body)?;
            let a = Ast::def(pos.clone(), name, body);
            self.declarations.push(a.clone());
            self.state = IdentifyState::Use;
            Ok(a)
        }
    }

    fn rewrite_op_def(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        self.state = IdentifyState::Use;
        let name = self.rewrite(name)?;
        let body = self.rewrite(body)?;
        let a = Ast::op_def(pos.clone(), name, body);
        self.declarations.push(a.clone());
        Ok(a)
    }

    fn rewrite_value(&mut self, pos: &Position, name: &AstRef, body: &AstRef) -> Result<AstRef> {
        self.state = IdentifyState::Use;
        let name = self.rewrite(name)?;
        let body = self.rewrite(body)?;
        let a = Ast::value(pos.clone(), name, body);
        self.declarations.push(a.clone());
        Ok(a)
    }

    fn rewrite_object(
        &mut self,
        pos: &Position,
        name: &AstRef,
        vars: &[AstRef],
        fields: &[AstRef],
        extends: &[AstRef],
    ) -> Result<AstRef> {
        self.state = IdentifyState::Use;
        let name = self.rewrite(name)?;
        self.range.enter();
        self.state = IdentifyState::Pattern;
        let vars = self.rewrites(vars)?;
        self.state = IdentifyState::Use;
        let extends = self.rewrites(extends)?;
        self.state = IdentifyState::Field;
        let fields = self.rewrites(fields)?;
        self.range.leave();
        let a = Ast::object(pos.clone(), name, vars, fields, extends);
        self.declarations.push(a.clone());
        self.state = IdentifyState::Use;
        Ok(a)
    }

    fn rewrite_namespace(
        &mut self,
        pos: &Position,
        path: &[String],
        decls: &[AstRef],
    ) -> Result<AstRef> {
        let saved = self.namespace.clone();
        self.namespace.extend(path.iter().cloned());
        let full = self.namespace.clone();
        self.range.enter();
        self.range.add_using(&full);
        let decls = self.rewrites(decls)?;
        self.range.leave();
        self.namespace = saved;
        Ok(Ast::namespace(pos.clone(), path.to_vec(), decls))
    }

    fn rewrite_wrapper(&mut self, pos: &Position, decls: &[AstRef]) -> Result<AstRef> {
        self.rewrites(decls)?;
        let declarations = std::mem::take(&mut self.declarations);
        Ok(Ast::wrapper(pos.clone(), declarations))
    }
}
