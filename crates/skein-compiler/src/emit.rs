//! Bytecode emission: two traversals over the lifted tree.
//!
//! [`emit_data`] registers a VM data object for every combinator introduced
//! by a data declaration. [`emit_code`] then compiles each definition to a
//! bytecode object against the register calling convention: register 0 holds
//! the frame, slots 0..4 of the frame are (result thunk, result index,
//! continuation, exception handler, combinator) and slots 5.. the arguments.
//!
//! Expression emission is a three-state machine. In `Pattern` state a node
//! compiles to tests against the register already holding the scrutinized
//! value; in `Expr` state a node stores its value into the current
//! (rt, rti) slot; in `ExprRoot` state an application assembles a thunk and
//! installs it as the continuation of the enclosing frame. Register
//! allocation is monotonic within a definition, and the counter is rolled
//! back between sibling match clauses so they share the same address space.

use indexmap::IndexMap;

use skein_bytecode::{Coder, FRAME_ARG_OFFSET, FRAME_COMBINATOR_SLOT, Label, Reg};
use skein_core::{Error, Position, Result, qualify};
use skein_vm::{Machine, Object, ObjectRef};

use crate::ast::{Ast, AstRef};
use crate::literal::{unescape_char, unescape_text};
use crate::walk::Visit;

/// Register every data combinator in `a` with the machine.
pub fn emit_data(machine: &mut Machine, a: &AstRef) -> Result<Vec<ObjectRef>> {
    let mut pass = EmitData {
        machine,
        out: Vec::new(),
    };
    pass.visit(a)?;
    Ok(pass.out)
}

struct EmitData<'a> {
    machine: &'a mut Machine,
    out: Vec<ObjectRef>,
}

impl Visit for EmitData<'_> {
    fn visit_combinator(&mut self, _pos: &Position, path: &[String], name: &str) -> Result<()> {
        let object = Object::data(qualify(path, name));
        self.machine.define_data(object.clone());
        self.out.push(object);
        Ok(())
    }

    // only data declarations introduce data combinators
    fn visit_def(&mut self, _pos: &Position, _name: &AstRef, _body: &AstRef) -> Result<()> {
        Ok(())
    }

    fn visit_op_def(&mut self, _pos: &Position, _name: &AstRef, _body: &AstRef) -> Result<()> {
        Ok(())
    }

    fn visit_value(&mut self, _pos: &Position, _name: &AstRef, _body: &AstRef) -> Result<()> {
        Ok(())
    }
}

/// Emit a bytecode object for every definition in `a`.
pub fn emit_code(machine: &mut Machine, a: &AstRef) -> Result<Vec<ObjectRef>> {
    let mut pass = EmitCode {
        machine,
        coder: Coder::new(),
        state: EmitState::Expr,
        frame: 0,
        rt: 0,
        rti: 0,
        k: 0,
        exc: 0,
        arity: 0,
        current: 0,
        fail: Label(0),
        variables: IndexMap::new(),
        out: Vec::new(),
    };
    pass.visit(a)?;
    Ok(pass.out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmitState {
    Pattern,
    Expr,
    ExprRoot,
}

struct EmitCode<'a> {
    machine: &'a mut Machine,
    coder: Coder<ObjectRef>,
    state: EmitState,

    frame: Reg,
    rt: Reg,
    rti: Reg,
    k: Reg,
    exc: Reg,

    arity: u16,
    current: Reg,
    fail: Label,
    variables: IndexMap<String, Reg>,

    out: Vec<ObjectRef>,
}

impl EmitCode<'_> {
    fn binding(&self, pos: &Position, name: &str) -> Reg {
        match self.variables.get(name) {
            Some(&r) => r,
            None => panic!(
                "{}",
                Error::internal(pos.clone(), format!("unbound variable {name}"))
            ),
        }
    }

    /// A literal constant: test in patterns, store in expressions, thunk at
    /// the expression root.
    fn emit_constant(&mut self, object: ObjectRef) {
        match self.state {
            EmitState::Pattern => {
                let r = self.current;
                let l = self.fail;
                let ri = self.coder.generate_register();
                let d = self.coder.intern_data(object);
                self.coder.emit_data(ri, d);
                self.coder.emit_test(r, ri);
                self.coder.emit_fail(l);
            }
            EmitState::ExprRoot => {
                let rt = self.coder.generate_register();
                let rti = self.coder.generate_register();
                let k = self.coder.generate_register();
                let exc = self.coder.generate_register();
                let c = self.coder.generate_register();
                let t = self.coder.generate_register();

                self.coder.emit_mov(rt, self.rt);
                self.coder.emit_mov(rti, self.rti);
                self.coder.emit_mov(k, self.k);
                self.coder.emit_mov(exc, self.exc);

                let d = self.coder.intern_data(object);
                self.coder.emit_data(c, d);
                self.coder.emit_array(t, rt, c);

                self.state = EmitState::Expr;
                let x = self.coder.generate_register();
                self.coder
                    .emit_concatx(x, t, self.frame, FRAME_ARG_OFFSET + self.arity);
                self.k = x;
            }
            EmitState::Expr => {
                let c = self.coder.generate_register();
                let d = self.coder.intern_data(object);
                self.coder.emit_data(c, d);
                self.coder.emit_set(self.rt, self.rti, c);
            }
        }
    }

    /// A combinator: in expression position it always becomes a nullary
    /// thunk so the machine reduces it.
    fn emit_combinator_object(&mut self, object: ObjectRef) {
        match self.state {
            EmitState::Pattern => {
                let r = self.current;
                let l = self.fail;
                let ri = self.coder.generate_register();
                let d = self.coder.intern_data(object);
                self.coder.emit_data(ri, d);
                self.coder.emit_test(r, ri);
                self.coder.emit_fail(l);
            }
            EmitState::Expr | EmitState::ExprRoot => {
                let rt = self.coder.generate_register();
                let rti = self.coder.generate_register();
                let k = self.coder.generate_register();
                let exc = self.coder.generate_register();
                let c = self.coder.generate_register();
                let t = self.coder.generate_register();

                self.coder.emit_mov(rt, self.rt);
                self.coder.emit_mov(rti, self.rti);
                self.coder.emit_mov(k, self.k);
                self.coder.emit_mov(exc, self.exc);

                let d = self.coder.intern_data(object);
                self.coder.emit_data(c, d);
                self.coder.emit_array(t, rt, c);

                if self.state == EmitState::ExprRoot {
                    self.state = EmitState::Expr;
                    let x = self.coder.generate_register();
                    self.coder
                        .emit_concatx(x, t, self.frame, FRAME_ARG_OFFSET + self.arity);
                    self.k = x;
                } else {
                    self.k = t;
                }
            }
        }
    }

    fn emit_definition(&mut self, name: &AstRef, body: &AstRef) -> Result<()> {
        self.variables.clear();

        let frame = self.coder.generate_register();
        let l = self.coder.generate_label();
        self.fail = l;

        let rt = self.coder.generate_register();
        let rti = self.coder.generate_register();
        let k = self.coder.generate_register();
        let exc = self.coder.generate_register();
        let c = self.coder.generate_register();

        self.frame = frame;
        self.rt = rt;
        self.rti = rti;
        self.k = k;
        self.exc = exc;
        self.arity = 0;

        self.coder.emit_takex(rt, c, frame, 0);
        self.coder.emit_fail(l);
        self.state = EmitState::ExprRoot;
        self.visit(body)?;
        self.coder.emit_label(l);

        // no clause matched: rebuild the unreduced redex from the frame and
        // hand it to the caller
        let em = self.coder.generate_register();
        let r = self.coder.generate_register();
        self.coder.emit_array(em, rti, rt);
        self.coder.emit_concatx(r, em, frame, FRAME_COMBINATOR_SLOT);
        self.coder.emit_set(rt, rti, r);
        self.coder.emit_return(k);

        self.coder
            .relabel()
            .map_err(|e| Error::internal(name.position(), e.to_string()))?;
        let (code, data) = self.coder.finish();

        let symbol = name.qualified_name().ok_or_else(|| {
            Error::identification(name.position(), "combinator expected")
        })?;
        let object = Object::bytecode(symbol, code, data);
        self.machine.define_data(object.clone());
        self.out.push(object);
        Ok(())
    }
}

impl Visit for EmitCode<'_> {
    fn visit_integer(&mut self, pos: &Position, text: &str) -> Result<()> {
        let i: i64 = text
            .parse()
            .map_err(|_| Error::internal(pos.clone(), format!("bad integer literal {text}")))?;
        let object = self.machine.create_integer(i);
        self.emit_constant(object);
        Ok(())
    }

    fn visit_hex_integer(&mut self, pos: &Position, text: &str) -> Result<()> {
        let digits = text.strip_prefix("0x").unwrap_or(text);
        let i = i64::from_str_radix(digits, 16)
            .map_err(|_| Error::internal(pos.clone(), format!("bad hex literal {text}")))?;
        let object = self.machine.create_integer(i);
        self.emit_constant(object);
        Ok(())
    }

    fn visit_float(&mut self, pos: &Position, text: &str) -> Result<()> {
        let f: f64 = text
            .parse()
            .map_err(|_| Error::internal(pos.clone(), format!("bad float literal {text}")))?;
        let object = self.machine.create_float(f);
        self.emit_constant(object);
        Ok(())
    }

    fn visit_character(&mut self, _pos: &Position, text: &str) -> Result<()> {
        let object = self.machine.create_char(unescape_char(text));
        self.emit_constant(object);
        Ok(())
    }

    fn visit_text(&mut self, _pos: &Position, text: &str) -> Result<()> {
        let object = self.machine.create_text(unescape_text(text));
        self.emit_constant(object);
        Ok(())
    }

    fn visit_combinator(&mut self, _pos: &Position, path: &[String], name: &str) -> Result<()> {
        let object = self.machine.get_combinator(path, name);
        self.emit_combinator_object(object);
        Ok(())
    }

    fn visit_operator(&mut self, pos: &Position, path: &[String], name: &str) -> Result<()> {
        self.visit_combinator(pos, path, name)
    }

    fn visit_variable(&mut self, pos: &Position, name: &str) -> Result<()> {
        match self.state {
            EmitState::Pattern => {
                self.variables.insert(name.to_string(), self.current);
            }
            EmitState::ExprRoot => {
                self.state = EmitState::Expr;
                let r = self.binding(pos, name);

                let rt = self.coder.generate_register();
                let rti = self.coder.generate_register();
                let k = self.coder.generate_register();
                let exc = self.coder.generate_register();
                let c = self.coder.generate_register();
                let t = self.coder.generate_register();

                self.coder.emit_mov(rt, self.rt);
                self.coder.emit_mov(rti, self.rti);
                self.coder.emit_mov(k, self.k);
                self.coder.emit_mov(exc, self.exc);
                self.coder.emit_mov(c, r);
                self.coder.emit_array(t, rt, c);

                let x = self.coder.generate_register();
                self.coder
                    .emit_concatx(x, t, self.frame, FRAME_ARG_OFFSET + self.arity);
                self.k = x;
            }
            EmitState::Expr => {
                let r = self.binding(pos, name);
                self.coder.emit_set(self.rt, self.rti, r);
            }
        }
        Ok(())
    }

    fn visit_apply(&mut self, _pos: &Position, terms: &[AstRef]) -> Result<()> {
        match self.state {
            EmitState::Pattern => {
                let r = self.current;
                let l = self.fail;

                let mut x = 0;
                let mut y = 0;
                for n in 0..terms.len() {
                    y = self.coder.generate_register();
                    if n == 0 {
                        x = y;
                    }
                }

                self.coder.emit_split(x, y, r);
                self.coder.emit_fail(l);

                let mut n = x;
                for term in terms {
                    self.current = n;
                    n += 1;
                    self.visit(term)?;
                }
                Ok(())
            }
            EmitState::Expr | EmitState::ExprRoot => {
                let rt = self.coder.generate_register();
                let rti = self.coder.generate_register();
                let k = self.coder.generate_register();
                let exc = self.coder.generate_register();
                let c = self.coder.generate_register();

                let sz = terms.len();
                let mut x = 0;
                let mut y = 0;
                for n in 1..sz {
                    y = self.coder.generate_register();
                    if n == 1 {
                        x = y;
                    }
                }

                let t = self.coder.generate_register();

                self.coder.emit_mov(rt, self.rt);
                self.coder.emit_mov(rti, self.rti);
                self.coder.emit_mov(k, self.k);
                self.coder.emit_mov(exc, self.exc);

                // heads that are variables or combinators load directly,
                // anything else evaluates into slot 4 afterwards
                let head_flag = match terms[0].as_ref() {
                    Ast::Variable { pos, name } => {
                        let r = self.binding(pos, name);
                        self.coder.emit_mov(c, r);
                        true
                    }
                    Ast::Combinator { path, name, .. } | Ast::Operator { path, name, .. } => {
                        let object = self.machine.get_combinator(path, name);
                        let d = self.coder.intern_data(object);
                        self.coder.emit_data(c, d);
                        true
                    }
                    _ => {
                        self.coder.emit_nil(c);
                        false
                    }
                };

                let mut z = x;
                for _ in 1..sz {
                    self.coder.emit_nil(z);
                    z += 1;
                }
                self.coder.emit_array(t, rt, y);

                let root = if self.state == EmitState::ExprRoot {
                    self.state = EmitState::Expr;
                    let root = self.coder.generate_register();
                    self.coder
                        .emit_concatx(root, t, self.frame, FRAME_ARG_OFFSET + self.arity);
                    root
                } else {
                    t
                };
                self.k = root;
                self.rt = root;

                if !head_flag {
                    let d = {
                        let object = self.machine.create_integer(i64::from(FRAME_COMBINATOR_SLOT));
                        self.coder.intern_data(object)
                    };
                    self.coder.emit_data(rti, d);
                    self.rti = rti;
                    self.visit(&terms[0])?;
                }

                for (n, term) in terms.iter().enumerate().skip(1) {
                    let object = self.machine.create_integer(n as i64 + 4);
                    let d = self.coder.intern_data(object);
                    let q = self.coder.generate_register();
                    self.coder.emit_data(q, d);
                    self.rti = q;
                    self.visit(term)?;
                }

                Ok(())
            }
        }
    }

    fn visit_tag(&mut self, pos: &Position, pattern: &AstRef, tag: &AstRef) -> Result<()> {
        match self.state {
            EmitState::Pattern => {
                let r = self.current;
                let l = self.fail;

                match pattern.as_ref() {
                    Ast::Variable { .. } => self.visit(pattern)?,
                    _ => {
                        return Err(Error::identification(
                            pattern.position(),
                            "variable expected",
                        ));
                    }
                }

                match tag.as_ref() {
                    Ast::Combinator { path, name, .. } => {
                        let object = self.machine.get_combinator(path, name);
                        let d = self.coder.intern_data(object);
                        let rt = self.coder.generate_register();
                        self.coder.emit_data(rt, d);
                        self.coder.emit_tag(r, rt);
                        self.coder.emit_fail(l);
                        Ok(())
                    }
                    _ => Err(Error::identification(tag.position(), "combinator expected")),
                }
            }
            EmitState::Expr | EmitState::ExprRoot => {
                panic!("{}", Error::internal(pos.clone(), "tag in expression"))
            }
        }
    }

    fn visit_match(
        &mut self,
        _pos: &Position,
        patterns: &[AstRef],
        _guard: &AstRef,
        result: &AstRef,
    ) -> Result<()> {
        let member = self.coder.peek_register();
        let r = self.frame;

        let l = self.coder.generate_label();
        self.fail = l;

        let arity = patterns.len() as u16;
        self.arity = arity;
        let mut x = 0;
        let mut y = 0;
        for n in 0..arity {
            y = self.coder.generate_register();
            if n == 0 {
                x = y;
            }
        }

        if arity > 0 {
            self.coder.emit_takex(x, y, r, FRAME_ARG_OFFSET);
            self.coder.emit_fail(l);
        }

        self.state = EmitState::Pattern;
        let mut n = x;
        for pattern in patterns {
            self.current = n;
            n += 1;
            self.visit(pattern)?;
        }

        // guards have been desugared upstream

        self.state = EmitState::ExprRoot;
        self.visit(result)?;

        // every clause ends by transferring to its continuation
        self.coder.emit_return(self.k);

        self.coder.emit_label(l);
        self.coder.restore_register(member);
        Ok(())
    }

    fn visit_block(&mut self, _pos: &Position, clauses: &[AstRef]) -> Result<()> {
        // the link registers are invariant across clauses
        let rt = self.rt;
        let rti = self.rti;
        let k = self.k;
        let exc = self.exc;

        for clause in clauses {
            self.rt = rt;
            self.rti = rti;
            self.k = k;
            self.exc = exc;
            self.visit(clause)?;
        }
        Ok(())
    }

    fn visit_try(&mut self, _pos: &Position, body: &AstRef, handler: &AstRef) -> Result<()> {
        let rt = self.rt;
        let rti = self.rti;
        let k = self.k;
        let exc = self.exc;

        // the exception thunk: (rt, rti, k, exc, handler combinator, arg)
        let e_rt = self.coder.generate_register();
        let e_rti = self.coder.generate_register();
        let e_k = self.coder.generate_register();
        let e_exc = self.coder.generate_register();
        let e_arg0 = self.coder.generate_register();
        let e_arg1 = self.coder.generate_register();

        self.coder.emit_mov(e_rt, rt);
        self.coder.emit_mov(e_rti, rti);
        self.coder.emit_mov(e_k, k);
        self.coder.emit_mov(e_exc, exc);
        self.coder.emit_nil(e_arg0);
        self.coder.emit_nil(e_arg1);

        let new_exc = self.coder.generate_register();
        self.coder.emit_array(new_exc, e_rt, e_arg1);

        // the body runs with the new handler installed
        self.exc = new_exc;
        self.visit(body)?;

        // the handler expression runs under the old handler and drops its
        // value into the handler thunk's combinator slot
        let new_exci = self.coder.generate_register();
        let d = {
            let object = self.machine.create_integer(i64::from(FRAME_COMBINATOR_SLOT));
            self.coder.intern_data(object)
        };
        self.coder.emit_data(new_exci, d);

        self.exc = exc;
        self.rt = new_exc;
        self.rti = new_exci;
        self.visit(handler)?;

        self.rt = rt;
        self.rti = rti;
        Ok(())
    }

    fn visit_throw(&mut self, pos: &Position, _expr: &AstRef) -> Result<()> {
        panic!(
            "{}",
            Error::internal(pos.clone(), "throw reached the emitter")
        )
    }

    // data combinators were registered by the data pass
    fn visit_data(&mut self, _pos: &Position, _items: &[AstRef]) -> Result<()> {
        Ok(())
    }

    fn visit_def(&mut self, _pos: &Position, name: &AstRef, body: &AstRef) -> Result<()> {
        self.emit_definition(name, body)
    }

    fn visit_op_def(&mut self, _pos: &Position, name: &AstRef, body: &AstRef) -> Result<()> {
        // operator declarations emit exactly like definitions
        self.emit_definition(name, body)
    }

    fn visit_value(&mut self, _pos: &Position, name: &AstRef, body: &AstRef) -> Result<()> {
        self.emit_definition(name, body)
    }
}
