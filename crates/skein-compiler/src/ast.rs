//! The AST algebra.
//!
//! Nodes are immutable and shared as [`AstRef`]; a pass builds a new tree and
//! never mutates nodes it does not own. Every node carries the [`Position`]
//! of the source construct it came from (synthesized nodes inherit the
//! position of the construct that triggered them), and the structural
//! equality and ordering below deliberately ignore positions so that sets,
//! substitution and free-variable computation treat α-copies as equal.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use skein_core::{Position, qualify};

pub type AstRef = Rc<Ast>;

#[derive(Debug, Clone)]
pub enum Ast {
    /// Placeholder for an absent optional sub-tree (e.g. a match guard).
    Empty,

    // literals, kept as source text until emission
    Integer { pos: Position, text: String },
    HexInteger { pos: Position, text: String },
    Float { pos: Position, text: String },
    Character { pos: Position, text: String },
    Text { pos: Position, text: String },

    // variables and constants
    Variable { pos: Position, name: String },
    Wildcard { pos: Position, name: String },
    Combinator { pos: Position, path: Vec<String>, name: String },
    Operator { pos: Position, path: Vec<String>, name: String },

    /// `p : c` pattern: binds `p` and asserts the value's head is `c`.
    Tag { pos: Position, pattern: AstRef, tag: AstRef },

    // list and tuple, desugared
    List { pos: Position, items: Vec<AstRef>, tail: Option<AstRef> },
    Tuple { pos: Position, items: Vec<AstRef> },

    // compound expressions
    Apply { pos: Position, terms: Vec<AstRef> },
    Match { pos: Position, patterns: Vec<AstRef>, guard: AstRef, result: AstRef },
    Block { pos: Position, clauses: Vec<AstRef> },
    Lambda { pos: Position, clause: AstRef },
    Let { pos: Position, patterns: Vec<AstRef>, value: AstRef, body: AstRef },
    If { pos: Position, cond: AstRef, then: AstRef, otherwise: AstRef },
    Statement { pos: Position, first: AstRef, rest: AstRef },
    Try { pos: Position, body: AstRef, handler: AstRef },
    Throw { pos: Position, expr: AstRef },
    Do { pos: Position, expr: AstRef },

    // directives, flattened out by identify
    Import { pos: Position, file: String },
    Using { pos: Position, path: Vec<String> },

    // declarations
    Namespace { pos: Position, path: Vec<String>, decls: Vec<AstRef> },
    Data { pos: Position, items: Vec<AstRef> },
    Def { pos: Position, name: AstRef, body: AstRef },
    OpDef { pos: Position, name: AstRef, body: AstRef },
    Object {
        pos: Position,
        name: AstRef,
        vars: Vec<AstRef>,
        fields: Vec<AstRef>,
        extends: Vec<AstRef>,
    },
    Value { pos: Position, name: AstRef, body: AstRef },

    /// Anonymous grouping of declarations, introduced by parsing a module
    /// and by lifting.
    Wrapper { pos: Position, decls: Vec<AstRef> },
}

impl Ast {
    pub fn empty() -> AstRef {
        Rc::new(Self::Empty)
    }

    pub fn integer(pos: Position, text: impl Into<String>) -> AstRef {
        Rc::new(Self::Integer { pos, text: text.into() })
    }

    pub fn hex_integer(pos: Position, text: impl Into<String>) -> AstRef {
        Rc::new(Self::HexInteger { pos, text: text.into() })
    }

    pub fn float(pos: Position, text: impl Into<String>) -> AstRef {
        Rc::new(Self::Float { pos, text: text.into() })
    }

    pub fn character(pos: Position, text: impl Into<String>) -> AstRef {
        Rc::new(Self::Character { pos, text: text.into() })
    }

    pub fn text(pos: Position, text: impl Into<String>) -> AstRef {
        Rc::new(Self::Text { pos, text: text.into() })
    }

    pub fn variable(pos: Position, name: impl Into<String>) -> AstRef {
        Rc::new(Self::Variable { pos, name: name.into() })
    }

    pub fn wildcard(pos: Position, name: impl Into<String>) -> AstRef {
        Rc::new(Self::Wildcard { pos, name: name.into() })
    }

    pub fn combinator(pos: Position, path: Vec<String>, name: impl Into<String>) -> AstRef {
        Rc::new(Self::Combinator { pos, path, name: name.into() })
    }

    pub fn operator(pos: Position, path: Vec<String>, name: impl Into<String>) -> AstRef {
        Rc::new(Self::Operator { pos, path, name: name.into() })
    }

    pub fn tag(pos: Position, pattern: AstRef, tag: AstRef) -> AstRef {
        Rc::new(Self::Tag { pos, pattern, tag })
    }

    pub fn list(pos: Position, items: Vec<AstRef>, tail: Option<AstRef>) -> AstRef {
        Rc::new(Self::List { pos, items, tail })
    }

    pub fn tuple(pos: Position, items: Vec<AstRef>) -> AstRef {
        Rc::new(Self::Tuple { pos, items })
    }

    pub fn apply(pos: Position, terms: Vec<AstRef>) -> AstRef {
        Rc::new(Self::Apply { pos, terms })
    }

    pub fn match_clause(
        pos: Position,
        patterns: Vec<AstRef>,
        guard: AstRef,
        result: AstRef,
    ) -> AstRef {
        Rc::new(Self::Match { pos, patterns, guard, result })
    }

    pub fn block(pos: Position, clauses: Vec<AstRef>) -> AstRef {
        Rc::new(Self::Block { pos, clauses })
    }

    pub fn lambda(pos: Position, clause: AstRef) -> AstRef {
        Rc::new(Self::Lambda { pos, clause })
    }

    pub fn let_(pos: Position, patterns: Vec<AstRef>, value: AstRef, body: AstRef) -> AstRef {
        Rc::new(Self::Let { pos, patterns, value, body })
    }

    pub fn if_(pos: Position, cond: AstRef, then: AstRef, otherwise: AstRef) -> AstRef {
        Rc::new(Self::If { pos, cond, then, otherwise })
    }

    pub fn statement(pos: Position, first: AstRef, rest: AstRef) -> AstRef {
        Rc::new(Self::Statement { pos, first, rest })
    }

    pub fn try_(pos: Position, body: AstRef, handler: AstRef) -> AstRef {
        Rc::new(Self::Try { pos, body, handler })
    }

    pub fn throw(pos: Position, expr: AstRef) -> AstRef {
        Rc::new(Self::Throw { pos, expr })
    }

    pub fn do_(pos: Position, expr: AstRef) -> AstRef {
        Rc::new(Self::Do { pos, expr })
    }

    pub fn import(pos: Position, file: impl Into<String>) -> AstRef {
        Rc::new(Self::Import { pos, file: file.into() })
    }

    pub fn using(pos: Position, path: Vec<String>) -> AstRef {
        Rc::new(Self::Using { pos, path })
    }

    pub fn namespace(pos: Position, path: Vec<String>, decls: Vec<AstRef>) -> AstRef {
        Rc::new(Self::Namespace { pos, path, decls })
    }

    pub fn data(pos: Position, items: Vec<AstRef>) -> AstRef {
        Rc::new(Self::Data { pos, items })
    }

    pub fn def(pos: Position, name: AstRef, body: AstRef) -> AstRef {
        Rc::new(Self::Def { pos, name, body })
    }

    pub fn op_def(pos: Position, name: AstRef, body: AstRef) -> AstRef {
        Rc::new(Self::OpDef { pos, name, body })
    }

    pub fn object(
        pos: Position,
        name: AstRef,
        vars: Vec<AstRef>,
        fields: Vec<AstRef>,
        extends: Vec<AstRef>,
    ) -> AstRef {
        Rc::new(Self::Object { pos, name, vars, fields, extends })
    }

    pub fn value(pos: Position, name: AstRef, body: AstRef) -> AstRef {
        Rc::new(Self::Value { pos, name, body })
    }

    pub fn wrapper(pos: Position, decls: Vec<AstRef>) -> AstRef {
        Rc::new(Self::Wrapper { pos, decls })
    }

    /// The position of the source construct this node came from.
    pub fn position(&self) -> Position {
        match self {
            Self::Empty => Position::none(),
            Self::Integer { pos, .. }
            | Self::HexInteger { pos, .. }
            | Self::Float { pos, .. }
            | Self::Character { pos, .. }
            | Self::Text { pos, .. }
            | Self::Variable { pos, .. }
            | Self::Wildcard { pos, .. }
            | Self::Combinator { pos, .. }
            | Self::Operator { pos, .. }
            | Self::Tag { pos, .. }
            | Self::List { pos, .. }
            | Self::Tuple { pos, .. }
            | Self::Apply { pos, .. }
            | Self::Match { pos, .. }
            | Self::Block { pos, .. }
            | Self::Lambda { pos, .. }
            | Self::Let { pos, .. }
            | Self::If { pos, .. }
            | Self::Statement { pos, .. }
            | Self::Try { pos, .. }
            | Self::Throw { pos, .. }
            | Self::Do { pos, .. }
            | Self::Import { pos, .. }
            | Self::Using { pos, .. }
            | Self::Namespace { pos, .. }
            | Self::Data { pos, .. }
            | Self::Def { pos, .. }
            | Self::OpDef { pos, .. }
            | Self::Object { pos, .. }
            | Self::Value { pos, .. }
            | Self::Wrapper { pos, .. } => pos.clone(),
        }
    }

    /// The canonical qualified name of a combinator or operator node.
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            Self::Combinator { path, name, .. } | Self::Operator { path, name, .. } => {
                Some(qualify(path, name))
            }
            _ => None,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Integer { .. } => 1,
            Self::HexInteger { .. } => 2,
            Self::Float { .. } => 3,
            Self::Character { .. } => 4,
            Self::Text { .. } => 5,
            Self::Variable { .. } => 6,
            Self::Wildcard { .. } => 7,
            Self::Combinator { .. } => 8,
            Self::Operator { .. } => 9,
            Self::Tag { .. } => 10,
            Self::List { .. } => 11,
            Self::Tuple { .. } => 12,
            Self::Apply { .. } => 13,
            Self::Match { .. } => 14,
            Self::Block { .. } => 15,
            Self::Lambda { .. } => 16,
            Self::Let { .. } => 17,
            Self::If { .. } => 18,
            Self::Statement { .. } => 19,
            Self::Try { .. } => 20,
            Self::Throw { .. } => 21,
            Self::Do { .. } => 22,
            Self::Import { .. } => 23,
            Self::Using { .. } => 24,
            Self::Namespace { .. } => 25,
            Self::Data { .. } => 26,
            Self::Def { .. } => 27,
            Self::OpDef { .. } => 28,
            Self::Object { .. } => 29,
            Self::Value { .. } => 30,
            Self::Wrapper { .. } => 31,
        }
    }
}

fn cmp_lists(a: &[AstRef], b: &[AstRef]) -> Ordering {
    // sizes first, then elementwise
    a.len()
        .cmp(&b.len())
        .then_with(|| a.iter().cmp(b.iter()))
}

fn cmp_paths(a: &[String], b: &[String]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.iter().cmp(b.iter()))
}

impl Ord for Ast {
    fn cmp(&self, other: &Self) -> Ordering {
        use Ast::*;
        match (self, other) {
            (Empty, Empty) => Ordering::Equal,
            (Integer { text: a, .. }, Integer { text: b, .. })
            | (HexInteger { text: a, .. }, HexInteger { text: b, .. })
            | (Float { text: a, .. }, Float { text: b, .. })
            | (Character { text: a, .. }, Character { text: b, .. })
            | (Text { text: a, .. }, Text { text: b, .. })
            | (Variable { name: a, .. }, Variable { name: b, .. })
            | (Wildcard { name: a, .. }, Wildcard { name: b, .. })
            | (Import { file: a, .. }, Import { file: b, .. }) => a.cmp(b),
            (
                Combinator { path: pa, name: na, .. },
                Combinator { path: pb, name: nb, .. },
            )
            | (Operator { path: pa, name: na, .. }, Operator { path: pb, name: nb, .. }) => {
                cmp_paths(pa, pb).then_with(|| na.cmp(nb))
            }
            (Tag { pattern: ea, tag: ta, .. }, Tag { pattern: eb, tag: tb, .. }) => {
                ea.cmp(eb).then_with(|| ta.cmp(tb))
            }
            (List { items: ia, tail: ta, .. }, List { items: ib, tail: tb, .. }) => {
                cmp_lists(ia, ib).then_with(|| ta.cmp(tb))
            }
            (Tuple { items: a, .. }, Tuple { items: b, .. })
            | (Apply { terms: a, .. }, Apply { terms: b, .. })
            | (Block { clauses: a, .. }, Block { clauses: b, .. })
            | (Data { items: a, .. }, Data { items: b, .. })
            | (Wrapper { decls: a, .. }, Wrapper { decls: b, .. }) => cmp_lists(a, b),
            (
                Match { patterns: pa, guard: ga, result: ra, .. },
                Match { patterns: pb, guard: gb, result: rb, .. },
            ) => cmp_lists(pa, pb)
                .then_with(|| ga.cmp(gb))
                .then_with(|| ra.cmp(rb)),
            (Lambda { clause: a, .. }, Lambda { clause: b, .. }) => a.cmp(b),
            (
                Let { patterns: pa, value: va, body: ba, .. },
                Let { patterns: pb, value: vb, body: bb, .. },
            ) => cmp_lists(pa, pb)
                .then_with(|| va.cmp(vb))
                .then_with(|| ba.cmp(bb)),
            (
                If { cond: ca, then: ta, otherwise: ea, .. },
                If { cond: cb, then: tb, otherwise: eb, .. },
            ) => ca.cmp(cb).then_with(|| ta.cmp(tb)).then_with(|| ea.cmp(eb)),
            (
                Statement { first: fa, rest: ra, .. },
                Statement { first: fb, rest: rb, .. },
            ) => fa.cmp(fb).then_with(|| ra.cmp(rb)),
            (Try { body: ba, handler: ha, .. }, Try { body: bb, handler: hb, .. }) => {
                ba.cmp(bb).then_with(|| ha.cmp(hb))
            }
            (Throw { expr: a, .. }, Throw { expr: b, .. })
            | (Do { expr: a, .. }, Do { expr: b, .. }) => a.cmp(b),
            (Using { path: a, .. }, Using { path: b, .. }) => cmp_paths(a, b),
            (
                Namespace { path: pa, decls: da, .. },
                Namespace { path: pb, decls: db, .. },
            ) => cmp_paths(pa, pb).then_with(|| cmp_lists(da, db)),
            (Def { name: na, body: ba, .. }, Def { name: nb, body: bb, .. })
            | (OpDef { name: na, body: ba, .. }, OpDef { name: nb, body: bb, .. })
            | (Value { name: na, body: ba, .. }, Value { name: nb, body: bb, .. }) => {
                na.cmp(nb).then_with(|| ba.cmp(bb))
            }
            (
                Object { name: na, vars: va, fields: fa, extends: ea, .. },
                Object { name: nb, vars: vb, fields: fb, extends: eb, .. },
            ) => na
                .cmp(nb)
                .then_with(|| cmp_lists(va, vb))
                .then_with(|| cmp_lists(fa, fb))
                .then_with(|| cmp_lists(ea, eb)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Ast {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ast {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ast {}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[AstRef], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "<empty>"),
            Self::Integer { text, .. }
            | Self::HexInteger { text, .. }
            | Self::Float { text, .. }
            | Self::Character { text, .. }
            | Self::Text { text, .. } => write!(f, "{text}"),
            Self::Variable { name, .. } | Self::Wildcard { name, .. } => write!(f, "{name}"),
            Self::Combinator { path, name, .. } | Self::Operator { path, name, .. } => {
                write!(f, "{}", qualify(path, name))
            }
            Self::Tag { pattern, tag, .. } => write!(f, "{pattern} : {tag}"),
            Self::List { items, tail, .. } => {
                f.write_str("{")?;
                write_joined(f, items, ", ")?;
                if let Some(tail) = tail {
                    write!(f, "|{tail}")?;
                }
                f.write_str("}")
            }
            Self::Tuple { items, .. } => {
                f.write_str("(")?;
                write_joined(f, items, ", ")?;
                f.write_str(")")
            }
            Self::Apply { terms, .. } => {
                f.write_str("(")?;
                write_joined(f, terms, " ")?;
                f.write_str(")")
            }
            Self::Match { patterns, guard, result, .. } => {
                write_joined(f, patterns, " ")?;
                if !patterns.is_empty() {
                    f.write_str(" ")?;
                }
                if !guard.is_empty() {
                    write!(f, "? {guard} ")?;
                }
                write!(f, "-> {result}")
            }
            Self::Block { clauses, .. } => {
                f.write_str("[")?;
                write_joined(f, clauses, " | ")?;
                f.write_str("]")
            }
            Self::Lambda { clause, .. } => write!(f, "\\{clause}"),
            Self::Let { patterns, value, body, .. } => {
                f.write_str("let ")?;
                write_joined(f, patterns, ", ")?;
                write!(f, " = {value} in {body}")
            }
            Self::If { cond, then, otherwise, .. } => {
                write!(f, "if {cond} then {then} else {otherwise}")
            }
            Self::Statement { first, rest, .. } => write!(f, "{first}; {rest}"),
            Self::Try { body, handler, .. } => write!(f, "try {body} catch {handler}"),
            Self::Throw { expr, .. } => write!(f, "throw {expr}"),
            Self::Do { expr, .. } => write!(f, "do {expr}"),
            Self::Import { file, .. } => write!(f, "import \"{file}\""),
            Self::Using { path, .. } => write!(f, "using {}", path.join("::")),
            Self::Namespace { path, decls, .. } => {
                write!(f, "namespace {} (", path.join("::"))?;
                write_joined(f, decls, " ")?;
                f.write_str(")")
            }
            Self::Data { items, .. } => {
                f.write_str("data ")?;
                write_joined(f, items, ", ")
            }
            Self::Def { name, body, .. } | Self::OpDef { name, body, .. } => {
                write!(f, "def {name} = {body}")
            }
            Self::Object { name, vars, fields, extends, .. } => {
                write!(f, "object {name}")?;
                for v in vars {
                    write!(f, " {v}")?;
                }
                f.write_str(" (")?;
                write_joined(f, fields, " ")?;
                f.write_str(")")?;
                if !extends.is_empty() {
                    f.write_str(" extends ")?;
                    write_joined(f, extends, ", ")?;
                }
                Ok(())
            }
            Self::Value { name, body, .. } => write!(f, "val {name} = {body}"),
            Self::Wrapper { decls, .. } => write_joined(f, decls, "\n"),
        }
    }
}
