//! Recursive-descent parser from tokens to the AST algebra.
//!
//! The parser is deliberately plain: one function per grammar level, no
//! recovery (the module is abandoned at the first syntactical error). The
//! parsed module is a `Wrapper` of declarations; namespaces nest until the
//! semantic pass flattens them.

use std::ops::Range;
use std::sync::Arc;

use skein_core::{Error, Position, Result};

use crate::ast::{Ast, AstRef};
use crate::lexer::{LineIndex, Token, tokenize};
use crate::literal::unescape_text;

/// Parse one module.
pub fn parse_module(source_name: &str, text: &str) -> Result<AstRef> {
    let tokens = tokenize(source_name, text)?;
    let mut parser = Parser {
        source: source_name.into(),
        lines: LineIndex::new(text),
        tokens,
        index: 0,
        end: text.len(),
    };
    parser.module()
}

struct Parser<'src> {
    source: Arc<str>,
    lines: LineIndex,
    tokens: Vec<(Token<'src>, Range<usize>)>,
    index: usize,
    end: usize,
}

impl<'src> Parser<'src> {
    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.index).map(|(t, _)| *t)
    }

    fn peek_at(&self, ahead: usize) -> Option<Token<'src>> {
        self.tokens.get(self.index + ahead).map(|(t, _)| *t)
    }

    fn advance(&mut self) -> Option<Token<'src>> {
        let t = self.peek();
        if t.is_some() {
            self.index += 1;
        }
        t
    }

    fn position(&self) -> Position {
        let offset = self
            .tokens
            .get(self.index)
            .map(|(_, span)| span.start)
            .unwrap_or(self.end);
        self.lines.position(&self.source, offset)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::syntactical(self.position(), message)
    }

    fn eat(&mut self, token: Token<'src>) -> bool {
        if self.peek() == Some(token) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token<'src>, what: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    // module and declarations

    fn module(&mut self) -> Result<AstRef> {
        let pos = self.position();
        let mut decls = Vec::new();
        while self.peek().is_some() {
            decls.push(self.decl()?);
        }
        Ok(Ast::wrapper(pos, decls))
    }

    fn decl(&mut self) -> Result<AstRef> {
        let pos = self.position();
        match self.peek() {
            Some(Token::Import) => {
                self.advance();
                match self.advance() {
                    Some(Token::Text(file)) => Ok(Ast::import(pos, unescape_text(file))),
                    _ => Err(self.error("expected file name after `import`")),
                }
            }
            Some(Token::Using) => {
                self.advance();
                let path = self.namespace_path()?;
                Ok(Ast::using(pos, path))
            }
            Some(Token::Namespace) => {
                self.advance();
                let path = self.namespace_path()?;
                self.expect(Token::LParen, "`(` after namespace name")?;
                let mut decls = Vec::new();
                while !self.eat(Token::RParen) {
                    if self.peek().is_none() {
                        return Err(self.error("unterminated namespace body"));
                    }
                    decls.push(self.decl()?);
                }
                Ok(Ast::namespace(pos, path, decls))
            }
            Some(Token::Data) => {
                self.advance();
                let mut items = vec![self.combinator_name()?];
                while self.eat(Token::Comma) {
                    items.push(self.combinator_name()?);
                }
                Ok(Ast::data(pos, items))
            }
            Some(Token::Def) => {
                self.advance();
                let name = self.combinator_name()?;
                self.expect(Token::Equals, "`=` after definition name")?;
                let body = self.expr()?;
                Ok(Ast::def(pos, name, body))
            }
            Some(Token::Val) => {
                self.advance();
                let name = self.combinator_name()?;
                self.expect(Token::Equals, "`=` after value name")?;
                let body = self.expr()?;
                Ok(Ast::value(pos, name, body))
            }
            Some(Token::Object) => {
                self.advance();
                let name = self.combinator_name()?;
                let mut vars = Vec::new();
                while let Some(Token::Upper(v)) = self.peek() {
                    let vpos = self.position();
                    self.advance();
                    vars.push(Ast::variable(vpos, v));
                }
                self.expect(Token::LParen, "`(` before object body")?;
                let mut fields = Vec::new();
                while !self.eat(Token::RParen) {
                    match self.peek() {
                        Some(Token::Data) | Some(Token::Def) => fields.push(self.decl()?),
                        _ => return Err(self.error("expected field declaration in object body")),
                    }
                }
                let mut extends = Vec::new();
                if self.eat(Token::Extends) {
                    extends.push(self.control()?);
                    while self.eat(Token::Comma) {
                        extends.push(self.control()?);
                    }
                }
                Ok(Ast::object(pos, name, vars, fields, extends))
            }
            _ => Err(self.error("expected declaration")),
        }
    }

    /// `Upper (:: Upper)*` - namespace segments are capitalized.
    fn namespace_path(&mut self) -> Result<Vec<String>> {
        let mut path = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Upper(segment)) => {
                    self.advance();
                    path.push(segment.to_string());
                }
                _ => return Err(self.error("expected namespace segment")),
            }
            if !self.eat(Token::DColon) {
                return Ok(path);
            }
        }
    }

    /// A possibly qualified combinator: `(Upper ::)* lower`.
    fn combinator_name(&mut self) -> Result<AstRef> {
        let pos = self.position();
        let mut path = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Upper(segment)) if self.peek_at(1) == Some(Token::DColon) => {
                    self.advance();
                    self.advance();
                    path.push(segment.to_string());
                }
                Some(Token::Lower(name)) => {
                    self.advance();
                    return Ok(Ast::combinator(pos, path, name));
                }
                _ => return Err(self.error("expected combinator name")),
            }
        }
    }

    // expressions

    fn expr(&mut self) -> Result<AstRef> {
        let first = self.control()?;
        if self.eat(Token::Semicolon) {
            let rest = self.expr()?;
            let pos = first.position();
            return Ok(Ast::statement(pos, first, rest));
        }
        Ok(first)
    }

    fn control(&mut self) -> Result<AstRef> {
        let pos = self.position();
        match self.peek() {
            Some(Token::Let) => {
                self.advance();
                let pattern = self.pattern()?;
                self.expect(Token::Equals, "`=` in let binding")?;
                let value = self.control()?;
                self.expect(Token::In, "`in` after let binding")?;
                let body = self.control()?;
                Ok(Ast::let_(pos, vec![pattern], value, body))
            }
            Some(Token::If) => {
                self.advance();
                let cond = self.control()?;
                self.expect(Token::Then, "`then` after condition")?;
                let then = self.control()?;
                self.expect(Token::Else, "`else` branch")?;
                let otherwise = self.control()?;
                Ok(Ast::if_(pos, cond, then, otherwise))
            }
            Some(Token::Try) => {
                self.advance();
                let body = self.control()?;
                self.expect(Token::Catch, "`catch` after try body")?;
                let handler = self.control()?;
                Ok(Ast::try_(pos, body, handler))
            }
            Some(Token::Throw) => {
                self.advance();
                Ok(Ast::throw(pos, self.control()?))
            }
            Some(Token::Do) => {
                self.advance();
                Ok(Ast::do_(pos, self.control()?))
            }
            Some(Token::Backslash) => {
                self.advance();
                let mut patterns = Vec::new();
                while self.peek() != Some(Token::Arrow) {
                    if self.peek().is_none() {
                        return Err(self.error("unterminated lambda"));
                    }
                    patterns.push(self.pattern()?);
                }
                self.advance();
                let body = self.control()?;
                let clause = Ast::match_clause(pos.clone(), patterns, Ast::empty(), body);
                Ok(Ast::lambda(pos, clause))
            }
            _ => self.binary(0),
        }
    }

    /// Binary operator levels, loosest first.
    const LEVELS: [&'static [(Token<'static>, &'static str)]; 6] = [
        &[(Token::PipeGt, "|>")],
        &[(Token::OrOr, "||")],
        &[(Token::AndAnd, "&&")],
        &[
            (Token::EqEq, "=="),
            (Token::NotEq, "/="),
            (Token::LtEq, "<="),
            (Token::GtEq, ">="),
            (Token::Lt, "<"),
            (Token::Gt, ">"),
        ],
        &[(Token::Plus, "+"), (Token::Minus, "-")],
        &[(Token::Star, "*"), (Token::Slash, "/")],
    ];

    fn binary(&mut self, level: usize) -> Result<AstRef> {
        if level >= Self::LEVELS.len() {
            return self.unary();
        }
        let mut lhs = self.binary(level + 1)?;
        'outer: loop {
            for &(token, name) in Self::LEVELS[level] {
                if self.peek() == Some(token) {
                    let pos = self.position();
                    self.advance();
                    let rhs = self.binary(level + 1)?;
                    let op = Ast::operator(pos.clone(), vec![], name);
                    lhs = Ast::apply(pos, vec![op, lhs, rhs]);
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn unary(&mut self) -> Result<AstRef> {
        if self.peek() == Some(Token::Minus) {
            let pos = self.position();
            self.advance();
            let operand = self.unary()?;
            let op = Ast::operator(pos.clone(), vec![], "neg");
            return Ok(Ast::apply(pos, vec![op, operand]));
        }
        self.application()
    }

    fn application(&mut self) -> Result<AstRef> {
        let first = self.primary()?;
        let mut terms = vec![first];
        while self.starts_primary() {
            terms.push(self.primary()?);
        }
        if terms.len() == 1 {
            Ok(terms.pop().expect("one term"))
        } else {
            let pos = terms[0].position();
            Ok(Ast::apply(pos, terms))
        }
    }

    fn starts_primary(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Integer(_)
                    | Token::HexInteger(_)
                    | Token::Float(_)
                    | Token::Character(_)
                    | Token::Text(_)
                    | Token::Upper(_)
                    | Token::Lower(_)
                    | Token::Underscore
                    | Token::LParen
                    | Token::LBrace
                    | Token::LBracket
            )
        )
    }

    fn primary(&mut self) -> Result<AstRef> {
        let pos = self.position();
        match self.peek() {
            Some(Token::Integer(text)) => {
                self.advance();
                Ok(Ast::integer(pos, text))
            }
            Some(Token::HexInteger(text)) => {
                self.advance();
                Ok(Ast::hex_integer(pos, text))
            }
            Some(Token::Float(text)) => {
                self.advance();
                Ok(Ast::float(pos, text))
            }
            Some(Token::Character(text)) => {
                self.advance();
                Ok(Ast::character(pos, text))
            }
            Some(Token::Text(text)) => {
                self.advance();
                Ok(Ast::text(pos, text))
            }
            Some(Token::Underscore) => {
                self.advance();
                Ok(Ast::wildcard(pos, "_"))
            }
            Some(Token::Upper(name)) => {
                if self.peek_at(1) == Some(Token::DColon) {
                    self.combinator_name()
                } else {
                    self.advance();
                    Ok(Ast::variable(pos, name))
                }
            }
            Some(Token::Lower(_)) => self.combinator_name(),
            Some(Token::LParen) => {
                self.advance();
                let first = self.expr()?;
                if self.eat(Token::Comma) {
                    let mut items = vec![first];
                    loop {
                        items.push(self.expr()?);
                        if !self.eat(Token::Comma) {
                            break;
                        }
                    }
                    self.expect(Token::RParen, "`)` after tuple")?;
                    return Ok(Ast::tuple(pos, items));
                }
                self.expect(Token::RParen, "`)`")?;
                Ok(first)
            }
            Some(Token::LBrace) => {
                self.advance();
                if self.eat(Token::RBrace) {
                    return Ok(Ast::list(pos, vec![], None));
                }
                let mut items = vec![self.expr()?];
                while self.eat(Token::Comma) {
                    items.push(self.expr()?);
                }
                let tail = if self.eat(Token::Bar) {
                    Some(self.expr()?)
                } else {
                    None
                };
                self.expect(Token::RBrace, "`}` after list")?;
                Ok(Ast::list(pos, items, tail))
            }
            Some(Token::LBracket) => {
                self.advance();
                let mut clauses = vec![self.clause()?];
                while self.eat(Token::Bar) {
                    clauses.push(self.clause()?);
                }
                self.expect(Token::RBracket, "`]` after block")?;
                Ok(Ast::block(pos, clauses))
            }
            _ => Err(self.error("expected expression")),
        }
    }

    /// One block clause: `pattern* -> expr`.
    fn clause(&mut self) -> Result<AstRef> {
        let pos = self.position();
        let mut patterns = Vec::new();
        while self.peek() != Some(Token::Arrow) {
            if self.peek().is_none() {
                return Err(self.error("unterminated match clause"));
            }
            patterns.push(self.pattern()?);
        }
        self.advance();
        let result = self.expr()?;
        Ok(Ast::match_clause(pos, patterns, Ast::empty(), result))
    }

    // patterns

    fn pattern(&mut self) -> Result<AstRef> {
        let atom = self.pattern_atom()?;
        if self.eat(Token::Colon) {
            let tag = self.combinator_name()?;
            let pos = atom.position();
            return Ok(Ast::tag(pos, atom, tag));
        }
        Ok(atom)
    }

    fn pattern_atom(&mut self) -> Result<AstRef> {
        let pos = self.position();
        match self.peek() {
            Some(Token::Integer(text)) => {
                self.advance();
                Ok(Ast::integer(pos, text))
            }
            Some(Token::HexInteger(text)) => {
                self.advance();
                Ok(Ast::hex_integer(pos, text))
            }
            Some(Token::Float(text)) => {
                self.advance();
                Ok(Ast::float(pos, text))
            }
            Some(Token::Character(text)) => {
                self.advance();
                Ok(Ast::character(pos, text))
            }
            Some(Token::Text(text)) => {
                self.advance();
                Ok(Ast::text(pos, text))
            }
            Some(Token::Underscore) => {
                self.advance();
                Ok(Ast::wildcard(pos, "_"))
            }
            Some(Token::Upper(name)) => {
                if self.peek_at(1) == Some(Token::DColon) {
                    self.combinator_name()
                } else {
                    self.advance();
                    Ok(Ast::variable(pos, name))
                }
            }
            Some(Token::Lower(_)) => self.combinator_name(),
            Some(Token::LParen) => {
                self.advance();
                let first = self.pattern()?;
                if self.eat(Token::Comma) {
                    let mut items = vec![first];
                    loop {
                        items.push(self.pattern()?);
                        if !self.eat(Token::Comma) {
                            break;
                        }
                    }
                    self.expect(Token::RParen, "`)` after tuple pattern")?;
                    return Ok(Ast::tuple(pos, items));
                }
                let mut terms = vec![first];
                while self.peek() != Some(Token::RParen) {
                    if self.peek().is_none() {
                        return Err(self.error("unterminated pattern"));
                    }
                    terms.push(self.pattern()?);
                }
                self.advance();
                if terms.len() == 1 {
                    Ok(terms.pop().expect("one term"))
                } else {
                    Ok(Ast::apply(pos, terms))
                }
            }
            Some(Token::LBrace) => {
                self.advance();
                if self.eat(Token::RBrace) {
                    return Ok(Ast::list(pos, vec![], None));
                }
                let mut items = vec![self.pattern()?];
                while self.eat(Token::Comma) {
                    items.push(self.pattern()?);
                }
                let tail = if self.eat(Token::Bar) {
                    Some(self.pattern()?)
                } else {
                    None
                };
                self.expect(Token::RBrace, "`}` after list pattern")?;
                Ok(Ast::list(pos, items, tail))
            }
            _ => Err(self.error("expected pattern")),
        }
    }
}
