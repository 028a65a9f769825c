//! Surface tokens.
//!
//! Lexical convention: identifiers starting with an uppercase letter are
//! variables (and namespace segments), lowercase identifiers are combinators,
//! a bare `_` is a wildcard. `#` starts a line comment.

use std::ops::Range;
use std::sync::Arc;

use logos::Logos;
use skein_core::{Error, Position, Result};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(serde::Serialize))]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"#[^\n]*", allow_greedy = true))]
pub enum Token<'src> {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("->")]
    Arrow,

    #[token("=")]
    Equals,

    #[token("\\")]
    Backslash,

    #[token("::")]
    DColon,

    #[token(":")]
    Colon,

    #[token("_")]
    Underscore,

    // operators, loosest to tightest binding
    #[token("|>")]
    PipeGt,

    #[token("||")]
    OrOr,

    #[token("|")]
    Bar,

    #[token("&&")]
    AndAnd,

    #[token("==")]
    EqEq,

    #[token("/=")]
    NotEq,

    #[token("<=")]
    LtEq,

    #[token(">=")]
    GtEq,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    // keywords
    #[token("import")]
    Import,

    #[token("using")]
    Using,

    #[token("namespace")]
    Namespace,

    #[token("data")]
    Data,

    #[token("def")]
    Def,

    #[token("val")]
    Val,

    #[token("object")]
    Object,

    #[token("extends")]
    Extends,

    #[token("let")]
    Let,

    #[token("in")]
    In,

    #[token("if")]
    If,

    #[token("then")]
    Then,

    #[token("else")]
    Else,

    #[token("try")]
    Try,

    #[token("catch")]
    Catch,

    #[token("throw")]
    Throw,

    #[token("do")]
    Do,

    // identifiers
    #[regex(r"[A-Z][A-Za-z0-9_]*")]
    Upper(&'src str),

    #[regex(r"[a-z][A-Za-z0-9_]*")]
    Lower(&'src str),

    // literals, kept verbatim (quotes included) until emission
    #[regex(r"0x[0-9a-fA-F]+")]
    HexInteger(&'src str),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    Float(&'src str),

    #[regex(r"[0-9]+")]
    Integer(&'src str),

    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    Text(&'src str),

    #[regex(r"'(?:[^'\\]|\\.)'")]
    Character(&'src str),
}

/// Byte-offset to line/column mapping for one source text.
#[derive(Debug)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    pub fn position(&self, source: &Arc<str>, offset: usize) -> Position {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let column = offset - self.line_starts[line];
        Position::new(source.clone(), line as u32 + 1, column as u32 + 1)
    }
}

/// Tokenize `text`, failing with a syntactical error on the first
/// unrecognized fragment.
pub fn tokenize<'src>(
    source_name: &str,
    text: &'src str,
) -> Result<Vec<(Token<'src>, Range<usize>)>> {
    let source: Arc<str> = source_name.into();
    let lines = LineIndex::new(text);
    let mut out = Vec::new();
    let mut lexer = Token::lexer(text);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => out.push((token, span)),
            Err(()) => {
                return Err(Error::syntactical(
                    lines.position(&source, span.start),
                    format!("unrecognized token `{}`", &text[span.clone()]),
                ));
            }
        }
    }
    Ok(out)
}
