use std::fmt;
use std::sync::Arc;

/// A source location: file (or input name), 1-based line and column.
///
/// Positions ride along on every AST node purely for diagnostics; structural
/// equality of nodes ignores them. The source name is shared so cloning a
/// position is two machine words.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Position {
    source: Arc<str>,
    line: u32,
    column: u32,
}

impl Position {
    pub fn new(source: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            source: source.into(),
            line,
            column,
        }
    }

    /// The placeholder position carried by synthesized filler nodes.
    pub fn none() -> Self {
        Self::new("", 0, 0)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}
