use crate::position::Position;

/// Compile errors, one variant per diagnostic category.
///
/// Every pass aborts the module on the first error it raises; there is no
/// recovery and no partial output. The rendered form is
/// `<source>:<line>:<column>: <category>: <message>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed surface syntax, raised by the lexer or parser.
    #[error("{position}: syntactical: {message}")]
    Syntactical { position: Position, message: String },

    /// Redeclaration, undeclared name, malformed namespace or object.
    #[error("{position}: semantical: {message}")]
    Semantical { position: Position, message: String },

    /// Illegal construct where a pattern or name was expected.
    #[error("{position}: identification: {message}")]
    Identification { position: Position, message: String },

    /// A broken compiler invariant. These indicate bugs, not user mistakes.
    #[error("{position}: internal: {message}")]
    Internal { position: Position, message: String },
}

impl Error {
    pub fn syntactical(position: Position, message: impl Into<String>) -> Self {
        Self::Syntactical {
            position,
            message: message.into(),
        }
    }

    pub fn semantical(position: Position, message: impl Into<String>) -> Self {
        Self::Semantical {
            position,
            message: message.into(),
        }
    }

    pub fn identification(position: Position, message: impl Into<String>) -> Self {
        Self::Identification {
            position,
            message: message.into(),
        }
    }

    pub fn internal(position: Position, message: impl Into<String>) -> Self {
        Self::Internal {
            position,
            message: message.into(),
        }
    }

    pub fn position(&self) -> &Position {
        match self {
            Self::Syntactical { position, .. }
            | Self::Semantical { position, .. }
            | Self::Identification { position, .. }
            | Self::Internal { position, .. } => position,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Syntactical { message, .. }
            | Self::Semantical { message, .. }
            | Self::Identification { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Syntactical { .. } => "syntactical",
            Self::Semantical { .. } => "semantical",
            Self::Identification { .. } => "identification",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Result type used throughout the compiler passes.
pub type Result<T> = std::result::Result<T, Error>;
