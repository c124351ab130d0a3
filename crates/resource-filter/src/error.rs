use thiserror::Error;

/// Errors raised while turning filter text into a [`Node`](crate::Node).
///
/// Compilation and evaluation never fail, so this is the only error a caller
/// of the library sees. Every variant carries the 1-based column of the
/// offending input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected character '{ch}' at column {column}")]
    UnexpectedChar { ch: char, column: usize },

    #[error("Unexpected token \"{token}\" at column {column}")]
    UnexpectedToken { token: String, column: usize },

    #[error("Unexpected end of input at column {column}")]
    UnexpectedEnd { column: usize },

    #[error("Unclosed string starting at column {column}")]
    UnclosedString { column: usize },

    #[error("Unclosed property starting at column {column}")]
    UnclosedProperty { column: usize },

    #[error("Invalid escape sequence at column {column}")]
    InvalidEscape { column: usize },

    #[error("Expected comparison operator at column {column}")]
    ExpectedOperator { column: usize },

    #[error("Empty filter expression")]
    Empty,
}

impl ParseError {
    /// Column the error points at, if any.
    pub fn column(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedChar { column, .. }
            | ParseError::UnexpectedToken { column, .. }
            | ParseError::UnexpectedEnd { column }
            | ParseError::UnclosedString { column }
            | ParseError::UnclosedProperty { column }
            | ParseError::InvalidEscape { column }
            | ParseError::ExpectedOperator { column } => Some(*column),
            ParseError::Empty => None,
        }
    }
}
