//! Error types for statement generation.

use std::fmt;

use crate::dialect::Dialect;
use crate::lexer::Span;

/// Errors that can occur while generating statements.
#[derive(Debug, thiserror::Error)]
pub enum AlterError {
    /// A value has no literal representation in the target dialect.
    #[error("Unsupported {kind} value for {dialect}")]
    UnsupportedValue {
        /// The dialect the value was formatted for.
        dialect: Dialect,
        /// The kind of value that could not be formatted.
        kind: &'static str,
    },

    /// The live DDL could not be parsed.
    #[error("Unparseable DDL: {0}")]
    Parse(#[from] ParseError),

    /// A connection declared a dialect without a generator.
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// A rebuild was needed but no live DDL was supplied.
    #[error("Table '{table}' needs a rebuild but its DDL was not provided")]
    MissingDdl {
        /// The table to rebuild.
        table: String,
    },

    /// An action references a column the live DDL does not contain.
    #[error("Column '{column}' not found in table '{table}'")]
    UnknownColumn {
        /// The table that was searched.
        table: String,
        /// The missing column.
        column: String,
    },

    /// The dialect cannot express the requested change.
    #[error("{dialect} cannot {detail}")]
    UnsupportedAlteration {
        /// The target dialect.
        dialect: Dialect,
        /// What was attempted.
        detail: String,
    },

    /// Row data passed to a row helper is malformed.
    #[error("Invalid rows: {0}")]
    InvalidRows(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for statement generation.
pub type Result<T> = std::result::Result<T, AlterError>;

/// An error produced while parsing a `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error message.
    pub message: String,
    /// Location in the normalized DDL text.
    pub span: Span,
    /// What was expected, if known.
    pub expected: Option<String>,
    /// What was found instead.
    pub found: Option<String>,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: None,
            found: None,
        }
    }

    /// Creates an "unexpected token" error.
    #[must_use]
    pub fn unexpected(expected: &str, found: &str, span: Span) -> Self {
        Self {
            message: format!("Expected {expected}, found {found}"),
            span,
            expected: Some(String::from(expected)),
            found: Some(String::from(found)),
        }
    }

    /// Creates an "unexpected end of input" error.
    #[must_use]
    pub fn unexpected_eof(expected: &str, span: Span) -> Self {
        Self {
            message: format!("Unexpected end of input, expected {expected}"),
            span,
            expected: Some(String::from(expected)),
            found: Some(String::from("end of input")),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at position {}..{}",
            self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::unexpected("table name", "(", Span::new(13, 14));
        assert_eq!(
            err.to_string(),
            "Expected table name, found ( at position 13..14"
        );
    }

    #[test]
    fn test_alter_error_from_parse_error() {
        let err: AlterError = ParseError::new("Not a CREATE TABLE statement", Span::new(0, 6)).into();
        assert!(matches!(err, AlterError::Parse(_)));
        assert_eq!(
            err.to_string(),
            "Unparseable DDL: Not a CREATE TABLE statement at position 0..6"
        );
    }

    #[test]
    fn test_unsupported_value_display() {
        let err = AlterError::UnsupportedValue {
            dialect: Dialect::MySql,
            kind: "geometric",
        };
        assert_eq!(err.to_string(), "Unsupported geometric value for MySQL");
    }
}
