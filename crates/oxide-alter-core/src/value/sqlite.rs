//! SQLite literals.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{SqlValue, ValueFormatter};
use crate::dialect::Dialect;
use crate::error::Result;

static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z_][a-z0-9_]*\s*\(.*\)$").expect("function call pattern is valid")
});

/// SQLite value formatter.
///
/// Blobs use the common `X'..'` form and JSON is stored as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteFormatter;

impl ValueFormatter for SqliteFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn is_function_call(&self, text: &str) -> bool {
        FUNCTION_CALL.is_match(text)
    }

    fn format(&self, value: &SqlValue, allow_function_call: bool) -> Result<String> {
        match value {
            SqlValue::Json(json) => Ok(self.quote_text(&json.to_string())),
            other => self.format_common(other, allow_function_call),
        }
    }
}
