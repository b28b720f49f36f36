//! SQL Server literals.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{hex, SqlValue, ValueFormatter};
use crate::dialect::Dialect;
use crate::error::Result;

static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]*(\(.*\))?$").expect("function call pattern is valid")
});

/// SQL Server value formatter.
///
/// Strings are Unicode `N'...'` literals and booleans are `BIT` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerFormatter;

impl ValueFormatter for SqlServerFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn is_function_call(&self, text: &str) -> bool {
        FUNCTION_CALL.is_match(&text.to_lowercase())
    }

    fn quote_text(&self, text: &str) -> String {
        format!("N'{}'", text.replace('\'', "''"))
    }

    fn format_bool(&self, value: bool) -> String {
        String::from(if value { "1" } else { "0" })
    }

    fn format(&self, value: &SqlValue, allow_function_call: bool) -> Result<String> {
        match value {
            SqlValue::Bytes(bytes) => Ok(format!("0x{}", hex(bytes))),
            SqlValue::Json(json) => Ok(self.quote_text(&json.to_string())),
            other => self.format_common(other, allow_function_call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_literal() {
        assert_eq!(
            SqlServerFormatter.format(&SqlValue::from("O'Brien"), false).unwrap(),
            "N'O''Brien'"
        );
    }

    #[test]
    fn test_bit_and_binary() {
        assert_eq!(SqlServerFormatter.format(&SqlValue::Bool(true), false).unwrap(), "1");
        assert_eq!(
            SqlServerFormatter.format(&SqlValue::Bytes(vec![0xca, 0xfe]), false).unwrap(),
            "0xcafe"
        );
    }

    #[test]
    fn test_getdate_passes_through() {
        assert_eq!(
            SqlServerFormatter.format(&SqlValue::from("GETDATE()"), true).unwrap(),
            "GETDATE()"
        );
    }
}
