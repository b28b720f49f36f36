//! MySQL literals.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{hex, SqlValue, ValueFormatter};
use crate::dialect::Dialect;
use crate::error::Result;

static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]*(\(.*\))?$").expect("function call pattern is valid")
});

/// MySQL value formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlFormatter;

impl ValueFormatter for MySqlFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn is_function_call(&self, text: &str) -> bool {
        FUNCTION_CALL.is_match(&text.to_lowercase())
    }

    /// Backslash is an escape character in MySQL string literals by default.
    fn quote_text(&self, text: &str) -> String {
        format!("'{}'", text.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn format(&self, value: &SqlValue, allow_function_call: bool) -> Result<String> {
        match value {
            SqlValue::Bytes(bytes) => Ok(format!("UNHEX('{}')", hex(bytes))),
            SqlValue::Json(json) => Ok(self.quote_text(&json.to_string())),
            other => self.format_common(other, allow_function_call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_backslash_and_quote() {
        assert_eq!(
            MySqlFormatter.format(&SqlValue::from(r"O'Brien\n"), false).unwrap(),
            r"'O''Brien\\n'"
        );
    }

    #[test]
    fn test_binary_and_json() {
        assert_eq!(
            MySqlFormatter.format(&SqlValue::Bytes(vec![0x68, 0x69]), false).unwrap(),
            "UNHEX('6869')"
        );
        let json = SqlValue::Json(serde_json::json!({"path": "a\\b"}));
        assert_eq!(
            MySqlFormatter.format(&json, false).unwrap(),
            r#"'{"path":"a\\\\b"}'"#
        );
    }

    #[test]
    fn test_bare_identifier_is_call() {
        assert!(MySqlFormatter.is_function_call("CURRENT_USER"));
        assert!(MySqlFormatter.is_function_call("NOW()"));
        assert!(!MySqlFormatter.is_function_call("two words"));
        assert_eq!(
            MySqlFormatter.format(&SqlValue::from("UUID()"), true).unwrap(),
            "UUID()"
        );
    }
}
