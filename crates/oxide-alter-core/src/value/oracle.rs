//! Oracle literals.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{hex, SqlValue, ValueFormatter};
use crate::dialect::Dialect;
use crate::error::Result;

static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]*(\(.*\))?$").expect("function call pattern is valid")
});

/// Oracle value formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleFormatter;

impl ValueFormatter for OracleFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::Oracle
    }

    fn is_function_call(&self, text: &str) -> bool {
        FUNCTION_CALL.is_match(&text.to_lowercase())
    }

    fn format_bool(&self, value: bool) -> String {
        String::from(if value { "1" } else { "0" })
    }

    fn format(&self, value: &SqlValue, allow_function_call: bool) -> Result<String> {
        match value {
            SqlValue::Bytes(bytes) => Ok(format!("HEXTORAW('{}')", hex(bytes))),
            SqlValue::Json(json) => Ok(self.quote_text(&json.to_string())),
            other => self.format_common(other, allow_function_call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hextoraw() {
        assert_eq!(
            OracleFormatter.format(&SqlValue::Bytes(vec![0x01, 0xff]), false).unwrap(),
            "HEXTORAW('01ff')"
        );
    }

    #[test]
    fn test_sysdate_is_bare_call() {
        assert_eq!(
            OracleFormatter.format(&SqlValue::from("SYSDATE"), true).unwrap(),
            "SYSDATE"
        );
        assert_eq!(
            OracleFormatter.format(&SqlValue::from("SYSDATE"), false).unwrap(),
            "'SYSDATE'"
        );
    }
}
