//! Native values and their dialect-specific SQL literals.
//!
//! Every literal the generators embed goes through a [`ValueFormatter`], so
//! no call site can interpolate a value without escaping it.

mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialect::Dialect;
use crate::error::{AlterError, Result};

pub use mysql::MySqlFormatter;
pub use oracle::OracleFormatter;
pub use postgres::PostgresFormatter;
pub use sqlite::SqliteFormatter;
pub use sqlserver::SqlServerFormatter;

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").expect("numeric pattern is valid"));

/// Keywords a default value may name without being quoted.
const DEFAULT_KEYWORDS: &[&str] = &[
    "NULL",
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "LOCALTIME",
    "LOCALTIMESTAMP",
];

/// A value to be embedded in a statement as a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Point in time, rendered as an ISO-8601 literal.
    Timestamp(DateTime<Utc>),
    /// Binary value.
    Bytes(Vec<u8>),
    /// Ordered collection of values.
    Array(Vec<SqlValue>),
    /// JSON document.
    Json(serde_json::Value),
    /// Network address (PostgreSQL only).
    Network(NetworkKind, String),
    /// Geometric value (PostgreSQL only).
    Geometric(Geometry),
    /// Raw SQL expression, always emitted verbatim.
    Expression(String),
}

impl SqlValue {
    /// Returns a short name for the kind of value, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Bytes(_) => "binary",
            Self::Array(_) => "array",
            Self::Json(_) => "json",
            Self::Network(..) => "network",
            Self::Geometric(_) => "geometric",
            Self::Expression(_) => "expression",
        }
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            object @ Value::Object(_) => Self::Json(object),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        Self::Text(String::from(s))
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for SqlValue {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for SqlValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl<T: Into<Self>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// PostgreSQL network address types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    /// Host address with optional netmask.
    Inet,
    /// Network specification.
    Cidr,
    /// MAC address.
    MacAddr,
    /// MAC address in EUI-64 format.
    MacAddr8,
}

impl NetworkKind {
    /// Returns the PostgreSQL type name.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Inet => "inet",
            Self::Cidr => "cidr",
            Self::MacAddr => "macaddr",
            Self::MacAddr8 => "macaddr8",
        }
    }
}

/// A point in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// PostgreSQL geometric values.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// `point`.
    Point(Point),
    /// `line`, the infinite line `ax + by + c = 0`.
    Line {
        /// Coefficient of x.
        a: f64,
        /// Coefficient of y.
        b: f64,
        /// Constant term.
        c: f64,
    },
    /// `lseg`, a finite line segment.
    Segment(Point, Point),
    /// `box`, given by two opposite corners.
    Box(Point, Point),
    /// `path`, open or closed.
    Path {
        /// Vertices in order.
        points: Vec<Point>,
        /// Whether the last point connects back to the first.
        closed: bool,
    },
    /// `polygon`.
    Polygon(Vec<Point>),
    /// `circle`.
    Circle {
        /// Center point.
        center: Point,
        /// Radius.
        radius: f64,
    },
}

/// Converts native values into one dialect's literal syntax.
///
/// The default methods implement the core shared by every dialect; each
/// formatter overrides the literal forms its engine spells differently.
pub trait ValueFormatter {
    /// The dialect this formatter targets.
    fn dialect(&self) -> Dialect;

    /// Returns true if `text` looks like a function call that should be
    /// emitted verbatim when function calls are allowed.
    fn is_function_call(&self, text: &str) -> bool;

    /// Quotes a string literal.
    fn quote_text(&self, text: &str) -> String {
        format!("'{}'", text.replace('\'', "''"))
    }

    /// Renders a boolean literal.
    fn format_bool(&self, value: bool) -> String {
        String::from(if value { "TRUE" } else { "FALSE" })
    }

    /// Renders a text value, passing recognized function calls through.
    fn format_text(&self, text: &str, allow_function_call: bool) -> String {
        if allow_function_call && !text.contains(';') && self.is_function_call(text) {
            String::from(text)
        } else {
            self.quote_text(text)
        }
    }

    /// Formats a value as a SQL literal.
    ///
    /// # Errors
    ///
    /// Returns [`AlterError::UnsupportedValue`] if the value has no literal
    /// form in this dialect.
    fn format(&self, value: &SqlValue, allow_function_call: bool) -> Result<String> {
        self.format_common(value, allow_function_call)
    }

    /// Formats the values every dialect spells the same way.
    ///
    /// # Errors
    ///
    /// Returns [`AlterError::UnsupportedValue`] for JSON, network and
    /// geometric values, which have no common form.
    fn format_common(&self, value: &SqlValue, allow_function_call: bool) -> Result<String> {
        match value {
            SqlValue::Null => Ok(String::from("NULL")),
            SqlValue::Bool(b) => Ok(self.format_bool(*b)),
            SqlValue::Int(n) => Ok(n.to_string()),
            SqlValue::Float(f) => Ok(format_float(*f)),
            SqlValue::Text(s) => Ok(self.format_text(s, allow_function_call)),
            SqlValue::Timestamp(ts) => {
                Ok(self.quote_text(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)))
            }
            SqlValue::Bytes(bytes) => Ok(format!("X'{}'", hex(bytes))),
            SqlValue::Array(items) => {
                let parts = items
                    .iter()
                    .map(|item| self.format(item, allow_function_call))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("({})", parts.join(", ")))
            }
            SqlValue::Expression(expr) => Ok(expr.clone()),
            other => Err(self.unsupported(other)),
        }
    }

    /// Builds the error for a value this dialect cannot express.
    fn unsupported(&self, value: &SqlValue) -> AlterError {
        AlterError::UnsupportedValue {
            dialect: self.dialect(),
            kind: value.kind(),
        }
    }
}

/// Returns the formatter for a dialect.
#[must_use]
pub fn formatter(dialect: Dialect) -> &'static dyn ValueFormatter {
    match dialect {
        Dialect::Postgres => &PostgresFormatter,
        Dialect::MySql => &MySqlFormatter,
        Dialect::SqlServer => &SqlServerFormatter,
        Dialect::Oracle => &OracleFormatter,
        Dialect::Sqlite => &SqliteFormatter,
    }
}

/// Formats a value as a SQL literal for `dialect`.
///
/// # Errors
///
/// Returns [`AlterError::UnsupportedValue`] if the value has no literal form
/// in the dialect.
pub fn format_value(dialect: Dialect, value: &SqlValue, allow_function_call: bool) -> Result<String> {
    formatter(dialect).format(value, allow_function_call)
}

/// Renders a user-entered default value as a SQL expression.
///
/// Returns `None` when the input is blank, meaning "no default". Numbers,
/// SQL keywords, parenthesized expressions, already-quoted literals and
/// function calls pass through; anything else becomes a string literal.
#[must_use]
pub fn format_default(dialect: Dialect, input: &str) -> Option<String> {
    let fmt = formatter(dialect);
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "''" || trimmed == "\"\"" {
        return Some(fmt.quote_text(""));
    }
    if NUMERIC.is_match(trimmed) {
        return Some(String::from(trimmed));
    }

    let upper = trimmed.to_ascii_uppercase();
    if upper == "TRUE" || upper == "FALSE" {
        return Some(fmt.format_bool(upper == "TRUE"));
    }
    if DEFAULT_KEYWORDS.contains(&upper.as_str()) {
        return Some(upper);
    }
    if is_quoted_literal(trimmed) || (trimmed.starts_with('(') && trimmed.ends_with(')')) {
        return Some(String::from(trimmed));
    }

    Some(fmt.format_text(trimmed, true))
}

/// Returns true for a complete single-quoted literal with doubled inner
/// quotes, e.g. `'it''s'`.
fn is_quoted_literal(text: &str) -> bool {
    text.len() >= 2
        && text.starts_with('\'')
        && text.ends_with('\'')
        && !text[1..text.len() - 1].replace("''", "").contains('\'')
}

/// Formats a float, mapping non-finite values to `NULL`.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_finite() {
        format!("{f}")
    } else {
        String::from("NULL")
    }
}

/// Lowercase hex encoding of a byte slice.
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
