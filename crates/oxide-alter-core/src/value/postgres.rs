//! PostgreSQL literals.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{format_float, hex, Geometry, Point, SqlValue, ValueFormatter};
use crate::dialect::Dialect;
use crate::error::{AlterError, Result};

static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z_][a-z0-9_]*\(.*\)$").expect("function call pattern is valid")
});

/// PostgreSQL value formatter.
///
/// Adds `bytea`, `jsonb`, `ARRAY[...]`, network and geometric literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresFormatter;

impl PostgresFormatter {
    fn array(&self, items: &[SqlValue], allow_function_call: bool, nested: bool) -> Result<String> {
        if items.is_empty() && !nested {
            return Ok(String::from("'{}'"));
        }
        let parts = items
            .iter()
            .map(|item| match item {
                SqlValue::Array(inner) => self.array(inner, allow_function_call, true),
                other => self.format(other, allow_function_call),
            })
            .collect::<Result<Vec<_>>>()?;
        let body = parts.join(", ");
        if nested {
            Ok(format!("[{body}]"))
        } else {
            Ok(format!("ARRAY[{body}]"))
        }
    }

    fn geometry(&self, geometry: &Geometry) -> Result<String> {
        let (literal, type_name, values) = match geometry {
            Geometry::Point(p) => (point(p), "point", vec![p.x, p.y]),
            Geometry::Line { a, b, c } => (
                format!("{{{},{},{}}}", format_float(*a), format_float(*b), format_float(*c)),
                "line",
                vec![*a, *b, *c],
            ),
            Geometry::Segment(p1, p2) => (
                format!("[{}]", points(&[*p1, *p2])),
                "lseg",
                coordinates(&[*p1, *p2]),
            ),
            Geometry::Box(p1, p2) => (
                format!("({})", points(&[*p1, *p2])),
                "box",
                coordinates(&[*p1, *p2]),
            ),
            Geometry::Path { points: ps, closed } => {
                let literal = if *closed {
                    format!("({})", points(ps))
                } else {
                    format!("[{}]", points(ps))
                };
                (literal, "path", coordinates(ps))
            }
            Geometry::Polygon(ps) => (format!("({})", points(ps)), "polygon", coordinates(ps)),
            Geometry::Circle { center, radius } => (
                format!("<{},{}>", point(center), format_float(*radius)),
                "circle",
                vec![center.x, center.y, *radius],
            ),
        };

        if !values.iter().all(|v| v.is_finite()) {
            return Err(AlterError::UnsupportedValue {
                dialect: Dialect::Postgres,
                kind: "non-finite geometric",
            });
        }
        Ok(format!("{}::{type_name}", self.quote_text(&literal)))
    }
}

fn point(p: &Point) -> String {
    format!("({},{})", format_float(p.x), format_float(p.y))
}

fn points(ps: &[Point]) -> String {
    ps.iter().map(point).collect::<Vec<_>>().join(",")
}

fn coordinates(ps: &[Point]) -> Vec<f64> {
    ps.iter().flat_map(|p| [p.x, p.y]).collect()
}

impl ValueFormatter for PostgresFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn is_function_call(&self, text: &str) -> bool {
        FUNCTION_CALL.is_match(text)
    }

    fn format(&self, value: &SqlValue, allow_function_call: bool) -> Result<String> {
        match value {
            SqlValue::Bytes(bytes) => Ok(format!("'\\x{}'::bytea", hex(bytes))),
            SqlValue::Json(json) => Ok(format!("{}::jsonb", self.quote_text(&json.to_string()))),
            SqlValue::Array(items) => self.array(items, allow_function_call, false),
            SqlValue::Network(kind, address) => {
                Ok(format!("{}::{}", self.quote_text(address), kind.type_name()))
            }
            SqlValue::Geometric(geometry) => self.geometry(geometry),
            other => self.format_common(other, allow_function_call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::NetworkKind;

    fn fmt(value: &SqlValue) -> String {
        PostgresFormatter.format(value, false).unwrap()
    }

    #[test]
    fn test_bytea() {
        assert_eq!(fmt(&SqlValue::Bytes(vec![0xde, 0xad])), "'\\xdead'::bytea");
    }

    #[test]
    fn test_jsonb() {
        let value = SqlValue::Json(serde_json::json!({"name": "O'Brien"}));
        assert_eq!(fmt(&value), r#"'{"name":"O''Brien"}'::jsonb"#);
    }

    #[test]
    fn test_array_constructor() {
        let value = SqlValue::Array(vec![SqlValue::from("a"), SqlValue::Null, SqlValue::from("b")]);
        assert_eq!(fmt(&value), "ARRAY['a', NULL, 'b']");
    }

    #[test]
    fn test_nested_and_empty_arrays() {
        let value = SqlValue::Array(vec![
            SqlValue::Array(vec![SqlValue::Int(1), SqlValue::Int(2)]),
            SqlValue::Array(vec![SqlValue::Int(3), SqlValue::Int(4)]),
        ]);
        assert_eq!(fmt(&value), "ARRAY[[1, 2], [3, 4]]");
        assert_eq!(fmt(&SqlValue::Array(vec![])), "'{}'");
    }

    #[test]
    fn test_network() {
        let value = SqlValue::Network(NetworkKind::Cidr, String::from("192.168.0.0/24"));
        assert_eq!(fmt(&value), "'192.168.0.0/24'::cidr");
    }

    #[test]
    fn test_geometric() {
        let p = |x, y| Point::new(x, y);
        assert_eq!(fmt(&SqlValue::Geometric(Geometry::Point(p(1.0, 2.5)))), "'(1,2.5)'::point");
        assert_eq!(
            fmt(&SqlValue::Geometric(Geometry::Line { a: 1.0, b: -1.0, c: 0.0 })),
            "'{1,-1,0}'::line"
        );
        assert_eq!(
            fmt(&SqlValue::Geometric(Geometry::Box(p(0.0, 0.0), p(2.0, 2.0)))),
            "'((0,0),(2,2))'::box"
        );
        assert_eq!(
            fmt(&SqlValue::Geometric(Geometry::Path {
                points: vec![p(0.0, 0.0), p(1.0, 1.0)],
                closed: false,
            })),
            "'[(0,0),(1,1)]'::path"
        );
        assert_eq!(
            fmt(&SqlValue::Geometric(Geometry::Circle {
                center: p(1.0, 1.0),
                radius: 3.0,
            })),
            "'<(1,1),3>'::circle"
        );
    }

    #[test]
    fn test_non_finite_geometry_rejected() {
        let value = SqlValue::Geometric(Geometry::Point(Point::new(f64::NAN, 0.0)));
        assert!(PostgresFormatter.format(&value, false).is_err());
    }

    #[test]
    fn test_function_call_requires_parentheses() {
        assert!(PostgresFormatter.is_function_call("now()"));
        assert!(PostgresFormatter.is_function_call("NEXTVAL('seq')"));
        assert!(!PostgresFormatter.is_function_call("now"));
        assert!(!PostgresFormatter.is_function_call("now ()"));
    }

    #[test]
    fn test_quote_escaping() {
        assert_eq!(fmt(&SqlValue::from("O'Brien")), "'O''Brien'");
        assert_eq!(fmt(&SqlValue::from(r"C:\path")), r"'C:\path'");
    }
}
