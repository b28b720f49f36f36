//! `CREATE TABLE` serializer.
//!
//! Output re-parses to an equal structure. Names are quoted only when
//! SQLite would not accept them bare.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialect::Dialect;
use crate::structure::{
    ColumnDefinition, ConstraintKind, GeneratedStorage, TableConstraint, TableStructure,
};

static BARE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("bare name pattern is valid"));

/// Words SQLite refuses as bare identifiers.
const RESERVED: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FOR", "FOREIGN",
    "FROM", "FULL", "GENERATED", "GLOB", "GROUP", "HAVING", "IF", "IMMEDIATE", "IN", "INDEX",
    "INDEXED", "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL",
    "JOIN", "LEFT", "LIKE", "LIMIT", "MATCH", "NATURAL", "NO", "NOT", "NOTNULL", "NULL", "OF",
    "OFFSET", "ON", "OR", "ORDER", "OUTER", "PLAN", "PRAGMA", "PRIMARY", "QUERY", "RAISE",
    "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RIGHT", "ROLLBACK", "ROW", "SAVEPOINT", "SELECT", "SET", "STORED", "TABLE",
    "TEMP", "TEMPORARY", "THEN", "TO", "TRANSACTION", "TRIGGER", "UNION", "UNIQUE", "UPDATE",
    "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN", "WHERE", "WITH", "WITHOUT",
];

/// Quotes `name` for SQLite only if it cannot stand bare.
#[must_use]
pub fn quote_name(name: &str) -> String {
    let reserved = RESERVED.iter().any(|word| word.eq_ignore_ascii_case(name));
    if BARE_NAME.is_match(name) && !reserved {
        name.to_string()
    } else {
        Dialect::Sqlite.quote_identifier(name)
    }
}

fn quote_list(names: &[impl AsRef<str>]) -> String {
    names
        .iter()
        .map(|name| quote_name(name.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders a structure as a `CREATE TABLE` statement without the trailing
/// semicolon.
#[must_use]
pub fn serialize(structure: &TableStructure) -> String {
    let primary_key = structure.primary_key_columns();
    let pk_constraint = structure.primary_key_constraint();
    let inline_pk = primary_key.len() == 1
        && (pk_constraint.is_none()
            || structure
                .find_column(primary_key[0])
                .is_some_and(|c| c.auto_increment));

    let mut lines: Vec<String> = structure
        .columns
        .iter()
        .map(|column| column_sql(column, inline_pk))
        .collect();

    if !inline_pk && !primary_key.is_empty() {
        let mut line = String::new();
        if let Some(name) = pk_constraint.and_then(|c| c.name.as_deref()) {
            line.push_str("CONSTRAINT ");
            line.push_str(&quote_name(name));
            line.push(' ');
        }
        line.push_str("PRIMARY KEY (");
        line.push_str(&quote_list(&primary_key));
        line.push(')');
        lines.push(line);
    }

    lines.extend(
        structure
            .constraints
            .iter()
            .filter(|c| c.kind != ConstraintKind::PrimaryKey)
            .map(constraint_sql),
    );

    let mut sql = format!(
        "CREATE TABLE {} (\n  {}\n)",
        quote_name(&structure.table_name),
        lines.join(",\n  ")
    );

    let mut options = Vec::new();
    if structure.options.without_row_id {
        options.push("WITHOUT ROWID");
    }
    if structure.options.strict {
        options.push("STRICT");
    }
    if !options.is_empty() {
        sql.push(' ');
        sql.push_str(&options.join(", "));
    }
    sql
}

fn column_sql(column: &ColumnDefinition, inline_pk: bool) -> String {
    let mut parts = vec![quote_name(&column.name)];

    let data_type = column.type_with_size();
    if !data_type.is_empty() {
        parts.push(data_type);
    }
    if column.is_primary_key && inline_pk {
        parts.push(String::from("PRIMARY KEY"));
        if column.auto_increment {
            parts.push(String::from("AUTOINCREMENT"));
        }
    }
    if !column.is_nullable {
        parts.push(String::from("NOT NULL"));
    }
    if column.is_unique_key {
        parts.push(String::from("UNIQUE"));
    }
    if let Some(default) = column.default_value.as_deref().filter(|_| !column.is_generated()) {
        parts.push(format!("DEFAULT {default}"));
    }
    if let Some(collation) = &column.collation {
        parts.push(format!("COLLATE {}", quote_name(collation)));
    }
    if let Some(check) = &column.check_constraint {
        parts.push(format!("CHECK ({check})"));
    }
    if let Some(references) = &column.references {
        parts.push(format!("REFERENCES {references}"));
    }
    if let Some(generated) = &column.generated {
        let mut clause = format!("GENERATED ALWAYS AS ({})", generated.expression);
        match generated.storage {
            Some(GeneratedStorage::Stored) => clause.push_str(" STORED"),
            Some(GeneratedStorage::Virtual) => clause.push_str(" VIRTUAL"),
            None => {}
        }
        parts.push(clause);
    }
    parts.join(" ")
}

fn constraint_sql(constraint: &TableConstraint) -> String {
    let mut sql = String::new();
    if let Some(name) = &constraint.name {
        sql.push_str("CONSTRAINT ");
        sql.push_str(&quote_name(name));
        sql.push(' ');
    }
    match constraint.kind {
        ConstraintKind::PrimaryKey => {
            sql.push_str(&format!("PRIMARY KEY ({})", quote_list(&constraint.columns)));
        }
        ConstraintKind::Unique => {
            sql.push_str(&format!("UNIQUE ({})", quote_list(&constraint.columns)));
        }
        ConstraintKind::Check => {
            sql.push_str(&format!(
                "CHECK ({})",
                constraint.condition.as_deref().unwrap_or("1")
            ));
        }
        ConstraintKind::ForeignKey => {
            sql.push_str(&format!(
                "FOREIGN KEY ({}) REFERENCES {}",
                quote_list(&constraint.columns),
                quote_name(constraint.reference_table.as_deref().unwrap_or_default())
            ));
            if !constraint.reference_columns.is_empty() {
                sql.push_str(&format!("({})", quote_list(&constraint.reference_columns)));
            }
            if let Some(action) = &constraint.on_delete {
                sql.push_str(&format!(" ON DELETE {action}"));
            }
            if let Some(action) = &constraint.on_update {
                sql.push_str(&format!(" ON UPDATE {action}"));
            }
        }
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Lexer, TokenKind};
    use crate::sqlite::parse_create_table;
    use crate::structure::TableOptions;

    fn round_trip(ddl: &str) {
        let parsed = parse_create_table(ddl).unwrap();
        let serialized = serialize(&parsed);
        let reparsed = parse_create_table(&serialized).unwrap();
        assert_eq!(parsed, reparsed, "serialized form:\n{serialized}");
    }

    #[test]
    fn test_quote_name() {
        assert_eq!(quote_name("users"), "users");
        assert_eq!(quote_name("first name"), "\"first name\"");
        assert_eq!(quote_name("order"), "\"order\"");
        assert_eq!(quote_name("1st"), "\"1st\"");
        assert_eq!(quote_name("say\"hi"), "\"say\"\"hi\"");
    }

    #[test]
    fn test_serialize_layout() {
        let table = TableStructure::new("users")
            .column(ColumnDefinition::new("id", "INTEGER").primary_key().autoincrement())
            .column(ColumnDefinition::new("name", "VARCHAR").with_size("255").not_null())
            .column(ColumnDefinition::new("age", "INT").default_expr("0"));
        assert_eq!(
            serialize(&table),
            "CREATE TABLE users (\n  id INTEGER PRIMARY KEY AUTOINCREMENT,\n  \
             name VARCHAR(255) NOT NULL,\n  age INT DEFAULT 0\n)"
        );
    }

    #[test]
    fn test_composite_primary_key_keeps_name() {
        let mut table = TableStructure::new("t")
            .column(ColumnDefinition::new("a", "INT").primary_key())
            .column(ColumnDefinition::new("b", "INT").primary_key());
        table.constraints.push(TableConstraint {
            name: Some(String::from("pk_t")),
            ..TableConstraint::new(ConstraintKind::PrimaryKey, vec!["b".into(), "a".into()])
        });
        let sql = serialize(&table);
        assert!(sql.contains("CONSTRAINT pk_t PRIMARY KEY (b, a)"), "{sql}");
        assert_eq!(sql.matches("PRIMARY KEY").count(), 1);
    }

    #[test]
    fn test_options() {
        let mut table = TableStructure::new("t").column(ColumnDefinition::new("k", "TEXT").primary_key());
        table.options = TableOptions {
            without_row_id: true,
            strict: true,
        };
        assert!(serialize(&table).ends_with(") WITHOUT ROWID, STRICT"));
    }

    #[test]
    fn test_round_trips() {
        round_trip("CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE)");
        round_trip("CREATE TABLE \"my table\" (\"select\" TEXT, [a b] INT DEFAULT -5)");
        round_trip("CREATE TABLE t (a INT, b INT, CONSTRAINT pk PRIMARY KEY (a, b))");
        round_trip("CREATE TABLE t (a DECIMAL(10, 2) CHECK (a > 0) DEFAULT (a * 2), b TEXT COLLATE NOCASE)");
        round_trip("CREATE TABLE t (a INT, b INT GENERATED ALWAYS AS (a + 1) VIRTUAL)");
        round_trip(
            "CREATE TABLE t (a INT REFERENCES users(id) ON DELETE CASCADE, \
             FOREIGN KEY (a) REFERENCES users(id) ON UPDATE SET NULL, UNIQUE (a), CHECK (a <> 0))",
        );
        round_trip("CREATE TABLE t (k TEXT PRIMARY KEY) WITHOUT ROWID, STRICT");
    }

    #[test]
    fn test_escaped_literal_survives() {
        let parsed = parse_create_table("CREATE TABLE t (name TEXT DEFAULT 'O''Brien')").unwrap();
        let serialized = serialize(&parsed);
        assert!(serialized.contains("DEFAULT 'O''Brien'"));

        let tokens = Lexer::new(parsed.columns[0].default_value.as_deref().unwrap()).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::String(String::from("O'Brien")));
    }
}
