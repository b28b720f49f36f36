//! Entry points keyed by dialect.
//!
//! These are thin wrappers over [`generator::generator`] for callers that
//! hold a [`Dialect`] or a connection's dialect tag rather than a generator.

use tracing::debug;

use crate::action::Action;
use crate::config::GenerateContext;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::generator::{self, AlterGenerator};
use crate::value::SqlValue;

/// Generates the statements applying `actions` to one table.
///
/// The result is wrapped in a transaction block when
/// [`GenerateOptions::transactional`](crate::config::GenerateOptions) is set.
///
/// # Errors
///
/// Returns an error if a value cannot be formatted, the dialect cannot
/// express a change, or a needed SQLite rebuild has no usable DDL.
pub fn generate_alter_statements(
    dialect: Dialect,
    actions: &[Action],
    ctx: &GenerateContext,
) -> Result<Vec<String>> {
    let statements = generator::generator(dialect).generate(actions, ctx)?;
    debug!(
        dialect = %dialect,
        actions = actions.len(),
        statements = statements.len(),
        "Generated alter statements"
    );
    if ctx.options.transactional {
        Ok(wrap_in_transaction(dialect, statements))
    } else {
        Ok(statements)
    }
}

/// Like [`generate_alter_statements`], with the dialect given as a tag such
/// as `"postgres"` or `"mssql"`.
///
/// # Errors
///
/// Returns [`AlterError::UnsupportedDialect`](crate::AlterError) for an unknown
/// tag, or any error of [`generate_alter_statements`].
pub fn generate_alter_statements_for(
    dialect: &str,
    actions: &[Action],
    ctx: &GenerateContext,
) -> Result<Vec<String>> {
    generate_alter_statements(dialect.parse()?, actions, ctx)
}

/// Wraps statements in the dialect's transaction block.
///
/// MySQL and Oracle commit DDL implicitly, so their statements come back
/// unchanged. On SQLite the block goes inside a `PRAGMA foreign_keys`
/// bracket, since the pragma has no effect within a transaction.
#[must_use]
pub fn wrap_in_transaction(dialect: Dialect, statements: Vec<String>) -> Vec<String> {
    let Some((begin, commit)) = dialect.transaction_block() else {
        return statements;
    };
    if statements.is_empty() {
        return statements;
    }

    let mut inner = statements;
    let mut prefix = Vec::new();
    let mut suffix = Vec::new();
    if dialect == Dialect::Sqlite {
        let is_pragma = |s: &String| s.trim_start().to_ascii_uppercase().starts_with("PRAGMA FOREIGN_KEYS");
        if inner.first().is_some_and(is_pragma) {
            prefix.push(inner.remove(0));
            // Direct statements may follow the rebuild's closing pragma.
            if let Some(index) = inner.iter().rposition(is_pragma) {
                suffix.push(inner.remove(index));
            }
        }
    }

    let mut wrapped = prefix;
    wrapped.push(String::from(begin));
    wrapped.extend(inner);
    wrapped.push(String::from(commit));
    wrapped.extend(suffix);
    wrapped
}

/// Generates a table rename.
#[must_use]
pub fn gen_rename_table_cmd(dialect: Dialect, old: &str, new: &str) -> String {
    generator::generator(dialect).rename_table(old, new)
}

/// Generates a statement removing every row of a table.
#[must_use]
pub fn gen_truncate_table_cmd(dialect: Dialect, table: &str) -> String {
    generator::generator(dialect).truncate_table(table)
}

/// Generates `DROP TABLE`.
#[must_use]
pub fn gen_delete_table_cmd(dialect: Dialect, table: &str) -> String {
    generator::generator(dialect).drop_table(table)
}

/// Generates a column rename.
#[must_use]
pub fn gen_rename_field_cmd(dialect: Dialect, table: &str, old: &str, new: &str) -> String {
    generator::generator(dialect).rename_column(table, old, new)
}

/// Generates the statements dropping a column.
#[must_use]
pub fn gen_delete_field_cmd(dialect: Dialect, table: &str, column: &str) -> Vec<String> {
    generator::generator(dialect).drop_column(table, column)
}

/// Generates the statements copying a table into a new one.
#[must_use]
pub fn gen_copy_table_cmd(dialect: Dialect, source: &str, target: &str) -> Vec<String> {
    generator::generator(dialect).copy_table(source, target)
}

/// Generates an `UPDATE` of the row whose `key.0` column equals `key.1`.
///
/// # Errors
///
/// Returns an error if `assignments` is empty or a value cannot be
/// formatted.
pub fn gen_update_field_cmd(
    dialect: Dialect,
    table: &str,
    assignments: &[(&str, SqlValue)],
    key: (&str, &SqlValue),
) -> Result<String> {
    generator::generator(dialect).update_row(table, assignments, key)
}

/// Generates a `DELETE` of the rows whose `column` is one of `values`.
///
/// # Errors
///
/// Returns an error if `values` is empty or a value cannot be formatted.
pub fn gen_delete_rows_cmd(
    dialect: Dialect,
    table: &str,
    column: &str,
    values: &[SqlValue],
) -> Result<String> {
    generator::generator(dialect).delete_rows(table, column, values)
}

/// Generates an `INSERT` of `rows`, each holding one value per column.
///
/// Text values are always quoted, even when they look like a function call
/// such as `now()`. Pass [`SqlValue::Expression`] to insert raw SQL.
///
/// # Errors
///
/// Returns an error if there are no rows, a row has the wrong length, or a
/// value cannot be formatted.
pub fn gen_insert_rows_cmd(
    dialect: Dialect,
    table: &str,
    columns: &[&str],
    rows: &[Vec<SqlValue>],
) -> Result<String> {
    generator::generator(dialect).insert_rows(table, columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{FieldAction, FieldSnapshot};
    use crate::config::GenerateOptions;
    use crate::error::AlterError;

    fn add_age() -> Vec<Action> {
        vec![Action::Field(FieldAction::add(
            "users",
            FieldSnapshot::new("age", "INT"),
        ))]
    }

    #[test]
    fn test_dispatch_by_tag() {
        let statements =
            generate_alter_statements_for("mysql", &add_age(), &GenerateContext::default()).unwrap();
        assert_eq!(statements, vec!["ALTER TABLE `users` ADD COLUMN `age` INT;"]);

        let err = generate_alter_statements_for("db2", &add_age(), &GenerateContext::default())
            .unwrap_err();
        assert!(matches!(err, AlterError::UnsupportedDialect(tag) if tag == "db2"));
    }

    #[test]
    fn test_transactional_option() {
        let ctx = GenerateContext::default().with_options(GenerateOptions {
            transactional: true,
            ..GenerateOptions::default()
        });
        assert_eq!(
            generate_alter_statements(Dialect::Postgres, &add_age(), &ctx).unwrap(),
            vec!["BEGIN;", r#"ALTER TABLE "users" ADD COLUMN "age" INT;"#, "COMMIT;"]
        );
        assert_eq!(
            generate_alter_statements(Dialect::Oracle, &add_age(), &ctx).unwrap(),
            vec![r#"ALTER TABLE "users" ADD ("age" INT);"#]
        );
    }

    #[test]
    fn test_wrap_sqlite_inside_pragma_bracket() {
        let statements = vec![
            String::from("PRAGMA foreign_keys = OFF;"),
            String::from("DROP TABLE \"t\";"),
            String::from("PRAGMA foreign_keys = ON;"),
        ];
        assert_eq!(
            wrap_in_transaction(Dialect::Sqlite, statements),
            vec![
                "PRAGMA foreign_keys = OFF;",
                "BEGIN TRANSACTION;",
                "DROP TABLE \"t\";",
                "COMMIT;",
                "PRAGMA foreign_keys = ON;",
            ]
        );
        assert_eq!(
            wrap_in_transaction(Dialect::SqlServer, vec![String::from("SELECT 1;")]),
            vec!["BEGIN TRANSACTION;", "SELECT 1;", "COMMIT TRANSACTION;"]
        );
        assert!(wrap_in_transaction(Dialect::Postgres, Vec::new()).is_empty());
    }

    #[test]
    fn test_wrap_sqlite_moves_closing_pragma_after_commit() {
        let statements = vec![
            String::from("PRAGMA foreign_keys = OFF;"),
            String::from("DROP TABLE \"t\";"),
            String::from("PRAGMA foreign_keys = ON;"),
            String::from("ALTER TABLE \"u\" DROP COLUMN \"c\";"),
        ];
        let wrapped = wrap_in_transaction(Dialect::Sqlite, statements);
        assert_eq!(wrapped[1], "BEGIN TRANSACTION;");
        assert_eq!(wrapped[3], "ALTER TABLE \"u\" DROP COLUMN \"c\";");
        assert_eq!(&wrapped[4..], ["COMMIT;", "PRAGMA foreign_keys = ON;"]);
    }

    #[test]
    fn test_table_helpers() {
        assert_eq!(
            gen_rename_table_cmd(Dialect::Sqlite, "a", "b"),
            r#"ALTER TABLE "a" RENAME TO "b";"#
        );
        assert_eq!(gen_truncate_table_cmd(Dialect::Sqlite, "a"), r#"DELETE FROM "a";"#);
        assert_eq!(gen_truncate_table_cmd(Dialect::MySql, "a"), "TRUNCATE TABLE `a`;");
        assert_eq!(gen_delete_table_cmd(Dialect::SqlServer, "a"), "DROP TABLE [a];");
        assert_eq!(
            gen_rename_field_cmd(Dialect::Postgres, "t", "a", "b"),
            r#"ALTER TABLE "t" RENAME COLUMN "a" TO "b";"#
        );
        assert_eq!(
            gen_delete_field_cmd(Dialect::Postgres, "t", "a"),
            vec![r#"ALTER TABLE "t" DROP COLUMN "a" CASCADE;"#]
        );
        assert_eq!(
            gen_copy_table_cmd(Dialect::SqlServer, "a", "b"),
            vec!["SELECT * INTO [b] FROM [a];"]
        );
    }

    #[test]
    fn test_row_helpers() {
        assert_eq!(
            gen_update_field_cmd(
                Dialect::Sqlite,
                "t",
                &[("name", SqlValue::from("O'Brien"))],
                ("id", &SqlValue::Int(1)),
            )
            .unwrap(),
            r#"UPDATE "t" SET "name" = 'O''Brien' WHERE "id" = 1;"#
        );
        assert_eq!(
            gen_delete_rows_cmd(Dialect::MySql, "t", "id", &[SqlValue::Int(3)]).unwrap(),
            "DELETE FROM `t` WHERE `id` IN (3);"
        );
        let err = gen_insert_rows_cmd(Dialect::Postgres, "t", &["a", "b"], &[vec![SqlValue::Int(1)]])
            .unwrap_err();
        assert!(matches!(err, AlterError::InvalidRows(_)));
    }
}
