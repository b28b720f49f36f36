//! Dialect statement generators.
//!
//! Each dialect is a unit struct implementing [`AlterGenerator`]. The trait's
//! default methods hold the statement forms most engines share; a generator
//! overrides the ones its engine spells differently.

mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;

pub use mysql::MySqlGenerator;
pub use oracle::OracleGenerator;
pub use postgres::PostgresGenerator;
pub use sqlite::SqliteGenerator;
pub use sqlserver::SqlServerGenerator;

use tracing::{debug, warn};

use crate::action::{Action, FieldAction, Operation, TableAction};
use crate::config::GenerateContext;
use crate::dialect::Dialect;
use crate::error::{AlterError, Result};
use crate::structure::type_with_size;
use crate::value::{format_default, format_value, formatter, SqlValue};

/// Turns recorded actions into executable statements for one dialect.
pub trait AlterGenerator {
    /// The dialect this generator targets.
    fn dialect(&self) -> Dialect;

    /// Quotes an identifier.
    fn quote_identifier(&self, name: &str) -> String {
        self.dialect().quote_identifier(name)
    }

    /// Quotes a string literal.
    fn text_literal(&self, text: &str) -> String {
        formatter(self.dialect()).quote_text(text)
    }

    /// Formats a row value. Text is always quoted.
    ///
    /// # Errors
    ///
    /// Returns [`AlterError::UnsupportedValue`] if the dialect has no literal
    /// form for the value.
    fn literal(&self, value: &SqlValue) -> Result<String> {
        format_value(self.dialect(), value, false)
    }

    /// Returns the field's new default as a SQL expression.
    fn default_expr(&self, field: &FieldAction) -> Option<String> {
        field
            .default_expr()
            .and_then(|value| format_default(self.dialect(), value))
    }

    /// Column clause marking database-generated values.
    fn identity_clause(&self) -> &'static str;

    /// Generates the statements for one table's actions.
    ///
    /// A table `ADD` becomes a single `CREATE TABLE`. Otherwise a table
    /// comment change comes first, then each field action in order against
    /// the pre-rename table name, then the table rename.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be formatted or the dialect cannot
    /// express a change.
    fn generate(&self, actions: &[Action], _ctx: &GenerateContext) -> Result<Vec<String>> {
        let (table, fields) = split_actions(actions);

        if let Some(t) = table {
            match t.operation {
                Operation::Add => return Ok(self.create_table(t, &fields)),
                Operation::Delete => return Ok(vec![self.drop_table(t.catalog_name())]),
                Operation::Edit => {}
            }
        }

        let mut statements = Vec::new();
        if let Some(t) = table.filter(|t| t.comment_changed()) {
            statements.extend(self.table_comment(
                t.catalog_name(),
                non_blank(t.comment.as_deref()),
                non_blank(t.comment_old.as_deref()),
            ));
        }

        for field in &fields {
            let table_name = table.map_or(field.table_name.as_str(), TableAction::catalog_name);
            let group = match field.operation {
                Operation::Add => self.add_column(table_name, field),
                Operation::Edit => self.alter_column(table_name, field)?,
                Operation::Delete => self.drop_column(table_name, &field.name),
            };
            debug!(
                dialect = %self.dialect(),
                table = %table_name,
                column = %field.name,
                operation = ?field.operation,
                statements = group.len(),
                "Generated field statements"
            );
            statements.extend(group);
        }

        if let Some(t) = table {
            if let Some(old) = t.renamed_from() {
                statements.push(self.rename_table(old, &t.table_name));
            }
        }
        Ok(statements)
    }

    /// Generates `CREATE TABLE` for a new table and its comment statements.
    fn create_table(&self, table: &TableAction, fields: &[&FieldAction]) -> Vec<String> {
        let columns: Vec<&FieldAction> = fields
            .iter()
            .copied()
            .filter(|f| f.operation != Operation::Delete)
            .collect();
        let mut lines: Vec<String> = columns
            .iter()
            .map(|f| self.column_definition(f.new_name(), f))
            .collect();
        lines.extend(self.key_fragments(&columns));

        let name = &table.table_name;
        let mut statements = vec![format!(
            "CREATE TABLE {} (\n  {}\n){};",
            self.quote_identifier(name),
            lines.join(",\n  "),
            self.create_table_suffix(table)
        )];

        if !self.inline_comments() {
            if let Some(comment) = non_blank(table.comment.as_deref()) {
                statements.extend(self.table_comment(name, Some(comment), None));
            }
            for field in &columns {
                if let Some(comment) = field.comment_text() {
                    statements.extend(self.column_comment(name, field.new_name(), Some(comment), None));
                }
            }
        }
        debug!(dialect = %self.dialect(), table = %name, columns = columns.len(), "Generated CREATE TABLE");
        statements
    }

    /// Text after the closing parenthesis of `CREATE TABLE`.
    fn create_table_suffix(&self, _table: &TableAction) -> String {
        String::new()
    }

    /// Returns true if comments are part of column and table definitions.
    fn inline_comments(&self) -> bool {
        false
    }

    /// Generates a column definition: name, type, nullability and default
    /// or identity.
    fn column_definition(&self, name: &str, field: &FieldAction) -> String {
        standard_definition(self, name, field)
    }

    /// Generates the table-level key fragments of `CREATE TABLE`: one
    /// `PRIMARY KEY` over all key columns and one `UNIQUE` per unique column.
    fn key_fragments(&self, fields: &[&FieldAction]) -> Vec<String> {
        let mut fragments = Vec::new();

        let keys: Vec<&FieldAction> = fields.iter().copied().filter(|f| f.is_primary_key).collect();
        if !keys.is_empty() {
            let name = keys.iter().find_map(|f| index_name(f));
            let columns: Vec<String> = keys
                .iter()
                .map(|f| self.quote_identifier(f.new_name()))
                .collect();
            fragments.push(format!(
                "{}PRIMARY KEY ({})",
                self.constraint_prefix(name),
                columns.join(", ")
            ));
        }

        for field in fields.iter().filter(|f| f.is_unique_key && !f.is_primary_key) {
            fragments.push(format!(
                "{}UNIQUE ({})",
                self.constraint_prefix(index_name(field)),
                self.quote_identifier(field.new_name())
            ));
        }
        fragments
    }

    /// `CONSTRAINT "name" ` when a name is given.
    fn constraint_prefix(&self, name: Option<&str>) -> String {
        name.map_or_else(String::new, |n| {
            format!("CONSTRAINT {} ", self.quote_identifier(n))
        })
    }

    /// Inline key clause for a column being added.
    fn inline_key(&self, field: &FieldAction) -> String {
        if field.is_primary_key {
            format!(" {}PRIMARY KEY", self.constraint_prefix(index_name(field)))
        } else if field.is_unique_key {
            format!(" {}UNIQUE", self.constraint_prefix(index_name(field)))
        } else {
            String::new()
        }
    }

    /// Generates the statements adding a column.
    fn add_column(&self, table: &str, field: &FieldAction) -> Vec<String> {
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN {}{};",
            self.quote_identifier(table),
            self.column_definition(field.new_name(), field),
            self.inline_key(field)
        )];
        if let Some(comment) = field.comment_text() {
            statements.extend(self.column_comment(table, field.new_name(), Some(comment), None));
        }
        statements
    }

    /// Generates the statements altering an existing column. Every changed
    /// dimension gets its statement, unchanged ones get none, and a rename
    /// comes last.
    ///
    /// # Errors
    ///
    /// Returns [`AlterError::UnsupportedAlteration`] if the dialect cannot
    /// apply a change.
    fn alter_column(&self, table: &str, field: &FieldAction) -> Result<Vec<String>>;

    /// Generates the statements dropping a column.
    fn drop_column(&self, table: &str, column: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} DROP COLUMN {};",
            self.quote_identifier(table),
            self.quote_identifier(column)
        )]
    }

    /// Generates `RENAME COLUMN`.
    fn rename_column(&self, table: &str, old: &str, new: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {};",
            self.quote_identifier(table),
            self.quote_identifier(old),
            self.quote_identifier(new)
        )
    }

    /// Generates a table rename.
    fn rename_table(&self, old: &str, new: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {};",
            self.quote_identifier(old),
            self.quote_identifier(new)
        )
    }

    /// Generates the statements setting or clearing a table comment.
    fn table_comment(&self, table: &str, comment: Option<&str>, _previous: Option<&str>) -> Vec<String> {
        vec![format!(
            "COMMENT ON TABLE {} IS {};",
            self.quote_identifier(table),
            comment.map_or_else(|| String::from("NULL"), |c| self.text_literal(c))
        )]
    }

    /// Generates the statements setting or clearing a column comment outside
    /// the column's definition.
    fn column_comment(
        &self,
        table: &str,
        column: &str,
        comment: Option<&str>,
        _previous: Option<&str>,
    ) -> Vec<String> {
        vec![format!(
            "COMMENT ON COLUMN {}.{} IS {};",
            self.quote_identifier(table),
            self.quote_identifier(column),
            comment.map_or_else(|| String::from("NULL"), |c| self.text_literal(c))
        )]
    }

    /// Generates a statement removing every row of a table.
    fn truncate_table(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {};", self.quote_identifier(table))
    }

    /// Generates `DROP TABLE`.
    fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE {};", self.quote_identifier(table))
    }

    /// Generates the statements copying a table's rows into a new table.
    fn copy_table(&self, source: &str, target: &str) -> Vec<String> {
        vec![format!(
            "CREATE TABLE {} AS SELECT * FROM {};",
            self.quote_identifier(target),
            self.quote_identifier(source)
        )]
    }

    /// Generates a multi-row `INSERT`.
    ///
    /// # Errors
    ///
    /// Returns [`AlterError::InvalidRows`] if there are no rows or a row's
    /// length differs from the column count, or a formatting error.
    fn insert_rows(&self, table: &str, columns: &[&str], rows: &[Vec<SqlValue>]) -> Result<String> {
        let tuples = row_tuples(self, columns, rows)?;
        Ok(format!(
            "INSERT INTO {} ({}) VALUES {};",
            self.quote_identifier(table),
            column_list(self, columns),
            tuples.join(", ")
        ))
    }

    /// Generates an `UPDATE` of one row identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AlterError::InvalidRows`] if there is nothing to set, or a
    /// formatting error.
    fn update_row(
        &self,
        table: &str,
        assignments: &[(&str, SqlValue)],
        key: (&str, &SqlValue),
    ) -> Result<String> {
        if assignments.is_empty() {
            return Err(AlterError::InvalidRows(String::from("no columns to update")));
        }
        let sets = assignments
            .iter()
            .map(|(column, value)| -> Result<String> {
                Ok(format!("{} = {}", self.quote_identifier(column), self.literal(value)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!(
            "UPDATE {} SET {} WHERE {};",
            self.quote_identifier(table),
            sets.join(", "),
            key_condition(self, key.0, key.1)?
        ))
    }

    /// Generates a `DELETE` of the rows whose `column` is one of `values`.
    ///
    /// # Errors
    ///
    /// Returns [`AlterError::InvalidRows`] if `values` is empty, or a
    /// formatting error.
    fn delete_rows(&self, table: &str, column: &str, values: &[SqlValue]) -> Result<String> {
        if values.is_empty() {
            return Err(AlterError::InvalidRows(String::from("no rows to delete")));
        }
        let literals = values
            .iter()
            .map(|value| self.literal(value))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!(
            "DELETE FROM {} WHERE {} IN ({});",
            self.quote_identifier(table),
            self.quote_identifier(column),
            literals.join(", ")
        ))
    }
}

/// Returns the generator for a dialect.
#[must_use]
pub fn generator(dialect: Dialect) -> &'static dyn AlterGenerator {
    match dialect {
        Dialect::Postgres => &PostgresGenerator,
        Dialect::MySql => &MySqlGenerator,
        Dialect::SqlServer => &SqlServerGenerator,
        Dialect::Oracle => &OracleGenerator,
        Dialect::Sqlite => &SqliteGenerator,
    }
}

/// Separates the table action from the field actions.
///
/// Only one table action is meaningful per batch. Extra ones are ignored
/// with a warning.
pub(crate) fn split_actions(actions: &[Action]) -> (Option<&TableAction>, Vec<&FieldAction>) {
    let mut table = None;
    let mut fields = Vec::new();
    for action in actions {
        match action {
            Action::Table(t) if table.is_none() => table = Some(t),
            Action::Table(t) => {
                warn!(table = %t.table_name, "Ignoring extra table action in batch");
            }
            Action::Field(f) => fields.push(f),
        }
    }
    (table, fields)
}

/// Name, type, nullability, then identity or default.
pub(crate) fn standard_definition<G: AlterGenerator + ?Sized>(
    generator: &G,
    name: &str,
    field: &FieldAction,
) -> String {
    let mut sql = format!(
        "{} {}",
        generator.quote_identifier(name),
        type_with_size(&field.data_type, field.size_text())
    );
    if !field.is_nullable {
        sql.push_str(" NOT NULL");
    }
    if field.auto_increment {
        sql.push(' ');
        sql.push_str(generator.identity_clause());
    } else if let Some(default) = generator.default_expr(field) {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default);
    }
    sql
}

/// Formats each row as a parenthesized value tuple.
pub(crate) fn row_tuples<G: AlterGenerator + ?Sized>(
    generator: &G,
    columns: &[&str],
    rows: &[Vec<SqlValue>],
) -> Result<Vec<String>> {
    if columns.is_empty() {
        return Err(AlterError::InvalidRows(String::from("no columns given")));
    }
    if rows.is_empty() {
        return Err(AlterError::InvalidRows(String::from("no rows given")));
    }
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            if row.len() != columns.len() {
                return Err(AlterError::InvalidRows(format!(
                    "row {index} has {} values for {} columns",
                    row.len(),
                    columns.len()
                )));
            }
            let values = row
                .iter()
                .map(|value| generator.literal(value))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("({})", values.join(", ")))
        })
        .collect()
}

pub(crate) fn column_list<G: AlterGenerator + ?Sized>(generator: &G, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| generator.quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn key_condition<G: AlterGenerator + ?Sized>(
    generator: &G,
    column: &str,
    value: &SqlValue,
) -> Result<String> {
    let column = generator.quote_identifier(column);
    if matches!(value, SqlValue::Null) {
        Ok(format!("{column} IS NULL"))
    } else {
        Ok(format!("{column} = {}", generator.literal(value)?))
    }
}

/// The field's index name, if one is set.
pub(crate) fn index_name(field: &FieldAction) -> Option<&str> {
    non_blank(field.index_name.as_deref())
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::FieldSnapshot;

    fn batch() -> Vec<Action> {
        let mut table = TableAction::add("users");
        table.operation = Operation::Edit;
        table.table_name_old = Some(String::from("members"));
        vec![
            Action::Table(table),
            Action::Field(FieldAction::add("members", FieldSnapshot::new("age", "INT"))),
        ]
    }

    #[test]
    fn test_split_actions() {
        let mut actions = batch();
        actions.push(Action::Table(TableAction::add("other")));
        let (table, fields) = split_actions(&actions);
        assert_eq!(table.unwrap().table_name, "users");
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_rename_comes_last_for_every_dialect() {
        for dialect in Dialect::ALL {
            let statements = generator(dialect)
                .generate(&batch(), &GenerateContext::default())
                .unwrap();
            let last = statements.last().unwrap();
            assert!(last.contains("users"), "{dialect}: {statements:?}");
            assert!(
                statements[..statements.len() - 1]
                    .iter()
                    .all(|s| !s.contains("users")),
                "{dialect} addressed the new name early: {statements:?}"
            );
        }
    }

    #[test]
    fn test_row_tuples_validation() {
        let rows = vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(2), SqlValue::Int(3)]];
        let err = row_tuples(&PostgresGenerator, &["id"], &rows).unwrap_err();
        assert!(matches!(err, AlterError::InvalidRows(msg) if msg.contains("row 1")));

        let err = row_tuples(&PostgresGenerator, &["id"], &[]).unwrap_err();
        assert!(matches!(err, AlterError::InvalidRows(_)));
    }

    #[test]
    fn test_row_helpers() {
        let generator = PostgresGenerator;
        assert_eq!(
            generator
                .update_row(
                    "users",
                    &[("name", SqlValue::from("O'Brien")), ("age", SqlValue::Int(30))],
                    ("id", &SqlValue::Int(7)),
                )
                .unwrap(),
            r#"UPDATE "users" SET "name" = 'O''Brien', "age" = 30 WHERE "id" = 7;"#
        );
        assert_eq!(
            generator
                .update_row("users", &[("age", SqlValue::Null)], ("id", &SqlValue::Null))
                .unwrap(),
            r#"UPDATE "users" SET "age" = NULL WHERE "id" IS NULL;"#
        );
        assert_eq!(
            generator
                .delete_rows("users", "id", &[SqlValue::Int(1), SqlValue::Int(2)])
                .unwrap(),
            r#"DELETE FROM "users" WHERE "id" IN (1, 2);"#
        );
        assert!(generator.delete_rows("users", "id", &[]).is_err());
        assert_eq!(
            generator
                .insert_rows(
                    "users",
                    &["id", "name"],
                    &[
                        vec![SqlValue::Int(1), SqlValue::from("now()")],
                        vec![SqlValue::Int(2), SqlValue::Null],
                    ],
                )
                .unwrap(),
            r#"INSERT INTO "users" ("id", "name") VALUES (1, 'now()'), (2, NULL);"#
        );
    }
}
