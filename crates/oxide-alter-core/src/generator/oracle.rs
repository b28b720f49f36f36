//! Oracle generator.

use super::{column_list, index_name, row_tuples, AlterGenerator};
use crate::action::FieldAction;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::structure::type_with_size;
use crate::value::SqlValue;

/// Oracle statement generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleGenerator;

impl OracleGenerator {
    fn modify(self, table: &str, column: &str, change: &str) -> String {
        format!(
            "ALTER TABLE {} MODIFY ({} {change});",
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }

    fn comment_literal(self, comment: Option<&str>) -> String {
        self.text_literal(comment.unwrap_or_default())
    }
}

impl AlterGenerator for OracleGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::Oracle
    }

    fn identity_clause(&self) -> &'static str {
        "GENERATED BY DEFAULT AS IDENTITY"
    }

    /// Oracle wants the default or identity clause before inline constraints.
    fn column_definition(&self, name: &str, field: &FieldAction) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(name),
            type_with_size(&field.data_type, field.size_text())
        );
        if field.auto_increment {
            sql.push(' ');
            sql.push_str(self.identity_clause());
        } else if let Some(default) = self.default_expr(field) {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        }
        if !field.is_nullable {
            sql.push_str(" NOT NULL");
        }
        sql
    }

    fn add_column(&self, table: &str, field: &FieldAction) -> Vec<String> {
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD ({}{});",
            self.quote_identifier(table),
            self.column_definition(field.new_name(), field),
            self.inline_key(field)
        )];
        if let Some(comment) = field.comment_text() {
            statements.extend(self.column_comment(table, field.new_name(), Some(comment), None));
        }
        statements
    }

    fn alter_column(&self, table: &str, field: &FieldAction) -> Result<Vec<String>> {
        let t = self.quote_identifier(table);
        let c = self.quote_identifier(&field.name);
        let name = field.name.as_str();
        let mut statements = Vec::new();

        if field.type_changed() {
            let data_type = type_with_size(&field.data_type, field.size_text());
            statements.push(self.modify(table, name, &data_type));
        }

        if field.primary_key_changed() && field.is_primary_key_old {
            statements.push(format!("ALTER TABLE {t} DROP PRIMARY KEY;"));
        }
        if field.unique_key_changed() && field.is_unique_key_old {
            statements.push(format!("ALTER TABLE {t} DROP UNIQUE ({c});"));
        }
        if field.primary_key_changed() && field.is_primary_key {
            statements.push(format!(
                "ALTER TABLE {t} ADD {}PRIMARY KEY ({c});",
                self.constraint_prefix(index_name(field))
            ));
        }
        if field.unique_key_changed() && field.is_unique_key {
            let constraint = index_name(field).filter(|_| !field.is_primary_key);
            statements.push(format!(
                "ALTER TABLE {t} ADD {}UNIQUE ({c});",
                self.constraint_prefix(constraint)
            ));
        }

        // Identity columns take no default, so the identity brackets the
        // nullability and default changes.
        if field.auto_increment_changed() && !field.auto_increment {
            statements.push(self.modify(table, name, "DROP IDENTITY"));
        }

        if field.nullability_changed() {
            let change = if field.is_nullable { "NULL" } else { "NOT NULL" };
            statements.push(self.modify(table, name, change));
        }

        if field.default_changed() {
            let default = self.default_expr(field).unwrap_or_else(|| String::from("NULL"));
            statements.push(self.modify(table, name, &format!("DEFAULT {default}")));
        }

        if field.auto_increment_changed() && field.auto_increment {
            statements.push(self.modify(table, name, self.identity_clause()));
        }

        if field.comment_changed() {
            statements.extend(self.column_comment(table, name, field.comment_text(), None));
        }

        if field.is_rename() {
            statements.push(self.rename_column(table, name, field.new_name()));
        }
        Ok(statements)
    }

    fn table_comment(&self, table: &str, comment: Option<&str>, _previous: Option<&str>) -> Vec<String> {
        vec![format!(
            "COMMENT ON TABLE {} IS {};",
            self.quote_identifier(table),
            self.comment_literal(comment)
        )]
    }

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
            self.comment_literal(comment)
        )]
    }

    /// Oracle has no multi-row `VALUES`; each row gets its own `INTO`.
    fn insert_rows(&self, table: &str, columns: &[&str], rows: &[Vec<SqlValue>]) -> Result<String> {
        let tuples = row_tuples(self, columns, rows)?;
        let target = format!("{} ({})", self.quote_identifier(table), column_list(self, columns));
        let mut sql = String::from("INSERT ALL");
        for tuple in tuples {
            sql.push_str(&format!("\n  INTO {target} VALUES {tuple}"));
        }
        sql.push_str("\nSELECT 1 FROM DUAL;");
        Ok(sql)
    }
}
