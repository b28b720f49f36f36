//! MySQL and MariaDB generator.

use super::{index_name, non_blank, standard_definition, AlterGenerator};
use crate::action::{FieldAction, TableAction};
use crate::dialect::Dialect;
use crate::error::Result;

/// MySQL statement generator.
///
/// Comments live inside column and table definitions, so a comment change
/// restates the column with `MODIFY COLUMN`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlGenerator;

impl AlterGenerator for MySqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn identity_clause(&self) -> &'static str {
        "AUTO_INCREMENT"
    }

    fn inline_comments(&self) -> bool {
        true
    }

    fn create_table_suffix(&self, table: &TableAction) -> String {
        non_blank(table.comment.as_deref())
            .map_or_else(String::new, |c| format!(" COMMENT = {}", self.text_literal(c)))
    }

    fn column_definition(&self, name: &str, field: &FieldAction) -> String {
        let mut sql = standard_definition(self, name, field);
        if let Some(comment) = field.comment_text() {
            sql.push_str(" COMMENT ");
            sql.push_str(&self.text_literal(comment));
        }
        sql
    }

    fn add_column(&self, table: &str, field: &FieldAction) -> Vec<String> {
        let definition = self.column_definition(field.new_name(), field);
        let t = self.quote_identifier(table);
        let c = self.quote_identifier(field.new_name());
        let statement = match (index_name(field), field.is_primary_key, field.is_unique_key) {
            (Some(name), true, _) => format!(
                "ALTER TABLE {t} ADD COLUMN {definition}, ADD CONSTRAINT {} PRIMARY KEY ({c});",
                self.quote_identifier(name)
            ),
            (Some(name), false, true) => format!(
                "ALTER TABLE {t} ADD COLUMN {definition}, ADD CONSTRAINT {} UNIQUE ({c});",
                self.quote_identifier(name)
            ),
            _ => format!(
                "ALTER TABLE {t} ADD COLUMN {definition}{};",
                self.inline_key(field)
            ),
        };
        vec![statement]
    }

    fn alter_column(&self, table: &str, field: &FieldAction) -> Result<Vec<String>> {
        let t = self.quote_identifier(table);
        let c = self.quote_identifier(&field.name);
        let mut clauses = Vec::new();

        let modify = field.type_changed()
            || field.nullability_changed()
            || field.auto_increment_changed()
            || field.comment_changed();
        if modify {
            clauses.push(format!(
                "MODIFY COLUMN {}",
                self.column_definition(&field.name, field)
            ));
        }

        if field.primary_key_changed() && field.is_primary_key_old {
            clauses.push(String::from("DROP PRIMARY KEY"));
        }
        if field.unique_key_changed() && field.is_unique_key_old {
            let index = index_name(field).unwrap_or(&field.name);
            clauses.push(format!("DROP INDEX {}", self.quote_identifier(index)));
        }
        if field.primary_key_changed() && field.is_primary_key {
            clauses.push(format!(
                "ADD {}PRIMARY KEY ({c})",
                self.constraint_prefix(index_name(field))
            ));
        }
        if field.unique_key_changed() && field.is_unique_key {
            let name = index_name(field).unwrap_or(&field.name);
            clauses.push(format!(
                "ADD CONSTRAINT {} UNIQUE ({c})",
                self.quote_identifier(name)
            ));
        }

        let mut statements = Vec::new();
        if !clauses.is_empty() {
            statements.push(format!("ALTER TABLE {t} {};", clauses.join(", ")));
        }

        if field.default_changed() && !modify {
            statements.push(match self.default_expr(field) {
                Some(default) => format!("ALTER TABLE {t} ALTER COLUMN {c} SET DEFAULT {default};"),
                None => format!("ALTER TABLE {t} ALTER COLUMN {c} DROP DEFAULT;"),
            });
        }

        if field.is_rename() {
            statements.push(self.rename_column(table, &field.name, field.new_name()));
        }
        Ok(statements)
    }

    fn rename_table(&self, old: &str, new: &str) -> String {
        format!(
            "RENAME TABLE {} TO {};",
            self.quote_identifier(old),
            self.quote_identifier(new)
        )
    }

    fn table_comment(&self, table: &str, comment: Option<&str>, _previous: Option<&str>) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} COMMENT = {};",
            self.quote_identifier(table),
            self.text_literal(comment.unwrap_or_default())
        )]
    }

    fn column_comment(
        &self,
        _table: &str,
        _column: &str,
        _comment: Option<&str>,
        _previous: Option<&str>,
    ) -> Vec<String> {
        Vec::new()
    }

    fn copy_table(&self, source: &str, target: &str) -> Vec<String> {
        let source = self.quote_identifier(source);
        let target = self.quote_identifier(target);
        vec![
            format!("CREATE TABLE {target} LIKE {source};"),
            format!("INSERT INTO {target} SELECT * FROM {source};"),
        ]
    }
}
