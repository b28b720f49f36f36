//! SQLite generator.

use tracing::debug;

use super::{index_name, split_actions, AlterGenerator};
use crate::action::{Action, FieldAction, Operation, TableAction};
use crate::config::GenerateContext;
use crate::dialect::Dialect;
use crate::error::{AlterError, Result};
use crate::sqlite::rebuild::{add_needs_rebuild, column_from_action};
use crate::sqlite::{
    delete_needs_rebuild, needs_rebuild, parse_create_table, rebuild_statements, serialize,
};
use crate::structure::{type_with_size, ConstraintKind, TableConstraint, TableStructure};

/// SQLite statement generator.
///
/// Edits SQLite cannot apply in place are batched into one table rebuild
/// built from the live DDL in the [`GenerateContext`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteGenerator;

impl AlterGenerator for SqliteGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn identity_clause(&self) -> &'static str {
        "AUTOINCREMENT"
    }

    fn generate(&self, actions: &[Action], ctx: &GenerateContext) -> Result<Vec<String>> {
        let (table, fields) = split_actions(actions);
        if let Some(t) = table {
            match t.operation {
                Operation::Add => return Ok(self.create_table(t, &fields)),
                Operation::Delete => return Ok(vec![self.drop_table(t.catalog_name())]),
                Operation::Edit => {}
            }
            if t.comment_changed() {
                debug!(table = %t.catalog_name(), "SQLite has no table comments, skipping");
            }
        }

        let Some(table_name) = table
            .map(TableAction::catalog_name)
            .or_else(|| fields.first().map(|f| f.table_name.as_str()))
        else {
            return Ok(Vec::new());
        };

        let uses_structure = fields.iter().any(|f| {
            needs_rebuild(f) || add_needs_rebuild(f) || f.operation == Operation::Delete
        });
        let structure = match ctx.table_ddl.as_deref() {
            Some(ddl) if uses_structure => Some(parse_create_table(ddl)?),
            _ => None,
        };

        let rebuilt: Vec<&FieldAction> = fields
            .iter()
            .copied()
            .filter(|f| {
                needs_rebuild(f)
                    || add_needs_rebuild(f)
                    || structure
                        .as_ref()
                        .is_some_and(|s| delete_needs_rebuild(f, s, &ctx.index_ddl))
            })
            .collect();

        let mut statements = Vec::new();
        if !rebuilt.is_empty() {
            let structure = structure.ok_or_else(|| AlterError::MissingDdl {
                table: table_name.to_string(),
            })?;
            statements.extend(rebuild_statements(table_name, structure, &rebuilt, ctx)?);
        }

        for field in &fields {
            let in_rebuild = rebuilt.iter().any(|r| std::ptr::eq(*r, *field));
            let group = match field.operation {
                Operation::Add if !in_rebuild => self.add_column(table_name, field),
                Operation::Delete if !in_rebuild => self.drop_column(table_name, &field.name),
                Operation::Edit if in_rebuild && field.is_rename() => {
                    vec![self.rename_column(table_name, &field.name, field.new_name())]
                }
                Operation::Edit if !in_rebuild => self.alter_column(table_name, field)?,
                _ => Vec::new(),
            };
            statements.extend(group);
        }

        if let Some(t) = table {
            if let Some(old) = t.renamed_from() {
                statements.push(self.rename_table(old, &t.table_name));
            }
        }
        Ok(statements)
    }

    fn create_table(&self, table: &TableAction, fields: &[&FieldAction]) -> Vec<String> {
        let mut structure = TableStructure::new(table.table_name.as_str());
        let columns: Vec<&FieldAction> = fields
            .iter()
            .copied()
            .filter(|f| f.operation != Operation::Delete)
            .collect();
        structure.columns = columns.iter().map(|f| column_from_action(f)).collect();

        // A named unique key needs the table-level form to carry its name.
        for (column, field) in structure.columns.iter_mut().zip(&columns) {
            if !field.is_unique_key || field.is_primary_key {
                continue;
            }
            if let Some(name) = index_name(field) {
                column.is_unique_key = false;
                structure.constraints.push(TableConstraint {
                    name: Some(name.to_string()),
                    ..TableConstraint::new(ConstraintKind::Unique, vec![column.name.clone()])
                });
            }
        }

        let keys: Vec<&FieldAction> = columns.iter().copied().filter(|f| f.is_primary_key).collect();
        if keys.len() > 1 {
            structure.constraints.push(TableConstraint {
                name: keys.iter().find_map(|f| index_name(f)).map(String::from),
                ..TableConstraint::new(
                    ConstraintKind::PrimaryKey,
                    keys.iter().map(|f| f.new_name().to_string()).collect(),
                )
            });
        }

        debug!(table = %table.table_name, columns = structure.columns.len(), "Generated CREATE TABLE");
        vec![format!("{};", serialize(&structure))]
    }

    fn column_definition(&self, name: &str, field: &FieldAction) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(name),
            type_with_size(&field.data_type, field.size_text())
        );
        if !field.is_nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = self.default_expr(field) {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        }
        sql
    }

    /// Adds the column; a unique column gets its index in a second statement
    /// since `ADD COLUMN` cannot carry `UNIQUE`.
    fn add_column(&self, table: &str, field: &FieldAction) -> Vec<String> {
        let column = field.new_name();
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN {};",
            self.quote_identifier(table),
            self.column_definition(column, field)
        )];
        if field.is_unique_key {
            let index = index_name(field).map_or_else(|| format!("{table}_{column}_unique"), String::from);
            statements.push(format!(
                "CREATE UNIQUE INDEX {} ON {}({});",
                self.quote_identifier(&index),
                self.quote_identifier(table),
                self.quote_identifier(column)
            ));
        }
        statements
    }

    /// Applies the parts of an edit SQLite can do in place: the rename.
    fn alter_column(&self, table: &str, field: &FieldAction) -> Result<Vec<String>> {
        if needs_rebuild(field) {
            return Err(AlterError::UnsupportedAlteration {
                dialect: Dialect::Sqlite,
                detail: format!("alter column '{}' in place", field.name),
            });
        }
        if field.comment_changed() {
            debug!(table = %table, column = %field.name, "SQLite has no column comments, skipping");
        }
        if field.auto_increment_changed() {
            debug!(table = %table, column = %field.name, "Auto-increment changes only apply with a key change");
        }
        Ok(if field.is_rename() {
            vec![self.rename_column(table, &field.name, field.new_name())]
        } else {
            Vec::new()
        })
    }

    fn table_comment(&self, _table: &str, _comment: Option<&str>, _previous: Option<&str>) -> Vec<String> {
        Vec::new()
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

    /// SQLite has no `TRUNCATE`; an unqualified `DELETE` uses the truncate
    /// optimization.
    fn truncate_table(&self, table: &str) -> String {
        format!("DELETE FROM {};", self.quote_identifier(table))
    }
}
