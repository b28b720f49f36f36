//! Rebuild classification and the copy/drop/rename script.

use regex::Regex;
use tracing::{debug, info};

use super::serializer::serialize;
use crate::action::{FieldAction, Operation};
use crate::config::GenerateContext;
use crate::dialect::Dialect;
use crate::error::{AlterError, Result};
use crate::structure::{ColumnDefinition, ConstraintKind, TableConstraint, TableStructure};
use crate::value::format_default;

/// Returns true if an edit cannot be applied with `ALTER TABLE` on SQLite.
#[must_use]
pub fn needs_rebuild(action: &FieldAction) -> bool {
    action.operation == Operation::Edit
        && (action.type_changed()
            || action.primary_key_changed()
            || action.unique_key_changed()
            || action.nullability_changed()
            || action.default_changed())
}

/// Returns true if dropping the column needs a rebuild: SQLite refuses
/// `DROP COLUMN` on key columns, on columns a table constraint names and on
/// indexed columns.
#[must_use]
pub fn delete_needs_rebuild(action: &FieldAction, structure: &TableStructure, indexes: &[String]) -> bool {
    if action.operation != Operation::Delete {
        return false;
    }
    let keyed = structure
        .find_column(&action.name)
        .is_some_and(|c| c.is_primary_key || c.is_unique_key);
    keyed
        || structure.constraints.iter().any(|c| c.mentions(&action.name))
        || indexes.iter().any(|index| index_mentions(index, &action.name))
}

/// Returns true if adding the column needs a rebuild. SQLite cannot add a
/// primary key column in place.
#[must_use]
pub(crate) fn add_needs_rebuild(action: &FieldAction) -> bool {
    action.operation == Operation::Add && action.is_primary_key
}

/// Builds the rebuild script for `table_name`.
///
/// `structure` is the parsed live table. Each action is applied to it: edits
/// in place, deletes by removal, adds by appending. The result is created
/// under a temporary name and swapped in.
///
/// # Errors
///
/// Returns [`AlterError::UnknownColumn`] if an edit or delete names a column
/// the live table does not have.
pub fn rebuild_statements(
    table_name: &str,
    mut structure: TableStructure,
    actions: &[&FieldAction],
    ctx: &GenerateContext,
) -> Result<Vec<String>> {
    let mut retained: Vec<String> = structure
        .columns
        .iter()
        .filter(|c| !c.is_generated())
        .map(|c| c.name.clone())
        .collect();
    let mut deleted = Vec::new();

    for action in actions {
        match action.operation {
            Operation::Edit => apply_edit(&mut structure, table_name, action)?,
            Operation::Delete => {
                remove_column(&mut structure, table_name, &action.name)?;
                retained.retain(|name| name != &action.name);
                deleted.push(action.name.as_str());
            }
            Operation::Add => structure.columns.push(column_from_action(action)),
        }
    }

    let options = &ctx.options;
    let new_table = format!("{table_name}{}", options.rebuild_suffix);
    structure.table_name.clone_from(&new_table);

    info!(
        table = %table_name,
        actions = actions.len(),
        retained = retained.len(),
        "Rebuilding table"
    );

    let quote = |name: &str| Dialect::Sqlite.quote_identifier(name);
    let table = quote(table_name);
    let backup = quote(&options.backup_table);
    let target = quote(&new_table);
    let columns = retained
        .iter()
        .map(|name| quote(name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut statements = vec![String::from("PRAGMA foreign_keys = OFF;")];
    if columns.is_empty() {
        statements.push(format!("{};", serialize(&structure)));
        statements.push(format!("DROP TABLE {table};"));
        statements.push(format!("ALTER TABLE {target} RENAME TO {table};"));
    } else {
        statements.push(format!(
            "CREATE TEMPORARY TABLE {backup} AS SELECT {columns} FROM {table};"
        ));
        statements.push(format!("{};", serialize(&structure)));
        statements.push(format!(
            "INSERT INTO {target}({columns}) SELECT {columns} FROM {backup};"
        ));
        statements.push(format!("DROP TABLE {table};"));
        statements.push(format!("ALTER TABLE {target} RENAME TO {table};"));
        statements.push(format!("DROP TABLE {backup};"));
    }

    for index in &ctx.index_ddl {
        let index = index.trim().trim_end_matches(';').trim_end();
        if index.is_empty() {
            continue;
        }
        if let Some(column) = deleted.iter().find(|c| index_mentions(index, c)) {
            debug!(table = %table_name, column = %column, "Skipping index on dropped column");
            continue;
        }
        statements.push(format!("{index};"));
    }
    statements.push(String::from("PRAGMA foreign_keys = ON;"));
    Ok(statements)
}

fn apply_edit(structure: &mut TableStructure, table_name: &str, action: &FieldAction) -> Result<()> {
    let unknown = || AlterError::UnknownColumn {
        table: table_name.to_string(),
        column: action.name.clone(),
    };
    let column = structure.find_column_mut(&action.name).ok_or_else(unknown)?;

    if action.type_changed() {
        column.data_type.clone_from(&action.data_type);
        column.size = action.size_text().map(String::from);
    }
    if action.nullability_changed() {
        column.is_nullable = action.is_nullable;
    }
    if action.default_changed() {
        column.default_value = action
            .default_expr()
            .and_then(|value| format_default(Dialect::Sqlite, value));
    }
    if action.primary_key_changed() || action.auto_increment_changed() {
        column.auto_increment = action.auto_increment && action.is_primary_key;
    }
    if action.comment_changed() {
        column.comment = action.comment_text().map(String::from);
    }
    if action.unique_key_changed() {
        column.is_unique_key = action.is_unique_key;
    }
    if action.primary_key_changed() {
        column.is_primary_key = action.is_primary_key;
    }

    if action.unique_key_changed() && !action.is_unique_key {
        structure.constraints.retain(|c| {
            !(c.kind == ConstraintKind::Unique && c.columns.len() == 1 && c.covers(&action.name))
        });
    }
    if action.primary_key_changed() {
        set_primary_key_member(&mut structure.constraints, &action.name, action.is_primary_key);
    }
    Ok(())
}

/// Keeps a named table-level primary key in step with a column's flag.
fn set_primary_key_member(constraints: &mut Vec<TableConstraint>, column: &str, member: bool) {
    let Some(pk) = constraints
        .iter_mut()
        .find(|c| c.kind == ConstraintKind::PrimaryKey)
    else {
        return;
    };
    if member {
        if !pk.covers(column) {
            pk.columns.push(column.to_string());
        }
    } else {
        pk.columns.retain(|c| c != column);
    }
    constraints.retain(|c| c.kind != ConstraintKind::PrimaryKey || !c.columns.is_empty());
}

fn remove_column(structure: &mut TableStructure, table_name: &str, name: &str) -> Result<()> {
    let before = structure.columns.len();
    structure.columns.retain(|c| c.name != name);
    if structure.columns.len() == before {
        return Err(AlterError::UnknownColumn {
            table: table_name.to_string(),
            column: name.to_string(),
        });
    }
    set_primary_key_member(&mut structure.constraints, name, false);
    structure
        .constraints
        .retain(|c| c.kind == ConstraintKind::PrimaryKey || !c.mentions(name));
    Ok(())
}

/// Builds the column a field action describes, in its new state.
pub(crate) fn column_from_action(action: &FieldAction) -> ColumnDefinition {
    let mut column = ColumnDefinition::new(action.new_name(), action.data_type.trim());
    column.size = action.size_text().map(String::from);
    column.is_nullable = action.is_nullable;
    column.is_primary_key = action.is_primary_key;
    column.auto_increment = action.auto_increment && action.is_primary_key;
    column.is_unique_key = action.is_unique_key;
    column.default_value = action
        .default_expr()
        .and_then(|value| format_default(Dialect::Sqlite, value));
    column.comment = action.comment_text().map(String::from);
    column
}

/// Returns true if the column list of an index statement names `column`.
fn index_mentions(index_ddl: &str, column: &str) -> bool {
    let Some(open) = index_ddl.find('(') else {
        return false;
    };
    let pattern = format!(
        r"(?i)(^|[^A-Za-z0-9_]){}([^A-Za-z0-9_]|$)",
        regex::escape(column)
    );
    Regex::new(&pattern).is_ok_and(|re| re.is_match(&index_ddl[open..]))
}
