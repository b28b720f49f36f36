//! The action log: pending table and field edits awaiting generation.
//!
//! Each entry keeps both the new values and the catalog's original values,
//! so generators only emit statements for dimensions that actually changed.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What an action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Target {
    /// The table itself.
    Table,
    /// One column of the table.
    Field,
}

/// The kind of edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Create the target.
    Add,
    /// Alter the target.
    Edit,
    /// Drop the target.
    Delete,
}

/// A pending edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "UPPERCASE")]
pub enum Action {
    /// Table-level edit.
    Table(TableAction),
    /// Column-level edit.
    Field(FieldAction),
}

impl Action {
    /// Returns what the action applies to.
    #[must_use]
    pub const fn target(&self) -> Target {
        match self {
            Self::Table(_) => Target::Table,
            Self::Field(_) => Target::Field,
        }
    }

    /// Returns the kind of edit.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Table(t) => t.operation,
            Self::Field(f) => f.operation,
        }
    }

    /// Returns the owning table's name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::Table(t) => &t.table_name,
            Self::Field(f) => &f.table_name,
        }
    }
}

/// A table-level edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableAction {
    /// The kind of edit.
    pub operation: Operation,
    /// The table name after the edit.
    pub table_name: String,
    /// The table name in the catalog, if it differs.
    #[serde(default)]
    pub table_name_old: Option<String>,
    /// The table comment after the edit.
    #[serde(default)]
    pub comment: Option<String>,
    /// The table comment in the catalog.
    #[serde(default)]
    pub comment_old: Option<String>,
}

impl TableAction {
    /// Creates an action adding a new table.
    #[must_use]
    pub fn add(table_name: impl Into<String>) -> Self {
        Self {
            operation: Operation::Add,
            table_name: table_name.into(),
            table_name_old: None,
            comment: None,
            comment_old: None,
        }
    }

    /// Returns the name the catalog currently knows the table by.
    #[must_use]
    pub fn catalog_name(&self) -> &str {
        self.table_name_old.as_deref().unwrap_or(&self.table_name)
    }

    /// Returns the previous name if the table is being renamed.
    #[must_use]
    pub fn renamed_from(&self) -> Option<&str> {
        self.table_name_old
            .as_deref()
            .filter(|old| *old != self.table_name)
    }

    /// Returns true if the comment differs from the catalog's.
    #[must_use]
    pub fn comment_changed(&self) -> bool {
        normalized(self.comment.as_deref()) != normalized(self.comment_old.as_deref())
    }
}

const fn default_true() -> bool {
    true
}

/// A column-level edit.
///
/// `name` is the column's identity in the catalog; `name_new` is set when
/// the edit renames it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAction {
    /// The kind of edit.
    pub operation: Operation,
    /// The owning table.
    pub table_name: String,
    /// The column name as stored in the catalog.
    pub name: String,
    /// The column name after the edit.
    #[serde(default)]
    pub name_new: Option<String>,
    /// The column type after the edit.
    #[serde(rename = "type", default)]
    pub data_type: String,
    /// The column type in the catalog.
    #[serde(default)]
    pub type_old: Option<String>,
    /// The type size or precision, e.g. `255` or `10,2`.
    #[serde(default)]
    pub size: Option<String>,
    /// The size in the catalog.
    #[serde(default)]
    pub size_old: Option<String>,
    /// Whether the column accepts NULL after the edit.
    #[serde(default = "default_true")]
    pub is_nullable: bool,
    /// Whether the column accepts NULL in the catalog.
    #[serde(default = "default_true")]
    pub is_nullable_old: bool,
    /// The default value as entered by the user.
    #[serde(default)]
    pub default_value: Option<String>,
    /// The default value in the catalog.
    #[serde(default)]
    pub default_value_old: Option<String>,
    /// Whether the column is part of the primary key after the edit.
    #[serde(default)]
    pub is_primary_key: bool,
    /// Whether the column is part of the primary key in the catalog.
    #[serde(default)]
    pub is_primary_key_old: bool,
    /// Whether the column is unique after the edit.
    #[serde(default)]
    pub is_unique_key: bool,
    /// Whether the column is unique in the catalog.
    #[serde(default)]
    pub is_unique_key_old: bool,
    /// Name for the key constraint or index.
    #[serde(default)]
    pub index_name: Option<String>,
    /// Whether values are generated by the database after the edit.
    #[serde(default)]
    pub auto_increment: bool,
    /// Whether values are generated by the database in the catalog.
    #[serde(default)]
    pub auto_increment_old: bool,
    /// The column comment after the edit.
    #[serde(default)]
    pub comment: Option<String>,
    /// The column comment in the catalog.
    #[serde(default)]
    pub comment_old: Option<String>,
}

impl FieldAction {
    /// Creates an action adding a column.
    #[must_use]
    pub fn add(table_name: impl Into<String>, field: FieldSnapshot) -> Self {
        let mut action = Self::edit(table_name, field.clone(), FieldSnapshot::absent(&field.name));
        action.operation = Operation::Add;
        action.name_new = None;
        action
    }

    /// Creates an action altering a column from `previous` to `current`.
    #[must_use]
    pub fn edit(table_name: impl Into<String>, current: FieldSnapshot, previous: FieldSnapshot) -> Self {
        let name_new = (current.name != previous.name).then(|| current.name.clone());
        Self {
            operation: Operation::Edit,
            table_name: table_name.into(),
            name: previous.name,
            name_new,
            data_type: current.data_type,
            type_old: Some(previous.data_type),
            size: current.size,
            size_old: previous.size,
            is_nullable: current.is_nullable,
            is_nullable_old: previous.is_nullable,
            default_value: current.default_value,
            default_value_old: previous.default_value,
            is_primary_key: current.is_primary_key,
            is_primary_key_old: previous.is_primary_key,
            is_unique_key: current.is_unique_key,
            is_unique_key_old: previous.is_unique_key,
            index_name: current.index_name,
            auto_increment: current.auto_increment,
            auto_increment_old: previous.auto_increment,
            comment: current.comment,
            comment_old: previous.comment,
        }
    }

    /// Creates an action dropping a column.
    #[must_use]
    pub fn delete(table_name: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let mut action = Self::edit(
            table_name,
            FieldSnapshot::absent(&name),
            FieldSnapshot::absent(&name),
        );
        action.operation = Operation::Delete;
        action
    }

    /// Overwrites the new-state values with `current`, keeping every
    /// catalog-side value.
    fn apply_current(&mut self, current: FieldSnapshot) {
        if self.operation == Operation::Add {
            self.name.clone_from(&current.name);
        } else {
            self.name_new = (current.name != self.name).then(|| current.name.clone());
        }
        self.data_type = current.data_type;
        self.size = current.size;
        self.is_nullable = current.is_nullable;
        self.default_value = current.default_value;
        self.is_primary_key = current.is_primary_key;
        self.is_unique_key = current.is_unique_key;
        self.index_name = current.index_name;
        self.auto_increment = current.auto_increment;
        self.comment = current.comment;
    }

    /// Returns the column name after the edit.
    #[must_use]
    pub fn new_name(&self) -> &str {
        self.name_new.as_deref().unwrap_or(&self.name)
    }

    /// Returns true if the edit renames the column.
    #[must_use]
    pub fn is_rename(&self) -> bool {
        self.name_new.as_deref().is_some_and(|n| n != self.name)
    }

    /// Returns true if the type or size changed.
    #[must_use]
    pub fn type_changed(&self) -> bool {
        let retyped = self
            .type_old
            .as_deref()
            .is_some_and(|old| !old.trim().eq_ignore_ascii_case(self.data_type.trim()));
        retyped || self.size_changed()
    }

    /// Returns true if the size changed.
    #[must_use]
    pub fn size_changed(&self) -> bool {
        normalized(self.size.as_deref()) != normalized(self.size_old.as_deref())
    }

    /// Returns true if nullability changed.
    #[must_use]
    pub const fn nullability_changed(&self) -> bool {
        self.is_nullable != self.is_nullable_old
    }

    /// Returns true if the default value changed.
    #[must_use]
    pub fn default_changed(&self) -> bool {
        normalized(self.default_value.as_deref()) != normalized(self.default_value_old.as_deref())
    }

    /// Returns true if primary-key membership changed.
    #[must_use]
    pub const fn primary_key_changed(&self) -> bool {
        self.is_primary_key != self.is_primary_key_old
    }

    /// Returns true if unique-key membership changed.
    #[must_use]
    pub const fn unique_key_changed(&self) -> bool {
        self.is_unique_key != self.is_unique_key_old
    }

    /// Returns true if auto-increment changed.
    #[must_use]
    pub const fn auto_increment_changed(&self) -> bool {
        self.auto_increment != self.auto_increment_old
    }

    /// Returns true if the comment changed.
    #[must_use]
    pub fn comment_changed(&self) -> bool {
        normalized(self.comment.as_deref()) != normalized(self.comment_old.as_deref())
    }

    /// Returns the default value, or `None` if it is blank.
    #[must_use]
    pub fn default_expr(&self) -> Option<&str> {
        normalized(self.default_value.as_deref())
    }

    /// Returns the comment, or `None` if it is blank.
    #[must_use]
    pub fn comment_text(&self) -> Option<&str> {
        normalized(self.comment.as_deref())
    }

    /// Returns the size, or `None` if it is blank.
    #[must_use]
    pub fn size_text(&self) -> Option<&str> {
        normalized(self.size.as_deref())
    }
}

/// Trims a value, mapping empty strings to `None`.
fn normalized(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The state of a column at one point in time, as shown in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSnapshot {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Type size or precision.
    #[serde(default)]
    pub size: Option<String>,
    /// Whether NULL is allowed.
    #[serde(default = "default_true")]
    pub is_nullable: bool,
    /// Default value as entered.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Part of the primary key.
    #[serde(default)]
    pub is_primary_key: bool,
    /// Unique.
    #[serde(default)]
    pub is_unique_key: bool,
    /// Key constraint or index name.
    #[serde(default)]
    pub index_name: Option<String>,
    /// Database-generated values.
    #[serde(default)]
    pub auto_increment: bool,
    /// Column comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl FieldSnapshot {
    /// Creates a nullable column snapshot with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            size: None,
            is_nullable: true,
            default_value: None,
            is_primary_key: false,
            is_unique_key: false,
            index_name: None,
            auto_increment: false,
            comment: None,
        }
    }

    /// A snapshot for a column with no catalog state.
    fn absent(name: &str) -> Self {
        Self::new(name, "")
    }

    /// Sets the size.
    #[must_use]
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    /// Sets nullability.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.is_nullable = nullable;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Clears the default value.
    #[must_use]
    pub fn no_default(mut self) -> Self {
        self.default_value = None;
        self
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }

    /// Sets unique-key membership.
    #[must_use]
    pub const fn unique(mut self, unique: bool) -> Self {
        self.is_unique_key = unique;
        self
    }

    /// Sets the key constraint or index name.
    #[must_use]
    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    /// Marks the column auto-incrementing.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Renames the snapshot.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Changes the type.
    #[must_use]
    pub fn retyped(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }
}

/// An advisory problem found before generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionWarning {
    /// An edit or drop references a column that neither exists nor is
    /// pending creation.
    #[error("{operation:?} on '{table}.{field}' references a column that does not exist")]
    UnknownField {
        /// The table.
        table: String,
        /// The column that was not found.
        field: String,
        /// The edit kind.
        operation: Operation,
    },

    /// Two columns would end up with the same name.
    #[error("Column '{table}.{field}' would exist twice")]
    DuplicateField {
        /// The table.
        table: String,
        /// The duplicated column name.
        field: String,
    },
}

/// The pending edits of one apply cycle.
///
/// Holds at most one table action and at most one field action per column
/// identity. Later edits merge into earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLog {
    table: Option<TableAction>,
    fields: Vec<FieldAction>,
}

impl ActionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_none() && self.fields.is_empty()
    }

    /// Discards all pending edits.
    pub fn clear(&mut self) {
        self.table = None;
        self.fields.clear();
    }

    /// Returns the pending table action.
    #[must_use]
    pub const fn table_action(&self) -> Option<&TableAction> {
        self.table.as_ref()
    }

    /// Returns the pending field actions in recording order.
    #[must_use]
    pub fn field_actions(&self) -> &[FieldAction] {
        &self.fields
    }

    /// Returns all pending actions, table action first.
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        self.table
            .iter()
            .cloned()
            .map(Action::Table)
            .chain(self.fields.iter().cloned().map(Action::Field))
            .collect()
    }

    fn creating_table(&self) -> bool {
        self.table
            .as_ref()
            .is_some_and(|t| t.operation == Operation::Add)
    }

    /// Finds the action for the column the editor currently shows as `name`.
    ///
    /// A renamed column is only found by its new name, so a column that later
    /// takes over the old name gets its own action. Pending deletions are a
    /// last resort.
    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.operation != Operation::Delete && f.new_name() == name)
            .or_else(|| self.fields.iter().position(|f| f.new_name() == name))
    }

    /// Records that a new table is being created.
    pub fn record_table_add(&mut self, table_name: &str) -> &TableAction {
        debug!(table = %table_name, "Recording table creation");
        self.table.insert(TableAction::add(table_name))
    }

    /// Records a table rename and/or comment change.
    ///
    /// Merges into the existing table action, keeping the catalog name and
    /// comment from the first edit.
    pub fn record_table_edit(&mut self, current: TableSnapshot, previous: TableSnapshot) -> &TableAction {
        let creating = self.creating_table();
        if creating {
            for field in &mut self.fields {
                field.table_name.clone_from(&current.name);
            }
        }

        let action = self.table.get_or_insert_with(|| TableAction {
            operation: Operation::Edit,
            table_name: previous.name.clone(),
            table_name_old: Some(previous.name.clone()),
            comment: previous.comment.clone(),
            comment_old: previous.comment.clone(),
        });
        action.table_name = current.name;
        action.comment = current.comment;
        action
    }

    /// Records a new column.
    ///
    /// A second add for the same name replaces the first.
    pub fn record_field_add(&mut self, table_name: &str, field: FieldSnapshot) -> &FieldAction {
        let index = match self
            .fields
            .iter()
            .position(|f| f.operation == Operation::Add && f.name == field.name)
        {
            Some(index) => {
                self.fields[index].apply_current(field);
                index
            }
            None => {
                self.fields.push(FieldAction::add(table_name, field));
                self.fields.len() - 1
            }
        };
        &self.fields[index]
    }

    /// Records an edit of a column from `previous` to `current`.
    ///
    /// `previous` is the state the editor showed before this edit, so its
    /// name may be a pending rename of an earlier edit. The merged action
    /// keeps the catalog values recorded by the first edit.
    pub fn record_field_edit(
        &mut self,
        table_name: &str,
        current: FieldSnapshot,
        previous: FieldSnapshot,
    ) -> &FieldAction {
        let index = if let Some(index) = self.position(&previous.name) {
            let existing = &mut self.fields[index];
            if existing.operation == Operation::Delete {
                warn!(field = %previous.name, "Editing a column pending deletion");
                *existing = FieldAction::edit(table_name, current, previous);
            } else {
                existing.apply_current(current);
            }
            index
        } else if self.creating_table() {
            self.fields.push(FieldAction::add(table_name, current));
            self.fields.len() - 1
        } else {
            self.fields
                .push(FieldAction::edit(table_name, current, previous));
            self.fields.len() - 1
        };

        let action = &self.fields[index];
        debug!(
            table = %table_name,
            field = %action.name,
            operation = ?action.operation,
            "Recorded field edit"
        );
        action
    }

    /// Records that a column is dropped.
    ///
    /// Returns `None` when the column was never persisted (its table or the
    /// column itself is pending creation), in which case the pending add is
    /// simply discarded.
    pub fn record_field_delete(&mut self, table_name: &str, name: &str) -> Option<&FieldAction> {
        let position = self.position(name);
        if let Some(index) = position {
            if self.creating_table() || self.fields[index].operation == Operation::Add {
                debug!(field = %name, "Discarding pending column");
                self.fields.remove(index);
                return None;
            }
            let catalog_name = self.fields[index].name.clone();
            self.fields[index] = FieldAction::delete(table_name, catalog_name);
            return Some(&self.fields[index]);
        }
        if self.creating_table() {
            return None;
        }
        self.fields.push(FieldAction::delete(table_name, name));
        self.fields.last()
    }

    /// Checks the pending actions against the catalog's column names.
    ///
    /// The result is advisory; generation still runs.
    #[must_use]
    pub fn validate(&self, catalog_columns: &[&str]) -> Vec<ActionWarning> {
        let mut warnings = Vec::new();
        if self.creating_table() {
            return warnings;
        }

        for field in &self.fields {
            if field.operation != Operation::Add && !catalog_columns.contains(&field.name.as_str()) {
                warnings.push(ActionWarning::UnknownField {
                    table: field.table_name.clone(),
                    field: field.name.clone(),
                    operation: field.operation,
                });
            }
        }

        let mut final_names: Vec<&str> = catalog_columns
            .iter()
            .copied()
            .filter(|c| !self.fields.iter().any(|f| f.operation != Operation::Add && f.name == *c))
            .collect();
        for field in &self.fields {
            if field.operation == Operation::Delete {
                continue;
            }
            let name = field.new_name();
            if final_names.contains(&name) {
                warnings.push(ActionWarning::DuplicateField {
                    table: field.table_name.clone(),
                    field: String::from(name),
                });
            } else {
                final_names.push(name);
            }
        }

        for warning in &warnings {
            warn!(%warning, "Inconsistent action");
        }
        warnings
    }
}

/// The state of a table at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table name.
    pub name: String,
    /// Table comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl TableSnapshot {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(name: impl Into<String>, comment: Option<&str>) -> Self {
        Self {
            name: name.into(),
            comment: comment.map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age() -> FieldSnapshot {
        FieldSnapshot::new("age", "INT")
    }

    #[test]
    fn test_repeated_edit_merges_and_keeps_first_old_values() {
        let mut log = ActionLog::new();
        log.record_field_edit("users", age().retyped("BIGINT"), age());
        log.record_field_edit("users", age().retyped("TEXT"), age().retyped("BIGINT"));

        assert_eq!(log.field_actions().len(), 1);
        let action = &log.field_actions()[0];
        assert_eq!(action.operation, Operation::Edit);
        assert_eq!(action.data_type, "TEXT");
        assert_eq!(action.type_old.as_deref(), Some("INT"));
    }

    #[test]
    fn test_same_edit_twice_is_one_action() {
        let mut log = ActionLog::new();
        let current = age().not_null();
        log.record_field_edit("users", current.clone(), age());
        log.record_field_edit("users", current.clone(), current);

        assert_eq!(log.field_actions().len(), 1);
        let action = &log.field_actions()[0];
        assert!(!action.is_nullable);
        assert!(action.is_nullable_old);
    }

    #[test]
    fn test_edit_after_rename_follows_new_name() {
        let mut log = ActionLog::new();
        log.record_field_edit("users", age().renamed("years"), age());
        log.record_field_edit(
            "users",
            age().renamed("years").retyped("BIGINT"),
            age().renamed("years"),
        );

        assert_eq!(log.field_actions().len(), 1);
        let action = &log.field_actions()[0];
        assert_eq!(action.name, "age");
        assert_eq!(action.new_name(), "years");
        assert!(action.is_rename());
        assert!(action.type_changed());
    }

    #[test]
    fn test_rename_back_is_not_a_rename() {
        let mut log = ActionLog::new();
        log.record_field_edit("users", age().renamed("years"), age());
        log.record_field_edit("users", age(), age().renamed("years"));
        assert!(!log.field_actions()[0].is_rename());
    }

    #[test]
    fn test_edit_of_pending_add_stays_add() {
        let mut log = ActionLog::new();
        log.record_field_add("users", age());
        log.record_field_edit("users", age().renamed("years"), age());

        let action = &log.field_actions()[0];
        assert_eq!(action.operation, Operation::Add);
        assert_eq!(action.name, "years");
        assert!(!action.is_rename());
    }

    #[test]
    fn test_delete_of_pending_add_discards_it() {
        let mut log = ActionLog::new();
        log.record_field_add("users", age());
        assert!(log.record_field_delete("users", "age").is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn test_delete_while_creating_table_is_not_recorded() {
        let mut log = ActionLog::new();
        log.record_table_add("users");
        log.record_field_edit("users", age(), age());
        assert!(log.record_field_delete("users", "email").is_none());
        assert!(log.record_field_delete("users", "age").is_none());
        assert!(log.field_actions().is_empty());
    }

    #[test]
    fn test_delete_replaces_pending_edit() {
        let mut log = ActionLog::new();
        log.record_field_edit("users", age().renamed("years"), age());
        let action = log.record_field_delete("users", "years").unwrap();
        assert_eq!(action.operation, Operation::Delete);
        assert_eq!(action.name, "age");
        assert_eq!(log.field_actions().len(), 1);
    }

    #[test]
    fn test_edit_of_column_reusing_renamed_name() {
        let mut log = ActionLog::new();
        log.record_field_edit("users", age().renamed("years"), age());
        log.record_field_add("users", FieldSnapshot::new("age", "TEXT"));
        log.record_field_edit("users", age().retyped("BIGINT"), FieldSnapshot::new("age", "TEXT"));

        let fields = log.field_actions();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].operation, Operation::Edit);
        assert_eq!(fields[0].name, "age");
        assert_eq!(fields[0].new_name(), "years");
        assert_eq!(fields[0].data_type, "INT");
        assert_eq!(fields[1].operation, Operation::Add);
        assert_eq!(fields[1].name, "age");
        assert_eq!(fields[1].data_type, "BIGINT");
    }

    #[test]
    fn test_delete_of_column_reusing_renamed_name() {
        let mut log = ActionLog::new();
        log.record_field_edit("users", age().renamed("years"), age());
        log.record_field_add("users", age());
        assert!(log.record_field_delete("users", "age").is_none());

        let fields = log.field_actions();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].new_name(), "years");
    }

    #[test]
    fn test_re_added_column_after_delete_stays_separate() {
        let mut log = ActionLog::new();
        log.record_field_delete("users", "age");
        log.record_field_add("users", FieldSnapshot::new("age", "TEXT"));
        log.record_field_edit("users", FieldSnapshot::new("age", "JSON"), FieldSnapshot::new("age", "TEXT"));

        let fields = log.field_actions();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].operation, Operation::Delete);
        assert_eq!(fields[1].operation, Operation::Add);
        assert_eq!(fields[1].data_type, "JSON");
    }

    #[test]
    fn test_table_edit_merges() {
        let mut log = ActionLog::new();
        log.record_table_edit(
            TableSnapshot::new("people", None),
            TableSnapshot::new("users", Some("old")),
        );
        log.record_table_edit(
            TableSnapshot::new("persons", Some("new")),
            TableSnapshot::new("people", Some("old")),
        );

        let table = log.table_action().unwrap();
        assert_eq!(table.operation, Operation::Edit);
        assert_eq!(table.table_name, "persons");
        assert_eq!(table.renamed_from(), Some("users"));
        assert_eq!(table.comment_old.as_deref(), Some("old"));
        assert!(table.comment_changed());
    }

    #[test]
    fn test_rename_of_new_table_moves_fields() {
        let mut log = ActionLog::new();
        log.record_table_add("draft");
        log.record_field_add("draft", age());
        log.record_table_edit(TableSnapshot::new("users", None), TableSnapshot::new("draft", None));

        assert_eq!(log.table_action().unwrap().operation, Operation::Add);
        assert_eq!(log.field_actions()[0].table_name, "users");
    }

    #[test]
    fn test_change_detection_ignores_blank_values() {
        let mut action = FieldAction::edit("t", age().comment(""), age());
        assert!(!action.comment_changed());
        action.default_value = Some(String::from(" 0 "));
        action.default_value_old = Some(String::from("0"));
        assert!(!action.default_changed());
        assert!(!action.type_changed());
    }

    #[test]
    fn test_type_change_is_case_insensitive() {
        let action = FieldAction::edit("t", age().retyped("int"), age());
        assert!(!action.type_changed());
        let action = FieldAction::edit("t", age().size("11"), age());
        assert!(action.type_changed());
    }

    #[test]
    fn test_validate_reports_unknown_and_duplicate() {
        let mut log = ActionLog::new();
        log.record_field_edit("users", age().not_null(), age());
        log.record_field_add("users", FieldSnapshot::new("email", "TEXT"));

        let warnings = log.validate(&["id", "email"]);
        assert_eq!(
            warnings,
            vec![
                ActionWarning::UnknownField {
                    table: String::from("users"),
                    field: String::from("age"),
                    operation: Operation::Edit,
                },
                ActionWarning::DuplicateField {
                    table: String::from("users"),
                    field: String::from("email"),
                },
            ]
        );
    }

    #[test]
    fn test_validate_allows_swap_by_rename() {
        let mut log = ActionLog::new();
        log.record_field_edit("users", age().renamed("years"), age());
        log.record_field_add("users", age());
        assert!(log.validate(&["id", "age"]).is_empty());
    }

    #[test]
    fn test_action_json_shape() {
        let json = serde_json::json!({
            "target": "FIELD",
            "operation": "ADD",
            "tableName": "users",
            "name": "age",
            "type": "INT",
            "isNullable": false,
            "defaultValue": "0"
        });
        let action: Action = serde_json::from_value(json).unwrap();
        assert_eq!(action.target(), Target::Field);
        assert_eq!(action.operation(), Operation::Add);
        assert_eq!(action.table_name(), "users");
        let Action::Field(field) = action else {
            panic!("expected a field action");
        };
        assert!(!field.is_nullable);
        assert_eq!(field.default_value.as_deref(), Some("0"));
    }
}
