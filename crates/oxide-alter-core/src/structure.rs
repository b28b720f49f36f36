//! Structural table shape shared by the SQLite parser, serializer and the
//! CREATE TABLE generators.

use serde::{Deserialize, Serialize};

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Declared type, without size. Empty when the column has no type.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Type size or precision, e.g. `255` or `10,2`.
    #[serde(default)]
    pub size: Option<String>,
    /// Whether NULL is allowed.
    pub is_nullable: bool,
    /// Part of the primary key.
    #[serde(default)]
    pub is_primary_key: bool,
    /// Database-generated values.
    #[serde(default)]
    pub auto_increment: bool,
    /// Unique.
    #[serde(default)]
    pub is_unique_key: bool,
    /// Default as a SQL expression.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Column comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Collation name.
    #[serde(default)]
    pub collation: Option<String>,
    /// Column-level CHECK expression, without the surrounding parentheses.
    #[serde(default)]
    pub check_constraint: Option<String>,
    /// Generated column definition.
    #[serde(default)]
    pub generated: Option<GeneratedColumn>,
    /// Inline foreign key, the text after `REFERENCES`.
    #[serde(default)]
    pub references: Option<String>,
}

impl ColumnDefinition {
    /// Creates a nullable column with no constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            size: None,
            is_nullable: true,
            is_primary_key: false,
            auto_increment: false,
            is_unique_key: false,
            default_value: None,
            comment: None,
            collation: None,
            check_constraint: None,
            generated: None,
            references: None,
        }
    }

    /// Sets the size.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    /// Marks the column as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Marks the column auto-incrementing.
    #[must_use]
    pub const fn autoincrement(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks the column unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.is_unique_key = true;
        self
    }

    /// Sets the default expression.
    #[must_use]
    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default_value = Some(expr.into());
        self
    }

    /// Returns true for generated columns, which cannot be inserted into.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        self.generated.is_some()
    }

    /// Returns the type with its size, e.g. `VARCHAR(255)`.
    #[must_use]
    pub fn type_with_size(&self) -> String {
        type_with_size(&self.data_type, self.size.as_deref())
    }
}

/// Renders `data_type(size)`, skipping blank or zero sizes and types that
/// already carry parentheses.
#[must_use]
pub fn type_with_size(data_type: &str, size: Option<&str>) -> String {
    let data_type = data_type.trim();
    match size.map(str::trim) {
        Some(size) if !size.is_empty() && size != "0" && !data_type.contains('(') => {
            let size: String = size.split(',').map(str::trim).collect::<Vec<_>>().join(",");
            format!("{data_type}({size})")
        }
        _ => String::from(data_type),
    }
}

/// How a generated column is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GeneratedStorage {
    /// Computed on write and stored.
    Stored,
    /// Computed on read.
    Virtual,
}

/// A generated column's expression and storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedColumn {
    /// The generating expression, without the surrounding parentheses.
    pub expression: String,
    /// Storage kind. `None` when the DDL did not say.
    #[serde(default)]
    pub storage: Option<GeneratedStorage>,
}

/// The kind of a table-level constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    /// `PRIMARY KEY (...)`.
    PrimaryKey,
    /// `UNIQUE (...)`.
    Unique,
    /// `CHECK (...)`.
    Check,
    /// `FOREIGN KEY (...) REFERENCES ...`.
    ForeignKey,
}

/// A table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConstraint {
    /// Constraint kind.
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    /// Constraint name, if declared.
    #[serde(default)]
    pub name: Option<String>,
    /// Constrained columns.
    #[serde(default)]
    pub columns: Vec<String>,
    /// CHECK expression, without the surrounding parentheses.
    #[serde(default)]
    pub condition: Option<String>,
    /// Referenced table for foreign keys.
    #[serde(default)]
    pub reference_table: Option<String>,
    /// Referenced columns for foreign keys.
    #[serde(default)]
    pub reference_columns: Vec<String>,
    /// `ON DELETE` action.
    #[serde(default)]
    pub on_delete: Option<String>,
    /// `ON UPDATE` action.
    #[serde(default)]
    pub on_update: Option<String>,
}

impl TableConstraint {
    /// Creates a constraint of `kind` over `columns`.
    #[must_use]
    pub fn new(kind: ConstraintKind, columns: Vec<String>) -> Self {
        Self {
            kind,
            name: None,
            columns,
            condition: None,
            reference_table: None,
            reference_columns: Vec::new(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Returns true if the constraint names `column`.
    #[must_use]
    pub fn covers(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Returns true if the constraint names `column` in its column list or
    /// its CHECK expression.
    #[must_use]
    pub fn mentions(&self, column: &str) -> bool {
        self.covers(column)
            || self.condition.as_deref().is_some_and(|condition| {
                condition
                    .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .any(|word| word.eq_ignore_ascii_case(column))
            })
    }
}

/// Table options. Only SQLite has any today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    /// `WITHOUT ROWID`.
    #[serde(default)]
    pub without_row_id: bool,
    /// `STRICT`.
    #[serde(default)]
    pub strict: bool,
}

/// The full shape of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStructure {
    /// Table name.
    pub table_name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDefinition>,
    /// Table-level constraints.
    #[serde(default)]
    pub constraints: Vec<TableConstraint>,
    /// Table options.
    #[serde(default)]
    pub options: TableOptions,
}

impl TableStructure {
    /// Creates an empty structure.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
            options: TableOptions::default(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds a table constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: TableConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Finds a column by name.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Finds a column by name for mutation.
    pub fn find_column_mut(&mut self, name: &str) -> Option<&mut ColumnDefinition> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Returns the primary-key columns in key order.
    ///
    /// A table-level key constraint gives the order when it covers exactly
    /// the flagged columns; otherwise declaration order is used.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&str> {
        let flagged: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.as_str())
            .collect();
        if let Some(pk) = self.primary_key_constraint() {
            let same_set = pk.columns.len() == flagged.len()
                && pk.columns.iter().all(|c| flagged.contains(&c.as_str()));
            if same_set {
                return pk.columns.iter().map(String::as_str).collect();
            }
        }
        flagged
    }

    /// Returns the table-level primary key constraint, if any.
    #[must_use]
    pub fn primary_key_constraint(&self) -> Option<&TableConstraint> {
        self.constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::PrimaryKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_with_size() {
        assert_eq!(type_with_size("VARCHAR", Some("255")), "VARCHAR(255)");
        assert_eq!(type_with_size("DECIMAL", Some("10, 2")), "DECIMAL(10,2)");
        assert_eq!(type_with_size("INT", Some("0")), "INT");
        assert_eq!(type_with_size("INT", Some(" ")), "INT");
        assert_eq!(type_with_size("VARCHAR(20)", Some("30")), "VARCHAR(20)");
        assert_eq!(type_with_size("TEXT", None), "TEXT");
    }

    #[test]
    fn test_primary_key_column_order() {
        let table = TableStructure::new("t")
            .column(ColumnDefinition::new("a", "INT").primary_key())
            .column(ColumnDefinition::new("b", "INT").primary_key())
            .constraint(TableConstraint::new(
                ConstraintKind::PrimaryKey,
                vec![String::from("b"), String::from("a")],
            ));
        assert_eq!(table.primary_key_columns(), vec!["b", "a"]);
    }

    #[test]
    fn test_primary_key_flags_win_over_stale_constraint() {
        let table = TableStructure::new("t")
            .column(ColumnDefinition::new("a", "INT").primary_key())
            .column(ColumnDefinition::new("b", "INT"))
            .constraint(TableConstraint::new(
                ConstraintKind::PrimaryKey,
                vec![String::from("a"), String::from("b")],
            ));
        assert_eq!(table.primary_key_columns(), vec!["a"]);
    }

    #[test]
    fn test_check_condition_mentions_column() {
        let mut check = TableConstraint::new(ConstraintKind::Check, Vec::new());
        check.condition = Some(String::from("total >= 0 AND Discount < total"));
        assert!(check.mentions("total"));
        assert!(check.mentions("discount"));
        assert!(!check.mentions("tot"));
        assert!(!check.covers("total"));
    }
}
