//! Generation options and per-call context.

use serde::{Deserialize, Serialize};

/// Tunables for statement generation.
///
/// Deserializes with defaults for any missing field, so a partial JSON
/// config file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateOptions {
    /// Wrap the generated statements in a transaction block where the
    /// dialect supports transactional DDL.
    pub transactional: bool,
    /// Name of the temporary table holding rows during a SQLite rebuild.
    pub backup_table: String,
    /// Suffix appended to the table name for the rebuilt SQLite table.
    pub rebuild_suffix: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            transactional: false,
            backup_table: String::from("temp_backup"),
            rebuild_suffix: String::from("_new"),
        }
    }
}

/// Everything a generator needs besides the actions themselves.
///
/// The live DDL and index definitions come from catalog introspection done
/// by the caller. Only the SQLite generator reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateContext {
    /// The table's current `CREATE TABLE` statement.
    pub table_ddl: Option<String>,
    /// `CREATE INDEX` statements to replay after a rebuild.
    pub index_ddl: Vec<String>,
    /// Generation options.
    pub options: GenerateOptions,
}

impl GenerateContext {
    /// Creates an empty context with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the live `CREATE TABLE` statement.
    #[must_use]
    pub fn with_table_ddl(mut self, ddl: impl Into<String>) -> Self {
        self.table_ddl = Some(ddl.into());
        self
    }

    /// Sets the index statements replayed after a rebuild.
    #[must_use]
    pub fn with_index_ddl(mut self, indexes: Vec<String>) -> Self {
        self.index_ddl = indexes;
        self
    }

    /// Replaces the generation options.
    #[must_use]
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}
