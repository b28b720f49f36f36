//! Supported SQL dialects.
//!
//! Every generator is selected through [`Dialect`], so adding an operation
//! without handling all five engines fails to compile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AlterError;

/// A SQL engine with its own DDL capabilities and literal syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL.
    Postgres,
    /// MySQL and MariaDB.
    #[serde(rename = "mysql")]
    MySql,
    /// Microsoft SQL Server.
    #[serde(rename = "sqlserver")]
    SqlServer,
    /// Oracle Database.
    Oracle,
    /// SQLite.
    Sqlite,
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Self; 5] = [
        Self::Postgres,
        Self::MySql,
        Self::SqlServer,
        Self::Oracle,
        Self::Sqlite,
    ];

    /// Returns the human-readable engine name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Postgres => "PostgreSQL",
            Self::MySql => "MySQL",
            Self::SqlServer => "SQL Server",
            Self::Oracle => "Oracle",
            Self::Sqlite => "SQLite",
        }
    }

    /// Quotes an identifier, escaping embedded quote characters.
    #[must_use]
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", name.replace('`', "``")),
            Self::SqlServer => format!("[{}]", name.replace(']', "]]")),
            Self::Postgres | Self::Oracle | Self::Sqlite => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
        }
    }

    /// Returns the statements opening and closing a transaction block, or
    /// `None` when DDL commits implicitly.
    #[must_use]
    pub const fn transaction_block(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Postgres => Some(("BEGIN;", "COMMIT;")),
            Self::SqlServer => Some(("BEGIN TRANSACTION;", "COMMIT TRANSACTION;")),
            Self::Sqlite => Some(("BEGIN TRANSACTION;", "COMMIT;")),
            Self::MySql | Self::Oracle => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = AlterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "mssql" | "sqlserver" | "sql_server" => Ok(Self::SqlServer),
            "oracle" => Ok(Self::Oracle),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(AlterError::UnsupportedDialect(String::from(s))),
        }
    }
}
