//! # oxide-alter-core
//!
//! Dialect-aware schema alteration for PostgreSQL, MySQL, SQL Server, Oracle
//! and SQLite.
//!
//! This crate provides:
//! - An action log of pending table and column edits that diffs against the
//!   catalog's original state
//! - A value formatter that turns native values into dialect literals
//! - One statement generator per dialect, selected by a closed [`Dialect`] enum
//! - A SQLite `CREATE TABLE` parser and serializer used to rebuild tables
//!   when SQLite cannot alter a column in place
//!
//! ## Generating statements
//!
//! ```rust
//! use oxide_alter_core::{ActionLog, Dialect, FieldSnapshot, GenerateContext};
//! use oxide_alter_core::adapter::generate_alter_statements;
//!
//! let mut log = ActionLog::new();
//! log.record_field_add(
//!     "users",
//!     FieldSnapshot::new("age", "INT").not_null().default_value("0"),
//! );
//!
//! let statements = generate_alter_statements(
//!     Dialect::Postgres,
//!     &log.actions(),
//!     &GenerateContext::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     statements,
//!     vec![r#"ALTER TABLE "users" ADD COLUMN "age" INT NOT NULL DEFAULT 0;"#]
//! );
//! ```
//!
//! Nothing in this crate touches a database. The returned statements are meant
//! for an external executor, ideally inside the transaction block produced by
//! [`adapter::wrap_in_transaction`].

pub mod action;
pub mod adapter;
pub mod config;
pub mod dialect;
pub mod error;
pub mod generator;
pub mod lexer;
pub mod sqlite;
pub mod structure;
pub mod value;

pub use action::{
    Action, ActionLog, ActionWarning, FieldAction, FieldSnapshot, Operation, TableAction,
    TableSnapshot, Target,
};
pub use config::{GenerateContext, GenerateOptions};
pub use dialect::Dialect;
pub use error::{AlterError, ParseError, Result};
pub use generator::AlterGenerator;
pub use structure::{
    ColumnDefinition, ConstraintKind, GeneratedColumn, GeneratedStorage, TableConstraint,
    TableOptions, TableStructure,
};
pub use value::SqlValue;
