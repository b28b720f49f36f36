//! SQLite table rebuilds.
//!
//! SQLite cannot retype a column, change its keys, toggle NOT NULL or
//! change its default in place. Those edits are applied to the parsed live
//! `CREATE TABLE` statement, which is re-serialized under a temporary name
//! and swapped in by a copy/drop/rename script.

pub mod parser;
pub mod rebuild;
pub mod serializer;

pub use parser::parse_create_table;
pub use rebuild::{delete_needs_rebuild, needs_rebuild, rebuild_statements};
pub use serializer::serialize;
