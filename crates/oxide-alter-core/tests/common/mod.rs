#![allow(dead_code)]

use oxide_alter_core::adapter::generate_alter_statements;
use oxide_alter_core::{ActionLog, Dialect, GenerateContext};

pub fn generate(dialect: Dialect, log: &ActionLog) -> Vec<String> {
    generate_with(dialect, log, &GenerateContext::default())
}

pub fn generate_with(dialect: Dialect, log: &ActionLog, ctx: &GenerateContext) -> Vec<String> {
    generate_alter_statements(dialect, &log.actions(), ctx)
        .unwrap_or_else(|e| panic!("Generation failed for {dialect}: {e}"))
}

/// Statements that follow the rebuild's closing pragma.
pub fn after_rebuild(statements: &[String]) -> Vec<&str> {
    statements
        .iter()
        .skip_while(|s| *s != "PRAGMA foreign_keys = ON;")
        .skip(1)
        .map(String::as_str)
        .collect()
}
