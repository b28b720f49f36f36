//! PostgreSQL generator.

use super::{index_name, AlterGenerator};
use crate::action::FieldAction;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::structure::type_with_size;

/// PostgreSQL statement generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGenerator;

/// Which key a catalog lookup drops.
#[derive(Clone, Copy)]
enum KeyKind {
    Primary,
    Unique,
}

impl PostgresGenerator {
    /// A `DO` block dropping the key constraints that cover `column`.
    ///
    /// For unique keys, standalone unique indexes on the column are dropped
    /// as well, since they enforce the same thing without a constraint.
    fn drop_key(self, table: &str, column: &str, kind: KeyKind) -> String {
        let relation = self.text_literal(&self.quote_identifier(table));
        let column = self.text_literal(column);
        let (contype, arity) = match kind {
            KeyKind::Primary => ("p", ""),
            KeyKind::Unique => ("u", "\n      AND array_length(con.conkey, 1) = 1"),
        };

        let mut block = format!(
            "DO $drop_key$\nDECLARE\n  r record;\nBEGIN\n  \
             FOR r IN\n    SELECT con.conname\n    FROM pg_constraint con\n    \
             JOIN pg_attribute att ON att.attrelid = con.conrelid AND att.attnum = ANY (con.conkey)\n    \
             WHERE con.conrelid = {relation}::regclass\n      AND con.contype = '{contype}'\n      \
             AND att.attname = {column}{arity}\n  \
             LOOP\n    EXECUTE format('ALTER TABLE %s DROP CONSTRAINT %I', {relation}, r.conname);\n  END LOOP;\n"
        );
        if matches!(kind, KeyKind::Unique) {
            block.push_str(&format!(
                "  FOR r IN\n    SELECT i.indexrelid::regclass AS index_name\n    FROM pg_index i\n    \
                 JOIN pg_attribute att ON att.attrelid = i.indrelid AND att.attnum = ANY (i.indkey)\n    \
                 WHERE i.indrelid = {relation}::regclass\n      AND i.indisunique AND NOT i.indisprimary\n      \
                 AND i.indnatts = 1\n      AND att.attname = {column}\n      \
                 AND NOT EXISTS (SELECT 1 FROM pg_constraint c WHERE c.conindid = i.indexrelid)\n  \
                 LOOP\n    EXECUTE format('DROP INDEX %s', r.index_name);\n  END LOOP;\n"
            ));
        }
        block.push_str("END $drop_key$;");
        block
    }
}

impl AlterGenerator for PostgresGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn identity_clause(&self) -> &'static str {
        "GENERATED ALWAYS AS IDENTITY"
    }

    fn alter_column(&self, table: &str, field: &FieldAction) -> Result<Vec<String>> {
        let t = self.quote_identifier(table);
        let c = self.quote_identifier(&field.name);
        let mut statements = Vec::new();

        if field.type_changed() {
            let data_type = type_with_size(&field.data_type, field.size_text());
            statements.push(format!(
                "ALTER TABLE {t} ALTER COLUMN {c} TYPE {data_type} USING {c}::{data_type};"
            ));
        }

        if field.primary_key_changed() {
            statements.push(self.drop_key(table, &field.name, KeyKind::Primary));
        }
        if field.unique_key_changed() {
            statements.push(self.drop_key(table, &field.name, KeyKind::Unique));
        }
        if field.primary_key_changed() && field.is_primary_key {
            statements.push(format!(
                "ALTER TABLE {t} ADD {}PRIMARY KEY ({c});",
                self.constraint_prefix(index_name(field))
            ));
        }
        if field.unique_key_changed() && field.is_unique_key {
            let name = index_name(field).filter(|_| !field.is_primary_key);
            statements.push(format!(
                "ALTER TABLE {t} ADD {}UNIQUE ({c});",
                self.constraint_prefix(name)
            ));
        }

        // An identity column cannot carry a default and must be NOT NULL, so
        // the identity goes first when dropped and last when added.
        if field.auto_increment_changed() && !field.auto_increment {
            statements.push(format!("ALTER TABLE {t} ALTER COLUMN {c} DROP IDENTITY IF EXISTS;"));
        }

        if field.nullability_changed() {
            let change = if field.is_nullable { "DROP" } else { "SET" };
            statements.push(format!("ALTER TABLE {t} ALTER COLUMN {c} {change} NOT NULL;"));
        }

        if field.default_changed() {
            statements.push(match self.default_expr(field) {
                Some(default) => format!("ALTER TABLE {t} ALTER COLUMN {c} SET DEFAULT {default};"),
                None => format!("ALTER TABLE {t} ALTER COLUMN {c} DROP DEFAULT;"),
            });
        }

        if field.auto_increment_changed() && field.auto_increment {
            statements.push(format!("ALTER TABLE {t} ALTER COLUMN {c} ADD GENERATED ALWAYS AS IDENTITY;"));
        }

        if field.comment_changed() {
            statements.extend(self.column_comment(
                table,
                &field.name,
                field.comment_text(),
                field.comment_old.as_deref(),
            ));
        }

        if field.is_rename() {
            statements.push(self.rename_column(table, &field.name, field.new_name()));
        }
        Ok(statements)
    }

    fn drop_column(&self, table: &str, column: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} DROP COLUMN {} CASCADE;",
            self.quote_identifier(table),
            self.quote_identifier(column)
        )]
    }

    fn copy_table(&self, source: &str, target: &str) -> Vec<String> {
        let source = self.quote_identifier(source);
        let target = self.quote_identifier(target);
        vec![
            format!("CREATE TABLE {target} (LIKE {source} INCLUDING ALL);"),
            format!("INSERT INTO {target} SELECT * FROM {source};"),
        ]
    }
}
