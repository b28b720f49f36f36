//! SQL Server generator.
//!
//! Keys and defaults are named constraints the caller rarely knows, so
//! dropping one is a batch that finds the name in the catalog views and
//! runs the `ALTER TABLE` through `sp_executesql`.

use super::{index_name, AlterGenerator};
use crate::action::FieldAction;
use crate::dialect::Dialect;
use crate::error::{AlterError, Result};
use crate::structure::type_with_size;

/// Schema holding the tables extended properties are attached to.
const SCHEMA: &str = "dbo";

/// Extended property name SQL Server tools show as the description.
const DESCRIPTION: &str = "MS_Description";

/// Longest variable name SQL Server accepts, `@` included.
const MAX_VARIABLE_LEN: usize = 128;

/// Names the variable a lookup batch stores its statement in.
///
/// Variables live for the whole batch, so every lookup a script may contain
/// gets its own name built from the constraint kind, table and column.
fn lookup_variable(kind: &str, table: &str, column: &str) -> String {
    let mut var = format!("@drop_{}", kind.to_ascii_lowercase());
    for part in [table, column] {
        var.push('_');
        var.extend(part.chars().map(|c| if c.is_alphanumeric() { c } else { '_' }));
    }
    var.chars().take(MAX_VARIABLE_LEN).collect()
}

/// SQL Server statement generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerGenerator;

impl SqlServerGenerator {
    fn drop_constraint_prefix(self, table: &str) -> String {
        self.text_literal(&format!(
            "ALTER TABLE {} DROP CONSTRAINT ",
            self.quote_identifier(table)
        ))
    }

    /// Drops the `PK` or `UQ` key constraint covering `column`.
    fn drop_key(self, table: &str, column: &str, key_type: &str) -> String {
        let var = lookup_variable(key_type, table, column);
        format!(
            "DECLARE {var} NVARCHAR(MAX);\n\
             SELECT {var} = {prefix} + QUOTENAME(kc.name)\n\
             FROM sys.key_constraints kc\n\
             JOIN sys.index_columns ic ON ic.object_id = kc.parent_object_id AND ic.index_id = kc.unique_index_id\n\
             JOIN sys.columns col ON col.object_id = ic.object_id AND col.column_id = ic.column_id\n\
             WHERE kc.parent_object_id = OBJECT_ID({table}) AND kc.type = '{key_type}' AND col.name = {column};\n\
             IF {var} IS NOT NULL EXEC sp_executesql {var};",
            prefix = self.drop_constraint_prefix(table),
            table = self.text_literal(&self.quote_identifier(table)),
            column = self.text_literal(column),
        )
    }

    /// Drops the default constraint bound to `column`.
    fn drop_default(self, table: &str, column: &str) -> String {
        let var = lookup_variable("DF", table, column);
        format!(
            "DECLARE {var} NVARCHAR(MAX);\n\
             SELECT {var} = {prefix} + QUOTENAME(dc.name)\n\
             FROM sys.default_constraints dc\n\
             JOIN sys.columns col ON col.object_id = dc.parent_object_id AND col.column_id = dc.parent_column_id\n\
             WHERE dc.parent_object_id = OBJECT_ID({table}) AND col.name = {column};\n\
             IF {var} IS NOT NULL EXEC sp_executesql {var};",
            prefix = self.drop_constraint_prefix(table),
            table = self.text_literal(&self.quote_identifier(table)),
            column = self.text_literal(column),
        )
    }

    /// Adds, updates or drops the description property of a table or column.
    fn description(
        self,
        table: &str,
        column: Option<&str>,
        comment: Option<&str>,
        previous: Option<&str>,
    ) -> String {
        let procedure = match (comment, previous) {
            (Some(_), None) => "sp_addextendedproperty",
            (Some(_), Some(_)) => "sp_updateextendedproperty",
            (None, _) => "sp_dropextendedproperty",
        };
        let mut params = vec![format!("@name = {}", self.text_literal(DESCRIPTION))];
        if let Some(comment) = comment {
            params.push(format!("@value = {}", self.text_literal(comment)));
        }
        params.push(format!(
            "@level0type = N'SCHEMA', @level0name = {}",
            self.text_literal(SCHEMA)
        ));
        params.push(format!(
            "@level1type = N'TABLE', @level1name = {}",
            self.text_literal(table)
        ));
        if let Some(column) = column {
            params.push(format!(
                "@level2type = N'COLUMN', @level2name = {}",
                self.text_literal(column)
            ));
        }
        format!("EXEC {procedure} {};", params.join(", "))
    }
}

impl AlterGenerator for SqlServerGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn identity_clause(&self) -> &'static str {
        "IDENTITY(1,1)"
    }

    fn add_column(&self, table: &str, field: &FieldAction) -> Vec<String> {
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD {}{};",
            self.quote_identifier(table),
            self.column_definition(field.new_name(), field),
            self.inline_key(field)
        )];
        if let Some(comment) = field.comment_text() {
            statements.extend(self.column_comment(table, field.new_name(), Some(comment), None));
        }
        statements
    }

    fn alter_column(&self, table: &str, field: &FieldAction) -> Result<Vec<String>> {
        if field.auto_increment_changed() {
            return Err(AlterError::UnsupportedAlteration {
                dialect: Dialect::SqlServer,
                detail: format!("change IDENTITY on existing column '{}'", field.name),
            });
        }

        let t = self.quote_identifier(table);
        let c = self.quote_identifier(&field.name);
        let mut statements = Vec::new();

        if field.primary_key_changed() && field.is_primary_key_old {
            statements.push(self.drop_key(table, &field.name, "PK"));
        }
        if field.unique_key_changed() && field.is_unique_key_old {
            statements.push(self.drop_key(table, &field.name, "UQ"));
        }

        if field.type_changed() || field.nullability_changed() {
            let nullability = if field.is_nullable { "NULL" } else { "NOT NULL" };
            statements.push(format!(
                "ALTER TABLE {t} ALTER COLUMN {c} {} {nullability};",
                type_with_size(&field.data_type, field.size_text())
            ));
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

        if field.default_changed() {
            statements.push(self.drop_default(table, &field.name));
            if let Some(default) = self.default_expr(field) {
                statements.push(format!("ALTER TABLE {t} ADD DEFAULT {default} FOR {c};"));
            }
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
        vec![
            self.drop_default(table, column),
            format!(
                "ALTER TABLE {} DROP COLUMN {};",
                self.quote_identifier(table),
                self.quote_identifier(column)
            ),
        ]
    }

    fn rename_column(&self, table: &str, old: &str, new: &str) -> String {
        let object = format!(
            "{}.{}",
            self.quote_identifier(table),
            self.quote_identifier(old)
        );
        format!(
            "EXEC sp_rename {}, {}, N'COLUMN';",
            self.text_literal(&object),
            self.text_literal(new)
        )
    }

    fn rename_table(&self, old: &str, new: &str) -> String {
        format!(
            "EXEC sp_rename {}, {};",
            self.text_literal(&self.quote_identifier(old)),
            self.text_literal(new)
        )
    }

    fn table_comment(&self, table: &str, comment: Option<&str>, previous: Option<&str>) -> Vec<String> {
        vec![self.description(table, None, comment, previous)]
    }

    fn column_comment(
        &self,
        table: &str,
        column: &str,
        comment: Option<&str>,
        previous: Option<&str>,
    ) -> Vec<String> {
        let previous = previous.map(str::trim).filter(|p| !p.is_empty());
        if comment.is_none() && previous.is_none() {
            return Vec::new();
        }
        vec![self.description(table, Some(column), comment, previous)]
    }

    fn copy_table(&self, source: &str, target: &str) -> Vec<String> {
        vec![format!(
            "SELECT * INTO {} FROM {};",
            self.quote_identifier(target),
            self.quote_identifier(source)
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::FieldSnapshot;
    use crate::value::SqlValue;

    fn edit(current: FieldSnapshot, previous: FieldSnapshot) -> Result<Vec<String>> {
        SqlServerGenerator.alter_column("users", &FieldAction::edit("users", current, previous))
    }

    #[test]
    fn test_add_column() {
        let field = FieldAction::add(
            "users",
            FieldSnapshot::new("id", "INT").primary_key().auto_increment(),
        );
        assert_eq!(
            SqlServerGenerator.add_column("users", &field),
            vec!["ALTER TABLE [users] ADD [id] INT NOT NULL IDENTITY(1,1) PRIMARY KEY;"]
        );
    }

    #[test]
    fn test_retype_keeps_nullability() {
        assert_eq!(
            edit(
                FieldSnapshot::new("name", "NVARCHAR").size("100").not_null(),
                FieldSnapshot::new("name", "NVARCHAR").size("50").not_null(),
            )
            .unwrap(),
            vec!["ALTER TABLE [users] ALTER COLUMN [name] NVARCHAR(100) NOT NULL;"]
        );
    }

    #[test]
    fn test_key_drop_first_then_add() {
        let statements = edit(
            FieldSnapshot::new("code", "INT").not_null().unique(true).index_name("uq_code"),
            FieldSnapshot::new("code", "INT").primary_key(),
        )
        .unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("kc.type = 'PK'"));
        assert!(statements[0].contains("N'ALTER TABLE [users] DROP CONSTRAINT ' + QUOTENAME(kc.name)"));
        assert!(statements[0].starts_with("DECLARE @drop_pk_users_code NVARCHAR(MAX);"));
        assert!(statements[0]
            .ends_with("IF @drop_pk_users_code IS NOT NULL EXEC sp_executesql @drop_pk_users_code;"));
        assert_eq!(
            statements[1],
            "ALTER TABLE [users] ADD CONSTRAINT [uq_code] UNIQUE ([code]);"
        );
    }

    #[test]
    fn test_default_replaced_through_lookup() {
        let statements = edit(
            FieldSnapshot::new("active", "BIT").default_value("true"),
            FieldSnapshot::new("active", "BIT").default_value("false"),
        )
        .unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("sys.default_constraints"));
        assert_eq!(statements[1], "ALTER TABLE [users] ADD DEFAULT 1 FOR [active];");
    }

    /// Variables declared more than once in `script`.
    fn redeclared(script: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        script
            .split("DECLARE ")
            .skip(1)
            .filter_map(|rest| rest.split_whitespace().next())
            .filter(|name| !seen.insert(name.to_string()))
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_unique_and_default_drop_share_one_batch() {
        let statements = edit(
            FieldSnapshot::new("c", "INT"),
            FieldSnapshot::new("c", "INT").unique(true).default_value("1"),
        )
        .unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("kc.type = 'UQ'"));
        assert!(statements[1].contains("sys.default_constraints"));
        assert!(redeclared(&statements.join("\n")).is_empty());
    }

    #[test]
    fn test_key_and_default_change_together() {
        let statements = edit(
            FieldSnapshot::new("code", "INT").not_null().default_value("2"),
            FieldSnapshot::new("code", "INT").not_null().primary_key().default_value("1"),
        )
        .unwrap();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].contains("kc.type = 'PK'"));
        assert!(statements[1].contains("sys.default_constraints"));
        assert_eq!(statements[2], "ALTER TABLE [users] ADD DEFAULT 2 FOR [code];");
        assert!(redeclared(&statements.join("\n")).is_empty());
    }

    #[test]
    fn test_dropping_columns_in_one_script() {
        let mut statements = SqlServerGenerator.drop_column("users", "age");
        statements.extend(SqlServerGenerator.drop_column("users", "nick name"));
        statements.extend(SqlServerGenerator.drop_column("people", "age"));
        assert!(statements[2].starts_with("DECLARE @drop_df_users_nick_name NVARCHAR(MAX);"));
        assert!(redeclared(&statements.join("\n")).is_empty());
    }

    #[test]
    fn test_lookup_variable_stays_within_limit() {
        let long = "x".repeat(200);
        let var = lookup_variable("UQ", &long, "c");
        assert_eq!(var.chars().count(), MAX_VARIABLE_LEN);
        assert!(var.starts_with("@drop_uq_xxx"));
    }

    #[test]
    fn test_identity_change_is_unsupported() {
        let err = edit(
            FieldSnapshot::new("id", "INT").not_null().auto_increment(),
            FieldSnapshot::new("id", "INT").not_null(),
        )
        .unwrap_err();
        assert!(matches!(err, AlterError::UnsupportedAlteration { dialect: Dialect::SqlServer, .. }));
    }

    #[test]
    fn test_comment_properties() {
        let add = &edit(
            FieldSnapshot::new("age", "INT").comment("years"),
            FieldSnapshot::new("age", "INT"),
        )
        .unwrap()[0];
        assert_eq!(
            add,
            "EXEC sp_addextendedproperty @name = N'MS_Description', @value = N'years', \
             @level0type = N'SCHEMA', @level0name = N'dbo', @level1type = N'TABLE', \
             @level1name = N'users', @level2type = N'COLUMN', @level2name = N'age';"
        );

        let update = &edit(
            FieldSnapshot::new("age", "INT").comment("in years"),
            FieldSnapshot::new("age", "INT").comment("years"),
        )
        .unwrap()[0];
        assert!(update.starts_with("EXEC sp_updateextendedproperty"));

        let drop = &edit(
            FieldSnapshot::new("age", "INT"),
            FieldSnapshot::new("age", "INT").comment("years"),
        )
        .unwrap()[0];
        assert!(drop.starts_with("EXEC sp_dropextendedproperty"));
        assert!(!drop.contains("@value"));
    }

    #[test]
    fn test_rename_and_drop() {
        assert_eq!(
            edit(
                FieldSnapshot::new("years", "INT"),
                FieldSnapshot::new("age", "INT"),
            )
            .unwrap(),
            vec!["EXEC sp_rename N'[users].[age]', N'years', N'COLUMN';"]
        );
        assert_eq!(
            SqlServerGenerator.rename_table("users", "people"),
            "EXEC sp_rename N'[users]', N'people';"
        );

        let drop = SqlServerGenerator.drop_column("users", "age");
        assert_eq!(drop.len(), 2);
        assert!(drop[0].contains("sys.default_constraints"));
        assert_eq!(drop[1], "ALTER TABLE [users] DROP COLUMN [age];");
    }

    #[test]
    fn test_row_literals() {
        assert_eq!(
            SqlServerGenerator
                .insert_rows(
                    "users",
                    &["name", "active"],
                    &[vec![SqlValue::from("Zoë"), SqlValue::Bool(true)]],
                )
                .unwrap(),
            "INSERT INTO [users] ([name], [active]) VALUES (N'Zoë', 1);"
        );
    }
}
