//! SQLite changes that need the copy/drop/rename rebuild.

mod common;

use common::{after_rebuild, generate_with};
use oxide_alter_core::sqlite::parse_create_table;
use oxide_alter_core::{ActionLog, Dialect, FieldSnapshot, GenerateContext, GenerateOptions};

const ORDERS: &str = "CREATE TABLE orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    total REAL DEFAULT 0, -- running total
    note TEXT,
    CHECK (total >= 0)
)";

fn orders_ctx() -> GenerateContext {
    GenerateContext::new()
        .with_table_ddl(ORDERS)
        .with_index_ddl(vec![
            String::from("CREATE INDEX idx_orders_customer ON orders(customer_id)"),
            String::from("CREATE INDEX idx_orders_total ON orders(total);"),
        ])
}

fn retype_total(log: &mut ActionLog) {
    log.record_field_edit(
        "orders",
        FieldSnapshot::new("total", "NUMERIC").not_null().default_value("0"),
        FieldSnapshot::new("total", "REAL").default_value("0"),
    );
}

fn rebuilt_table(statements: &[String]) -> oxide_alter_core::TableStructure {
    let create = statements
        .iter()
        .find(|s| s.starts_with("CREATE TABLE orders_new"))
        .unwrap_or_else(|| panic!("no rebuilt table in {statements:?}"));
    parse_create_table(create.trim_end_matches(';')).unwrap()
}

#[test]
fn retype_keeps_constraints_and_data() {
    let mut log = ActionLog::new();
    retype_total(&mut log);
    let statements = generate_with(Dialect::Sqlite, &log, &orders_ctx());

    assert_eq!(statements[0], "PRAGMA foreign_keys = OFF;");
    assert_eq!(
        statements[1],
        r#"CREATE TEMPORARY TABLE "temp_backup" AS SELECT "id", "customer_id", "total", "note" FROM "orders";"#
    );
    assert!(statements.contains(&String::from(
        r#"INSERT INTO "orders_new"("id", "customer_id", "total", "note") SELECT "id", "customer_id", "total", "note" FROM "temp_backup";"#
    )));
    assert!(statements.contains(&String::from(r#"ALTER TABLE "orders_new" RENAME TO "orders";"#)));
    assert!(statements.contains(&String::from(
        "CREATE INDEX idx_orders_customer ON orders(customer_id);"
    )));
    assert!(statements.contains(&String::from("CREATE INDEX idx_orders_total ON orders(total);")));
    assert_eq!(statements.last().unwrap(), "PRAGMA foreign_keys = ON;");

    let rebuilt = rebuilt_table(&statements);
    let id = rebuilt.find_column("id").unwrap();
    assert!(id.is_primary_key && id.auto_increment);
    let customer = rebuilt.find_column("customer_id").unwrap();
    assert!(!customer.is_nullable);
    assert!(customer.references.as_deref().is_some_and(|r| r.starts_with("customers")));
    let total = rebuilt.find_column("total").unwrap();
    assert_eq!(total.data_type, "NUMERIC");
    assert!(!total.is_nullable);
    assert_eq!(total.default_value.as_deref(), Some("0"));
    assert_eq!(rebuilt.constraints.len(), 1);
}

#[test]
fn plain_drop_runs_after_rebuild() {
    let mut log = ActionLog::new();
    retype_total(&mut log);
    log.record_field_delete("orders", "note");
    let statements = generate_with(Dialect::Sqlite, &log, &orders_ctx());

    assert_eq!(
        after_rebuild(&statements),
        vec![r#"ALTER TABLE "orders" DROP COLUMN "note";"#]
    );
}

#[test]
fn dropping_key_column_rebuilds_without_its_indexes() {
    let ddl = "CREATE TABLE tags (id INTEGER PRIMARY KEY, slug TEXT UNIQUE, label TEXT)";
    let ctx = GenerateContext::new()
        .with_table_ddl(ddl)
        .with_index_ddl(vec![
            String::from("CREATE INDEX idx_tags_slug ON tags(slug)"),
            String::from("CREATE INDEX idx_tags_label ON tags(label)"),
        ]);
    let mut log = ActionLog::new();
    log.record_field_delete("tags", "slug");
    let statements = generate_with(Dialect::Sqlite, &log, &ctx);

    assert_eq!(
        statements[1],
        r#"CREATE TEMPORARY TABLE "temp_backup" AS SELECT "id", "label" FROM "tags";"#
    );
    assert!(!statements.iter().any(|s| s.contains("idx_tags_slug")));
    assert!(statements.contains(&String::from("CREATE INDEX idx_tags_label ON tags(label);")));
}

#[test]
fn dropping_indexed_column_rebuilds() {
    let mut log = ActionLog::new();
    log.record_field_delete("orders", "total");
    let statements = generate_with(Dialect::Sqlite, &log, &orders_ctx());

    assert_eq!(
        statements[1],
        r#"CREATE TEMPORARY TABLE "temp_backup" AS SELECT "id", "customer_id", "note" FROM "orders";"#
    );
    assert!(!statements.iter().any(|s| s.contains("idx_orders_total")));
    assert!(after_rebuild(&statements).is_empty());

    let rebuilt = rebuilt_table(&statements);
    assert!(rebuilt.find_column("total").is_none());
    assert!(rebuilt.constraints.is_empty(), "CHECK on the dropped column must go");
}

#[test]
fn transactional_rebuild_keeps_pragmas_outside() {
    let mut log = ActionLog::new();
    retype_total(&mut log);
    log.record_field_delete("orders", "note");
    let ctx = orders_ctx().with_options(GenerateOptions {
        transactional: true,
        ..GenerateOptions::default()
    });
    let statements = generate_with(Dialect::Sqlite, &log, &ctx);

    assert_eq!(statements[0], "PRAGMA foreign_keys = OFF;");
    assert_eq!(statements[1], "BEGIN TRANSACTION;");
    let n = statements.len();
    assert_eq!(statements[n - 3], r#"ALTER TABLE "orders" DROP COLUMN "note";"#);
    assert_eq!(statements[n - 2], "COMMIT;");
    assert_eq!(statements[n - 1], "PRAGMA foreign_keys = ON;");
}

#[test]
fn custom_backup_and_suffix() {
    let mut log = ActionLog::new();
    retype_total(&mut log);
    let ctx = orders_ctx().with_options(GenerateOptions {
        backup_table: String::from("orders_copy"),
        rebuild_suffix: String::from("_tmp"),
        ..GenerateOptions::default()
    });
    let statements = generate_with(Dialect::Sqlite, &log, &ctx);

    assert!(statements[1].starts_with(r#"CREATE TEMPORARY TABLE "orders_copy""#));
    assert!(statements.iter().any(|s| s.starts_with("CREATE TABLE orders_tmp (")));
    assert!(statements.contains(&String::from(r#"DROP TABLE "orders_copy";"#)));
}
