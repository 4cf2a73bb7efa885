/// Inline SQL migrations for the monitor schema.
///
/// Simple inline statements rather than sqlx migration files: the schema is
/// two fact tables and their indexes, and every statement is idempotent.
///
/// `actual_start_date` is Unix seconds (UTC); month buckets are derived
/// with `strftime('%Y-%m', ..., 'unixepoch')`, never stored. Error metrics
/// and dimension columns are nullable — upstream loads are incomplete and
/// the aggregation layer filters nulls per query.
pub const MIGRATIONS: &[&str] = &[
    // Migration 1: ROP fact table
    r#"
CREATE TABLE IF NOT EXISTS rop_monitor (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    process_order_number TEXT NOT NULL,
    actual_start_date INTEGER,
    recommended_rop_abs_error REAL,
    planned_rop_abs_error REAL,
    interface TEXT,
    platform TEXT,
    segment TEXT,
    business_unit TEXT,
    facility TEXT,
    machine TEXT,
    packer_resource TEXT
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_rop_monitor_start ON rop_monitor(actual_start_date);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_rop_monitor_order ON rop_monitor(process_order_number);"#,
    // Migration 2: Setup-Time fact table (shared columns + setup-matrix dimensions)
    r#"
CREATE TABLE IF NOT EXISTS setup_time_monitor (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    process_order_number TEXT NOT NULL,
    actual_start_date INTEGER,
    recommended_st_abs_error REAL,
    planned_st_abs_error REAL,
    setup_matrix TEXT,
    from_setup_group TEXT,
    to_setup_group TEXT,
    interface TEXT,
    platform TEXT,
    segment TEXT,
    business_unit TEXT,
    facility TEXT,
    machine TEXT,
    packer_resource TEXT
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_setup_time_monitor_start ON setup_time_monitor(actual_start_date);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_setup_time_monitor_order ON setup_time_monitor(process_order_number);"#,
];
