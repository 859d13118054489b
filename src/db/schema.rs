pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS monthly_budgets (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    month         TEXT NOT NULL UNIQUE,
    total_budget  TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS category_allocations (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    month          TEXT NOT NULL REFERENCES monthly_budgets(month) ON DELETE CASCADE,
    main_category  TEXT NOT NULL,
    position       INTEGER NOT NULL,
    percentage     REAL NOT NULL,
    UNIQUE(month, main_category)
);

CREATE INDEX IF NOT EXISTS idx_allocations_month ON category_allocations(month);

CREATE TABLE IF NOT EXISTS spending (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    date          TEXT NOT NULL,
    sub_category  TEXT NOT NULL,
    amount        TEXT NOT NULL,
    note          TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_spending_date ON spending(date);

CREATE TABLE IF NOT EXISTS settings (
    key    TEXT PRIMARY KEY,
    value  TEXT NOT NULL
);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
