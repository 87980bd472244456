//! # Database Migrations
//!
//! Embedded SQL migrations for SICONI, followed by additive column upgrades.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Startup                                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sqlx MIGRATOR (tracked in _sqlx_migrations)                           │
//! │       ├── 001_initial_schema.sql   CREATE TABLE IF NOT EXISTS ...      │
//! │       └── 002_seed_catalog.sql     INSERT OR IGNORE seeds, counters    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Additive columns                                                      │
//! │       ├── pragma_table_info(table) has column? → skip                  │
//! │       └── missing → ALTER TABLE ... ADD COLUMN ...                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Indexes over additive columns                                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The additive step exists for database files created by older builds of
//! the workshop software: their tables already exist (so `CREATE TABLE IF NOT
//! EXISTS` leaves them alone) but lack the newer columns.
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Write idempotent SQL (use `IF NOT EXISTS` / `INSERT OR IGNORE`)
//! 3. **NEVER** modify existing migrations - always add new ones
//! 4. A column added to an existing table also goes in [`ADDITIVE_COLUMNS`]

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Columns that older database files may be missing: (table, column, type
/// and constraints as accepted by `ADD COLUMN`).
pub const ADDITIVE_COLUMNS: &[(&str, &str, &str)] = &[
    ("products", "min_stock", "INTEGER NOT NULL DEFAULT 0"),
    ("products", "is_active", "INTEGER NOT NULL DEFAULT 1"),
    ("clients", "club_id", "TEXT REFERENCES clubs(id)"),
    ("clients", "is_vip", "INTEGER NOT NULL DEFAULT 0"),
    ("sales", "exchange_rate", "REAL NOT NULL DEFAULT 1.0"),
    ("sales", "invoice_number", "TEXT"),
    ("sales", "control_number", "TEXT"),
    ("sales", "notes", "TEXT"),
    ("sales", "delivered_at", "TEXT"),
    ("payments", "reference", "TEXT"),
    ("payments", "notes", "TEXT"),
    ("inventory_movements", "sale_id", "TEXT REFERENCES sales(id)"),
];

/// Indexes on additive columns; created only after the columns exist.
const ADDITIVE_INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_sales_invoice_number \
     ON sales(invoice_number) WHERE invoice_number IS NOT NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_sales_control_number \
     ON sales(control_number) WHERE control_number IS NOT NULL",
    "CREATE INDEX IF NOT EXISTS idx_movements_sale ON inventory_movements(sale_id)",
];

/// Runs every pending migration, then the additive upgrades.
///
/// Idempotent: safe to run multiple times against the same file.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    let added = apply_additive_columns(pool).await?;
    for ddl in ADDITIVE_INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    info!(columns_added = added, "All migrations applied successfully");
    Ok(())
}

/// Adds each missing column from [`ADDITIVE_COLUMNS`]. Returns how many were
/// added.
pub async fn apply_additive_columns(pool: &SqlitePool) -> DbResult<usize> {
    let mut added = 0;

    for (table, column, definition) in ADDITIVE_COLUMNS {
        if column_exists(pool, table, column).await? {
            continue;
        }

        info!(table = %table, column = %column, "Adding missing column");
        // Identifiers come from the constant list above, never from input.
        let ddl = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition);
        sqlx::query(&ddl).execute(pool).await?;
        added += 1;
    }

    Ok(added)
}

/// Whether `table` has a column named `column`.
pub async fn column_exists(pool: &SqlitePool, table: &str, column: &str) -> DbResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;

    debug!(table = %table, column = %column, exists = count > 0, "Checked column");
    Ok(count > 0)
}

/// Names of the user tables, sorted. Used by diagnostics and tests.
pub async fn table_names(pool: &SqlitePool) -> DbResult<Vec<String>> {
    let names = sqlx::query_scalar(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(names)
}

/// Returns (embedded migrations, applied migrations).
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
