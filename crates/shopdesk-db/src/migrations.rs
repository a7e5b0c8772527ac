//! # Database Migrations
//!
//! SQL files under `crates/shopdesk-db/migrations/` are embedded at compile
//! time and applied in filename order on startup. Applied versions are
//! tracked in `_sqlx_migrations`.
//!
//! ## Adding a Migration
//! 1. Add `NNN_description.sql` with the next number
//! 2. Use `IF NOT EXISTS` where SQLite allows it
//! 3. Never edit a migration that has shipped

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Runs all pending migrations.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(
        available = MIGRATOR.migrations.len(),
        "Checking for pending migrations"
    );

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// `(embedded, applied)` migration counts, for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((total, usize::try_from(applied).unwrap_or(0)))
}
