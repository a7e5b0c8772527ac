//! # Repository Module
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  service (apps/shopdesk)                                                │
//! │       │  db.brands().list_active()                                      │
//! │       ▼                                                                 │
//! │  BrandRepository ──► BrandRow (FromRow) ──► shopdesk_core::Brand        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read into private `*Row` structs and converted to the core
//! domain types, so the SQL shape never leaks past this module.
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`](customer::CustomerRepository) - customers, notes, payments, check-in
//! - [`BrandRepository`](brand::BrandRepository) - brands with soft delete
//! - [`CategoryRepository`](category::CategoryRepository) - categories with soft delete
//! - [`SupplierRepository`](supplier::SupplierRepository) - suppliers with soft delete
//! - [`ProductRepository`](product::ProductRepository) - products, variants, sale search
//! - [`OrderRepository`](order::OrderRepository) - sale orders and sales stats

pub mod brand;
pub mod category;
pub mod customer;
pub mod order;
pub mod product;
pub mod supplier;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Trims optional form text; blank becomes `None`.
pub(crate) fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Category tags are stored as a JSON array in a TEXT column.
pub(crate) fn encode_tags(tags: &[String]) -> DbResult<String> {
    serde_json::to_string(tags).map_err(|e| DbError::decode("categories", e))
}

pub(crate) fn decode_tags(raw: &str) -> DbResult<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| DbError::decode("categories", e))
}

/// Sets `deleted_at` on a live row of a soft-delete table.
///
/// `table` is always one of our own table names, never user input.
pub(crate) async fn mark_deleted(
    pool: &SqlitePool,
    table: &'static str,
    entity: &'static str,
    id: &str,
    at: DateTime<Utc>,
) -> DbResult<()> {
    debug!(table, id = %id, "Soft-deleting row");

    let sql = format!(
        "UPDATE {table} SET deleted_at = ?1, updated_at = ?1 \
         WHERE id = ?2 AND deleted_at IS NULL"
    );
    let result = sqlx::query(&sql).bind(at).bind(id).execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(format!("Active {entity}"), id));
    }
    Ok(())
}

/// Clears `deleted_at` on a soft-deleted row.
pub(crate) async fn mark_restored(
    pool: &SqlitePool,
    table: &'static str,
    entity: &'static str,
    id: &str,
    at: DateTime<Utc>,
) -> DbResult<()> {
    debug!(table, id = %id, "Restoring row");

    let sql = format!(
        "UPDATE {table} SET deleted_at = NULL, updated_at = ?1 \
         WHERE id = ?2 AND deleted_at IS NOT NULL"
    );
    let result = sqlx::query(&sql).bind(at).bind(id).execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(format!("Deleted {entity}"), id));
    }
    Ok(())
}

/// `%term%` for a LIKE match; SQLite LIKE ignores ASCII case.
pub(crate) fn like_pattern(text: &str) -> String {
    let escaped = text
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
