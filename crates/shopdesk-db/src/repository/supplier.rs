//! # Supplier Repository

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::{clean, decode_tags, encode_tags, like_pattern, mark_deleted, mark_restored};
use crate::error::{DbError, DbResult};
use shopdesk_core::catalog::{Supplier, SupplierInput};
use shopdesk_core::RecordStatus;

const SELECT_SUPPLIER: &str = r#"
    SELECT id, name, contact_person, phone, email, address, city, categories,
           deleted_at, created_at, updated_at
    FROM suppliers
"#;

#[derive(Debug, sqlx::FromRow)]
struct SupplierRow {
    id: String,
    name: String,
    contact_person: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    city: Option<String>,
    categories: String,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SupplierRow> for Supplier {
    type Error = DbError;

    fn try_from(row: SupplierRow) -> DbResult<Self> {
        Ok(Supplier {
            categories: decode_tags(&row.categories)?,
            id: row.id,
            name: row.name,
            contact_person: row.contact_person,
            phone: row.phone,
            email: row.email,
            address: row.address,
            city: row.city,
            status: RecordStatus::from_deleted_at(row.deleted_at),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_suppliers(rows: Vec<SupplierRow>) -> DbResult<Vec<Supplier>> {
    rows.into_iter().map(Supplier::try_from).collect()
}

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn list_active(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("{SELECT_SUPPLIER} WHERE deleted_at IS NULL ORDER BY name COLLATE NOCASE");
        into_suppliers(sqlx::query_as::<_, SupplierRow>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn list_all(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("{SELECT_SUPPLIER} ORDER BY name COLLATE NOCASE");
        into_suppliers(sqlx::query_as::<_, SupplierRow>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let sql = format!("{SELECT_SUPPLIER} WHERE id = ?1");
        sqlx::query_as::<_, SupplierRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Supplier::try_from)
            .transpose()
    }

    /// Active suppliers matching name, contact person, phone, email or city.
    pub async fn search(&self, text: &str) -> DbResult<Vec<Supplier>> {
        debug!(text = %text, "Searching suppliers");
        let sql = format!(
            r"{SELECT_SUPPLIER}
            WHERE deleted_at IS NULL
              AND (name LIKE ?1 ESCAPE '\'
                   OR contact_person LIKE ?1 ESCAPE '\'
                   OR phone LIKE ?1 ESCAPE '\'
                   OR email LIKE ?1 ESCAPE '\'
                   OR city LIKE ?1 ESCAPE '\')
            ORDER BY name COLLATE NOCASE"
        );
        into_suppliers(
            sqlx::query_as::<_, SupplierRow>(&sql)
                .bind(like_pattern(text))
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn create(&self, input: &SupplierInput) -> DbResult<Supplier> {
        let now = Utc::now();
        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            contact_person: clean(&input.contact_person),
            phone: clean(&input.phone),
            email: clean(&input.email),
            address: clean(&input.address),
            city: clean(&input.city),
            categories: input.normalized_categories(),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %supplier.id, name = %supplier.name, "Creating supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, name, contact_person, phone, email, address, city, categories,
                deleted_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9, ?9)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(&supplier.city)
        .bind(encode_tags(&supplier.categories)?)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    pub async fn update(&self, id: &str, input: &SupplierInput) -> DbResult<Supplier> {
        debug!(id = %id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE suppliers
            SET name = ?2, contact_person = ?3, phone = ?4, email = ?5,
                address = ?6, city = ?7, categories = ?8, updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(clean(&input.contact_person))
        .bind(clean(&input.phone))
        .bind(clean(&input.email))
        .bind(clean(&input.address))
        .bind(clean(&input.city))
        .bind(encode_tags(&input.normalized_categories())?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    pub async fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> DbResult<()> {
        mark_deleted(&self.pool, "suppliers", "Supplier", id, at).await
    }

    pub async fn restore(&self, id: &str) -> DbResult<()> {
        mark_restored(&self.pool, "suppliers", "Supplier", id, Utc::now()).await
    }
}
