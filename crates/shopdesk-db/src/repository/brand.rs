//! # Brand Repository
//!
//! Brands are soft-deleted: `deleted_at` is set and the row stays so old
//! products keep their brand. `list_active` hides them, `list_all` does not.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::{clean, decode_tags, encode_tags, like_pattern, mark_deleted, mark_restored};
use crate::error::{DbError, DbResult};
use shopdesk_core::catalog::{Brand, BrandInput};
use shopdesk_core::RecordStatus;

const SELECT_BRAND: &str = r#"
    SELECT id, name, description, website, categories, deleted_at, created_at, updated_at
    FROM brands
"#;

#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    id: String,
    name: String,
    description: Option<String>,
    website: Option<String>,
    categories: String,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BrandRow> for Brand {
    type Error = DbError;

    fn try_from(row: BrandRow) -> DbResult<Self> {
        Ok(Brand {
            categories: decode_tags(&row.categories)?,
            id: row.id,
            name: row.name,
            description: row.description,
            website: row.website,
            status: RecordStatus::from_deleted_at(row.deleted_at),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for brand database operations.
#[derive(Debug, Clone)]
pub struct BrandRepository {
    pool: SqlitePool,
}

impl BrandRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BrandRepository { pool }
    }

    async fn fetch(&self, sql: &str, bind: Option<&str>) -> DbResult<Vec<Brand>> {
        let mut query = sqlx::query_as::<_, BrandRow>(sql);
        if let Some(value) = bind {
            query = query.bind(value.to_string());
        }
        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Brand::try_from)
            .collect()
    }

    /// Brands that are not soft-deleted, by name.
    pub async fn list_active(&self) -> DbResult<Vec<Brand>> {
        let sql = format!("{SELECT_BRAND} WHERE deleted_at IS NULL ORDER BY name COLLATE NOCASE");
        self.fetch(&sql, None).await
    }

    /// Every brand including soft-deleted ones, by name.
    pub async fn list_all(&self) -> DbResult<Vec<Brand>> {
        let sql = format!("{SELECT_BRAND} ORDER BY name COLLATE NOCASE");
        self.fetch(&sql, None).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Brand>> {
        let sql = format!("{SELECT_BRAND} WHERE id = ?1");
        Ok(self.fetch(&sql, Some(id)).await?.into_iter().next())
    }

    /// Active brands whose name or description contains `text`.
    pub async fn search(&self, text: &str) -> DbResult<Vec<Brand>> {
        debug!(text = %text, "Searching brands");
        let sql = format!(
            r"{SELECT_BRAND}
            WHERE deleted_at IS NULL
              AND (name LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\')
            ORDER BY name COLLATE NOCASE"
        );
        self.fetch(&sql, Some(&like_pattern(text))).await
    }

    /// Inserts a brand. The input must already be validated.
    pub async fn create(&self, input: &BrandInput) -> DbResult<Brand> {
        let now = Utc::now();
        let brand = Brand {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            description: clean(&input.description),
            website: clean(&input.website),
            categories: input.normalized_categories(),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %brand.id, name = %brand.name, "Creating brand");

        sqlx::query(
            r#"
            INSERT INTO brands (id, name, description, website, categories, deleted_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?6)
            "#,
        )
        .bind(&brand.id)
        .bind(&brand.name)
        .bind(&brand.description)
        .bind(&brand.website)
        .bind(encode_tags(&brand.categories)?)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_name(e, &brand.name))?;

        Ok(brand)
    }

    /// Replaces the editable fields. Soft-deleted brands can be edited too.
    pub async fn update(&self, id: &str, input: &BrandInput) -> DbResult<Brand> {
        let name = input.name.trim().to_string();
        debug!(id = %id, name = %name, "Updating brand");

        let result = sqlx::query(
            r#"
            UPDATE brands
            SET name = ?2, description = ?3, website = ?4, categories = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(clean(&input.description))
        .bind(clean(&input.website))
        .bind(encode_tags(&input.normalized_categories())?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| unique_name(e, &name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Brand", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Brand", id))
    }

    pub async fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> DbResult<()> {
        mark_deleted(&self.pool, "brands", "Brand", id, at).await
    }

    pub async fn restore(&self, id: &str) -> DbResult<()> {
        mark_restored(&self.pool, "brands", "Brand", id, Utc::now()).await
    }
}

fn unique_name(err: sqlx::Error, name: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("brand name", name),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;

    fn input(name: &str) -> BrandInput {
        BrandInput {
            name: name.into(),
            description: Some("  ".into()),
            website: None,
            categories: vec!["Phones".into(), " phones ".into(), "Tablets".into()],
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = memory_db().await;
        let repo = db.brands();

        let created = repo.create(&input(" Samsung ")).await.unwrap();
        assert_eq!(created.name, "Samsung");
        assert_eq!(created.description, None);
        assert_eq!(created.categories, vec!["Phones", "Tablets"]);

        let loaded = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.categories, created.categories);
        assert!(loaded.status.is_active());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = memory_db().await;
        let repo = db.brands();

        repo.create(&input("Apple")).await.unwrap();
        let err = repo.create(&input("apple")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore() {
        let db = memory_db().await;
        let repo = db.brands();

        let tecno = repo.create(&input("Tecno")).await.unwrap();
        repo.create(&input("Infinix")).await.unwrap();

        repo.soft_delete(&tecno.id, Utc::now()).await.unwrap();
        assert_eq!(repo.list_active().await.unwrap().len(), 1);
        assert_eq!(repo.list_all().await.unwrap().len(), 2);

        let err = repo.soft_delete(&tecno.id, Utc::now()).await.unwrap_err();
        assert!(err.is_not_found());

        repo.restore(&tecno.id).await.unwrap();
        assert_eq!(repo.list_active().await.unwrap().len(), 2);
        assert!(repo.restore(&tecno.id).await.is_err());
    }

    #[tokio::test]
    async fn test_update_and_search() {
        let db = memory_db().await;
        let repo = db.brands();

        let brand = repo.create(&input("Nokia")).await.unwrap();
        let edited = BrandInput {
            description: Some("Feature phones".into()),
            ..input("Nokia")
        };
        let updated = repo.update(&brand.id, &edited).await.unwrap();
        assert_eq!(updated.description.as_deref(), Some("Feature phones"));

        assert_eq!(repo.search("FEATURE").await.unwrap().len(), 1);
        assert!(repo.search("iphone").await.unwrap().is_empty());
        assert!(repo.update("missing", &edited).await.unwrap_err().is_not_found());
    }
}
