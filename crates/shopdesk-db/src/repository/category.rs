//! # Category Repository
//!
//! Product categories with an optional parent and a badge colour.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::{clean, like_pattern, mark_deleted, mark_restored};
use crate::error::{DbError, DbResult};
use shopdesk_core::catalog::{Category, CategoryInput};
use shopdesk_core::RecordStatus;

const SELECT_CATEGORY: &str = r#"
    SELECT id, name, description, color, parent_id, deleted_at, created_at, updated_at
    FROM categories
"#;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    description: Option<String>,
    color: Option<String>,
    parent_id: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
            color: row.color,
            parent_id: row.parent_id,
            status: RecordStatus::from_deleted_at(row.deleted_at),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn list_active(&self) -> DbResult<Vec<Category>> {
        let sql = format!("{SELECT_CATEGORY} WHERE deleted_at IS NULL ORDER BY name COLLATE NOCASE");
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn list_all(&self) -> DbResult<Vec<Category>> {
        let sql = format!("{SELECT_CATEGORY} ORDER BY name COLLATE NOCASE");
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let sql = format!("{SELECT_CATEGORY} WHERE id = ?1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Category::from))
    }

    pub async fn search(&self, text: &str) -> DbResult<Vec<Category>> {
        debug!(text = %text, "Searching categories");
        let sql = format!(
            r"{SELECT_CATEGORY}
            WHERE deleted_at IS NULL
              AND (name LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\')
            ORDER BY name COLLATE NOCASE"
        );
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(like_pattern(text))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn create(&self, input: &CategoryInput) -> DbResult<Category> {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            description: clean(&input.description),
            color: clean(&input.color),
            parent_id: clean(&input.parent_id),
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %category.id, name = %category.name, "Creating category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, color, parent_id, deleted_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?6)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.color)
        .bind(&category.parent_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_name(e, &category.name))?;

        Ok(category)
    }

    pub async fn update(&self, id: &str, input: &CategoryInput) -> DbResult<Category> {
        let name = input.name.trim().to_string();
        let parent_id = clean(&input.parent_id);
        if parent_id.as_deref() == Some(id) {
            return Err(DbError::ForeignKeyViolation {
                message: "a category cannot be its own parent".to_string(),
            });
        }

        debug!(id = %id, name = %name, "Updating category");

        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = ?2, description = ?3, color = ?4, parent_id = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(clean(&input.description))
        .bind(clean(&input.color))
        .bind(&parent_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| unique_name(e, &name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    pub async fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> DbResult<()> {
        mark_deleted(&self.pool, "categories", "Category", id, at).await
    }

    pub async fn restore(&self, id: &str) -> DbResult<()> {
        mark_restored(&self.pool, "categories", "Category", id, Utc::now()).await
    }
}

fn unique_name(err: sqlx::Error, name: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("category name", name),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;

    fn input(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.into(),
            color: Some("#3b82f6".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_parent_child() {
        let db = memory_db().await;
        let repo = db.categories();

        let phones = repo.create(&input("Phones")).await.unwrap();
        let child = repo
            .create(&CategoryInput {
                parent_id: Some(phones.id.clone()),
                ..input("Smartphones")
            })
            .await
            .unwrap();

        let loaded = repo.get_by_id(&child.id).await.unwrap().unwrap();
        assert_eq!(loaded.parent_id.as_deref(), Some(phones.id.as_str()));

        let err = repo
            .update(
                &phones.id,
                &CategoryInput {
                    parent_id: Some(phones.id.clone()),
                    ..input("Phones")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_parent_rejected() {
        let db = memory_db().await;
        let err = db
            .categories()
            .create(&CategoryInput {
                parent_id: Some("nope".into()),
                ..input("Orphans")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_active_and_search() {
        let db = memory_db().await;
        let repo = db.categories();

        let cables = repo.create(&input("Cables")).await.unwrap();
        repo.soft_delete(&cables.id, Utc::now()).await.unwrap();

        assert!(repo.list_active().await.unwrap().is_empty());
        assert!(repo.search("cab").await.unwrap().is_empty());

        let all = repo.list_all().await.unwrap();
        assert!(!all[0].status.is_active());

        repo.restore(&cables.id).await.unwrap();
        assert_eq!(repo.search("cab").await.unwrap().len(), 1);
    }
}
