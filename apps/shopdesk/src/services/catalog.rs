//! # Catalog Service
//!
//! Brands, categories and suppliers share one lifecycle:
//!
//! ```text
//!   create ──► Active ──soft_delete──► Deleted ──restore──► Active
//!                 │                       │
//!                 └── listed by default   └── listed with show_deleted
//! ```
//!
//! Deleted records keep their row and every reference to them.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shopdesk_core::catalog::CatalogFilter;
use shopdesk_core::validation::validate_search_query;
use shopdesk_core::SoftDelete;

use crate::error::ApiError;
use crate::ports::{CatalogEntity, CatalogStore};

/// Catalog operations over one store that serves every record type.
pub struct CatalogService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        CatalogService {
            store: self.store.clone(),
        }
    }
}

impl<S: ?Sized> CatalogService<S> {
    pub fn new(store: Arc<S>) -> Self {
        CatalogService { store }
    }

    /// Typed view over one record kind: `catalog.of::<Brand>().list(..)`.
    pub fn of<E: CatalogEntity>(&self) -> CatalogPage<'_, S, E>
    where
        S: CatalogStore<E>,
    {
        CatalogPage {
            store: &self.store,
            _entity: PhantomData,
        }
    }
}

/// The list page of one catalog record kind.
pub struct CatalogPage<'a, S: ?Sized, E> {
    store: &'a Arc<S>,
    _entity: PhantomData<E>,
}

impl<S, E> CatalogPage<'_, S, E>
where
    S: CatalogStore<E> + ?Sized,
    E: CatalogEntity,
{
    /// Active records, or every record when `filter.show_deleted` is set,
    /// narrowed by search text and category.
    pub async fn list(&self, filter: &CatalogFilter) -> Result<Vec<E>, ApiError> {
        let records = if filter.show_deleted {
            self.store.list_all().await?
        } else {
            self.store.list_active().await?
        };
        let view = E::view(&records, filter);
        debug!(kind = %E::KIND, total = records.len(), shown = view.len(), "list catalog");
        Ok(view)
    }

    pub async fn get(&self, id: &str) -> Result<E, ApiError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found(E::KIND.entity(), id))
    }

    /// Active records whose name matches `text`, for pickers.
    pub async fn search(&self, text: &str) -> Result<Vec<E>, ApiError> {
        let text = validate_search_query(text)?;
        Ok(self.store.search(&text).await?)
    }

    pub async fn create(&self, input: &E::Input) -> Result<E, ApiError> {
        E::validate(input)?;
        let record = self.store.create(input).await?;
        info!(kind = %E::KIND, id = %record.id(), name = %record.name(), "Created");
        Ok(record)
    }

    pub async fn update(&self, id: &str, input: &E::Input) -> Result<E, ApiError> {
        E::validate(input)?;
        Ok(self.store.update(id, input).await?)
    }

    /// Active → Deleted. Deleting twice is refused.
    pub async fn soft_delete(&self, id: &str) -> Result<E, ApiError> {
        let mut record = self.get(id).await?;
        let now = Utc::now();
        record.soft_delete(now)?;
        self.store.soft_delete(id, now).await?;
        info!(kind = %E::KIND, id = %id, "Soft deleted");
        Ok(record)
    }

    /// Deleted → Active. Restoring an active record is refused.
    pub async fn restore(&self, id: &str) -> Result<E, ApiError> {
        let mut record = self.get(id).await?;
        record.restore()?;
        self.store.restore(id).await?;
        info!(kind = %E::KIND, id = %id, "Restored");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::fakes::FakeBackend;
    use shopdesk_core::catalog::{Brand, BrandInput};

    fn brand(name: &str, category: &str) -> BrandInput {
        BrandInput {
            name: name.into(),
            categories: vec![category.into()],
            ..Default::default()
        }
    }

    async fn seeded() -> CatalogService<FakeBackend> {
        let catalog = CatalogService::new(Arc::new(FakeBackend::default()));
        for (name, category) in [("Tecno", "Phones"), ("Apple", "Phones"), ("Lenovo", "Laptops")] {
            catalog.of::<Brand>().create(&brand(name, category)).await.unwrap();
        }
        catalog
    }

    fn names(brands: &[Brand]) -> Vec<&str> {
        brands.iter().map(|b| b.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_brand_list_filters_by_category() {
        let catalog = seeded().await;
        let filter = CatalogFilter {
            category: Some("phones".into()),
            ..Default::default()
        };

        let view = catalog.of::<Brand>().list(&filter).await.unwrap();
        assert_eq!(view.len(), 2);
        assert!(names(&view).contains(&"Apple"));
        assert!(!names(&view).contains(&"Lenovo"));
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore() {
        let catalog = seeded().await;
        let brands = catalog.of::<Brand>();
        let lenovo = brands.search("lenovo").await.unwrap().remove(0);

        let deleted = brands.soft_delete(&lenovo.id).await.unwrap();
        assert!(!deleted.is_active());
        assert_eq!(brands.list(&CatalogFilter::default()).await.unwrap().len(), 2);

        let all = brands
            .list(&CatalogFilter {
                show_deleted: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let err = brands.soft_delete(&lenovo.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let restored = brands.restore(&lenovo.id).await.unwrap();
        assert!(restored.is_active());
        assert_eq!(brands.list(&CatalogFilter::default()).await.unwrap().len(), 3);

        let err = brands.restore(&lenovo.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_and_duplicate() {
        let catalog = seeded().await;
        let brands = catalog.of::<Brand>();

        let err = brands.create(&brand(" ", "Phones")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = brands.create(&brand("Apple", "Phones")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let catalog = seeded().await;
        let err = catalog.of::<Brand>().restore("nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message, "Brand not found: nope");
    }
}
