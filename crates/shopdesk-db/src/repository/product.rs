//! # Product Repository
//!
//! Products are sold through their variants: every product has at least
//! one row in `product_variants` carrying price, cost and stock.
//!
//! ## Sale Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier types: "a15"                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LIKE '%a15%' over product name, variant name, SKU, brand name          │
//! │  (active products AND active variants only)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  one SaleableProduct per variant                                        │
//! │  ┌──────────────────────────────┬──────────┬───────────┬──────────┐    │
//! │  │ Galaxy A15 (128GB Blue)      │ SAMSUNG  │ 520,000   │ stock 4  │    │
//! │  │ Galaxy A15 (256GB Black)     │ SAMSUNG  │ 610,000   │ stock 0  │    │
//! │  └──────────────────────────────┴──────────┴───────────┴──────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An empty query lists the catalog alphabetically. LIKE is plenty for a
//! shop-sized catalog.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::like_pattern;
use crate::error::{DbError, DbResult};
use shopdesk_core::product::{Product, ProductVariant, SaleableProduct};
use shopdesk_core::{CustomerType, Money};

/// Variant name used when a product has no real variants.
pub const DEFAULT_VARIANT_NAME: &str = "Default";

const SELECT_SALEABLE: &str = r#"
    SELECT p.id  AS product_id,
           v.id  AS variant_id,
           p.name,
           v.name AS variant_name,
           b.name AS brand_name,
           v.sku,
           v.selling_price,
           v.wholesale_price,
           v.cost_price,
           v.stock_quantity
    FROM product_variants v
    INNER JOIN products p ON p.id = v.product_id
    LEFT JOIN brands b ON b.id = p.brand_id
    WHERE p.is_active = 1 AND v.is_active = 1
"#;

#[derive(Debug, sqlx::FromRow)]
struct SaleableRow {
    product_id: String,
    variant_id: String,
    name: String,
    variant_name: String,
    brand_name: Option<String>,
    sku: Option<String>,
    selling_price: i64,
    wholesale_price: Option<i64>,
    cost_price: Option<i64>,
    stock_quantity: i64,
}

impl From<SaleableRow> for SaleableProduct {
    fn from(row: SaleableRow) -> Self {
        let label = row.variant_name.trim();
        let variant_label = (!label.is_empty() && !label.eq_ignore_ascii_case(DEFAULT_VARIANT_NAME))
            .then(|| label.to_string());

        SaleableProduct {
            product_id: row.product_id,
            variant_id: Some(row.variant_id),
            name: row.name,
            variant_label,
            brand_name: row.brand_name,
            sku: row.sku,
            selling_price: Money::from_minor(row.selling_price),
            wholesale_price: row.wholesale_price.map(Money::from_minor),
            cost_price: row.cost_price.map(Money::from_minor),
            stock_quantity: row.stock_quantity,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    brand_id: Option<String>,
    category_id: Option<String>,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            brand_id: row.brand_id,
            category_id: row.category_id,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: String,
    product_id: String,
    name: String,
    sku: Option<String>,
    selling_price: i64,
    wholesale_price: Option<i64>,
    cost_price: Option<i64>,
    stock_quantity: i64,
    is_active: bool,
}

impl From<VariantRow> for ProductVariant {
    fn from(row: VariantRow) -> Self {
        ProductVariant {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            sku: row.sku,
            selling_price: Money::from_minor(row.selling_price),
            wholesale_price: row.wholesale_price.map(Money::from_minor),
            cost_price: row.cost_price.map(Money::from_minor),
            stock_quantity: row.stock_quantity,
            is_active: row.is_active,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let hits = db.products().search_for_sale("a15", 20).await?;
/// let price = db.products().price_for(&variant_id, CustomerType::Wholesale).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Sellable variants matching `query`, at most `limit`.
    pub async fn search_for_sale(&self, query: &str, limit: u32) -> DbResult<Vec<SaleableProduct>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching products for sale");

        let sql = format!(
            r"{SELECT_SALEABLE}
              AND (?1 = ''
                   OR p.name LIKE ?2 ESCAPE '\'
                   OR v.name LIKE ?2 ESCAPE '\'
                   OR v.sku LIKE ?2 ESCAPE '\'
                   OR b.name LIKE ?2 ESCAPE '\')
            ORDER BY p.name COLLATE NOCASE, v.name COLLATE NOCASE
            LIMIT ?3"
        );

        let rows = sqlx::query_as::<_, SaleableRow>(&sql)
            .bind(query)
            .bind(like_pattern(query))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned products");
        Ok(rows.into_iter().map(SaleableProduct::from).collect())
    }

    /// The sellable line for a product, or `None` if the product or the
    /// variant is missing or inactive. Without a variant id the product's
    /// first active variant is used.
    pub async fn get_saleable(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> DbResult<Option<SaleableProduct>> {
        let sql = format!(
            "{SELECT_SALEABLE} AND p.id = ?1 AND (?2 IS NULL OR v.id = ?2) ORDER BY v.rowid LIMIT 1"
        );
        let row = sqlx::query_as::<_, SaleableRow>(&sql)
            .bind(product_id)
            .bind(variant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(SaleableProduct::from))
    }

    /// True if the cart line still resolves to an active product/variant.
    pub async fn is_line_available(&self, product_id: &str, variant_id: Option<&str>) -> DbResult<bool> {
        Ok(self.get_saleable(product_id, variant_id).await?.is_some())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, brand_id, category_id, description, is_active, created_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    pub async fn get_variant(&self, id: &str) -> DbResult<Option<ProductVariant>> {
        let row = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, product_id, name, sku, selling_price, wholesale_price,
                   cost_price, stock_quantity, is_active
            FROM product_variants
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ProductVariant::from))
    }

    pub async fn list_variants(&self, product_id: &str) -> DbResult<Vec<ProductVariant>> {
        let rows = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, product_id, name, sku, selling_price, wholesale_price,
                   cost_price, stock_quantity, is_active
            FROM product_variants
            WHERE product_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProductVariant::from).collect())
    }

    /// Unit price of a variant for the given customer type. Inactive
    /// variants, or variants of inactive products, are not found.
    pub async fn price_for(&self, variant_id: &str, customer_type: CustomerType) -> DbResult<Money> {
        let sql = format!("{SELECT_SALEABLE} AND v.id = ?1");
        let row = sqlx::query_as::<_, SaleableRow>(&sql)
            .bind(variant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product variant", variant_id))?;
        Ok(SaleableProduct::from(row).price_for(customer_type))
    }

    /// Inserts a product and its variants in one transaction.
    ///
    /// A product without variants gets no rows in `product_variants` and
    /// so never shows up in sale search.
    pub async fn insert(&self, product: &Product, variants: &[ProductVariant]) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, variants = variants.len(), "Inserting product");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, brand_id, category_id, description, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.brand_id)
        .bind(&product.category_id)
        .bind(&product.description)
        .bind(product.is_active)
        .bind(product.created_at)
        .execute(&mut *tx)
        .await?;

        for variant in variants {
            sqlx::query(
                r#"
                INSERT INTO product_variants (
                    id, product_id, name, sku, selling_price, wholesale_price,
                    cost_price, stock_quantity, is_active
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&variant.id)
            .bind(&product.id)
            .bind(&variant.name)
            .bind(&variant.sku)
            .bind(variant.selling_price.minor())
            .bind(variant.wholesale_price.map(|m| m.minor()))
            .bind(variant.cost_price.map(|m| m.minor()))
            .bind(variant.stock_quantity)
            .bind(variant.is_active)
            .execute(&mut *tx)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => {
                    DbError::duplicate("sku", variant.sku.clone().unwrap_or_default())
                }
                other => other,
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Hides or re-lists a product in sale search.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// New product id.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use crate::Database;

    fn variant(product_id: &str, name: &str, sku: &str, price: i64) -> ProductVariant {
        ProductVariant {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            name: name.to_string(),
            sku: Some(sku.to_string()),
            selling_price: Money::from_minor(price),
            wholesale_price: Some(Money::from_minor(price - 20_000)),
            cost_price: Some(Money::from_minor(price - 50_000)),
            stock_quantity: 4,
            is_active: true,
        }
    }

    async fn seed_phone(db: &Database) -> (Product, Vec<ProductVariant>) {
        let product = Product {
            id: generate_product_id(),
            name: "Galaxy A15".into(),
            brand_id: None,
            category_id: None,
            description: None,
            is_active: true,
            created_at: Utc::now(),
        };
        let variants = vec![
            variant(&product.id, "128GB Blue", "SM-A15-128", 520_000),
            variant(&product.id, "256GB Black", "SM-A15-256", 610_000),
        ];
        db.products().insert(&product, &variants).await.unwrap();
        (product, variants)
    }

    #[tokio::test]
    async fn test_search_for_sale() {
        let db = memory_db().await;
        seed_phone(&db).await;
        let repo = db.products();

        let hits = repo.search_for_sale("a15", 20).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].display_name(), "Galaxy A15 (128GB Blue)");

        assert_eq!(repo.search_for_sale("sm-a15-256", 20).await.unwrap().len(), 1);
        assert_eq!(repo.search_for_sale("", 1).await.unwrap().len(), 1);
        assert!(repo.search_for_sale("iphone", 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_price_by_customer_type() {
        let db = memory_db().await;
        let (_, variants) = seed_phone(&db).await;
        let repo = db.products();

        let retail = repo.price_for(&variants[0].id, CustomerType::Retail).await.unwrap();
        let wholesale = repo
            .price_for(&variants[0].id, CustomerType::Wholesale)
            .await
            .unwrap();
        assert_eq!(retail.minor(), 520_000);
        assert_eq!(wholesale.minor(), 500_000);

        assert!(repo
            .price_for("missing", CustomerType::Retail)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_inactive_variants_have_no_price() {
        let db = memory_db().await;
        let (product, variants) = seed_phone(&db).await;
        let repo = db.products();

        sqlx::query("UPDATE product_variants SET is_active = 0 WHERE id = ?1")
            .bind(&variants[0].id)
            .execute(db.pool())
            .await
            .unwrap();
        assert!(repo
            .price_for(&variants[0].id, CustomerType::Retail)
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(
            repo.price_for(&variants[1].id, CustomerType::Retail)
                .await
                .unwrap()
                .minor(),
            610_000
        );

        repo.set_active(&product.id, false).await.unwrap();
        assert!(repo
            .price_for(&variants[1].id, CustomerType::Wholesale)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_line_availability_follows_active_flag() {
        let db = memory_db().await;
        let (product, variants) = seed_phone(&db).await;
        let repo = db.products();

        assert!(repo
            .is_line_available(&product.id, Some(&variants[1].id))
            .await
            .unwrap());
        assert!(repo.is_line_available(&product.id, None).await.unwrap());
        assert!(!repo.is_line_available(&product.id, Some("nope")).await.unwrap());

        repo.set_active(&product.id, false).await.unwrap();
        assert!(!repo.is_line_available(&product.id, None).await.unwrap());
        assert!(repo.search_for_sale("", 20).await.unwrap().is_empty());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rolls_back_product() {
        let db = memory_db().await;
        seed_phone(&db).await;

        let product = Product {
            id: generate_product_id(),
            name: "Clone".into(),
            brand_id: None,
            category_id: None,
            description: None,
            is_active: true,
            created_at: Utc::now(),
        };
        let dup = variant(&product.id, DEFAULT_VARIANT_NAME, "SM-A15-128", 100_000);
        let err = db.products().insert(&product, &[dup]).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(db.products().get_by_id(&product.id).await.unwrap().is_none());
    }
}
