//! # Order Repository
//!
//! ## Creating a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale_order(draft)            one BEGIN IMMEDIATE transaction    │
//! │                                                                         │
//! │  1. next order number  SO-YYYYMMDD-NNNN (per-day counter)               │
//! │  2. INSERT sale_orders                                                  │
//! │  3. INSERT sale_order_items         one row per line, in cart order     │
//! │  4. UPDATE product_variants         stock -= quantity (floored at 0)    │
//! │  5. INSERT customer_payments        amount applied to the order         │
//! │     UPDATE customers.total_spent                                        │
//! │                                                                         │
//! │  any failure → rollback, nothing is written                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The amount applied is what was paid capped at the order total; the
//! rest is change handed back.
//!
//! The write lock is taken before the order number is counted, so
//! concurrent sales queue up instead of racing for the same number.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use super::customer::insert_payment;
use crate::error::{DbError, DbResult};
use shopdesk_core::order::{DeliveryDetails, SaleOrder, SaleOrderDraft, SaleOrderLine, SalesPeriod, SalesStats};
use shopdesk_core::{CustomerType, DeliveryMethod, Money, OrderStatus, OrderTotals, PaymentMethod};

const SELECT_ORDER: &str = r#"
    SELECT id, order_number, customer_id, customer_type,
           subtotal, discount, taxable_base, tax, shipping, total, amount_paid, balance,
           payment_method, delivery_method, delivery_address, delivery_city, delivery_notes,
           status, created_by, created_at
    FROM sale_orders
"#;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    customer_id: String,
    customer_type: CustomerType,
    subtotal: i64,
    discount: i64,
    taxable_base: i64,
    tax: i64,
    shipping: i64,
    total: i64,
    amount_paid: i64,
    balance: i64,
    payment_method: PaymentMethod,
    delivery_method: DeliveryMethod,
    delivery_address: Option<String>,
    delivery_city: Option<String>,
    delivery_notes: Option<String>,
    status: OrderStatus,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<SaleOrderLine>) -> SaleOrder {
        SaleOrder {
            id: self.id,
            order_number: self.order_number,
            customer_id: self.customer_id,
            customer_type: self.customer_type,
            lines,
            totals: OrderTotals {
                subtotal: Money::from_minor(self.subtotal),
                discount: Money::from_minor(self.discount),
                taxable_base: Money::from_minor(self.taxable_base),
                tax: Money::from_minor(self.tax),
                shipping: Money::from_minor(self.shipping),
                total: Money::from_minor(self.total),
                amount_paid: Money::from_minor(self.amount_paid),
                balance: Money::from_minor(self.balance),
            },
            payment_method: self.payment_method,
            delivery: DeliveryDetails {
                method: self.delivery_method,
                address: self.delivery_address,
                city: self.delivery_city,
                notes: self.delivery_notes,
            },
            status: self.status,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    product_id: Option<String>,
    variant_id: Option<String>,
    name: String,
    variant_label: Option<String>,
    quantity: i64,
    unit_price: i64,
    unit_cost: Option<i64>,
    line_total: i64,
    is_external: bool,
}

impl From<LineRow> for SaleOrderLine {
    fn from(row: LineRow) -> Self {
        SaleOrderLine {
            product_id: row.product_id,
            variant_id: row.variant_id,
            name: row.name,
            variant_label: row.variant_label,
            quantity: row.quantity,
            unit_price: Money::from_minor(row.unit_price),
            unit_cost: row.unit_cost.map(Money::from_minor),
            line_total: Money::from_minor(row.line_total),
            is_external: row.is_external,
        }
    }
}

/// Repository for sale orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Stores a submitted sale and everything that follows from it.
    pub async fn create_sale_order(&self, draft: &SaleOrderDraft) -> DbResult<SaleOrder> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let order = SaleOrder {
            id: Uuid::new_v4().to_string(),
            order_number: next_order_number(&mut tx, now).await?,
            customer_id: draft.customer_id.clone(),
            customer_type: draft.customer_type,
            lines: draft.lines.clone(),
            totals: draft.totals,
            payment_method: draft.payment_method,
            delivery: draft.delivery.clone(),
            status: draft.status,
            created_by: draft.created_by.clone(),
            created_at: now,
        };

        debug!(
            id = %order.id,
            order_number = %order.order_number,
            customer_id = %order.customer_id,
            lines = order.lines.len(),
            total = %order.totals.total,
            "Creating sale order"
        );

        let t = &order.totals;
        sqlx::query(
            r#"
            INSERT INTO sale_orders (
                id, order_number, customer_id, customer_type,
                subtotal, discount, taxable_base, tax, shipping, total, amount_paid, balance,
                payment_method, delivery_method, delivery_address, delivery_city, delivery_notes,
                status, created_by, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.customer_id)
        .bind(order.customer_type)
        .bind(t.subtotal.minor())
        .bind(t.discount.minor())
        .bind(t.taxable_base.minor())
        .bind(t.tax.minor())
        .bind(t.shipping.minor())
        .bind(t.total.minor())
        .bind(t.amount_paid.minor())
        .bind(t.balance.minor())
        .bind(order.payment_method)
        .bind(order.delivery.method)
        .bind(&order.delivery.address)
        .bind(&order.delivery.city)
        .bind(&order.delivery.notes)
        .bind(order.status)
        .bind(&order.created_by)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::ForeignKeyViolation { .. } => DbError::not_found("Customer", &order.customer_id),
            other => other,
        })?;

        for (position, line) in order.lines.iter().enumerate() {
            insert_line(&mut tx, &order.id, position, line).await?;
        }

        let applied = t.amount_paid.max_zero().capped_at(t.total);
        if applied.is_positive() {
            insert_payment(
                &mut tx,
                &order.customer_id,
                applied,
                order.payment_method,
                Some(&order.id),
                now,
            )
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_number = %order.order_number,
            status = %order.status,
            "Sale order created"
        );
        Ok(order)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleOrder>> {
        let sql = format!("{SELECT_ORDER} WHERE id = ?1");
        let Some(row) = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let lines = self.lines_for(&row.id).await?;
        Ok(Some(row.into_order(lines)))
    }

    /// Orders created at or after `since` (all orders for `None`), newest first.
    pub async fn list_since(&self, since: Option<DateTime<Utc>>) -> DbResult<Vec<SaleOrder>> {
        let sql = format!("{SELECT_ORDER} WHERE (?1 IS NULL OR created_at >= ?1) ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.lines_for(&row.id).await?;
            orders.push(row.into_order(lines));
        }
        Ok(orders)
    }

    async fn lines_for(&self, order_id: &str) -> DbResult<Vec<SaleOrderLine>> {
        let rows = sqlx::query_as::<_, LineRow>(
            r#"
            SELECT product_id, variant_id, name, variant_label, quantity,
                   unit_price, unit_cost, line_total, is_external
            FROM sale_order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(SaleOrderLine::from).collect())
    }

    /// Moves an order along (delivered, cancelled, ...).
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE sale_orders SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale order", id));
        }
        Ok(())
    }

    /// Count, revenue and items sold in `period`, cancelled orders excluded.
    pub async fn sales_stats(&self, period: SalesPeriod, now: DateTime<Utc>) -> DbResult<SalesStats> {
        let since = period.start(now);
        debug!(?period, since = ?since, "Computing sales stats");

        let (count, revenue, items): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(o.total), 0),
                   COALESCE(SUM((SELECT SUM(i.quantity) FROM sale_order_items i WHERE i.order_id = o.id)), 0)
            FROM sale_orders o
            WHERE o.status != ?1
              AND (?2 IS NULL OR o.created_at >= ?2)
            "#,
        )
        .bind(OrderStatus::Cancelled)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesStats::new(count, Money::from_minor(revenue), items))
    }
}

async fn next_order_number(tx: &mut Transaction<'_, Sqlite>, now: DateTime<Utc>) -> DbResult<String> {
    let prefix = format!("SO-{}-", now.format("%Y%m%d"));
    let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_orders WHERE order_number LIKE ?1")
        .bind(format!("{prefix}%"))
        .fetch_one(&mut **tx)
        .await?;
    Ok(format!("{prefix}{:04}", taken + 1))
}

async fn insert_line(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: &str,
    position: usize,
    line: &SaleOrderLine,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_order_items (
            id, order_id, position, product_id, variant_id, name, variant_label,
            quantity, unit_price, unit_cost, line_total, is_external
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(order_id)
    .bind(i64::try_from(position).unwrap_or(i64::MAX))
    .bind(&line.product_id)
    .bind(&line.variant_id)
    .bind(&line.name)
    .bind(&line.variant_label)
    .bind(line.quantity)
    .bind(line.unit_price.minor())
    .bind(line.unit_cost.map(|c| c.minor()))
    .bind(line.line_total.minor())
    .bind(line.is_external)
    .execute(&mut **tx)
    .await?;

    if let Some(variant_id) = &line.variant_id {
        sqlx::query(
            "UPDATE product_variants SET stock_quantity = MAX(stock_quantity - ?2, 0) WHERE id = ?1",
        )
        .bind(variant_id)
        .bind(line.quantity)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::generate_product_id;
    use crate::repository::test_support::memory_db;
    use crate::{Database, DbConfig};
    use shopdesk_core::customer::CustomerInput;
    use shopdesk_core::product::{Product, ProductVariant};
    use shopdesk_core::totals::PricingParams;

    async fn customer(db: &Database) -> String {
        db.customers()
            .create(&CustomerInput {
                name: "Baraka".into(),
                phone: "0754000111".into(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn variant(db: &Database, stock: i64) -> ProductVariant {
        let product = Product {
            id: generate_product_id(),
            name: "USB-C Charger".into(),
            brand_id: None,
            category_id: None,
            description: None,
            is_active: true,
            created_at: Utc::now(),
        };
        let variant = ProductVariant {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            name: "25W".into(),
            sku: None,
            selling_price: Money::from_minor(25_000),
            wholesale_price: None,
            cost_price: Some(Money::from_minor(15_000)),
            stock_quantity: stock,
            is_active: true,
        };
        db.products()
            .insert(&product, std::slice::from_ref(&variant))
            .await
            .unwrap();
        variant
    }

    fn draft(customer_id: &str, variant: &ProductVariant, qty: i64, paid: i64) -> SaleOrderDraft {
        let line = SaleOrderLine {
            product_id: Some(variant.product_id.clone()),
            variant_id: Some(variant.id.clone()),
            name: "USB-C Charger".into(),
            variant_label: Some(variant.name.clone()),
            quantity: qty,
            unit_price: variant.selling_price,
            unit_cost: variant.cost_price,
            line_total: variant.selling_price.multiply_quantity(qty).unwrap(),
            is_external: false,
        };
        let params = PricingParams {
            amount_paid: Money::from_minor(paid),
            ..Default::default()
        };
        let totals = OrderTotals::from_subtotal(line.line_total, &params).unwrap();
        SaleOrderDraft {
            customer_id: customer_id.to_string(),
            customer_type: CustomerType::Retail,
            lines: vec![line],
            status: shopdesk_core::order::initial_status(&totals, PaymentMethod::Cash),
            totals,
            payment_method: PaymentMethod::Cash,
            delivery: DeliveryDetails::default(),
            created_by: Some("cashier-1".into()),
        }
    }

    #[tokio::test]
    async fn test_create_sale_order_writes_everything() {
        let db = memory_db().await;
        let customer_id = customer(&db).await;
        let v = variant(&db, 10).await;

        // 2 × 25,000 = 50,000 + 16% = 58,000; paid 60,000
        let order = db
            .orders()
            .create_sale_order(&draft(&customer_id, &v, 2, 60_000))
            .await
            .unwrap();

        assert!(order.order_number.starts_with("SO-"));
        assert!(order.order_number.ends_with("-0001"));
        assert_eq!(order.status, OrderStatus::Completed);

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.lines, order.lines);
        assert_eq!(stored.totals.total.minor(), 58_000);

        let stock = db.products().get_variant(&v.id).await.unwrap().unwrap();
        assert_eq!(stock.stock_quantity, 8);

        let c = db.customers().get_by_id(&customer_id).await.unwrap().unwrap();
        assert_eq!(c.spent().minor(), 58_000);
        assert_eq!(c.payments[0].order_id.as_deref(), Some(order.id.as_str()));
    }

    #[tokio::test]
    async fn test_order_numbers_increment_per_day() {
        let db = memory_db().await;
        let customer_id = customer(&db).await;
        let v = variant(&db, 1).await;

        let first = db
            .orders()
            .create_sale_order(&draft(&customer_id, &v, 1, 0))
            .await
            .unwrap();
        let second = db
            .orders()
            .create_sale_order(&draft(&customer_id, &v, 1, 0))
            .await
            .unwrap();

        assert!(second.order_number.ends_with("-0002"));
        assert_ne!(first.order_number, second.order_number);
        assert_eq!(first.status, OrderStatus::Pending);

        let stock = db.products().get_variant(&v.id).await.unwrap().unwrap();
        assert_eq!(stock.stock_quantity, 0);

        let c = db.customers().get_by_id(&customer_id).await.unwrap().unwrap();
        assert!(c.payments.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_get_distinct_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("shop.db")).max_connections(5))
            .await
            .unwrap();
        let customer_id = customer(&db).await;
        let v = variant(&db, 100).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let orders = db.orders();
                let draft = draft(&customer_id, &v, 1, 0);
                tokio::spawn(async move { orders.create_sale_order(&draft).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap().unwrap().order_number);
        }
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 8);
        assert!(numbers[7].ends_with("-0008"));

        let stock = db.products().get_variant(&v.id).await.unwrap().unwrap();
        assert_eq!(stock.stock_quantity, 92);
    }

    #[tokio::test]
    async fn test_unknown_customer_rolls_back() {
        let db = memory_db().await;
        let v = variant(&db, 5).await;

        let err = db
            .orders()
            .create_sale_order(&draft("ghost", &v, 1, 0))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        assert!(db.orders().list_since(None).await.unwrap().is_empty());
        let stock = db.products().get_variant(&v.id).await.unwrap().unwrap();
        assert_eq!(stock.stock_quantity, 5);
    }

    #[tokio::test]
    async fn test_sales_stats_skip_cancelled() {
        let db = memory_db().await;
        let customer_id = customer(&db).await;
        let v = variant(&db, 50).await;
        let orders = db.orders();

        let kept = orders
            .create_sale_order(&draft(&customer_id, &v, 2, 0))
            .await
            .unwrap();
        let dropped = orders
            .create_sale_order(&draft(&customer_id, &v, 5, 0))
            .await
            .unwrap();
        orders
            .update_status(&dropped.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        let stats = orders.sales_stats(SalesPeriod::Today, Utc::now()).await.unwrap();
        assert_eq!(stats.total_sales, 1);
        assert_eq!(stats.total_revenue, kept.totals.total);
        assert_eq!(stats.total_items, 2);

        let all = orders.list_since(None).await.unwrap();
        assert_eq!(stats, SalesStats::from_orders(&all));
    }
}
