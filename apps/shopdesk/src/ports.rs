//! # Ports to the Data Layer
//!
//! The services never talk to SQLite directly; they go through these traits.
//! [`crate::adapters`] implements them for [`shopdesk_db::Database`], tests
//! swap in in-process fakes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PosService ───────► ProductStore   search, resolve, price by type      │
//! │      │      ───────► OrderGateway   create sale order, sales stats      │
//! │      │                                                                  │
//! │  CustomerService ──► CustomerStore  fetch, create, update, check-in     │
//! │      │           ──► Messenger      SMS / WhatsApp                      │
//! │      │                                                                  │
//! │  CatalogService ───► CatalogStore<Brand | Category | Supplier>          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store errors are [`DbError`]; every adapter is a thin pass-through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use shopdesk_core::catalog::{
    filter_brands, filter_records, Brand, BrandInput, CatalogFilter, CatalogKind, CatalogRecord,
    Category, CategoryInput, Supplier, SupplierInput,
};
use shopdesk_core::customer::{Customer, CustomerInput, CustomerNote, MessageChannel};
use shopdesk_core::order::{SaleOrder, SaleOrderDraft, SalesPeriod, SalesStats};
use shopdesk_core::product::SaleableProduct;
use shopdesk_core::validation::ValidationResult;
use shopdesk_core::{CustomerType, Money};
use shopdesk_db::DbResult;

// =============================================================================
// Customers
// =============================================================================

#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// All customers, newest first. Payments and notes are not loaded.
    async fn list_customers(&self) -> DbResult<Vec<Customer>>;

    async fn get_customer(&self, id: &str) -> DbResult<Option<Customer>>;

    async fn create_customer(&self, input: &CustomerInput) -> DbResult<Customer>;

    async fn update_customer(&self, id: &str, input: &CustomerInput) -> DbResult<Customer>;

    async fn mark_as_read(&self, id: &str) -> DbResult<()>;

    /// Awards `points` and returns the updated customer.
    async fn check_in(&self, id: &str, points: i64) -> DbResult<Customer>;

    async fn add_note(&self, id: &str, content: &str, created_by: Option<&str>) -> DbResult<CustomerNote>;
}

// =============================================================================
// Catalog
// =============================================================================

/// Ties a catalog record to its form payload and listing order.
pub trait CatalogEntity: CatalogRecord + Clone + Send + Sync + 'static {
    type Input: Send + Sync;

    const KIND: CatalogKind;

    fn validate(input: &Self::Input) -> ValidationResult<()>;

    /// The page view of `records` under `filter`.
    fn view(records: &[Self], filter: &CatalogFilter) -> Vec<Self> {
        filter_records(records, filter)
    }
}

impl CatalogEntity for Brand {
    type Input = BrandInput;
    const KIND: CatalogKind = CatalogKind::Brand;

    fn validate(input: &BrandInput) -> ValidationResult<()> {
        input.validate()
    }

    /// Popular brands first, then alphabetical.
    fn view(records: &[Self], filter: &CatalogFilter) -> Vec<Self> {
        filter_brands(records, filter)
    }
}

impl CatalogEntity for Category {
    type Input = CategoryInput;
    const KIND: CatalogKind = CatalogKind::Category;

    fn validate(input: &CategoryInput) -> ValidationResult<()> {
        input.validate()
    }
}

impl CatalogEntity for Supplier {
    type Input = SupplierInput;
    const KIND: CatalogKind = CatalogKind::Supplier;

    fn validate(input: &SupplierInput) -> ValidationResult<()> {
        input.validate()
    }
}

#[async_trait]
pub trait CatalogStore<E: CatalogEntity>: Send + Sync {
    async fn list_active(&self) -> DbResult<Vec<E>>;

    /// Including soft-deleted records.
    async fn list_all(&self) -> DbResult<Vec<E>>;

    async fn get(&self, id: &str) -> DbResult<Option<E>>;

    async fn search(&self, text: &str) -> DbResult<Vec<E>>;

    async fn create(&self, input: &E::Input) -> DbResult<E>;

    async fn update(&self, id: &str, input: &E::Input) -> DbResult<E>;

    async fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> DbResult<()>;

    async fn restore(&self, id: &str) -> DbResult<()>;
}

// =============================================================================
// Products & Orders
// =============================================================================

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn search_for_sale(&self, query: &str, limit: u32) -> DbResult<Vec<SaleableProduct>>;

    /// `None` when the product or variant is missing or inactive.
    async fn get_saleable(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> DbResult<Option<SaleableProduct>>;

    async fn is_line_available(&self, product_id: &str, variant_id: Option<&str>) -> DbResult<bool>;

    async fn price_for(&self, variant_id: &str, customer_type: CustomerType) -> DbResult<Money>;
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn create_sale_order(&self, draft: &SaleOrderDraft) -> DbResult<SaleOrder>;

    async fn sales_stats(&self, period: SalesPeriod, now: DateTime<Utc>) -> DbResult<SalesStats>;
}

// =============================================================================
// Messaging
// =============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Message rejected: {0}")]
    Rejected(String),

    #[error("Messaging service unavailable")]
    Unavailable,
}

/// Outbound SMS / WhatsApp.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, channel: MessageChannel, to: &str, text: &str) -> Result<(), MessageError>;
}
