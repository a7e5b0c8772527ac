//! # Adapters
//!
//! Port implementations over [`Database`], plus the logging messenger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use shopdesk_core::catalog::{Brand, BrandInput, Category, CategoryInput, Supplier, SupplierInput};
use shopdesk_core::customer::{Customer, CustomerInput, CustomerNote, MessageChannel};
use shopdesk_core::order::{SaleOrder, SaleOrderDraft, SalesPeriod, SalesStats};
use shopdesk_core::product::SaleableProduct;
use shopdesk_core::{CustomerType, Money};
use shopdesk_db::{Database, DbResult};

use crate::ports::{CatalogStore, CustomerStore, MessageError, Messenger, OrderGateway, ProductStore};

#[async_trait]
impl CustomerStore for Database {
    async fn list_customers(&self) -> DbResult<Vec<Customer>> {
        self.customers().list_all().await
    }

    async fn get_customer(&self, id: &str) -> DbResult<Option<Customer>> {
        self.customers().get_by_id(id).await
    }

    async fn create_customer(&self, input: &CustomerInput) -> DbResult<Customer> {
        self.customers().create(input).await
    }

    async fn update_customer(&self, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        self.customers().update(id, input).await
    }

    async fn mark_as_read(&self, id: &str) -> DbResult<()> {
        self.customers().mark_as_read(id).await
    }

    async fn check_in(&self, id: &str, points: i64) -> DbResult<Customer> {
        self.customers().check_in(id, points).await
    }

    async fn add_note(&self, id: &str, content: &str, created_by: Option<&str>) -> DbResult<CustomerNote> {
        self.customers().add_note(id, content, created_by).await
    }
}

/// One `CatalogStore` impl per record type, each forwarding to its repository.
macro_rules! catalog_store {
    ($record:ty, $input:ty, $repo:ident) => {
        #[async_trait]
        impl CatalogStore<$record> for Database {
            async fn list_active(&self) -> DbResult<Vec<$record>> {
                self.$repo().list_active().await
            }

            async fn list_all(&self) -> DbResult<Vec<$record>> {
                self.$repo().list_all().await
            }

            async fn get(&self, id: &str) -> DbResult<Option<$record>> {
                self.$repo().get_by_id(id).await
            }

            async fn search(&self, text: &str) -> DbResult<Vec<$record>> {
                self.$repo().search(text).await
            }

            async fn create(&self, input: &$input) -> DbResult<$record> {
                self.$repo().create(input).await
            }

            async fn update(&self, id: &str, input: &$input) -> DbResult<$record> {
                self.$repo().update(id, input).await
            }

            async fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> DbResult<()> {
                self.$repo().soft_delete(id, at).await
            }

            async fn restore(&self, id: &str) -> DbResult<()> {
                self.$repo().restore(id).await
            }
        }
    };
}

catalog_store!(Brand, BrandInput, brands);
catalog_store!(Category, CategoryInput, categories);
catalog_store!(Supplier, SupplierInput, suppliers);

#[async_trait]
impl ProductStore for Database {
    async fn search_for_sale(&self, query: &str, limit: u32) -> DbResult<Vec<SaleableProduct>> {
        self.products().search_for_sale(query, limit).await
    }

    async fn get_saleable(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> DbResult<Option<SaleableProduct>> {
        self.products().get_saleable(product_id, variant_id).await
    }

    async fn is_line_available(&self, product_id: &str, variant_id: Option<&str>) -> DbResult<bool> {
        self.products().is_line_available(product_id, variant_id).await
    }

    async fn price_for(&self, variant_id: &str, customer_type: CustomerType) -> DbResult<Money> {
        self.products().price_for(variant_id, customer_type).await
    }
}

#[async_trait]
impl OrderGateway for Database {
    async fn create_sale_order(&self, draft: &SaleOrderDraft) -> DbResult<SaleOrder> {
        self.orders().create_sale_order(draft).await
    }

    async fn sales_stats(&self, period: SalesPeriod, now: DateTime<Utc>) -> DbResult<SalesStats> {
        self.orders().sales_stats(period, now).await
    }
}

/// Messenger that only logs. Real SMS / WhatsApp delivery lives outside
/// this workspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMessenger;

#[async_trait]
impl Messenger for LogMessenger {
    async fn send(&self, channel: MessageChannel, to: &str, text: &str) -> Result<(), MessageError> {
        if to.trim().is_empty() {
            return Err(MessageError::Rejected("no recipient".to_string()));
        }
        info!(%channel, to = %to, chars = text.chars().count(), "Message queued");
        Ok(())
    }
}
