//! # POS Service
//!
//! Drives one cashier's checkout: product search, cart edits, totals and
//! sale submission.
//!
//! ## Submitting a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit_sale()                                                          │
//! │                                                                         │
//! │  lock ─► begin_submit(pricing) ─► unlock                                │
//! │            │ guard fails: customer, empty cart, negative paid           │
//! │            │ ─► ApiError, nothing changes                               │
//! │            ▼                                                            │
//! │  OrderGateway::create_sale_order(draft)      (no lock held)             │
//! │            │                                                            │
//! │     ok ────┴──── err                                                    │
//! │     │            │                                                      │
//! │  lock ─► complete     lock ─► fail("Failed to process sale")            │
//! │  receipt, cart reset   cart kept, error shown, no retry                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use shopdesk_core::order::{DeliveryDetails, Receipt, SalesPeriod, SalesStats};
use shopdesk_core::product::SaleableProduct;
use shopdesk_core::validation::{validate_bps, validate_price, validate_quantity, validate_search_query};
use shopdesk_core::{
    CartItem, CheckoutPhase, CoreError, CustomerRef, CustomerType, Discount, ExternalProduct, LineKey, Money,
    OrderTotals, PaymentMethod,
};

use crate::config::ShopConfig;
use crate::error::{ApiError, ErrorCode};
use crate::ports::{OrderGateway, ProductStore};
use crate::state::SessionState;

/// Shown when the backend refuses or fails to create the order.
pub const SALE_FAILED: &str = "Failed to process sale";

/// Shown when cart validation drops lines.
pub const ITEMS_REMOVED: &str = "Some items were removed from cart (no longer available)";

/// Rows returned by one product search.
const SEARCH_LIMIT: u32 = 50;

/// Snapshot of the checkout panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub totals: OrderTotals,
    pub phase: CheckoutPhase,
    pub customer: Option<CustomerRef>,
    pub last_error: Option<String>,
}

/// Result of re-checking the cart against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartValidation {
    pub removed: Vec<CartItem>,
    pub warning: Option<String>,
}

pub struct PosService {
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderGateway>,
    session: SessionState,
    config: Arc<ShopConfig>,
}

impl PosService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderGateway>,
        session: SessionState,
        config: Arc<ShopConfig>,
    ) -> Self {
        PosService {
            products,
            orders,
            session,
            config,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn search_products(&self, query: &str) -> Result<Vec<SaleableProduct>, ApiError> {
        let query = validate_search_query(query)?;
        debug!(query = %query, "search_products");
        Ok(self.products.search_for_sale(&query, SEARCH_LIMIT).await?)
    }

    /// Price of a variant for the session's current customer type.
    pub async fn price_for(&self, variant_id: &str) -> Result<Money, ApiError> {
        let customer_type = self.session.with_checkout(|c| c.customer_type());
        Ok(self.products.price_for(variant_id, customer_type).await?)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds a catalog product, merging with an existing line for the same
    /// product and variant. The product must still be sellable.
    pub async fn add_to_cart(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: i64,
    ) -> Result<CartView, ApiError> {
        validate_quantity(quantity)?;
        debug!(product_id = %product_id, variant_id = ?variant_id, quantity, "add_to_cart");

        let product = self
            .products
            .get_saleable(product_id, variant_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        self.edit(|c| c.add_product(&product, quantity))?;
        info!(product = %product.display_name(), quantity, "Added to cart");
        self.cart()
    }

    /// Adds an item that is not in the catalog. Always a new line.
    pub fn add_external_product(&self, product: ExternalProduct) -> Result<LineKey, ApiError> {
        let key = self.edit(|c| c.add_external(&product))?;
        info!(name = %product.name, price = %product.price, "Added external item");
        Ok(key)
    }

    /// Zero or less removes the line.
    pub fn update_quantity(&self, key: &LineKey, quantity: i64) -> Result<CartView, ApiError> {
        self.edit(|c| c.update_quantity(key, quantity))?;
        self.cart()
    }

    pub fn remove_from_cart(&self, key: &LineKey) -> Result<CartView, ApiError> {
        self.edit(|c| c.remove_item(key))?;
        self.cart()
    }

    pub fn clear_cart(&self) -> Result<(), ApiError> {
        self.edit(|c| c.clear())?;
        info!("Cart cleared");
        Ok(())
    }

    // =========================================================================
    // Sale Fields
    // =========================================================================

    pub fn select_customer(&self, customer: Option<CustomerRef>) -> Result<CheckoutPhase, ApiError> {
        self.edit(|c| c.select_customer(customer))?;
        Ok(self.session.with_checkout(|c| c.phase()))
    }

    pub fn set_customer_type(&self, customer_type: CustomerType) -> Result<(), ApiError> {
        self.edit(|c| c.set_customer_type(customer_type))
    }

    pub fn set_payment_method(&self, method: PaymentMethod) -> Result<(), ApiError> {
        self.edit(|c| c.set_payment_method(method))
    }

    /// `quote` replaces the flat delivery fee when the courier gave a price.
    pub fn set_delivery(&self, delivery: DeliveryDetails, quote: Option<Money>) -> Result<(), ApiError> {
        if let Some(quote) = quote {
            validate_price("shipping", quote)?;
        }
        self.edit(|c| c.set_delivery(delivery, quote))
    }

    pub fn set_discount(&self, discount: Discount) -> Result<(), ApiError> {
        match discount {
            Discount::Percentage(bps) => validate_bps("discount", bps)?,
            Discount::Fixed(amount) => validate_price("discount", amount)?,
            Discount::None => {}
        }
        self.edit(|c| c.set_discount(discount))
    }

    /// Negative amounts are accepted here and refused at submission.
    pub fn set_amount_paid(&self, amount: Money) -> Result<(), ApiError> {
        self.edit(|c| c.set_amount_paid(amount))
    }

    pub fn totals(&self) -> Result<OrderTotals, ApiError> {
        let pricing = self.config.pricing();
        Ok(self.session.with_checkout(|c| c.totals(pricing))?)
    }

    pub fn cart(&self) -> Result<CartView, ApiError> {
        let pricing = self.config.pricing();
        self.session.with_checkout(|c| -> Result<CartView, ApiError> {
            Ok(CartView {
                items: c.cart().items().to_vec(),
                totals: c.totals(pricing)?,
                phase: c.phase(),
                customer: c.customer().cloned(),
                last_error: c.last_error().map(str::to_string),
            })
        })
    }

    fn edit<T>(
        &self,
        f: impl FnOnce(&mut shopdesk_core::Checkout) -> Result<T, CoreError>,
    ) -> Result<T, ApiError> {
        self.session.with_checkout_mut(f).map_err(ApiError::from)
    }

    // =========================================================================
    // Cart Validation
    // =========================================================================

    /// Drops catalog lines whose product or variant is gone or deactivated.
    /// External lines are kept. A backend failure leaves the cart as it was.
    pub async fn validate_cart_items(&self) -> Result<CartValidation, ApiError> {
        let keys: Vec<LineKey> = self.session.with_checkout(|c| {
            c.cart()
                .items()
                .iter()
                .filter(|i| !i.is_external())
                .map(|i| i.key.clone())
                .collect()
        });

        let mut gone = HashSet::new();
        for key in keys {
            if let LineKey::Catalog {
                product_id,
                variant_id,
            } = &key
            {
                if !self
                    .products
                    .is_line_available(product_id, variant_id.as_deref())
                    .await?
                {
                    gone.insert(key);
                }
            }
        }

        if gone.is_empty() {
            return Ok(CartValidation::default());
        }

        let removed = self.edit(|c| c.retain_lines(|item| !gone.contains(&item.key)))?;
        warn!(removed = removed.len(), "Dropped unavailable cart lines");
        Ok(CartValidation {
            removed,
            warning: Some(ITEMS_REMOVED.to_string()),
        })
    }

    // =========================================================================
    // Submission
    // =========================================================================

    pub async fn submit_sale(&self) -> Result<Receipt, ApiError> {
        let pricing = self.config.pricing();
        let draft = self.edit(|c| c.begin_submit(pricing))?;

        debug!(
            customer_id = %draft.customer_id,
            lines = draft.lines.len(),
            total = %draft.totals.total,
            "submit_sale"
        );

        match self.orders.create_sale_order(&draft).await {
            Ok(order) => {
                let receipt = self.edit(|c| c.complete(&order, &self.config.store_name).cloned())?;
                info!(
                    order_number = %order.order_number,
                    total = %order.totals.total,
                    status = %order.status,
                    "Sale completed"
                );
                Ok(receipt)
            }
            Err(e) => {
                error!("Sale order creation failed: {}", e);
                self.edit(|c| c.fail(SALE_FAILED))?;
                Err(ApiError::new(ErrorCode::CheckoutFailed, SALE_FAILED))
            }
        }
    }

    pub async fn sales_stats(&self, period: SalesPeriod) -> Result<SalesStats, ApiError> {
        Ok(self.orders.sales_stats(period, Utc::now()).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
