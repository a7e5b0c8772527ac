//! # Sale Orders
//!
//! What checkout hands to the backend, what comes back, and the receipt
//! printed from it.
//!
//! ## Order Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout::begin_submit ──► SaleOrderDraft ──► backend create          │
//! │                                                    │                    │
//! │                                                    ▼                    │
//! │  Receipt ◄── Checkout::complete ◄────────────── SaleOrder              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines use the snapshot pattern: name, price and cost are frozen on the
//! order so later catalog edits do not rewrite history.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{CartItem, LineKey};
use crate::error::CoreError;
use crate::money::Money;
use crate::totals::OrderTotals;
use crate::types::{CustomerType, DeliveryMethod, OrderStatus, PaymentMethod};

// =============================================================================
// Delivery
// =============================================================================

/// Where and how the goods go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryDetails {
    pub method: DeliveryMethod,
    pub address: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Draft
// =============================================================================

/// A frozen order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleOrderLine {
    /// `None` for ad-hoc items.
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub name: String,
    pub variant_label: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_cost: Option<Money>,
    pub line_total: Money,
    pub is_external: bool,
}

impl TryFrom<&CartItem> for SaleOrderLine {
    type Error = CoreError;

    fn try_from(item: &CartItem) -> Result<Self, CoreError> {
        let (product_id, variant_id) = match &item.key {
            LineKey::Catalog {
                product_id,
                variant_id,
            } => (Some(product_id.clone()), variant_id.clone()),
            LineKey::External { .. } => (None, None),
        };
        Ok(SaleOrderLine {
            product_id,
            variant_id,
            name: item.name.clone(),
            variant_label: item.variant_label.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            unit_cost: item.unit_cost,
            line_total: item.line_total()?,
            is_external: item.is_external(),
        })
    }
}

/// The order as sent to the backend for creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleOrderDraft {
    pub customer_id: String,
    pub customer_type: CustomerType,
    pub lines: Vec<SaleOrderLine>,
    pub totals: OrderTotals,
    pub payment_method: PaymentMethod,
    pub delivery: DeliveryDetails,
    pub status: OrderStatus,
    /// Staff member who rang up the sale.
    pub created_by: Option<String>,
}

/// Initial status of a new order from how much was paid and how.
///
/// Settled orders are completed. Otherwise cash-on-delivery orders wait for
/// the courier, part-paid orders carry a balance, and the rest are pending.
pub fn initial_status(totals: &OrderTotals, method: PaymentMethod) -> OrderStatus {
    if totals.is_fully_paid() {
        OrderStatus::Completed
    } else if method == PaymentMethod::PaymentOnDelivery {
        OrderStatus::PaymentOnDelivery
    } else if totals.amount_paid.is_positive() {
        OrderStatus::PartiallyPaid
    } else {
        OrderStatus::Pending
    }
}

// =============================================================================
// Stored Order
// =============================================================================

/// An order as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleOrder {
    pub id: String,
    /// Human-facing number printed on the receipt (`SO-20240315-0042`).
    pub order_number: String,
    pub customer_id: String,
    pub customer_type: CustomerType,
    pub lines: Vec<SaleOrderLine>,
    pub totals: OrderTotals,
    pub payment_method: PaymentMethod,
    pub delivery: DeliveryDetails,
    pub status: OrderStatus,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleOrder {
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// What the cashier hands the customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub store_name: String,
    pub order_id: String,
    pub order_number: String,
    pub customer_name: String,
    pub lines: Vec<SaleOrderLine>,
    pub totals: OrderTotals,
    pub payment_method: PaymentMethod,
    pub delivery_method: DeliveryMethod,
    pub status: OrderStatus,
    pub change_due: Money,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    pub fn from_order(order: &SaleOrder, store_name: &str, customer_name: &str) -> Self {
        Receipt {
            store_name: store_name.to_string(),
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            customer_name: customer_name.to_string(),
            lines: order.lines.clone(),
            totals: order.totals,
            payment_method: order.payment_method,
            delivery_method: order.delivery.method,
            status: order.status,
            change_due: order.totals.change_due(),
            issued_at: order.created_at,
        }
    }
}

// =============================================================================
// Sales Statistics
// =============================================================================

/// Time window of the sales dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SalesPeriod {
    Today,
    /// Since Monday 00:00.
    ThisWeek,
    ThisMonth,
    #[default]
    AllTime,
}

impl SalesPeriod {
    /// Start of the window in UTC, or `None` for all time.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let day = match self {
            SalesPeriod::Today => today,
            SalesPeriod::ThisWeek => {
                today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
            }
            SalesPeriod::ThisMonth => today.with_day(1)?,
            SalesPeriod::AllTime => return None,
        };
        Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
    }
}

/// Aggregate sales figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesStats {
    pub total_sales: i64,
    pub total_revenue: Money,
    /// Revenue per sale, rounded half up.
    pub average_sale: Money,
    pub total_items: i64,
}

impl SalesStats {
    pub fn new(total_sales: i64, total_revenue: Money, total_items: i64) -> Self {
        let average_sale = if total_sales > 0 {
            let revenue = total_revenue.minor();
            Money::from_minor((revenue + total_sales / 2).div_euclid(total_sales))
        } else {
            Money::zero()
        };
        SalesStats {
            total_sales,
            total_revenue,
            average_sale,
            total_items,
        }
    }

    /// Aggregates non-cancelled orders.
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a SaleOrder>) -> Self {
        let (count, revenue, items) = orders
            .into_iter()
            .filter(|o| o.status.counts_as_sale())
            .fold((0, Money::zero(), 0), |(n, rev, items), o| {
                (n + 1, rev + o.totals.total, items + o.item_count())
            });
        SalesStats::new(count, revenue, items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
