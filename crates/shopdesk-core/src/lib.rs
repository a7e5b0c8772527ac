//! # shopdesk-core: Pure Business Logic for ShopDesk
//!
//! Everything the counter needs to price and ring up a sale, manage
//! customers and keep the catalog tidy, as pure functions with no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ShopDesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/shopdesk (services + ports)                │   │
//! │  │   PosService   CustomerService   CatalogService   Messenger     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shopdesk-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌────────┐ ┌────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐  │   │
//! │  │  │ money  │ │  cart  │ │  totals  │ │ checkout │ │ customer │  │   │
//! │  │  └────────┘ └────────┘ └──────────┘ └──────────┘ └──────────┘  │   │
//! │  │  ┌────────┐ ┌────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐  │   │
//! │  │  │ types  │ │product │ │  order   │ │ catalog  │ │  record  │  │   │
//! │  │  └────────┘ └────────┘ └──────────┘ └──────────┘ └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shopdesk-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer money and basis-point percentages
//! - [`types`] - Shared enums (payment, delivery, order status) and `TaxRate`
//! - [`cart`] - Cart lines keyed by product and variant
//! - [`totals`] - Discount, tax, shipping and balance
//! - [`checkout`] - The POS session state machine
//! - [`customer`] - Customers, loyalty tiers, filtering and stats
//! - [`catalog`] - Brands, categories and suppliers
//! - [`record`] - Soft delete and restore
//! - [`filter`] - Case-insensitive text search
//! - [`order`] - Sale orders, receipts and sales stats
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use shopdesk_core::cart::Cart;
//! use shopdesk_core::product::SaleableProduct;
//! use shopdesk_core::totals::{OrderTotals, PricingParams};
//! use shopdesk_core::{CustomerType, Money};
//!
//! let phone = SaleableProduct {
//!     product_id: "p-1".into(),
//!     variant_id: None,
//!     name: "Galaxy A15".into(),
//!     variant_label: None,
//!     brand_name: Some("Samsung".into()),
//!     sku: None,
//!     selling_price: Money::from_minor(500_000),
//!     wholesale_price: None,
//!     cost_price: None,
//!     stock_quantity: 10,
//! };
//!
//! let mut cart = Cart::new();
//! cart.add_product(&phone, CustomerType::Retail, 3).unwrap();
//!
//! // 16% VAT on 1,500,000, pickup so no shipping
//! let totals = OrderTotals::compute(cart.items(), &PricingParams::default()).unwrap();
//! assert_eq!(totals.total.minor(), 1_740_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod customer;
pub mod error;
pub mod filter;
pub mod money;
pub mod order;
pub mod product;
pub mod record;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, ExternalProduct, LineKey};
pub use checkout::{Checkout, CheckoutPhase, CustomerRef};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use record::{RecordStatus, SoftDelete};
pub use totals::{Discount, OrderTotals, PricingConfig, PricingParams};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on one line.
///
/// Catches typos like 1000 for 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price a line may carry, in minor units.
///
/// `MAX_PRICE × MAX_ITEM_QUANTITY × MAX_CART_ITEMS` stays well inside `i64`.
pub const MAX_PRICE: i64 = 9_999_999_999;

/// VAT applied when the shop config does not override it (16%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1600;

/// Flat delivery fee in minor units for any non-pickup order.
pub const DEFAULT_DELIVERY_FEE: i64 = 500;
