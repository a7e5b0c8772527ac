//! # Products
//!
//! Catalog items as the POS sees them. A product has one or more variants
//! (colour, storage size, …); each variant carries its own retail and
//! wholesale price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::CustomerType;

/// A product family, e.g. "iPhone 13".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand_id: Option<String>,
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A sellable variant of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductVariant {
    pub id: String,
    pub product_id: String,
    /// Label shown next to the product name ("128GB Blue").
    pub name: String,
    pub sku: Option<String>,
    pub selling_price: Money,
    pub wholesale_price: Option<Money>,
    pub cost_price: Option<Money>,
    pub stock_quantity: i64,
    pub is_active: bool,
}

impl ProductVariant {
    /// Unit price for the given price list.
    ///
    /// Wholesale customers fall back to the selling price when no wholesale
    /// price is set.
    pub fn price_for(&self, customer_type: CustomerType) -> Money {
        list_price(self.selling_price, self.wholesale_price, customer_type)
    }
}

/// One row of a POS product search: a product joined with one of its
/// variants, or with none when the product is sold without variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleableProduct {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub variant_label: Option<String>,
    pub brand_name: Option<String>,
    pub sku: Option<String>,
    pub selling_price: Money,
    pub wholesale_price: Option<Money>,
    pub cost_price: Option<Money>,
    pub stock_quantity: i64,
}

impl SaleableProduct {
    /// Unit price for the given price list.
    pub fn price_for(&self, customer_type: CustomerType) -> Money {
        list_price(self.selling_price, self.wholesale_price, customer_type)
    }

    /// Display name including the variant label.
    pub fn display_name(&self) -> String {
        match &self.variant_label {
            Some(label) if !label.is_empty() => format!("{} ({})", self.name, label),
            _ => self.name.clone(),
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// Selling price for retail; wholesale price, or selling price when unset,
/// for wholesale.
fn list_price(selling: Money, wholesale: Option<Money>, customer_type: CustomerType) -> Money {
    match customer_type {
        CustomerType::Retail => selling,
        CustomerType::Wholesale => wholesale.unwrap_or(selling),
    }
}
