//! # Cart
//!
//! The in-progress sale: line items, quantities and frozen unit prices.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Operation              Cart Change            │
//! │  ──────────────           ─────────              ───────────            │
//! │                                                                         │
//! │  Pick product ──────────► add_product() ───────► merge or push line    │
//! │                                                                         │
//! │  Ad-hoc item ───────────► add_external() ──────► always push line      │
//! │                                                                         │
//! │  Change quantity ───────► update_quantity() ───► qty = n (n ≤ 0: drop) │
//! │                                                                         │
//! │  Click remove ──────────► remove_item() ───────► drop line             │
//! │                                                                         │
//! │  Sale done / cancel ────► clear() ─────────────► empty                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Identity
//! Catalog lines are keyed by `(product_id, variant_id)`. Adding the same
//! variant twice bumps the quantity instead of creating a duplicate line.
//! Ad-hoc ("external") items get a fresh id each time and never merge.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::product::SaleableProduct;
use crate::types::CustomerType;
use crate::validation::{validate_name, validate_price};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Line Key
// =============================================================================

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum LineKey {
    /// An item from the catalog.
    Catalog {
        product_id: String,
        variant_id: Option<String>,
    },
    /// An item typed in at the till that is not in the catalog.
    External { id: String },
}

impl LineKey {
    pub fn catalog(product_id: impl Into<String>, variant_id: Option<String>) -> Self {
        LineKey::Catalog {
            product_id: product_id.into(),
            variant_id,
        }
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        matches!(self, LineKey::External { .. })
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineKey::Catalog {
                product_id,
                variant_id: Some(variant_id),
            } => write!(f, "{}/{}", product_id, variant_id),
            LineKey::Catalog {
                product_id,
                variant_id: None,
            } => f.write_str(product_id),
            LineKey::External { id } => write!(f, "external-{}", id),
        }
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the cart. Name and price are frozen when the line is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub key: LineKey,
    pub name: String,
    pub variant_label: Option<String>,
    pub sku: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    /// Purchase cost, carried onto the order for margin reports.
    pub unit_cost: Option<Money>,
}

impl CartItem {
    /// Builds a line for a catalog product at the price for `customer_type`.
    pub fn from_product(product: &SaleableProduct, customer_type: CustomerType, quantity: i64) -> Self {
        CartItem {
            key: LineKey::catalog(product.product_id.clone(), product.variant_id.clone()),
            name: product.name.clone(),
            variant_label: product.variant_label.clone(),
            sku: product.sku.clone(),
            quantity,
            unit_price: product.price_for(customer_type),
            unit_cost: product.cost_price,
        }
    }

    /// `quantity × unit_price`.
    #[inline]
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price.multiply_quantity(self.quantity)
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.key.is_external()
    }
}

/// An ad-hoc item sold without a catalog entry (a part sourced for a repair,
/// a service fee, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExternalProduct {
    pub name: String,
    pub price: Money,
    pub description: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Catalog lines are unique by `(product_id, variant_id)`
/// - Every line has quantity ≥ 1 (setting 0 removes the line)
/// - At most [`MAX_CART_ITEMS`] lines, each at most [`MAX_ITEM_QUANTITY`]
/// - Unit prices pass [`validate_price`], so the subtotal fits in `i64`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get(&self, key: &LineKey) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.key == key)
    }

    /// Adds a catalog product or increases its quantity if already present.
    pub fn add_product(
        &mut self,
        product: &SaleableProduct,
        customer_type: CustomerType,
        quantity: i64,
    ) -> CoreResult<()> {
        check_quantity(quantity)?;
        let key = LineKey::catalog(product.product_id.clone(), product.variant_id.clone());

        if let Some(item) = self.items.iter_mut().find(|i| i.key == key) {
            let new_qty = item.quantity + quantity;
            check_quantity(new_qty)?;
            item.quantity = new_qty;
            return Ok(());
        }

        self.ensure_room()?;
        let item = CartItem::from_product(product, customer_type, quantity);
        validate_price("price", item.unit_price)?;
        self.items.push(item);
        Ok(())
    }

    /// Appends an ad-hoc item with quantity 1 and returns its key.
    pub fn add_external(&mut self, product: &ExternalProduct) -> CoreResult<LineKey> {
        validate_name("name", &product.name)?;
        validate_price("price", product.price)?;
        self.ensure_room()?;

        let key = LineKey::External {
            id: Uuid::new_v4().to_string(),
        };
        self.items.push(CartItem {
            key: key.clone(),
            name: product.name.trim().to_string(),
            variant_label: product.description.clone(),
            sku: None,
            quantity: 1,
            unit_price: product.price,
            unit_cost: None,
        });
        Ok(key)
    }

    /// Sets the quantity of a line. Zero or less removes it.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(key).map(|_| ());
        }
        check_quantity(quantity)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| &i.key == key)
            .ok_or_else(|| CoreError::LineNotFound(key.to_string()))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line and returns it.
    pub fn remove_item(&mut self, key: &LineKey) -> CoreResult<CartItem> {
        let idx = self
            .items
            .iter()
            .position(|i| &i.key == key)
            .ok_or_else(|| CoreError::LineNotFound(key.to_string()))?;
        Ok(self.items.remove(idx))
    }

    /// Keeps lines for which `keep` returns true; returns the dropped lines.
    pub fn retain_lines<F>(&mut self, mut keep: F) -> Vec<CartItem>
    where
        F: FnMut(&CartItem) -> bool,
    {
        let (kept, dropped): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.items).into_iter().partition(|i| keep(i));
        self.items = kept;
        dropped
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Σ line totals.
    pub fn subtotal(&self) -> CoreResult<Money> {
        self.items
            .iter()
            .try_fold(Money::zero(), |acc, item| {
                item.line_total().and_then(|line| acc.checked_add(line))
            })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn ensure_room(&self) -> CoreResult<()> {
        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }
        Ok(())
    }
}

fn check_quantity(quantity: i64) -> CoreResult<()> {
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    if quantity <= 0 {
        return Err(crate::error::ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_PRICE;

    fn product(id: &str, variant: Option<&str>, price: i64) -> SaleableProduct {
        SaleableProduct {
            product_id: id.to_string(),
            variant_id: variant.map(str::to_string),
            name: format!("Product {}", id),
            variant_label: variant.map(|v| format!("Variant {}", v)),
            brand_name: None,
            sku: None,
            selling_price: Money::from_minor(price),
            wholesale_price: Some(Money::from_minor(price - 100)),
            cost_price: None,
            stock_quantity: 10,
        }
    }

    #[test]
    fn test_add_new_line() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", None, 999), CustomerType::Retail, 2)
            .unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal().unwrap().minor(), 1998);
    }

    #[test]
    fn test_same_variant_merges() {
        let mut cart = Cart::new();
        let p = product("1", Some("a"), 500);
        cart.add_product(&p, CustomerType::Retail, 1).unwrap();
        cart.add_product(&p, CustomerType::Retail, 1).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[0].line_total().unwrap().minor(), 1000);
    }

    #[test]
    fn test_different_variants_are_separate_lines() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", Some("a"), 500), CustomerType::Retail, 1)
            .unwrap();
        cart.add_product(&product("1", Some("b"), 700), CustomerType::Retail, 1)
            .unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.subtotal().unwrap().minor(), 1200);
    }

    #[test]
    fn test_wholesale_price_is_frozen_on_line() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", None, 1000), CustomerType::Wholesale, 1)
            .unwrap();
        assert_eq!(cart.items()[0].unit_price.minor(), 900);
    }

    #[test]
    fn test_external_items_never_merge() {
        let mut cart = Cart::new();
        let ext = ExternalProduct {
            name: "Screen protector".into(),
            price: Money::from_minor(15_000),
            description: None,
        };
        let k1 = cart.add_external(&ext).unwrap();
        let k2 = cart.add_external(&ext).unwrap();

        assert_ne!(k1, k2);
        assert!(k1.is_external());
        assert_eq!(cart.item_count(), 2);
        assert!(cart.items().iter().all(|i| i.quantity == 1 && i.is_external()));
    }

    #[test]
    fn test_external_requires_name_and_non_negative_price() {
        let mut cart = Cart::new();
        let unnamed = ExternalProduct {
            name: "  ".into(),
            price: Money::from_minor(1),
            description: None,
        };
        assert!(cart.add_external(&unnamed).is_err());

        let negative = ExternalProduct {
            name: "Refund".into(),
            price: Money::from_minor(-1),
            description: None,
        };
        assert!(cart.add_external(&negative).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_zero_quantity_equals_remove() {
        let mut a = Cart::new();
        a.add_product(&product("1", None, 300), CustomerType::Retail, 2).unwrap();
        a.add_product(&product("2", None, 450), CustomerType::Retail, 1).unwrap();
        let mut b = a.clone();

        let key = LineKey::catalog("1", None);
        let before = a.subtotal().unwrap();
        let line_total = a.get(&key).unwrap().line_total().unwrap();

        a.update_quantity(&key, 0).unwrap();
        b.remove_item(&key).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.subtotal().unwrap(), before - line_total);
        assert!(a.get(&key).is_none());
    }

    #[test]
    fn test_negative_quantity_removes() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", None, 300), CustomerType::Retail, 2)
            .unwrap();
        cart.update_quantity(&LineKey::catalog("1", None), -3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_unknown_line() {
        let mut cart = Cart::new();
        let err = cart
            .update_quantity(&LineKey::catalog("missing", None), 2)
            .unwrap_err();
        assert!(matches!(err, CoreError::LineNotFound(_)));
    }

    #[test]
    fn test_quantity_limit() {
        let mut cart = Cart::new();
        let p = product("1", None, 1);
        cart.add_product(&p, CustomerType::Retail, MAX_ITEM_QUANTITY)
            .unwrap();
        let err = cart.add_product(&p, CustomerType::Retail, 1).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
        assert_eq!(cart.total_quantity(), MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_product(&product(&i.to_string(), None, 1), CustomerType::Retail, 1)
                .unwrap();
        }
        let err = cart
            .add_product(&product("overflow", None, 1), CustomerType::Retail, 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }

    #[test]
    fn test_subtotal_is_order_independent() {
        let lines = [("a", 3, 1_250), ("b", 1, 99_000), ("c", 7, 40)];

        let mut forward = Cart::new();
        for (id, qty, price) in lines {
            forward
                .add_product(&product(id, None, price), CustomerType::Retail, qty)
                .unwrap();
        }
        let mut reverse = Cart::new();
        for (id, qty, price) in lines.iter().rev() {
            reverse
                .add_product(&product(id, None, *price), CustomerType::Retail, *qty)
                .unwrap();
        }

        let expected: i64 = lines.iter().map(|(_, q, p)| q * p).sum();
        assert_eq!(forward.subtotal().unwrap().minor(), expected);
        assert_eq!(forward.subtotal().unwrap(), reverse.subtotal().unwrap());
    }

    #[test]
    fn test_retain_lines_returns_dropped() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", None, 100), CustomerType::Retail, 1)
            .unwrap();
        cart.add_product(&product("2", None, 200), CustomerType::Retail, 1)
            .unwrap();

        let dropped = cart.retain_lines(|i| i.key != LineKey::catalog("1", None));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].name, "Product 1");
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", None, 100), CustomerType::Retail, 1)
            .unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.subtotal().unwrap().is_zero());
    }

    #[test]
    fn test_huge_prices_are_refused() {
        let mut cart = Cart::new();
        let huge = ExternalProduct {
            name: "Gold bar".into(),
            price: Money::from_minor(i64::MAX / 2),
            description: None,
        };
        let err = cart.add_external(&huge).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = cart
            .add_product(&product("1", None, i64::MAX / 2), CustomerType::Retail, 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_largest_cart_subtotal_fits() {
        let mut cart = Cart::new();
        let key = cart
            .add_external(&ExternalProduct {
                name: "Generator".into(),
                price: Money::from_minor(MAX_PRICE),
                description: None,
            })
            .unwrap();
        cart.update_quantity(&key, MAX_ITEM_QUANTITY).unwrap();
        for i in 1..MAX_CART_ITEMS {
            let p = product(&i.to_string(), None, MAX_PRICE);
            cart.add_product(&p, CustomerType::Retail, MAX_ITEM_QUANTITY)
                .unwrap();
        }

        let expected = MAX_PRICE * MAX_ITEM_QUANTITY * MAX_CART_ITEMS as i64;
        assert_eq!(cart.subtotal().unwrap().minor(), expected);
    }

    #[test]
    fn test_overflowing_lines_report_an_error() {
        let line = CartItem {
            key: LineKey::catalog("1", None),
            name: "Corrupt".into(),
            variant_label: None,
            sku: None,
            quantity: 3,
            unit_price: Money::from_minor(i64::MAX / 2),
            unit_cost: None,
        };
        assert!(matches!(line.line_total(), Err(CoreError::AmountOverflow)));

        let cart = Cart { items: vec![line] };
        assert!(matches!(cart.subtotal(), Err(CoreError::AmountOverflow)));
    }
}
