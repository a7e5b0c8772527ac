//! # Order Totals
//!
//! Pure calculator from cart lines plus pricing parameters to the figures on
//! the checkout panel and receipt.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal      = Σ quantity × unit_price                                │
//! │  discount      = fixed amount (≤ subtotal) | subtotal × pct            │
//! │  taxable_base  = subtotal − discount                                    │
//! │  tax           = taxable_base × rate          (0 when tax is disabled)  │
//! │  shipping      = 0 for pickup, else quoted fee or flat delivery fee     │
//! │  total         = taxable_base + tax + shipping                          │
//! │  balance       = total − amount_paid   (> 0 owed, ≤ 0 settled)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tax is always charged on the discounted amount. Every step is checked, so
//! an out-of-range amount surfaces as [`CoreError::AmountOverflow`](crate::CoreError::AmountOverflow).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartItem;
use crate::error::CoreResult;
use crate::money::{Money, BPS_SCALE};
use crate::types::{DeliveryMethod, TaxRate};
use crate::{DEFAULT_DELIVERY_FEE, DEFAULT_TAX_RATE_BPS};

// =============================================================================
// Discount
// =============================================================================

/// Discount applied to the whole order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum Discount {
    #[default]
    None,
    /// Percentage in basis points (1000 = 10%). Values above 100% are capped.
    Percentage(u32),
    /// Flat amount off. Capped at the subtotal.
    Fixed(Money),
}

impl Discount {
    /// Discount amount for the given subtotal. Never negative, never more
    /// than the subtotal.
    pub fn amount_on(&self, subtotal: Money) -> CoreResult<Money> {
        let subtotal = subtotal.max_zero();
        match *self {
            Discount::None => Ok(Money::zero()),
            Discount::Percentage(bps) => subtotal.percentage_of(bps.min(BPS_SCALE)),
            Discount::Fixed(amount) => Ok(amount.max_zero().capped_at(subtotal)),
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Discount::None)
    }
}

// =============================================================================
// Pricing Parameters
// =============================================================================

/// Shop-wide pricing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub tax_rate: TaxRate,
    pub tax_enabled: bool,
    /// Flat fee for any non-pickup delivery without a quote.
    pub delivery_fee: Money,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            tax_rate: TaxRate::from_bps(DEFAULT_TAX_RATE_BPS),
            tax_enabled: true,
            delivery_fee: Money::from_minor(DEFAULT_DELIVERY_FEE),
        }
    }
}

/// Everything besides the lines that feeds the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PricingParams {
    pub config: PricingConfig,
    pub discount: Discount,
    pub delivery_method: DeliveryMethod,
    /// Carrier quote that replaces the flat delivery fee.
    pub shipping_quote: Option<Money>,
    pub amount_paid: Money,
}

impl PricingParams {
    /// Shipping charged for these parameters.
    pub fn shipping(&self) -> Money {
        if self.delivery_method.is_pickup() {
            return Money::zero();
        }
        self.shipping_quote
            .unwrap_or(self.config.delivery_fee)
            .max_zero()
    }
}

// =============================================================================
// Order Totals
// =============================================================================

/// Derived totals. Never stored on its own; copied onto the order at
/// submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub taxable_base: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
    pub amount_paid: Money,
    /// Positive: still owed. Zero or negative: settled (negative is change).
    pub balance: Money,
}

impl OrderTotals {
    /// Runs the calculator over `items`.
    ///
    /// ## Example
    /// ```rust
    /// use shopdesk_core::totals::{OrderTotals, PricingParams};
    /// use shopdesk_core::cart::{Cart, ExternalProduct};
    /// use shopdesk_core::money::Money;
    ///
    /// let mut cart = Cart::new();
    /// cart.add_external(&ExternalProduct {
    ///     name: "Laptop".into(),
    ///     price: Money::from_minor(1_500_000),
    ///     description: None,
    /// }).unwrap();
    ///
    /// let totals = OrderTotals::compute(cart.items(), &PricingParams::default()).unwrap();
    /// assert_eq!(totals.tax.minor(), 240_000);
    /// assert_eq!(totals.total.minor(), 1_740_000);
    /// ```
    pub fn compute(items: &[CartItem], params: &PricingParams) -> CoreResult<Self> {
        let subtotal = items
            .iter()
            .try_fold(Money::zero(), |acc, item| {
                item.line_total().and_then(|line| acc.checked_add(line))
            })?;
        Self::from_subtotal(subtotal, params)
    }

    /// Same as [`OrderTotals::compute`] for an already summed subtotal.
    pub fn from_subtotal(subtotal: Money, params: &PricingParams) -> CoreResult<Self> {
        let discount = params.discount.amount_on(subtotal)?;
        let taxable_base = subtotal.checked_sub(discount)?;
        let tax = if params.config.tax_enabled {
            taxable_base.calculate_tax(params.config.tax_rate)?
        } else {
            Money::zero()
        };
        let shipping = params.shipping();
        let total = taxable_base.checked_add(tax)?.checked_add(shipping)?;
        let balance = total.checked_sub(params.amount_paid)?;

        Ok(OrderTotals {
            subtotal,
            discount,
            taxable_base,
            tax,
            shipping,
            total,
            amount_paid: params.amount_paid,
            balance,
        })
    }

    /// Amount still owed, never negative.
    pub fn balance_due(&self) -> Money {
        self.balance.max_zero()
    }

    /// Change to hand back when the customer overpaid.
    pub fn change_due(&self) -> Money {
        (-self.balance).max_zero()
    }

    pub fn is_fully_paid(&self) -> bool {
        !self.balance.is_positive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
