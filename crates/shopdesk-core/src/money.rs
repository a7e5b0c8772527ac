//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    1,500,000 × 0.16 in floats = 239999.99999999997   ❌                 │
//! │                                                                         │
//! │  OUR SOLUTION: integer minor units + basis points                       │
//! │    1,500,000 × 1600 / 10000   = 240000               ✅                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A minor unit is whatever the shop books amounts in. For shillings that
//! is the whole shilling, so `Money::from_minor(1_500_000)` is TSh 1,500,000.
//!
//! ## Usage
//! ```rust
//! use shopdesk_core::money::Money;
//!
//! let price = Money::from_minor(250_000);
//! let line = price.multiply_quantity(3).unwrap();
//! assert_eq!(line.minor(), 750_000);
//! assert_eq!(line.to_string(), "750,000");
//! ```
//!
//! ## Overflow
//! Cart and totals math goes through the `checked_*` methods and reports
//! [`CoreError::AmountOverflow`]. The operator impls saturate at the `i64`
//! bounds so they never panic or wrap.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::TaxRate;

/// Basis points in 100%.
pub const BPS_SCALE: u32 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Monetary value in the smallest unit the shop records.
///
/// ## Where Money is Used
/// ```text
/// ProductVariant.selling_price ──► CartItem.unit_price ──► line_total
///                                                             │
///                               OrderTotals.subtotal ◄────────┘
///                                      │
///              discount ─ tax ─ shipping ─► total ─► balance
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `self` or zero, whichever is larger.
    #[inline]
    pub fn max_zero(self) -> Self {
        Money(self.0.max(0))
    }

    /// Caps `self` at `ceiling`.
    #[inline]
    pub fn capped_at(self, ceiling: Money) -> Self {
        Money(self.0.min(ceiling.0))
    }

    /// Returns `bps / 10000` of this amount, rounded half up.
    ///
    /// ## Implementation
    /// `(amount * bps + 5000) / 10000` in i128. Results outside `i64`
    /// (only possible above 100%) are an error, never truncated.
    ///
    /// ## Example
    /// ```rust
    /// use shopdesk_core::money::Money;
    ///
    /// // 10% of 1,234,567 = 123,456.7 → 123,457
    /// assert_eq!(Money::from_minor(1_234_567).percentage_of(1000).unwrap().minor(), 123_457);
    /// ```
    pub fn percentage_of(&self, bps: u32) -> CoreResult<Money> {
        let half = i128::from(BPS_SCALE / 2);
        let scaled = i128::from(self.0) * i128::from(bps);
        let rounded = if scaled >= 0 {
            (scaled + half) / i128::from(BPS_SCALE)
        } else {
            (scaled - half) / i128::from(BPS_SCALE)
        };
        i64::try_from(rounded)
            .map(Money)
            .map_err(|_| CoreError::AmountOverflow)
    }

    /// Calculates tax on this amount.
    ///
    /// ## Example
    /// ```rust
    /// use shopdesk_core::money::Money;
    /// use shopdesk_core::types::TaxRate;
    ///
    /// let base = Money::from_minor(1_500_000);
    /// assert_eq!(base.calculate_tax(TaxRate::from_bps(1600)).unwrap().minor(), 240_000);
    /// ```
    #[inline]
    pub fn calculate_tax(&self, rate: TaxRate) -> CoreResult<Money> {
        self.percentage_of(rate.bps())
    }

    /// `self × qty`, or [`CoreError::AmountOverflow`].
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> CoreResult<Money> {
        self.0
            .checked_mul(qty)
            .map(Money)
            .ok_or(CoreError::AmountOverflow)
    }

    #[inline]
    pub fn checked_add(self, other: Money) -> CoreResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(CoreError::AmountOverflow)
    }

    #[inline]
    pub fn checked_sub(self, other: Money) -> CoreResult<Money> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or(CoreError::AmountOverflow)
    }

    /// Sums `amounts`, failing on the first overflow.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> CoreResult<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), Money::checked_add)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Groups thousands with commas: `1740000` → `1,740,000`.
///
/// Currency symbols and decimal placement are applied by the app config.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            write!(f, "-{}", grouped)
        } else {
            f.write_str(&grouped)
        }
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
