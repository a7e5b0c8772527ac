//! # Domain Types
//!
//! Small value types shared by the cart, checkout and order modules.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Shared Value Types                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  CustomerType   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Retail         │   │  Cash, Card     │       │
//! │  │  1600 = 16%     │   │  Wholesale      │   │  MobileMoney …  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │ DeliveryMethod  │   │  OrderStatus    │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  Pickup         │   │  Pending        │                             │
//! │  │  LocalTransport │   │  Completed …    │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Enums are stored as snake_case TEXT; the serde and sqlx spellings agree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1600 bps = 16% (VAT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for config input).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round().max(0.0) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Implements `as_str`, `Display` and `FromStr` for a snake_case enum.
macro_rules! text_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable snake_case spelling used in storage and JSON.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ValidationError::NotAllowed {
                        field: $field.to_string(),
                        allowed: $name::ALL.iter().map(|v| v.as_str().to_string()).collect(),
                    }),
                }
            }
        }
    };
}

// =============================================================================
// Customer Type
// =============================================================================

/// Price list applied to a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    #[default]
    Retail,
    Wholesale,
}

text_enum!(CustomerType, "customer_type", {
    Retail => "retail",
    Wholesale => "wholesale",
});

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer settles the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    /// Bank transfer.
    Transfer,
    /// M-Pesa and similar wallets.
    MobileMoney,
    /// Paid over several visits; the order stays open with a balance.
    Installment,
    /// Collected by the courier on delivery.
    PaymentOnDelivery,
}

text_enum!(PaymentMethod, "payment_method", {
    Cash => "cash",
    Card => "card",
    Transfer => "transfer",
    MobileMoney => "mobile_money",
    Installment => "installment",
    PaymentOnDelivery => "payment_on_delivery",
});

// =============================================================================
// Delivery Method
// =============================================================================

/// How the goods leave the shop. Anything but `Pickup` carries a shipping fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    #[default]
    Pickup,
    LocalTransport,
    AirCargo,
    BusCargo,
}

text_enum!(DeliveryMethod, "delivery_method", {
    Pickup => "pickup",
    LocalTransport => "local_transport",
    AirCargo => "air_cargo",
    BusCargo => "bus_cargo",
});

impl DeliveryMethod {
    #[inline]
    pub const fn is_pickup(&self) -> bool {
        matches!(self, DeliveryMethod::Pickup)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status of a sale order as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    PartiallyPaid,
    PaymentOnDelivery,
    OnHold,
    Cancelled,
    Delivered,
}

text_enum!(OrderStatus, "status", {
    Pending => "pending",
    Completed => "completed",
    PartiallyPaid => "partially_paid",
    PaymentOnDelivery => "payment_on_delivery",
    OnHold => "on_hold",
    Cancelled => "cancelled",
    Delivered => "delivered",
});

impl OrderStatus {
    /// Whether the order counts towards revenue figures.
    #[inline]
    pub const fn counts_as_sale(&self) -> bool {
        !matches!(self, OrderStatus::Cancelled)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
