//! # Error Types
//!
//! Domain-specific error types for shopdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopdesk-core errors (this file)                                      │
//! │  ├── CoreError        - Cart, checkout and lifecycle rule violations   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopdesk-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  App errors                                                            │
//! │  └── ApiError         - What the frontend sees (serialized)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Toast                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The checkout messages are shown to the cashier verbatim, so they are
//! phrased as instructions rather than diagnostics.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout was attempted without choosing a customer.
    #[error("Please select a customer")]
    MissingCustomer,

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The amount tendered is below zero.
    #[error("Amount paid cannot be negative")]
    NegativePayment,

    /// A sale is already in flight; the cart is frozen until it resolves.
    ///
    /// ## User Workflow
    /// ```text
    /// Click "Complete Sale"
    ///      │
    ///      ▼
    /// Submitting ──► click again ──► CheckoutInProgress (ignored)
    ///      │
    ///      ▼
    /// Completed | back to ReadyToSubmit
    /// ```
    #[error("A sale is already being processed")]
    CheckoutInProgress,

    /// `complete`/`fail` called while no submission is pending.
    #[error("No sale is being submitted")]
    NotSubmitting,

    /// The referenced cart line does not exist.
    #[error("Item not in cart: {0}")]
    LineNotFound(String),

    /// Product or variant cannot be sold (missing or deactivated).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// An amount left the representable range.
    #[error("Amount is too large")]
    AmountOverflow,

    /// Soft delete requested on a record that is already deleted.
    #[error("{entity} {id} is already deleted")]
    AlreadyDeleted { entity: String, id: String },

    /// Restore requested on a record that is not deleted.
    #[error("{entity} {id} is not deleted")]
    NotDeleted { entity: String, id: String },

    /// The customer has no address for the requested channel.
    #[error("Customer has no {channel} number")]
    NoContactChannel { channel: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for errors caused by user input rather than system state.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, CoreError::NotSubmitting)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any call reaches the data layer.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
