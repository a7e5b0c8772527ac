//! # API Error Type
//!
//! What the presentation layer receives when an operation fails. It ends up
//! in a toast or an inline form message.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in ShopDesk                               │
//! │                                                                         │
//! │  Service method                                                         │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Validation? ── ValidationError ─► CoreError ──┐   (before any call)    │
//! │         │                                      │                        │
//! │         ▼                                      ▼                        │
//! │  Backend?   ── DbError (logged) ──────────► ApiError { code, message }  │
//! │         │                                      ▲                        │
//! │         ▼                                      │                        │
//! │  Messaging? ── MessageError ───────────────────┘                        │
//! │                                                                         │
//! │  Frontend: toast(e.message), branch on e.code                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Backend internals never reach the user; they are logged and replaced by a
//! generic message.

use serde::Serialize;
use shopdesk_core::{CoreError, ValidationError};
use shopdesk_db::DbError;

use crate::ports::MessageError;

/// API error returned from service calls.
///
/// ```json
/// { "code": "VALIDATION_ERROR", "message": "Please select a customer" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Name or SKU already taken (409)
    Duplicate,

    /// Database operation failed (500)
    DatabaseError,

    /// Business rule refused the action (422)
    BusinessLogic,

    /// Cart operation failed
    CartError,

    /// The sale could not be created
    CheckoutFailed,

    /// SMS / WhatsApp could not be sent
    MessagingError,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Duplicate,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::Decode { column, reason } => {
                tracing::error!(column = %column, "Stored value could not be read: {}", reason);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::MissingCustomer
            | CoreError::EmptyCart
            | CoreError::NegativePayment
            | CoreError::QuantityTooLarge { .. }
            | CoreError::AmountOverflow
            | CoreError::NoContactChannel { .. } => ApiError::validation(message),
            CoreError::Validation(e) => ApiError::from(e),
            CoreError::LineNotFound(_) | CoreError::CartTooLarge { .. } => {
                ApiError::new(ErrorCode::CartError, message)
            }
            CoreError::ProductNotFound(_) => ApiError::new(ErrorCode::NotFound, message),
            CoreError::CheckoutInProgress
            | CoreError::AlreadyDeleted { .. }
            | CoreError::NotDeleted { .. } => ApiError::new(ErrorCode::BusinessLogic, message),
            CoreError::NotSubmitting => {
                tracing::error!("Checkout completed out of order");
                ApiError::internal(message)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<MessageError> for ApiError {
    fn from(err: MessageError) -> Self {
        tracing::warn!("Message not sent: {}", err);
        ApiError::new(ErrorCode::MessagingError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
