//! # Validation Module
//!
//! Field rules shared by the cart, the customer form and the catalog forms.
//!
//! ## Where It Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Form input ──► *Input::validate() ──► service ──► repository (SQLite) │
//! │                        │                              │                 │
//! │                   THIS MODULE                 NOT NULL / UNIQUE / FK    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validator takes the field name it reports so the same rule can be
//! reused for "name", "contact_person" and friends.
//!
//! ## Usage
//! ```rust
//! use shopdesk_core::validation::{validate_name, validate_phone};
//!
//! validate_name("name", "Samsung").unwrap();
//! validate_phone("+255 712 345 678").unwrap();
//! assert!(validate_phone("call me").is_err());
//! ```

use crate::error::ValidationError;
use crate::money::{Money, BPS_SCALE};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted display name.
pub const MAX_NAME_LEN: usize = 200;

/// Longest accepted search box input.
pub const MAX_SEARCH_LEN: usize = 100;

const MIN_PHONE_LEN: usize = 7;
const MAX_PHONE_LEN: usize = 20;

// =============================================================================
// String Validators
// =============================================================================

/// Non-blank, at most [`MAX_NAME_LEN`] characters after trimming.
///
/// ## Example
/// ```rust
/// use shopdesk_core::validation::validate_name;
///
/// assert!(validate_name("name", "Galaxy A15").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Optional free text; `None` and blank strings always pass.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(text) if text.trim().chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Phone or WhatsApp number.
///
/// ## Rules
/// - Required
/// - Digits plus `+`, spaces, `-`, `(` and `)`
/// - 7 to 20 characters, at least 7 of them digits
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces, '+' and '-'".to_string(),
        });
    }

    if phone.len() > MAX_PHONE_LEN {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: MAX_PHONE_LEN,
        });
    }

    if phone.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_LEN {
        return Err(ValidationError::TooShort {
            field: "phone".to_string(),
            min: MIN_PHONE_LEN,
        });
    }

    Ok(())
}

/// Optional e-mail address. Only the shape `local@domain.tld` is checked.
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.contains(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
///
/// Empty is fine: it means "no filter".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Line quantity: 1 to [`MAX_ITEM_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Prices may be zero (free items) but never negative or above [`MAX_PRICE`].
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.minor() > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE,
        });
    }

    Ok(())
}

/// Basis points between 0 and 10000 (0% to 100%).
pub fn validate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > BPS_SCALE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::from(BPS_SCALE),
        });
    }

    Ok(())
}

pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    validate_bps("tax_rate", bps)
}

// =============================================================================
// Unit Tests
// =============================================================================
