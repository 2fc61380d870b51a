//! # Validation Module
//!
//! Input validation for invoice and payment requests.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: HTTP (apps/api)                                              │
//! │  ├── Type validation (JSON deserialization, decimals, dates)           │
//! │  └── Role checks                                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine services (kardex-db)                                  │
//! │  ├── THIS MODULE: field rules, before any transaction opens            │
//! │  └── pricing::LineInput::compute for per-line money rules              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  ├── UNIQUE (tenant_id, invoice_number)                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kardex_core::validation::{validate_item_count, validate_quantity};
//!
//! validate_item_count(3).unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_item_count(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_INVOICE_ITEMS, MAX_ITEM_QUANTITY, MAX_NOTES_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a payment reference.
pub const MAX_REFERENCE_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Trims optional free text and enforces a maximum length in characters.
///
/// Blank input normalizes to `None`.
///
/// ## Example
/// ```rust
/// use kardex_core::validation::validate_optional_text;
///
/// assert_eq!(validate_optional_text("notes", Some("  hi "), 10).unwrap(), Some("hi".to_string()));
/// assert_eq!(validate_optional_text("notes", Some("   "), 10).unwrap(), None);
/// assert!(validate_optional_text("notes", Some("way too long"), 3).is_err());
/// ```
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(Some(value.to_string()))
}

/// Validates invoice or payment notes.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    validate_optional_text("notes", notes, MAX_NOTES_LEN)
}

/// Validates a payment reference.
pub fn validate_reference(reference: Option<&str>) -> ValidationResult<Option<String>> {
    validate_optional_text("reference", reference, MAX_REFERENCE_LEN)
}

/// Validates that an id is present and looks like a UUID.
///
/// ## Example
/// ```rust
/// use kardex_core::validation::validate_id;
///
/// assert!(validate_id("productId", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("productId", "not-a-uuid").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ```text
/// qty <= 0        → "quantity must be positive"
/// qty > 999_999   → "quantity must be between 1 and 999999"
/// ```
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

/// Validates a payment amount. Zero and negative amounts are rejected.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines on an invoice (1..=MAX_INVOICE_ITEMS).
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_INVOICE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_INVOICE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// A due date may not fall before the issue date.
pub fn validate_due_date(
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
) -> ValidationResult<()> {
    match due_date {
        Some(due) if due < issue_date => Err(ValidationError::InvalidFormat {
            field: "dueDate".to_string(),
            reason: format!("must not be before issue date {}", issue_date),
        }),
        _ => Ok(()),
    }
}

/// Validates an optional `from..=to` filter range.
pub fn validate_date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ValidationResult<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(ValidationError::InvalidFormat {
            field: "fromDate".to_string(),
            reason: "must not be after toDate".to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999_999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1_000_000).is_err());
    }

    #[test]
    fn test_validate_notes_counts_characters() {
        let accented = "é".repeat(MAX_NOTES_LEN);
        assert!(validate_notes(Some(&accented)).is_ok());
        let too_long = "a".repeat(MAX_NOTES_LEN + 1);
        assert!(validate_notes(Some(&too_long)).is_err());
        assert_eq!(validate_notes(None).unwrap(), None);
    }

    #[test]
    fn test_validate_item_count() {
        assert!(validate_item_count(1).is_ok());
        assert!(validate_item_count(MAX_INVOICE_ITEMS).is_ok());
        assert!(validate_item_count(0).is_err());
        assert!(validate_item_count(MAX_INVOICE_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(Money::from_cents(1)).is_ok());
        assert!(validate_payment_amount(Money::zero()).is_err());
        assert!(validate_payment_amount(Money::from_cents(-100)).is_err());
    }

    #[test]
    fn test_validate_due_date() {
        let issue = date(2026, 3, 10);
        assert!(validate_due_date(issue, None).is_ok());
        assert!(validate_due_date(issue, Some(issue)).is_ok());
        assert!(validate_due_date(issue, Some(date(2026, 4, 10))).is_ok());
        assert!(validate_due_date(issue, Some(date(2026, 3, 9))).is_err());
    }

    #[test]
    fn test_validate_date_range() {
        assert!(validate_date_range(None, Some(date(2026, 1, 1))).is_ok());
        assert!(validate_date_range(Some(date(2026, 1, 1)), Some(date(2026, 1, 31))).is_ok());
        assert!(validate_date_range(Some(date(2026, 2, 1)), Some(date(2026, 1, 31))).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_id("id", "").is_err());
        assert!(validate_id("id", "123").is_err());
    }
}
