//! # Error Types
//!
//! Domain-specific error types for kardex-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kardex-core errors (this file)                                        │
//! │  ├── CoreError        - Domain errors (not found, business rules)      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kardex-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── EngineError      - CoreError | DbError (service results)          │
//! │                                                                         │
//! │  apps/api errors                                                       │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError → Client   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries the context a caller needs to act on it: entity ids,
//! the attempted transition, numeric limits.

use thiserror::Error;

use crate::lifecycle::{InvoiceAction, InvoiceStatus};
use crate::money::Money;
use crate::tenant::Role;

// =============================================================================
// Error Kind
// =============================================================================

/// Machine-distinguishable category of a failure.
///
/// The HTTP layer maps each kind to a status code; the engine uses it to
/// decide whether a failure is worth a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entity absent, or present in another tenant.
    NotFound,
    /// A business rule rejected the operation (status, stock, balance).
    BusinessRule,
    /// A tenant quota rejected the operation.
    QuotaExceeded,
    /// Malformed input.
    Validation,
    /// The caller's role does not allow the operation.
    Forbidden,
    /// A concurrent writer won the race; safe to retry.
    Conflict,
    /// Anything else.
    Internal,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Tenant cannot be resolved.
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    /// Invoice is absent or belongs to another tenant.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Product is absent or belongs to another tenant.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Customer is absent or belongs to another tenant.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Payment is absent or belongs to another tenant.
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Not enough stock to cover the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /invoices (item qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "COKE-330", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// 400: "Insufficient stock for COKE-330: available 3, requested 5"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The invoice status does not allow the requested action.
    #[error("Invoice {invoice_id} is {from}, cannot {action}")]
    InvalidTransition {
        invoice_id: String,
        from: InvoiceStatus,
        action: InvoiceAction,
    },

    /// The tenant has used up its monthly invoice allowance.
    #[error("Monthly invoice quota exceeded: {used} of {limit} used")]
    QuotaExceeded { limit: i64, used: i64 },

    /// Payment amount is larger than what is still owed.
    #[error("Payment of {amount} exceeds outstanding balance {balance} on invoice {invoice_id}")]
    PaymentExceedsBalance {
        invoice_id: String,
        amount: Money,
        balance: Money,
    },

    /// Payments cannot be recorded against a closed invoice.
    #[error("Invoice {invoice_id} is {status}, payments are not accepted")]
    InvoiceClosed {
        invoice_id: String,
        status: InvoiceStatus,
    },

    /// A DRAFT invoice with recorded payments cannot be deleted.
    #[error("Invoice {invoice_id} has {count} recorded payment(s) and cannot be deleted")]
    InvoiceHasPayments { invoice_id: String, count: i64 },

    /// The caller's role is not in the allowed set.
    #[error("Role {role} is not allowed to {operation}")]
    Forbidden { role: Role, operation: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::TenantNotFound(_)
            | CoreError::InvoiceNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::CustomerNotFound(_)
            | CoreError::PaymentNotFound(_) => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. }
            | CoreError::InvalidTransition { .. }
            | CoreError::PaymentExceedsBalance { .. }
            | CoreError::InvoiceClosed { .. }
            | CoreError::InvoiceHasPayments { .. } => ErrorKind::BusinessRule,
            CoreError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            CoreError::Forbidden { .. } => ErrorKind::Forbidden,
            CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Used for early validation before any database work.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "COKE-330".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for COKE-330: available 3, requested 5"
        );

        let err = CoreError::InvalidTransition {
            invoice_id: "inv-1".to_string(),
            from: InvoiceStatus::Sent,
            action: InvoiceAction::Send,
        };
        assert_eq!(err.to_string(), "Invoice inv-1 is SENT, cannot send");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CoreError::InvoiceNotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::QuotaExceeded { limit: 2, used: 2 }.kind(),
            ErrorKind::QuotaExceeded
        );
        assert_eq!(
            CoreError::PaymentExceedsBalance {
                invoice_id: "x".into(),
                amount: Money::from_cents(2),
                balance: Money::from_cents(1),
            }
            .kind(),
            ErrorKind::BusinessRule
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        assert_eq!(validation_err.field(), "items");
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }
}
