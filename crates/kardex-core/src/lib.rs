//! # kardex-core: Pure Business Logic for Kardex
//!
//! The domain rules of the invoice lifecycle and stock-consistency engine,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Kardex Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │   POST /invoices, PATCH /invoices/:id/cancel, POST /payments    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              kardex-db services (transactions)                  │   │
//! │  │   InvoiceService, PaymentService, stock ledger, sequencer       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls pure rules                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kardex-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌──────────┐ ┌───────┐ │   │
//! │  │  │  money  │ │ pricing │ │ lifecycle │ │numbering │ │tenant │ │   │
//! │  │  │ Money   │ │ Line    │ │ Status    │ │ INV-0001 │ │ Role  │ │   │
//! │  │  │ TaxRate │ │ Totals  │ │ machines  │ │          │ │ Quota │ │   │
//! │  │  └─────────┘ └─────────┘ └───────────┘ └──────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Invoice, InvoiceItem, Product, Payment, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Line and invoice total computation
//! - [`lifecycle`] - Invoice status and payment status state machines
//! - [`numbering`] - Invoice number formatting and parsing
//! - [`tenant`] - Caller identity, roles and tenant limits
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use kardex_core::money::Money;
//! use kardex_core::pricing::LineInput;
//! use kardex_core::types::TaxRate;
//!
//! let line = LineInput {
//!     quantity: 2,
//!     unit_price: Money::from_cents(10_000_000), // 100000.00
//!     tax_rate: TaxRate::from_bps(1900),         // 19%
//!     discount: Money::zero(),
//! }
//! .compute()
//! .unwrap();
//!
//! assert_eq!(line.subtotal.cents(), 20_000_000);
//! assert_eq!(line.tax.cents(), 3_800_000);
//! assert_eq!(line.total.cents(), 23_800_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod tenant;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use lifecycle::{InvoiceAction, InvoiceStatus, PaymentStatus};
pub use money::Money;
pub use tenant::{CallerIdentity, Role, TenantLimits};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax rate applied to a line when the request does not name one (19%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1900;

/// Prefix used for invoice numbers when the tenant has not configured one.
pub const DEFAULT_INVOICE_PREFIX: &str = "INV";

/// Maximum number of lines on a single invoice.
pub const MAX_INVOICE_ITEMS: usize = 200;

/// Maximum quantity of a single line.
pub const MAX_ITEM_QUANTITY: i64 = 999_999;

/// Maximum length of free-text notes on invoices and payments.
pub const MAX_NOTES_LEN: usize = 2000;
