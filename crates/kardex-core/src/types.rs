//! # Domain Types
//!
//! Core domain types used throughout Kardex.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Invoice      │──►│  InvoiceItem    │──►│    Product      │       │
//! │  │  invoice_number │1 N│  quantity       │N 1│  stock (>= 0)   │       │
//! │  │  status         │   │  unit_price     │   │  price_cents    │       │
//! │  │  payment_status │   │  tax_rate_bps   │   └────────┬────────┘       │
//! │  │  total_cents    │   │  total_cents    │            │ 1              │
//! │  └──┬──────────┬───┘   └─────────────────┘            │ N              │
//! │     │ 1        │ 1                           ┌────────▼────────┐       │
//! │     │ N        └────────────────────────────►│ StockMovement   │       │
//! │  ┌──▼──────────────┐                       N │  SALE / RETURN  │       │
//! │  │    Payment      │                         │  delta (signed) │       │
//! │  │  amount_cents   │                         └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tenant Scoping
//! Every persisted entity carries `tenant_id`. kardex-db never reads or writes
//! a row without a tenant predicate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::lifecycle::{InvoiceStatus, PaymentStatus};
use crate::money::Money;
use crate::tenant::Role;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so 1900 bps = 19%. Integer basis points
/// keep the tax formula in integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a decimal percentage (`19` → 1900 bps).
    ///
    /// Returns `None` for negative values or values that do not fit.
    pub fn from_percent(pct: rust_decimal::Decimal) -> Option<Self> {
        use rust_decimal::prelude::ToPrimitive;

        if pct.is_sign_negative() {
            return None;
        }
        (pct * rust_decimal::Decimal::ONE_HUNDRED)
            .round()
            .to_u32()
            .map(TaxRate)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a decimal percentage (1900 bps → 19.00).
    pub fn percent(&self) -> rust_decimal::Decimal {
        rust_decimal::Decimal::new(self.0 as i64, 2)
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product whose stock this engine mutates.
///
/// Product CRUD lives elsewhere; the engine only reads products and changes
/// `stock` through the stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    /// Stock Keeping Unit - business identifier.
    pub sku: String,
    pub name: String,
    /// Default unit price in minor units.
    pub price_cents: i64,
    /// Units on hand. Never negative.
    pub stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if the stock on hand covers `quantity`.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Customer & User Summaries
// =============================================================================

/// The part of a customer record shown on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerSummary {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub tax_id: Option<String>,
}

/// The part of a user record shown on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

// =============================================================================
// Invoice
// =============================================================================

/// An invoice header.
///
/// ## Invariants
/// - `total_cents == subtotal_cents + tax_cents - discount_cents`
/// - `total_cents == Σ items.total_cents`
/// - all amounts are non-negative
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub tenant_id: String,
    /// Human-readable number, unique per tenant (`INV-000042`).
    pub invoice_number: String,
    pub customer_id: Option<String>,
    /// User who created the invoice.
    pub user_id: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns the invoice total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A line on an invoice.
///
/// Uses the snapshot pattern: SKU and name are frozen at creation time so the
/// line still reads correctly after the product is renamed or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    /// `None` once the product has been deleted.
    pub product_id: Option<String>,
    pub sku_snapshot: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub tax_rate_bps: u32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Cause of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Units left with an invoice.
    Sale,
    /// Units came back from a cancelled or deleted invoice.
    Return,
    /// Manual correction.
    Adjustment,
    /// Units received from a supplier.
    Purchase,
}

/// Append-only audit record of one stock change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub tenant_id: String,
    /// `None` once the product has been deleted.
    pub product_id: Option<String>,
    pub movement_type: MovementType,
    /// Signed change: negative for sales, positive for returns.
    pub quantity: i64,
    /// Stock level right after this movement.
    pub stock_after: i64,
    pub invoice_id: Option<String>,
    pub user_id: Option<String>,
    pub reason: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Check,
    Other,
}

/// A payment recorded against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub tenant_id: String,
    pub invoice_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    /// External reference (transfer id, card auth code, etc.).
    pub reference: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub payment_date: NaiveDate,
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// An invoice with everything the detail view shows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub customer: Option<CustomerSummary>,
    pub user: Option<UserSummary>,
    pub payments: Vec<Payment>,
    pub movements: Vec<StockMovement>,
}

impl InvoiceDetail {
    /// Sum of recorded payments.
    pub fn amount_paid(&self) -> Money {
        self.payments.iter().map(Payment::amount).sum()
    }
}

/// One page of a list query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the filter across all pages.
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    /// Number of pages needed for `total` rows (0 when there are none).
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        let limit = i64::from(self.limit);
        ((self.total + limit - 1) / limit) as u32
    }
}

/// Page/limit pair after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Builds a page request, defaulting missing values and clamping the rest.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_tax_rate_from_percent() {
        assert_eq!(TaxRate::from_percent(Decimal::new(19, 0)).unwrap().bps(), 1900);
        assert_eq!(TaxRate::from_percent(Decimal::new(825, 2)).unwrap().bps(), 825);
        assert!(TaxRate::from_percent(Decimal::new(-1, 0)).is_none());
        assert_eq!(TaxRate::from_bps(1900).percent(), Decimal::new(19, 0));
    }

    #[test]
    fn test_tax_rate_default_is_nineteen_percent() {
        assert_eq!(TaxRate::default().bps(), 1900);
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(None, None);
        assert_eq!(req, PageRequest { page: 1, limit: 10 });
        assert_eq!(req.offset(), 0);

        let req = PageRequest::new(Some(0), Some(1000));
        assert_eq!(req, PageRequest { page: 1, limit: 100 });

        let req = PageRequest::new(Some(3), Some(20));
        assert_eq!(req.offset(), 40);
    }

    #[test]
    fn test_total_pages() {
        let page: Page<()> = Page { items: vec![], total: 21, page: 1, limit: 10 };
        assert_eq!(page.total_pages(), 3);
        let page: Page<()> = Page { items: vec![], total: 0, page: 1, limit: 10 };
        assert_eq!(page.total_pages(), 0);
    }
}
