//! # Invoice Lifecycle
//!
//! Two independent state machines live on every invoice.
//!
//! ## Document Status
//! ```text
//!                 send                 (payments)
//!   ┌───────┐ ───────────► ┌──────┐ ─ ─ ─ ─ ─ ─ ► ┌──────┐
//!   │ DRAFT │              │ SENT │                │ PAID │
//!   └───┬───┘              └──┬───┘                └──┬───┘
//!       │ cancel              │ cancel                │ cancel
//!       │ update / delete     │                       │
//!       ▼                     ▼                       ▼
//!   ┌──────────────────────────────────────────────────────┐
//!   │                     CANCELLED                        │   (terminal)
//!   └──────────────────────────────────────────────────────┘
//!   ┌──────┐
//!   │ VOID │  legacy terminal state, no transitions in or out
//!   └──────┘
//! ```
//!
//! ## Settlement Status
//! ```text
//!   amount_paid == 0            → UNPAID
//!   0 < amount_paid < total     → PARTIALLY_PAID
//!   amount_paid >= total        → PAID
//! ```
//!
//! Settlement is always derived from recorded payments. It never moves the
//! document status.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Invoice Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Editable, stock already reserved.
    Draft,
    /// Issued to the customer.
    Sent,
    /// Settled document. Reachable only through legacy data.
    Paid,
    /// Stock returned. Terminal.
    Cancelled,
    /// Terminal.
    Void,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Cancelled,
        InvoiceStatus::Void,
    ];

    /// Wire/storage spelling.
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Cancelled => "CANCELLED",
            InvoiceStatus::Void => "VOID",
        }
    }

    /// Parses the wire spelling, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
    }

    /// No transition leaves a terminal status.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Cancelled | InvoiceStatus::Void)
    }

    /// Whether payments may still be recorded.
    pub const fn accepts_payments(&self) -> bool {
        !self.is_terminal()
    }

    /// Statuses from which `action` is permitted.
    pub const fn allowed_from(action: InvoiceAction) -> &'static [InvoiceStatus] {
        match action {
            InvoiceAction::Update | InvoiceAction::Send | InvoiceAction::Delete => {
                &[InvoiceStatus::Draft]
            }
            InvoiceAction::Cancel => &[
                InvoiceStatus::Draft,
                InvoiceStatus::Sent,
                InvoiceStatus::Paid,
            ],
        }
    }

    /// Applies `action` to this status.
    ///
    /// Returns the resulting status, `None` for a delete (the invoice stops
    /// existing), or `Err(self)` when the action is not permitted from here.
    ///
    /// ```rust
    /// use kardex_core::lifecycle::{InvoiceAction, InvoiceStatus};
    ///
    /// assert_eq!(
    ///     InvoiceStatus::Draft.transition(InvoiceAction::Send),
    ///     Ok(Some(InvoiceStatus::Sent))
    /// );
    /// assert!(InvoiceStatus::Sent.transition(InvoiceAction::Update).is_err());
    /// ```
    pub fn transition(self, action: InvoiceAction) -> Result<Option<InvoiceStatus>, InvoiceStatus> {
        if !Self::allowed_from(action).contains(&self) {
            return Err(self);
        }
        Ok(match action {
            InvoiceAction::Update => Some(self),
            InvoiceAction::Send => Some(InvoiceStatus::Sent),
            InvoiceAction::Cancel => Some(InvoiceStatus::Cancelled),
            InvoiceAction::Delete => None,
        })
    }

    /// Like [`transition`](Self::transition), failing with `InvalidTransition`
    /// for the named invoice.
    pub fn ensure(
        self,
        invoice_id: &str,
        action: InvoiceAction,
    ) -> CoreResult<Option<InvoiceStatus>> {
        self.transition(action)
            .map_err(|from| CoreError::InvalidTransition {
                invoice_id: invoice_id.to_string(),
                from,
                action,
            })
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Invoice Action
// =============================================================================

/// A status-sensitive operation on an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceAction {
    Update,
    Send,
    Cancel,
    Delete,
}

impl fmt::Display for InvoiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InvoiceAction::Update => "update",
            InvoiceAction::Send => "send",
            InvoiceAction::Cancel => "cancel",
            InvoiceAction::Delete => "delete",
        })
    }
}

// =============================================================================
// Payment Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl PaymentStatus {
    /// Derives settlement from the amount paid so far and the invoice total.
    pub fn from_amounts(paid: Money, total: Money) -> Self {
        if paid.cents() <= 0 {
            PaymentStatus::Unpaid
        } else if paid >= total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::PartiallyPaid
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::PartiallyPaid => "PARTIALLY_PAID",
            PaymentStatus::Paid => "PAID",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_allows_everything() {
        let draft = InvoiceStatus::Draft;
        assert_eq!(draft.transition(InvoiceAction::Update), Ok(Some(InvoiceStatus::Draft)));
        assert_eq!(draft.transition(InvoiceAction::Send), Ok(Some(InvoiceStatus::Sent)));
        assert_eq!(
            draft.transition(InvoiceAction::Cancel),
            Ok(Some(InvoiceStatus::Cancelled))
        );
        assert_eq!(draft.transition(InvoiceAction::Delete), Ok(None));
    }

    #[test]
    fn test_sent_and_paid_only_cancel() {
        for status in [InvoiceStatus::Sent, InvoiceStatus::Paid] {
            assert_eq!(status.transition(InvoiceAction::Update), Err(status));
            assert_eq!(status.transition(InvoiceAction::Send), Err(status));
            assert_eq!(status.transition(InvoiceAction::Delete), Err(status));
            assert_eq!(
                status.transition(InvoiceAction::Cancel),
                Ok(Some(InvoiceStatus::Cancelled))
            );
        }
    }

    #[test]
    fn test_terminal_states_reject_all_actions() {
        for status in [InvoiceStatus::Cancelled, InvoiceStatus::Void] {
            assert!(status.is_terminal());
            assert!(!status.accepts_payments());
            for action in [
                InvoiceAction::Update,
                InvoiceAction::Send,
                InvoiceAction::Cancel,
                InvoiceAction::Delete,
            ] {
                assert_eq!(status.transition(action), Err(status));
            }
        }
    }

    #[test]
    fn test_ensure_names_invoice() {
        let err = InvoiceStatus::Sent
            .ensure("inv-9", InvoiceAction::Delete)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invoice inv-9 is SENT, cannot delete");
    }

    #[test]
    fn test_status_parse_roundtrips_wire_names() {
        for status in InvoiceStatus::ALL {
            assert_eq!(InvoiceStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(InvoiceStatus::parse("draft"), Some(InvoiceStatus::Draft));
        assert_eq!(InvoiceStatus::parse("ARCHIVED"), None);
    }

    #[test]
    fn test_payment_status_from_amounts() {
        let total = Money::from_cents(23_800_000);
        assert_eq!(PaymentStatus::from_amounts(Money::zero(), total), PaymentStatus::Unpaid);
        assert_eq!(
            PaymentStatus::from_amounts(Money::from_cents(10_000_000), total),
            PaymentStatus::PartiallyPaid
        );
        assert_eq!(PaymentStatus::from_amounts(total, total), PaymentStatus::Paid);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::PartiallyPaid).unwrap(),
            "\"PARTIALLY_PAID\""
        );
        assert_eq!(serde_json::to_string(&InvoiceStatus::Cancelled).unwrap(), "\"CANCELLED\"");
    }
}
