//! # Pricing
//!
//! Line and invoice total computation.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  per line                                                               │
//! │    subtotal = unit_price × quantity                                     │
//! │    tax      = round_half_up(subtotal × tax_rate)                        │
//! │    total    = subtotal + tax − discount                                 │
//! │                                                                         │
//! │  per invoice                                                            │
//! │    subtotal = Σ line.subtotal     tax      = Σ line.tax                 │
//! │    discount = Σ line.discount     total    = Σ line.total               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tax is rounded per line, so the invoice total is exactly the sum of the
//! line totals.

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::TaxRate;
use crate::MAX_ITEM_QUANTITY;

/// Largest accepted tax rate (100%).
pub const MAX_TAX_RATE_BPS: u32 = 10_000;

/// Priced input for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInput {
    pub quantity: i64,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
    pub discount: Money,
}

/// Computed amounts for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineAmounts {
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl LineInput {
    /// Validates the input and computes the line amounts.
    pub fn compute(&self) -> Result<LineAmounts, ValidationError> {
        if self.quantity < 1 || self.quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if self.unit_price.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "unitPrice".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        if self.tax_rate.bps() > MAX_TAX_RATE_BPS {
            return Err(ValidationError::OutOfRange {
                field: "taxRate".to_string(),
                min: 0,
                max: 100,
            });
        }
        if self.discount.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }

        let subtotal = self
            .unit_price
            .checked_multiply(self.quantity)
            .ok_or_else(amount_too_large)?;
        let tax = subtotal.calculate_tax(self.tax_rate);
        let gross = subtotal.checked_add(tax).ok_or_else(amount_too_large)?;

        if self.discount > gross {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: gross.cents(),
            });
        }

        Ok(LineAmounts {
            subtotal,
            tax,
            discount: self.discount,
            total: gross.checked_sub(self.discount).ok_or_else(amount_too_large)?,
        })
    }
}

fn amount_too_large() -> ValidationError {
    ValidationError::InvalidFormat {
        field: "unitPrice".to_string(),
        reason: "line amount too large".to_string(),
    }
}

/// Invoice-level sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl InvoiceTotals {
    /// Sums already-computed line amounts, failing when a sum overflows.
    pub fn from_lines<'a, I>(lines: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = &'a LineAmounts>,
    {
        lines.into_iter().try_fold(InvoiceTotals::default(), |acc, line| {
            let sum = |a: Money, b: Money| a.checked_add(b).ok_or_else(amount_too_large);
            Ok(InvoiceTotals {
                subtotal: sum(acc.subtotal, line.subtotal)?,
                tax: sum(acc.tax, line.tax)?,
                discount: sum(acc.discount, line.discount)?,
                total: sum(acc.total, line.total)?,
            })
        })
    }
}

/// Computes every line and the invoice totals in one pass.
///
/// Fails with the first invalid line.
pub fn price_lines(
    inputs: &[LineInput],
) -> Result<(Vec<LineAmounts>, InvoiceTotals), ValidationError> {
    let lines = inputs
        .iter()
        .map(LineInput::compute)
        .collect::<Result<Vec<_>, _>>()?;
    let totals = InvoiceTotals::from_lines(&lines)?;
    Ok((lines, totals))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, unit_cents: i64, bps: u32, discount_cents: i64) -> LineInput {
        LineInput {
            quantity,
            unit_price: Money::from_cents(unit_cents),
            tax_rate: TaxRate::from_bps(bps),
            discount: Money::from_cents(discount_cents),
        }
    }

    #[test]
    fn test_two_laptops_at_nineteen_percent() {
        let amounts = line(2, 10_000_000, 1900, 0).compute().unwrap();
        assert_eq!(amounts.subtotal, Money::from_cents(20_000_000));
        assert_eq!(amounts.tax, Money::from_cents(3_800_000));
        assert_eq!(amounts.total, Money::from_cents(23_800_000));
    }

    #[test]
    fn test_discount_reduces_total() {
        let amounts = line(1, 1000, 1900, 190).compute().unwrap();
        assert_eq!(amounts.total, Money::from_cents(1000));
    }

    #[test]
    fn test_zero_price_line_is_allowed() {
        let amounts = line(3, 0, 1900, 0).compute().unwrap();
        assert!(amounts.total.is_zero());
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(line(0, 100, 1900, 0).compute().is_err());
        assert!(line(MAX_ITEM_QUANTITY + 1, 100, 1900, 0).compute().is_err());
        assert!(line(1, -1, 1900, 0).compute().is_err());
        assert!(line(1, 100, 10_001, 0).compute().is_err());
        assert!(line(1, 100, 0, -1).compute().is_err());
        // discount larger than subtotal + tax
        assert!(line(1, 100, 0, 101).compute().is_err());
        assert!(line(2, i64::MAX, 0, 0).compute().is_err());
    }

    #[test]
    fn test_invoice_total_is_sum_of_lines() {
        let (lines, totals) = price_lines(&[
            line(2, 10_000_000, 1900, 0),
            line(3, 333, 825, 10),
            line(1, 1, 1900, 0),
        ])
        .unwrap();

        let line_sum: Money = lines.iter().map(|l| l.total).sum();
        assert_eq!(totals.total, line_sum);
        assert_eq!(
            totals.total,
            totals.subtotal + totals.tax - totals.discount
        );
    }

    #[test]
    fn test_line_sum_overflow_is_rejected() {
        let err = line(1, 5_000_000_000_000_000_000, 10_000, 0).compute().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidFormat { ref field, .. } if field == "unitPrice"
        ));
    }

    #[test]
    fn test_invoice_sum_overflow_is_rejected() {
        let big = line(1, 4_000_000_000_000_000_000, 0, 0);
        let err = price_lines(&[big, big, big]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidFormat { ref field, .. } if field == "unitPrice"
        ));
    }
}
