//! # Payment Reconciliation
//!
//! Records and deletes payments, keeping each invoice's `payment_status`
//! equal to what its recorded payments say.
//!
//! ```text
//! paid == 0        → UNPAID
//! 0 < paid < total → PARTIALLY_PAID
//! paid >= total    → PAID
//! ```
//!
//! Only `payment_status` is derived here. The lifecycle `status` is never
//! moved by a payment.

use chrono::{NaiveDate, Utc};
use kardex_core::validation::{
    validate_date_range, validate_id, validate_notes, validate_payment_amount, validate_reference,
};
use kardex_core::{
    CallerIdentity, CoreError, Money, Page, PageRequest, Payment, PaymentMethod, PaymentStatus,
    Role,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use super::with_retry;
use crate::error::EngineResult;
use crate::repository::payment::PaymentFilter;
use crate::repository::{invoice, new_id, payment};

#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub invoice_id: String,
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    /// Defaults to today (UTC).
    pub payment_date: Option<NaiveDate>,
}

/// Payment operations. Obtained with `Database::payments()`.
#[derive(Debug, Clone)]
pub struct PaymentService {
    pool: SqlitePool,
}

impl PaymentService {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentService { pool }
    }

    /// Records a payment against an open invoice.
    pub async fn record(
        &self,
        caller: &CallerIdentity,
        request: RecordPayment,
    ) -> EngineResult<Payment> {
        caller.require_any(&[Role::Admin, Role::Manager], "record payments")?;

        validate_id("invoiceId", &request.invoice_id)?;
        validate_payment_amount(request.amount)?;
        let request = RecordPayment {
            reference: validate_reference(request.reference.as_deref())?,
            notes: validate_notes(request.notes.as_deref())?,
            ..request
        };
        let request = &request;

        let (recorded, status) =
            with_retry("record payment", move || self.try_record(caller, request)).await?;

        info!(
            tenant_id = %caller.tenant_id,
            invoice_id = %recorded.invoice_id,
            payment_id = %recorded.id,
            amount = %recorded.amount(),
            payment_status = %status,
            "Payment recorded"
        );
        Ok(recorded)
    }

    async fn try_record(
        &self,
        caller: &CallerIdentity,
        request: &RecordPayment,
    ) -> EngineResult<(Payment, PaymentStatus)> {
        let tenant_id = caller.tenant_id.as_str();
        let mut tx = self.pool.begin().await?;

        let target = invoice::claim(&mut tx, tenant_id, &request.invoice_id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(request.invoice_id.clone()))?;

        if !target.status.accepts_payments() {
            return Err(CoreError::InvoiceClosed {
                invoice_id: target.id,
                status: target.status,
            }
            .into());
        }

        let paid = payment::total_paid(&mut tx, tenant_id, &target.id).await?;
        let balance = target.total() - paid;
        if request.amount > balance {
            return Err(CoreError::PaymentExceedsBalance {
                invoice_id: target.id,
                amount: request.amount,
                balance,
            }
            .into());
        }

        let now = Utc::now();
        let recorded = Payment {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            invoice_id: target.id.clone(),
            amount_cents: request.amount.cents(),
            method: request.method,
            reference: request.reference.clone(),
            notes: request.notes.clone(),
            payment_date: request.payment_date.unwrap_or_else(|| now.date_naive()),
            user_id: caller.user_id.clone(),
            created_at: now,
        };
        payment::insert(&mut tx, &recorded).await?;

        let status = reconcile(&mut tx, tenant_id, &target.id, target.total()).await?;

        tx.commit().await?;
        Ok((recorded, status))
    }

    /// Deletes a payment and recomputes its invoice's payment status.
    pub async fn delete(&self, caller: &CallerIdentity, id: &str) -> EngineResult<()> {
        caller.require_any(&[Role::Admin], "delete payments")?;

        let (invoice_id, status) =
            with_retry("delete payment", move || self.try_delete(caller, id)).await?;

        info!(
            tenant_id = %caller.tenant_id,
            payment_id = %id,
            invoice_id = %invoice_id,
            payment_status = %status,
            "Payment deleted"
        );
        Ok(())
    }

    async fn try_delete(
        &self,
        caller: &CallerIdentity,
        id: &str,
    ) -> EngineResult<(String, PaymentStatus)> {
        let tenant_id = caller.tenant_id.as_str();
        let mut tx = self.pool.begin().await?;

        let invoice_id = payment::delete(&mut tx, tenant_id, id)
            .await?
            .ok_or_else(|| CoreError::PaymentNotFound(id.to_string()))?;

        let target = invoice::find_by_id(&mut tx, tenant_id, &invoice_id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(invoice_id.clone()))?;

        let status = reconcile(&mut tx, tenant_id, &invoice_id, target.total()).await?;

        tx.commit().await?;
        Ok((invoice_id, status))
    }

    /// Lists payments of a tenant, newest payment date first.
    pub async fn find_all(
        &self,
        tenant_id: &str,
        filter: &PaymentFilter,
        page: PageRequest,
    ) -> EngineResult<Page<Payment>> {
        validate_date_range(filter.from_date, filter.to_date)?;

        let mut conn = self.pool.acquire().await?;
        Ok(payment::find_all(&mut conn, tenant_id, filter, page).await?)
    }
}

/// Stores the payment status implied by the invoice's current payments.
async fn reconcile(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    invoice_id: &str,
    total: Money,
) -> EngineResult<PaymentStatus> {
    let paid = payment::total_paid(conn, tenant_id, invoice_id).await?;
    let status = PaymentStatus::from_amounts(paid, total);
    invoice::set_payment_status(conn, tenant_id, invoice_id, status).await?;
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::service::invoice::{CreateInvoice, CreateInvoiceItem};
    use crate::service::test_support::{setup, Fixture, OTHER_TENANT, TENANT};
    use kardex_core::{ErrorKind, Invoice, InvoiceStatus};

    /// One mouse: 5000 + 19% = 5950.
    async fn mouse_invoice(fx: &Fixture) -> Invoice {
        let request = CreateInvoice {
            items: vec![CreateInvoiceItem {
                product_id: fx.mouse.id.clone(),
                quantity: 1,
                unit_price: None,
                tax_rate: None,
                discount: None,
            }],
            ..Default::default()
        };
        fx.db.invoices().create(&fx.admin, request).await.unwrap().invoice
    }

    fn pay(invoice_id: &str, cents: i64) -> RecordPayment {
        RecordPayment {
            invoice_id: invoice_id.to_string(),
            amount: Money::from_cents(cents),
            method: PaymentMethod::BankTransfer,
            reference: Some("TRX-1".into()),
            notes: None,
            payment_date: None,
        }
    }

    async fn payment_status(fx: &Fixture, invoice_id: &str) -> PaymentStatus {
        fx.db.invoices().find_one(TENANT, invoice_id).await.unwrap().invoice.payment_status
    }

    #[tokio::test]
    async fn test_full_payment_marks_paid_and_delete_reverts() {
        let fx = setup().await;
        let inv = mouse_invoice(&fx).await;
        assert_eq!(inv.total_cents, 5_950);

        let recorded = fx.db.payments().record(&fx.admin, pay(&inv.id, 5_950)).await.unwrap();
        assert_eq!(payment_status(&fx, &inv.id).await, PaymentStatus::Paid);

        let detail = fx.db.invoices().find_one(TENANT, &inv.id).await.unwrap();
        assert_eq!(detail.invoice.status, InvoiceStatus::Draft);
        assert_eq!(detail.amount_paid(), Money::from_cents(5_950));

        fx.db.payments().delete(&fx.admin, &recorded.id).await.unwrap();
        assert_eq!(payment_status(&fx, &inv.id).await, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_status_follows_record_and_delete_sequence() {
        let fx = setup().await;
        let inv = mouse_invoice(&fx).await;
        let payments = fx.db.payments();

        let first = payments.record(&fx.admin, pay(&inv.id, 2_000)).await.unwrap();
        assert_eq!(payment_status(&fx, &inv.id).await, PaymentStatus::PartiallyPaid);

        payments.record(&fx.admin, pay(&inv.id, 3_950)).await.unwrap();
        assert_eq!(payment_status(&fx, &inv.id).await, PaymentStatus::Paid);

        payments.delete(&fx.admin, &first.id).await.unwrap();
        assert_eq!(payment_status(&fx, &inv.id).await, PaymentStatus::PartiallyPaid);
    }

    #[tokio::test]
    async fn test_over_balance_is_rejected_and_not_persisted() {
        let fx = setup().await;
        let inv = mouse_invoice(&fx).await;
        let payments = fx.db.payments();

        payments.record(&fx.admin, pay(&inv.id, 5_000)).await.unwrap();
        let err = payments.record(&fx.admin, pay(&inv.id, 951)).await.unwrap_err();

        match err {
            EngineError::Domain(CoreError::PaymentExceedsBalance { amount, balance, .. }) => {
                assert_eq!(amount, Money::from_cents(951));
                assert_eq!(balance, Money::from_cents(950));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let filter = PaymentFilter {
            invoice_id: Some(inv.id.clone()),
            ..Default::default()
        };
        let page = payments.find_all(TENANT, &filter, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(payment_status(&fx, &inv.id).await, PaymentStatus::PartiallyPaid);
    }

    #[tokio::test]
    async fn test_cancelled_invoice_rejects_payments() {
        let fx = setup().await;
        let inv = mouse_invoice(&fx).await;
        fx.db.invoices().cancel(&fx.admin, &inv.id).await.unwrap();

        let err = fx.db.payments().record(&fx.admin, pay(&inv.id, 100)).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvoiceClosed { status: InvoiceStatus::Cancelled, .. })
        ));
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_validation_error() {
        let fx = setup().await;
        let inv = mouse_invoice(&fx).await;

        let err = fx.db.payments().record(&fx.admin, pay(&inv.id, 0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = fx.db.payments().record(&fx.admin, pay(&inv.id, -5)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_find_all_filters_by_invoice_and_method() {
        let fx = setup().await;
        let first = mouse_invoice(&fx).await;
        let second = mouse_invoice(&fx).await;
        let payments = fx.db.payments();

        payments.record(&fx.admin, pay(&first.id, 1_000)).await.unwrap();
        payments.record(&fx.admin, pay(&first.id, 2_000)).await.unwrap();
        let mut cash = pay(&second.id, 500);
        cash.method = PaymentMethod::Cash;
        payments.record(&fx.admin, cash).await.unwrap();

        let by_invoice = PaymentFilter {
            invoice_id: Some(first.id.clone()),
            ..Default::default()
        };
        let page = payments.find_all(TENANT, &by_invoice, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|p| p.invoice_id == first.id));

        let by_method = PaymentFilter {
            method: Some(PaymentMethod::Cash),
            ..Default::default()
        };
        let page = payments.find_all(TENANT, &by_method, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].invoice_id, second.id);
    }

    #[tokio::test]
    async fn test_roles_and_tenants() {
        let fx = setup().await;
        let inv = mouse_invoice(&fx).await;
        let manager = CallerIdentity::new(TENANT, "user-manager", Role::Manager);
        let staff = CallerIdentity::new(TENANT, "user-staff", Role::Staff);
        let outsider = CallerIdentity::new(OTHER_TENANT, "user-other", Role::Admin);
        let payments = fx.db.payments();

        let err = payments.record(&staff, pay(&inv.id, 100)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let recorded = payments.record(&manager, pay(&inv.id, 100)).await.unwrap();
        let err = payments.delete(&manager, &recorded.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = payments.record(&outsider, pay(&inv.id, 100)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = payments.delete(&outsider, &recorded.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let page = payments
            .find_all(OTHER_TENANT, &PaymentFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }
}
