//! # Payment Repository
//!
//! Payments recorded against invoices. Every query is tenant-scoped.

use chrono::NaiveDate;
use kardex_core::{Money, Page, PageRequest, Payment, PaymentMethod};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::DbResult;

/// Filters for listing payments. Dates apply to `payment_date`, inclusive.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub invoice_id: Option<String>,
    pub method: Option<PaymentMethod>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// Inserts a payment.
pub async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    debug!(
        id = %payment.id,
        invoice_id = %payment.invoice_id,
        amount = %payment.amount(),
        "Inserting payment"
    );

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, tenant_id, invoice_id, amount_cents, method, reference, notes,
            payment_date, user_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.tenant_id)
    .bind(&payment.invoice_id)
    .bind(payment.amount_cents)
    .bind(payment.method)
    .bind(&payment.reference)
    .bind(&payment.notes)
    .bind(payment.payment_date)
    .bind(&payment.user_id)
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Deletes a payment and returns the invoice it belonged to.
pub async fn delete(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Option<String>> {
    let invoice_id = sqlx::query_scalar::<_, String>(
        "DELETE FROM payments WHERE id = ?1 AND tenant_id = ?2 RETURNING invoice_id",
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(invoice_id)
}

/// Sum of the payments recorded against an invoice.
pub async fn total_paid(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    invoice_id: &str,
) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(amount_cents), 0) FROM payments
        WHERE tenant_id = ?1 AND invoice_id = ?2
        "#,
    )
    .bind(tenant_id)
    .bind(invoice_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_cents(cents))
}

/// Number of payments recorded against an invoice.
pub async fn count_for_invoice(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    invoice_id: &str,
) -> DbResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE tenant_id = ?1 AND invoice_id = ?2")
            .bind(tenant_id)
            .bind(invoice_id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(count)
}

/// Payments of an invoice, oldest first.
pub async fn list_for_invoice(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    invoice_id: &str,
) -> DbResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(
        r#"
        SELECT * FROM payments
        WHERE tenant_id = ?1 AND invoice_id = ?2
        ORDER BY payment_date ASC, created_at ASC
        "#,
    )
    .bind(tenant_id)
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(payments)
}

/// Gets a payment by ID within the tenant.
pub async fn find_by_id(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Option<Payment>> {
    let payment =
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(payment)
}

/// Lists payments, newest payment date first.
pub async fn find_all(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    filter: &PaymentFilter,
    page: PageRequest,
) -> DbResult<Page<Payment>> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM payments");
    push_filters(&mut count, tenant_id, filter);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut list = QueryBuilder::<Sqlite>::new("SELECT * FROM payments");
    push_filters(&mut list, tenant_id, filter);
    list.push(" ORDER BY payment_date DESC, created_at DESC LIMIT ")
        .push_bind(i64::from(page.limit))
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = list.build_query_as::<Payment>().fetch_all(&mut *conn).await?;

    Ok(Page {
        items,
        total,
        page: page.page,
        limit: page.limit,
    })
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, tenant_id: &str, filter: &PaymentFilter) {
    qb.push(" WHERE tenant_id = ").push_bind(tenant_id.to_string());
    if let Some(invoice_id) = &filter.invoice_id {
        qb.push(" AND invoice_id = ").push_bind(invoice_id.clone());
    }
    if let Some(method) = filter.method {
        qb.push(" AND method = ").push_bind(method);
    }
    if let Some(from) = filter.from_date {
        qb.push(" AND payment_date >= ").push_bind(from);
    }
    if let Some(to) = filter.to_date {
        qb.push(" AND payment_date <= ").push_bind(to);
    }
}
