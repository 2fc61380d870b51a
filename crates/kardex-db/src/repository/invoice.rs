//! # Invoice Repository
//!
//! Invoices and their items.
//!
//! ## Conditional Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Status changes are compare-and-swap statements:                        │
//! │                                                                         │
//! │    UPDATE invoices SET status = 'SENT'                                  │
//! │    WHERE id = ? AND tenant_id = ? AND status IN ('DRAFT')               │
//! │    RETURNING *                                                          │
//! │                                                                         │
//! │  No row back means "absent, or not in an allowed status". The service   │
//! │  re-reads to tell the two apart. A concurrent writer can never have     │
//! │  its status overwritten by a decision taken on a stale read.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use kardex_core::{Invoice, InvoiceItem, InvoiceStatus, Page, PageRequest, PaymentStatus};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::DbResult;

/// Filters for listing invoices. Dates apply to `issue_date`, inclusive.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

// =============================================================================
// Writes
// =============================================================================

/// Inserts an invoice header.
pub async fn insert(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    debug!(id = %invoice.id, number = %invoice.invoice_number, "Inserting invoice");

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, tenant_id, invoice_number, customer_id, user_id,
            subtotal_cents, tax_cents, discount_cents, total_cents,
            issue_date, due_date, status, payment_status, notes,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13, ?14,
            ?15, ?16
        )
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.tenant_id)
    .bind(&invoice.invoice_number)
    .bind(&invoice.customer_id)
    .bind(&invoice.user_id)
    .bind(invoice.subtotal_cents)
    .bind(invoice.tax_cents)
    .bind(invoice.discount_cents)
    .bind(invoice.total_cents)
    .bind(invoice.issue_date)
    .bind(invoice.due_date)
    .bind(invoice.status)
    .bind(invoice.payment_status)
    .bind(&invoice.notes)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts an invoice line.
///
/// ## Snapshot Pattern
/// SKU and name are copied onto the line so it still reads correctly after
/// the product changes or is deleted.
pub async fn insert_item(conn: &mut SqliteConnection, item: &InvoiceItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_items (
            id, invoice_id, product_id, sku_snapshot, name_snapshot,
            quantity, unit_price_cents, tax_rate_bps,
            subtotal_cents, tax_cents, discount_cents, total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&item.id)
    .bind(&item.invoice_id)
    .bind(&item.product_id)
    .bind(&item.sku_snapshot)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.tax_rate_bps)
    .bind(item.subtotal_cents)
    .bind(item.tax_cents)
    .bind(item.discount_cents)
    .bind(item.total_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Touches the invoice row and returns it.
///
/// Used as the first statement of a transaction that depends on the
/// invoice's current state: the write takes the database lock before the
/// state is read.
pub async fn claim(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices SET updated_at = ?1
        WHERE id = ?2 AND tenant_id = ?3
        RETURNING *
        "#,
    )
    .bind(Utc::now())
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(invoice)
}

/// Moves the invoice to `to` if its current status is one of `from`.
pub async fn transition_status(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
    from: &[InvoiceStatus],
    to: InvoiceStatus,
) -> DbResult<Option<Invoice>> {
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE invoices SET status = ");
    qb.push_bind(to)
        .push(", updated_at = ")
        .push_bind(Utc::now())
        .push(" WHERE id = ")
        .push_bind(id.to_string())
        .push(" AND tenant_id = ")
        .push_bind(tenant_id.to_string())
        .push(" AND status IN (");
    let mut allowed = qb.separated(", ");
    for status in from {
        allowed.push_bind(*status);
    }
    allowed.push_unseparated(") RETURNING *");

    let invoice = qb
        .build_query_as::<Invoice>()
        .fetch_optional(&mut *conn)
        .await?;

    Ok(invoice)
}

/// Patches notes and due date of a DRAFT invoice.
///
/// `notes`: `None` keeps the value, `Some(None)` clears it.
/// `due_date`: `None` keeps the value.
pub async fn update_draft_details(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
    notes: Option<Option<&str>>,
    due_date: Option<NaiveDate>,
) -> DbResult<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices
        SET notes = CASE WHEN ?1 THEN ?2 ELSE notes END,
            due_date = COALESCE(?3, due_date),
            updated_at = ?4
        WHERE id = ?5 AND tenant_id = ?6 AND status = 'DRAFT'
        RETURNING *
        "#,
    )
    .bind(notes.is_some())
    .bind(notes.flatten())
    .bind(due_date)
    .bind(Utc::now())
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(invoice)
}

/// Stores a recomputed payment status.
pub async fn set_payment_status(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
    status: PaymentStatus,
) -> DbResult<()> {
    sqlx::query(
        "UPDATE invoices SET payment_status = ?1, updated_at = ?2 WHERE id = ?3 AND tenant_id = ?4",
    )
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .bind(tenant_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Deletes a DRAFT invoice and its items. Returns whether a row was removed.
pub async fn delete_draft(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<bool> {
    sqlx::query(
        r#"
        DELETE FROM invoice_items
        WHERE invoice_id IN (
            SELECT id FROM invoices WHERE id = ?1 AND tenant_id = ?2 AND status = 'DRAFT'
        )
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .execute(&mut *conn)
    .await?;

    let result =
        sqlx::query("DELETE FROM invoices WHERE id = ?1 AND tenant_id = ?2 AND status = 'DRAFT'")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *conn)
            .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Reads
// =============================================================================

/// Gets an invoice by ID within the tenant.
pub async fn find_by_id(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Option<Invoice>> {
    let invoice =
        sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(invoice)
}

/// Lines of an invoice, in insertion order.
pub async fn items(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    invoice_id: &str,
) -> DbResult<Vec<InvoiceItem>> {
    let items = sqlx::query_as::<_, InvoiceItem>(
        r#"
        SELECT ii.*
        FROM invoice_items ii
        JOIN invoices i ON i.id = ii.invoice_id
        WHERE ii.invoice_id = ?1 AND i.tenant_id = ?2
        ORDER BY ii.rowid ASC
        "#,
    )
    .bind(invoice_id)
    .bind(tenant_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Lists invoices newest first.
pub async fn find_all(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    filter: &InvoiceFilter,
    page: PageRequest,
) -> DbResult<Page<Invoice>> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM invoices");
    push_filters(&mut count, tenant_id, filter);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut list = QueryBuilder::<Sqlite>::new("SELECT * FROM invoices");
    push_filters(&mut list, tenant_id, filter);
    list.push(" ORDER BY created_at DESC, invoice_number DESC LIMIT ")
        .push_bind(i64::from(page.limit))
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = list.build_query_as::<Invoice>().fetch_all(&mut *conn).await?;

    Ok(Page {
        items,
        total,
        page: page.page,
        limit: page.limit,
    })
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, tenant_id: &str, filter: &InvoiceFilter) {
    qb.push(" WHERE tenant_id = ").push_bind(tenant_id.to_string());
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(payment_status) = filter.payment_status {
        qb.push(" AND payment_status = ").push_bind(payment_status);
    }
    if let Some(customer_id) = &filter.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id.clone());
    }
    if let Some(from) = filter.from_date {
        qb.push(" AND issue_date >= ").push_bind(from);
    }
    if let Some(to) = filter.to_date {
        qb.push(" AND issue_date <= ").push_bind(to);
    }
}
