//! # Invoice Lifecycle Manager
//!
//! Create, update, send, cancel and delete invoices, keeping stock and the
//! movement history consistent with every invoice.
//!
//! ## Stock Effects
//! ```text
//! ┌──────────────┬──────────────────────────────┬───────────────────────────┐
//! │ operation    │ status                       │ stock                     │
//! ├──────────────┼──────────────────────────────┼───────────────────────────┤
//! │ create       │ → DRAFT / UNPAID             │ −qty per line (SALE)      │
//! │ update       │ DRAFT → DRAFT                │ unchanged                 │
//! │ send         │ DRAFT → SENT                 │ unchanged                 │
//! │ cancel       │ DRAFT|SENT|PAID → CANCELLED  │ +qty per line (RETURN)    │
//! │ delete       │ DRAFT → (gone)               │ +qty per line, history    │
//! │              │                              │ of the invoice removed    │
//! └──────────────┴──────────────────────────────┴───────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use kardex_core::numbering::effective_prefix;
use kardex_core::pricing::{price_lines, LineInput};
use kardex_core::validation::{
    validate_date_range, validate_due_date, validate_id, validate_item_count, validate_notes,
    validate_quantity,
};
use kardex_core::{
    CallerIdentity, CoreError, Invoice, InvoiceAction, InvoiceDetail, InvoiceItem, InvoiceStatus,
    Money, MovementType, Page, PageRequest, PaymentStatus, Product, Role, TaxRate, ValidationError,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::with_retry;
use crate::error::{DbError, EngineError, EngineResult};
use crate::repository::invoice::InvoiceFilter;
use crate::repository::stock::StockAdjustment;
use crate::repository::{customer, invoice, new_id, payment, product, sequence, stock, tenant};

const WRITERS: &[Role] = &[Role::Admin, Role::Manager];
const ADMINS: &[Role] = &[Role::Admin];

// =============================================================================
// Requests
// =============================================================================

/// One requested line.
#[derive(Debug, Clone)]
pub struct CreateInvoiceItem {
    pub product_id: String,
    pub quantity: i64,
    /// Defaults to the product's price.
    pub unit_price: Option<Money>,
    /// Defaults to 19%.
    pub tax_rate: Option<TaxRate>,
    /// Absolute amount; defaults to zero.
    pub discount: Option<Money>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateInvoice {
    pub customer_id: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<CreateInvoiceItem>,
}

/// Patch for a DRAFT invoice. `None` leaves the field unchanged; blank
/// `notes` clear them.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoice {
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// A create request after field validation.
struct ValidatedInvoice {
    customer_id: Option<String>,
    due_date: Option<NaiveDate>,
    notes: Option<String>,
    items: Vec<CreateInvoiceItem>,
    issue_date: NaiveDate,
}

// =============================================================================
// Service
// =============================================================================

/// Invoice lifecycle operations. Obtained with `Database::invoices()`.
#[derive(Debug, Clone)]
pub struct InvoiceService {
    pool: SqlitePool,
}

impl InvoiceService {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceService { pool }
    }

    /// Creates a DRAFT invoice and takes its items out of stock.
    ///
    /// ## Flow
    /// ```text
    /// validate fields ──► BEGIN
    ///                       claim tenant row (lock) + limits
    ///                       quota check (this UTC month)
    ///                       customer exists?
    ///                       products exist + stock covers Σ qty per product
    ///                       price lines
    ///                       next invoice number
    ///                       INSERT invoice + items
    ///                       SALE movement per line
    ///                     COMMIT
    /// ```
    pub async fn create(
        &self,
        caller: &CallerIdentity,
        request: CreateInvoice,
    ) -> EngineResult<InvoiceDetail> {
        caller.require_any(WRITERS, "create invoices")?;

        let request = validate_create(request, Utc::now().date_naive())?;
        let request = &request;

        let detail = with_retry("create invoice", move || self.try_create(caller, request)).await?;

        info!(
            tenant_id = %caller.tenant_id,
            invoice_id = %detail.invoice.id,
            number = %detail.invoice.invoice_number,
            total = %detail.invoice.total(),
            items = detail.items.len(),
            "Invoice created"
        );
        Ok(detail)
    }

    async fn try_create(
        &self,
        caller: &CallerIdentity,
        request: &ValidatedInvoice,
    ) -> EngineResult<InvoiceDetail> {
        let tenant_id = caller.tenant_id.as_str();
        let mut tx = self.pool.begin().await?;

        let limits = tenant::claim_limits(&mut tx, tenant_id)
            .await?
            .ok_or_else(|| CoreError::TenantNotFound(tenant_id.to_string()))?;

        if limits.max_invoices_per_month.is_some() {
            let used =
                tenant::count_invoices_in_month(&mut tx, tenant_id, request.issue_date).await?;
            limits.check_invoice_quota(used)?;
        }

        let customer = match &request.customer_id {
            Some(customer_id) => Some(
                customer::find_summary(&mut tx, tenant_id, customer_id)
                    .await?
                    .ok_or_else(|| CoreError::CustomerNotFound(customer_id.clone()))?,
            ),
            None => None,
        };

        let products = load_products(&mut tx, tenant_id, &request.items).await?;

        let inputs: Vec<LineInput> = request
            .items
            .iter()
            .map(|item| {
                let product = &products[item.product_id.as_str()];
                LineInput {
                    quantity: item.quantity,
                    unit_price: item.unit_price.unwrap_or_else(|| product.price()),
                    tax_rate: item.tax_rate.unwrap_or_default(),
                    discount: item.discount.unwrap_or_default(),
                }
            })
            .collect();
        let (lines, totals) = price_lines(&inputs)?;

        let prefix = effective_prefix(Some(&limits.invoice_prefix)).to_string();
        let number = sequence::next_invoice_number(&mut tx, tenant_id, &prefix).await?;

        let now = Utc::now();
        let invoice = Invoice {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            invoice_number: number,
            customer_id: request.customer_id.clone(),
            user_id: caller.user_id.clone(),
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            discount_cents: totals.discount.cents(),
            total_cents: totals.total.cents(),
            issue_date: request.issue_date,
            due_date: request.due_date,
            status: InvoiceStatus::Draft,
            payment_status: PaymentStatus::Unpaid,
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        invoice::insert(&mut tx, &invoice).await?;

        let mut items = Vec::with_capacity(lines.len());
        let mut movements = Vec::with_capacity(lines.len());
        for ((requested, input), amounts) in request.items.iter().zip(&inputs).zip(&lines) {
            let product = &products[requested.product_id.as_str()];
            let item = InvoiceItem {
                id: new_id(),
                invoice_id: invoice.id.clone(),
                product_id: Some(product.id.clone()),
                sku_snapshot: product.sku.clone(),
                name_snapshot: product.name.clone(),
                quantity: input.quantity,
                unit_price_cents: input.unit_price.cents(),
                tax_rate_bps: input.tax_rate.bps(),
                subtotal_cents: amounts.subtotal.cents(),
                tax_cents: amounts.tax.cents(),
                discount_cents: amounts.discount.cents(),
                total_cents: amounts.total.cents(),
                created_at: now,
            };
            invoice::insert_item(&mut tx, &item).await?;

            let movement = stock::adjust(
                &mut tx,
                &StockAdjustment {
                    tenant_id,
                    product_id: &product.id,
                    delta: -item.quantity,
                    movement_type: MovementType::Sale,
                    reason: format!("Sale on invoice {}", invoice.invoice_number),
                    invoice_id: Some(&invoice.id),
                    user_id: Some(&caller.user_id),
                },
            )
            .await?;

            items.push(item);
            movements.push(movement);
        }

        let user = tenant::find_user(&mut tx, tenant_id, &caller.user_id).await?;

        tx.commit().await?;

        Ok(InvoiceDetail {
            invoice,
            items,
            customer,
            user,
            payments: Vec::new(),
            movements,
        })
    }

    /// Patches notes and due date of a DRAFT invoice. Totals are not touched.
    pub async fn update(
        &self,
        caller: &CallerIdentity,
        id: &str,
        request: UpdateInvoice,
    ) -> EngineResult<Invoice> {
        caller.require_any(WRITERS, "update invoices")?;

        // Present but blank notes clear the field.
        let notes = match request.notes.as_deref() {
            Some(text) => Some(validate_notes(Some(text))?),
            None => None,
        };
        let tenant_id = caller.tenant_id.as_str();
        let mut conn = self.pool.acquire().await?;

        let current = invoice::find_by_id(&mut conn, tenant_id, id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()))?;
        current.status.ensure(id, InvoiceAction::Update)?;
        validate_due_date(current.issue_date, request.due_date)?;

        let notes = notes.as_ref().map(|n| n.as_deref());
        match invoice::update_draft_details(&mut conn, tenant_id, id, notes, request.due_date)
            .await?
        {
            Some(updated) => {
                info!(tenant_id = %tenant_id, invoice_id = %id, "Invoice updated");
                Ok(updated)
            }
            None => Err(rejection(&mut conn, tenant_id, id, InvoiceAction::Update).await),
        }
    }

    /// DRAFT → SENT.
    pub async fn send(&self, caller: &CallerIdentity, id: &str) -> EngineResult<Invoice> {
        caller.require_any(WRITERS, "send invoices")?;

        let tenant_id = caller.tenant_id.as_str();
        let mut conn = self.pool.acquire().await?;

        let sent = invoice::transition_status(
            &mut conn,
            tenant_id,
            id,
            InvoiceStatus::allowed_from(InvoiceAction::Send),
            InvoiceStatus::Sent,
        )
        .await?;

        match sent {
            Some(invoice) => {
                info!(
                    tenant_id = %tenant_id,
                    invoice_id = %id,
                    number = %invoice.invoice_number,
                    "Invoice sent"
                );
                Ok(invoice)
            }
            None => Err(rejection(&mut conn, tenant_id, id, InvoiceAction::Send).await),
        }
    }

    /// Cancels an invoice and returns its items to stock.
    ///
    /// The invoice, its items and its history are kept.
    pub async fn cancel(&self, caller: &CallerIdentity, id: &str) -> EngineResult<Invoice> {
        caller.require_any(ADMINS, "cancel invoices")?;

        let invoice = with_retry("cancel invoice", move || self.try_cancel(caller, id)).await?;

        info!(
            tenant_id = %caller.tenant_id,
            invoice_id = %id,
            number = %invoice.invoice_number,
            "Invoice cancelled"
        );
        Ok(invoice)
    }

    async fn try_cancel(&self, caller: &CallerIdentity, id: &str) -> EngineResult<Invoice> {
        let tenant_id = caller.tenant_id.as_str();
        let mut tx = self.pool.begin().await?;

        let cancelled = invoice::transition_status(
            &mut tx,
            tenant_id,
            id,
            InvoiceStatus::allowed_from(InvoiceAction::Cancel),
            InvoiceStatus::Cancelled,
        )
        .await?;

        let Some(cancelled) = cancelled else {
            return Err(rejection(&mut tx, tenant_id, id, InvoiceAction::Cancel).await);
        };

        let reason = format!("Invoice {} cancelled", cancelled.invoice_number);
        restock_items(&mut tx, caller, &cancelled, &reason).await?;

        tx.commit().await?;
        Ok(cancelled)
    }

    /// Deletes a DRAFT invoice without payments, undoing its creation.
    pub async fn delete(&self, caller: &CallerIdentity, id: &str) -> EngineResult<()> {
        caller.require_any(ADMINS, "delete invoices")?;

        with_retry("delete invoice", move || self.try_delete(caller, id)).await?;

        info!(tenant_id = %caller.tenant_id, invoice_id = %id, "Invoice deleted");
        Ok(())
    }

    async fn try_delete(&self, caller: &CallerIdentity, id: &str) -> EngineResult<()> {
        let tenant_id = caller.tenant_id.as_str();
        let mut tx = self.pool.begin().await?;

        let current = invoice::claim(&mut tx, tenant_id, id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()))?;
        current.status.ensure(id, InvoiceAction::Delete)?;

        let payments = payment::count_for_invoice(&mut tx, tenant_id, id).await?;
        if payments > 0 {
            return Err(CoreError::InvoiceHasPayments {
                invoice_id: id.to_string(),
                count: payments,
            }
            .into());
        }

        let reason = format!("Invoice {} deleted", current.invoice_number);
        restock_items(&mut tx, caller, &current, &reason).await?;

        let removed = stock::delete_for_invoice(&mut tx, tenant_id, id).await?;
        debug!(invoice_id = %id, movements = removed, "Removed invoice stock history");

        if !invoice::delete_draft(&mut tx, tenant_id, id).await? {
            return Err(DbError::Conflict(format!("invoice {id} changed during delete")).into());
        }

        tx.commit().await?;
        Ok(())
    }

    /// Lists invoices of a tenant, newest first.
    pub async fn find_all(
        &self,
        tenant_id: &str,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> EngineResult<Page<Invoice>> {
        validate_date_range(filter.from_date, filter.to_date)?;

        let mut conn = self.pool.acquire().await?;
        Ok(invoice::find_all(&mut conn, tenant_id, filter, page).await?)
    }

    /// Loads an invoice with items, customer, creating user, payments and
    /// stock movements.
    pub async fn find_one(&self, tenant_id: &str, id: &str) -> EngineResult<InvoiceDetail> {
        let mut conn = self.pool.acquire().await?;

        let found = invoice::find_by_id(&mut conn, tenant_id, id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()))?;

        let items = invoice::items(&mut conn, tenant_id, id).await?;
        let customer = match &found.customer_id {
            Some(customer_id) => customer::find_summary(&mut conn, tenant_id, customer_id).await?,
            None => None,
        };
        let user = tenant::find_user(&mut conn, tenant_id, &found.user_id).await?;
        let payments = payment::list_for_invoice(&mut conn, tenant_id, id).await?;
        let movements = stock::movements_for_invoice(&mut conn, tenant_id, id).await?;

        Ok(InvoiceDetail {
            invoice: found,
            items,
            customer,
            user,
            payments,
            movements,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn validate_create(
    request: CreateInvoice,
    issue_date: NaiveDate,
) -> Result<ValidatedInvoice, ValidationError> {
    validate_item_count(request.items.len())?;

    for item in &request.items {
        validate_id("productId", &item.product_id)?;
        validate_quantity(item.quantity)?;
    }
    if let Some(customer_id) = &request.customer_id {
        validate_id("customerId", customer_id)?;
    }
    validate_due_date(issue_date, request.due_date)?;
    let notes = validate_notes(request.notes.as_deref())?;

    Ok(ValidatedInvoice {
        customer_id: request.customer_id,
        due_date: request.due_date,
        notes,
        items: request.items,
        issue_date,
    })
}

/// Loads every product named by the lines and checks that stock covers the
/// total quantity requested per product.
async fn load_products(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    items: &[CreateInvoiceItem],
) -> EngineResult<HashMap<String, Product>> {
    let mut products: HashMap<String, Product> = HashMap::new();
    let mut requested: HashMap<&str, i64> = HashMap::new();

    for item in items {
        if !products.contains_key(&item.product_id) {
            let found = product::find_by_id(conn, tenant_id, &item.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;
            products.insert(item.product_id.clone(), found);
        }

        let total = requested.entry(item.product_id.as_str()).or_insert(0);
        *total += item.quantity;

        let product = &products[&item.product_id];
        if !product.can_sell(*total) {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: *total,
            }
            .into());
        }
    }

    Ok(products)
}

/// Returns every line that still references a product to stock.
async fn restock_items(
    conn: &mut SqliteConnection,
    caller: &CallerIdentity,
    target: &Invoice,
    reason: &str,
) -> EngineResult<()> {
    let items = invoice::items(conn, &target.tenant_id, &target.id).await?;

    for item in &items {
        let Some(product_id) = item.product_id.as_deref() else {
            debug!(item_id = %item.id, "Product deleted, nothing to restock");
            continue;
        };

        stock::adjust(
            conn,
            &StockAdjustment {
                tenant_id: &target.tenant_id,
                product_id,
                delta: item.quantity,
                movement_type: MovementType::Return,
                reason: reason.to_string(),
                invoice_id: Some(&target.id),
                user_id: Some(&caller.user_id),
            },
        )
        .await?;
    }

    Ok(())
}

/// Explains why a conditional write on an invoice matched no row.
async fn rejection(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
    action: InvoiceAction,
) -> EngineError {
    match invoice::find_by_id(conn, tenant_id, id).await {
        Ok(None) => CoreError::InvoiceNotFound(id.to_string()).into(),
        Ok(Some(current)) => match current.status.ensure(id, action) {
            Err(err) => err.into(),
            // Allowed now: the status moved between our write and this read.
            Ok(_) => DbError::Conflict(format!("invoice {id} changed concurrently")).into(),
        },
        Err(err) => err.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
