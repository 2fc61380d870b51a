//! # Request and Response Shapes
//!
//! JSON bodies exchanged with clients. Keys are camelCase, money travels as
//! decimal numbers in major units and tax rates as percentages.
//!
//! ```text
//! domain (integers)                 wire (decimals)
//! ─────────────────                 ───────────────
//! total_cents: 23_800_000   ──────► "total": 238000.0
//! tax_rate_bps: 1900        ──────► "taxRate": 19.0
//! "unitPrice": 100000.5     ──────► unit_price: Money(10_000_050)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use kardex_core::{
    CustomerSummary, Invoice, InvoiceDetail, InvoiceItem, InvoiceStatus, Money, MovementType, Page,
    PageRequest, Payment, PaymentMethod, PaymentStatus, Role, StockMovement, TaxRate, UserSummary,
};
use kardex_db::{
    CreateInvoice, CreateInvoiceItem, InvoiceFilter, PaymentFilter, RecordPayment, UpdateInvoice,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub customer_id: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<CreateInvoiceItemRequest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceItemRequest {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Option<Decimal>,
    /// Percent, e.g. `19` or `8.25`.
    pub tax_rate: Option<Decimal>,
    pub discount: Option<Decimal>,
}

impl TryFrom<CreateInvoiceRequest> for CreateInvoice {
    type Error = ApiError;

    fn try_from(req: CreateInvoiceRequest) -> Result<Self, Self::Error> {
        let items = req
            .items
            .into_iter()
            .map(|item| {
                Ok(CreateInvoiceItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price.map(|v| money("unitPrice", v)).transpose()?,
                    tax_rate: item.tax_rate.map(tax_rate).transpose()?,
                    discount: item.discount.map(|v| money("discount", v)).transpose()?,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(CreateInvoice {
            customer_id: req.customer_id,
            due_date: req.due_date,
            notes: req.notes,
            items,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl From<UpdateInvoiceRequest> for UpdateInvoice {
    fn from(req: UpdateInvoiceRequest) -> Self {
        UpdateInvoice {
            notes: req.notes,
            due_date: req.due_date,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub invoice_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub payment_date: Option<NaiveDate>,
}

impl TryFrom<RecordPaymentRequest> for RecordPayment {
    type Error = ApiError;

    fn try_from(req: RecordPaymentRequest) -> Result<Self, Self::Error> {
        Ok(RecordPayment {
            invoice_id: req.invoice_id,
            amount: money("amount", req.amount)?,
            method: req.method,
            reference: req.reference,
            notes: req.notes,
            payment_date: req.payment_date,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListQuery {
    pub status: Option<InvoiceStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl InvoiceListQuery {
    pub fn into_parts(self) -> (InvoiceFilter, PageRequest) {
        let filter = InvoiceFilter {
            status: self.status,
            payment_status: self.payment_status,
            customer_id: self.customer_id,
            from_date: self.from_date,
            to_date: self.to_date,
        };
        (filter, PageRequest::new(self.page, self.limit))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListQuery {
    pub invoice_id: Option<String>,
    pub method: Option<PaymentMethod>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PaymentListQuery {
    pub fn into_parts(self) -> (PaymentFilter, PageRequest) {
        let filter = PaymentFilter {
            invoice_id: self.invoice_id,
            method: self.method,
            from_date: self.from_date,
            to_date: self.to_date,
        };
        (filter, PageRequest::new(self.page, self.limit))
    }
}

fn money(field: &str, value: Decimal) -> Result<Money, ApiError> {
    Money::from_decimal(value)
        .ok_or_else(|| ApiError::validation(format!("{field} is out of range")))
}

fn tax_rate(value: Decimal) -> Result<TaxRate, ApiError> {
    TaxRate::from_percent(value)
        .ok_or_else(|| ApiError::validation("taxRate must be between 0 and 100"))
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: String,
    pub invoice_number: String,
    pub customer_id: Option<String>,
    pub user_id: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(inv: Invoice) -> Self {
        InvoiceResponse {
            subtotal: decimal(inv.subtotal_cents),
            tax: decimal(inv.tax_cents),
            discount: decimal(inv.discount_cents),
            total: decimal(inv.total_cents),
            id: inv.id,
            invoice_number: inv.invoice_number,
            customer_id: inv.customer_id,
            user_id: inv.user_id,
            issue_date: inv.issue_date,
            due_date: inv.due_date,
            status: inv.status,
            payment_status: inv.payment_status,
            notes: inv.notes,
            created_at: inv.created_at,
            updated_at: inv.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemResponse {
    pub id: String,
    pub product_id: Option<String>,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl From<InvoiceItem> for InvoiceItemResponse {
    fn from(item: InvoiceItem) -> Self {
        InvoiceItemResponse {
            id: item.id,
            product_id: item.product_id,
            sku: item.sku_snapshot,
            name: item.name_snapshot,
            quantity: item.quantity,
            unit_price: decimal(item.unit_price_cents),
            tax_rate: TaxRate::from_bps(item.tax_rate_bps).percent(),
            subtotal: decimal(item.subtotal_cents),
            tax: decimal(item.tax_cents),
            discount: decimal(item.discount_cents),
            total: decimal(item.total_cents),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub tax_id: Option<String>,
}

impl From<CustomerSummary> for CustomerResponse {
    fn from(c: CustomerSummary) -> Self {
        CustomerResponse {
            id: c.id,
            name: c.name,
            email: c.email,
            tax_id: c.tax_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<UserSummary> for UserResponse {
    fn from(u: UserSummary) -> Self {
        UserResponse {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub invoice_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub payment_date: NaiveDate,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        PaymentResponse {
            amount: decimal(p.amount_cents),
            id: p.id,
            invoice_id: p.invoice_id,
            method: p.method,
            reference: p.reference,
            notes: p.notes,
            payment_date: p.payment_date,
            user_id: p.user_id,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementResponse {
    pub id: String,
    pub product_id: Option<String>,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub stock_after: i64,
    pub invoice_id: Option<String>,
    pub user_id: Option<String>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<StockMovement> for StockMovementResponse {
    fn from(m: StockMovement) -> Self {
        StockMovementResponse {
            id: m.id,
            product_id: m.product_id,
            movement_type: m.movement_type,
            quantity: m.quantity,
            stock_after: m.stock_after,
            invoice_id: m.invoice_id,
            user_id: m.user_id,
            reason: m.reason,
            created_at: m.created_at,
        }
    }
}

/// Invoice with everything the detail view shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetailResponse {
    #[serde(flatten)]
    pub invoice: InvoiceResponse,
    pub items: Vec<InvoiceItemResponse>,
    pub customer: Option<CustomerResponse>,
    pub user: Option<UserResponse>,
    pub payments: Vec<PaymentResponse>,
    pub movements: Vec<StockMovementResponse>,
    pub amount_paid: Decimal,
    pub balance: Decimal,
}

impl From<InvoiceDetail> for InvoiceDetailResponse {
    fn from(detail: InvoiceDetail) -> Self {
        let paid = detail.amount_paid();
        let balance = detail.invoice.total() - paid;

        InvoiceDetailResponse {
            invoice: detail.invoice.into(),
            items: detail.items.into_iter().map(Into::into).collect(),
            customer: detail.customer.map(Into::into),
            user: detail.user.map(Into::into),
            payments: detail.payments.into_iter().map(Into::into).collect(),
            movements: detail.movements.into_iter().map(Into::into).collect(),
            amount_paid: paid.to_decimal(),
            balance: balance.to_decimal(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T, U: Into<T>> From<Page<U>> for PaginatedResponse<T> {
    fn from(page: Page<U>) -> Self {
        let meta = PageMeta {
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages(),
        };

        PaginatedResponse {
            data: page.items.into_iter().map(Into::into).collect(),
            meta,
        }
    }
}

fn decimal(cents: i64) -> Decimal {
    Money::from_cents(cents).to_decimal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_converts_decimals() {
        let req: CreateInvoiceRequest = serde_json::from_value(json!({
            "items": [{
                "productId": "p1",
                "quantity": 2,
                "unitPrice": 100000,
                "taxRate": 8.25,
                "discount": 0.5
            }]
        }))
        .unwrap();

        let create = CreateInvoice::try_from(req).unwrap();
        let item = &create.items[0];
        assert_eq!(item.unit_price, Some(Money::from_cents(10_000_000)));
        assert_eq!(item.tax_rate, Some(TaxRate::from_bps(825)));
        assert_eq!(item.discount, Some(Money::from_cents(50)));
    }

    #[test]
    fn test_negative_tax_rate_is_rejected() {
        let req: CreateInvoiceRequest = serde_json::from_value(json!({
            "items": [{ "productId": "p1", "quantity": 1, "taxRate": -1 }]
        }))
        .unwrap();

        let err = CreateInvoice::try_from(req).unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
    }

    #[test]
    fn test_page_meta() {
        let page = Page {
            items: vec![1_i64, 2, 3],
            total: 21,
            page: 2,
            limit: 10,
        };
        let body = serde_json::to_value(PaginatedResponse::<i64>::from(page)).unwrap();
        assert_eq!(body["meta"], json!({ "total": 21, "page": 2, "limit": 10, "totalPages": 3 }));
        assert_eq!(body["data"], json!([1, 2, 3]));
    }
}
