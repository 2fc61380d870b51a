//! Invoice endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use kardex_core::CallerIdentity;
use kardex_db::CreateInvoice;

use crate::dto::{
    CreateInvoiceRequest, InvoiceDetailResponse, InvoiceListQuery, InvoiceResponse,
    PaginatedResponse, UpdateInvoiceRequest,
};
use crate::error::ApiError;
use crate::AppState;

/// `GET /invoices`
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    query: Result<Query<InvoiceListQuery>, QueryRejection>,
) -> Result<Json<PaginatedResponse<InvoiceResponse>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::malformed(e.body_text()))?;
    let (filter, page) = query.into_parts();

    let page = state.db.invoices().find_all(&caller.tenant_id, &filter, page).await?;
    Ok(Json(page.into()))
}

/// `GET /invoices/{id}`
pub async fn find_one(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceDetailResponse>, ApiError> {
    let detail = state.db.invoices().find_one(&caller.tenant_id, &id).await?;
    Ok(Json(detail.into()))
}

/// `POST /invoices`
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InvoiceDetailResponse>), ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::malformed(e.body_text()))?;
    let request = CreateInvoice::try_from(payload)?;

    let detail = state.db.invoices().create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// `PATCH /invoices/{id}`
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateInvoiceRequest>, JsonRejection>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::malformed(e.body_text()))?;

    let invoice = state.db.invoices().update(&caller, &id, payload.into()).await?;
    Ok(Json(invoice.into()))
}

/// `DELETE /invoices/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.invoices().delete(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /invoices/{id}/send`
pub async fn send(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.db.invoices().send(&caller, &id).await?;
    Ok(Json(invoice.into()))
}

/// `PATCH /invoices/{id}/cancel`
pub async fn cancel(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.db.invoices().cancel(&caller, &id).await?;
    Ok(Json(invoice.into()))
}
