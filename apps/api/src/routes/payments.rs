//! Payment endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use kardex_core::CallerIdentity;
use kardex_db::RecordPayment;

use crate::dto::{PaginatedResponse, PaymentListQuery, PaymentResponse, RecordPaymentRequest};
use crate::error::ApiError;
use crate::AppState;

/// `GET /payments`
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    query: Result<Query<PaymentListQuery>, QueryRejection>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::malformed(e.body_text()))?;
    let (filter, page) = query.into_parts();

    let page = state.db.payments().find_all(&caller.tenant_id, &filter, page).await?;
    Ok(Json(page.into()))
}

/// `POST /payments`
pub async fn record(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<RecordPaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::malformed(e.body_text()))?;
    let request = RecordPayment::try_from(payload)?;

    let payment = state.db.payments().record(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

/// `DELETE /payments/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.payments().delete(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
