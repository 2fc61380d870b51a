//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kardex                                 │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  EngineError::Domain(CoreError) ──► code + status from the variant      │
//! │  EngineError::Db(Conflict)     ──► 409 CONFLICT                         │
//! │  EngineError::Db(_)            ──► 500, details only in the log         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  IntoResponse: JSON body rendered in English, ApiError kept in the      │
//! │  response extensions                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  localize_errors middleware: re-renders the body for Accept-Language    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Body
//! ```json
//! {
//!   "code": "INVOICE_NOT_FOUND",
//!   "kind": "NOT_FOUND",
//!   "message": "Invoice not found: 6f1c..."
//! }
//! ```

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kardex_core::CoreError;
use kardex_db::{DbError, EngineError};
use serde::Serialize;

use crate::i18n::{Entity, Locale, Message};
use crate::AppState;

/// Error category as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorKind {
    NotFound,
    BusinessRule,
    Validation,
    Forbidden,
    Unauthorized,
    Conflict,
    Internal,
}

/// API error returned from handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    /// Machine-readable error code for programmatic handling
    pub code: &'static str,
    pub kind: ApiErrorKind,
    pub message: Message,
}

/// What the client receives.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        kind: ApiErrorKind,
        message: Message,
    ) -> Self {
        ApiError {
            status,
            code,
            kind,
            message,
        }
    }

    /// Missing or invalid identity header.
    pub fn unauthorized(header: &str) -> Self {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            ApiErrorKind::Unauthorized,
            Message::MissingIdentity(header.to_string()),
        )
    }

    /// Body, query or path that could not be decoded.
    pub fn malformed(detail: impl Into<String>) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "MALFORMED_REQUEST",
            ApiErrorKind::Validation,
            Message::MalformedRequest(detail.into()),
        )
    }

    /// Input that decoded but is not acceptable.
    pub fn validation(detail: impl Into<String>) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            ApiErrorKind::Validation,
            Message::Validation(detail.into()),
        )
    }

    fn not_found(code: &'static str, entity: Entity, id: String) -> Self {
        ApiError::new(
            StatusCode::NOT_FOUND,
            code,
            ApiErrorKind::NotFound,
            Message::NotFound { entity, id },
        )
    }

    fn business(code: &'static str, message: Message) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, code, ApiErrorKind::BusinessRule, message)
    }

    fn internal() -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            ApiErrorKind::Internal,
            Message::Internal,
        )
    }

    pub fn body(&self, locale: Locale) -> ErrorBody {
        ErrorBody {
            code: self.code,
            kind: self.kind,
            message: self.message.render(locale),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::TenantNotFound(id) => {
                ApiError::not_found("TENANT_NOT_FOUND", Entity::Tenant, id)
            }
            CoreError::InvoiceNotFound(id) => {
                ApiError::not_found("INVOICE_NOT_FOUND", Entity::Invoice, id)
            }
            CoreError::ProductNotFound(id) => {
                ApiError::not_found("PRODUCT_NOT_FOUND", Entity::Product, id)
            }
            CoreError::CustomerNotFound(id) => {
                ApiError::not_found("CUSTOMER_NOT_FOUND", Entity::Customer, id)
            }
            CoreError::PaymentNotFound(id) => {
                ApiError::not_found("PAYMENT_NOT_FOUND", Entity::Payment, id)
            }
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => ApiError::business(
                "INSUFFICIENT_STOCK",
                Message::InsufficientStock {
                    product,
                    available,
                    requested,
                },
            ),
            CoreError::InvalidTransition {
                invoice_id,
                from,
                action,
            } => ApiError::business(
                "INVALID_TRANSITION",
                Message::InvalidTransition {
                    invoice_id,
                    from,
                    action,
                },
            ),
            CoreError::QuotaExceeded { limit, used } => ApiError::new(
                StatusCode::FORBIDDEN,
                "QUOTA_EXCEEDED",
                ApiErrorKind::BusinessRule,
                Message::QuotaExceeded { limit, used },
            ),
            CoreError::PaymentExceedsBalance { amount, balance, .. } => ApiError::business(
                "PAYMENT_EXCEEDS_BALANCE",
                Message::PaymentExceedsBalance { amount, balance },
            ),
            CoreError::InvoiceClosed { invoice_id, status } => {
                ApiError::business("INVOICE_CLOSED", Message::InvoiceClosed { invoice_id, status })
            }
            CoreError::InvoiceHasPayments { invoice_id, count } => {
                ApiError::business(
                    "INVOICE_HAS_PAYMENTS",
                    Message::InvoiceHasPayments { invoice_id, count },
                )
            }
            CoreError::Forbidden { role, operation } => ApiError::new(
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                ApiErrorKind::Forbidden,
                Message::Forbidden { role, operation },
            ),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts engine errors to API errors.
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Domain(err) => err.into(),
            EngineError::Db(DbError::Conflict(detail)) => {
                tracing::warn!(%detail, "Write conflict surfaced to client");
                ApiError::new(
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    ApiErrorKind::Conflict,
                    Message::Conflict,
                )
            }
            EngineError::Db(err) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %err, "Database operation failed");
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body(Locale::En))).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message.render(Locale::En))
    }
}

impl std::error::Error for ApiError {}

/// Re-renders error bodies in the locale negotiated from `Accept-Language`.
pub async fn localize_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let locale = Locale::negotiate(
        request
            .headers()
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok()),
        state.config.default_locale,
    );

    let response = next.run(request).await;

    match response.extensions().get::<ApiError>() {
        Some(err) if locale != Locale::En => (err.status, Json(err.body(locale))).into_response(),
        _ => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kardex_core::{InvoiceAction, InvoiceStatus};

    #[test]
    fn test_status_mapping() {
        let err: ApiError = CoreError::InvoiceNotFound("x".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "INVOICE_NOT_FOUND");

        let err: ApiError = CoreError::InvalidTransition {
            invoice_id: "x".into(),
            from: InvoiceStatus::Cancelled,
            action: InvoiceAction::Cancel,
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.kind, ApiErrorKind::BusinessRule);

        let err: ApiError = CoreError::QuotaExceeded { limit: 2, used: 2 }.into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err: ApiError = EngineError::Db(DbError::Conflict("busy".into())).into();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err: ApiError =
            EngineError::Db(DbError::QueryFailed("syntax error near SELEC".into())).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.body(Locale::En).message.contains("SELEC"));
    }
}
