//! # Kardex API
//!
//! JSON HTTP surface of the invoice engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Request Pipeline                                │
//! │                                                                         │
//! │  TraceLayer ─► TimeoutLayer ─► localize_errors ─► require_identity      │
//! │                                                        │                │
//! │                                                        ▼                │
//! │   /invoices  list · find_one · create · update · delete · send · cancel │
//! │   /payments  list · record · delete                                     │
//! │                                                        │                │
//! │                                                        ▼                │
//! │                              kardex-db services (SQLite)                │
//! │                                                                         │
//! │  /health skips require_identity.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `KARDEX_HTTP_PORT` - listen port (default: 8080)
//! - `KARDEX_DATABASE_PATH` - SQLite file (default: ./data/kardex.db)
//! - `KARDEX_DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `KARDEX_DEFAULT_LOCALE` - `en` or `es` (default: en)
//! - `KARDEX_REQUEST_TIMEOUT_SECS` - per-request timeout (default: 30)

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod i18n;
pub mod routes;

use std::sync::Arc;

use axum::routing::{delete, get, patch};
use axum::{middleware, Router};
use kardex_db::Database;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::routes::{health, invoices, payments};

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the router with every route and middleware attached.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/invoices", get(invoices::list).post(invoices::create))
        .route(
            "/invoices/{id}",
            get(invoices::find_one).patch(invoices::update).delete(invoices::delete),
        )
        .route("/invoices/{id}/send", patch(invoices::send))
        .route("/invoices/{id}/cancel", patch(invoices::cancel))
        .route("/payments", get(payments::list).post(payments::record))
        .route("/payments/{id}", delete(payments::delete))
        .route_layer(middleware::from_fn(auth::require_identity));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(state.config.request_timeout))
                .layer(middleware::from_fn_with_state(state.clone(), error::localize_errors)),
        )
        .with_state(state)
}
