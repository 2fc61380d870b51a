//! # kardex-db: Persistence and Transactional Engine for Kardex
//!
//! Every SQLite read and write of the invoice engine, plus the services that
//! wrap them in transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kardex Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /invoices)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    kardex-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (service/)    │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ InvoiceSvc    │───►│ invoice       │    │ 001_initial  │  │   │
//! │  │   │ PaymentSvc    │    │ stock ledger  │    │              │  │   │
//! │  │   │ BEGIN/COMMIT  │    │ sequence      │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │ pure rules                                         │   │
//! │  │           ▼                                                     │   │
//! │  │       kardex-core (pricing, lifecycle, numbering, roles)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and engine error types
//! - [`repository`] - Tenant-scoped SQL, one module per table group
//! - [`service`] - Invoice lifecycle and payment reconciliation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kardex_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/kardex.db")).await?;
//!
//! let detail = db.invoices().create(&caller, request).await?;
//! db.invoices().send(&caller, &detail.invoice.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, EngineError, EngineResult};
pub use pool::{Database, DbConfig};

pub use repository::invoice::InvoiceFilter;
pub use repository::payment::PaymentFilter;
pub use service::invoice::{CreateInvoice, CreateInvoiceItem, InvoiceService, UpdateInvoice};
pub use service::payment::{PaymentService, RecordPayment};
