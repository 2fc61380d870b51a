//! # Repository Module
//!
//! Tenant-scoped SQL for Kardex, one module per table group.
//!
//! ## Connection-Passing Repositories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every function takes `&mut SqliteConnection` and a tenant id:         │
//! │                                                                         │
//! │  InvoiceService::cancel                                                │
//! │       │  let mut tx = pool.begin().await?;                             │
//! │       │                                                                 │
//! │       ├── invoice::transition_status(&mut *tx, tenant, ...)  (write)   │
//! │       ├── invoice::items(&mut *tx, tenant, ...)                        │
//! │       └── stock::adjust(&mut *tx, &StockAdjustment { .. })             │
//! │       │                                                                 │
//! │       ▼  tx.commit()                                                   │
//! │                                                                         │
//! │  The same functions run on a pooled connection for plain reads, so     │
//! │  a service decides the transaction boundary, never the repository.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`tenant`] - Tenant limits, the tenant claim, user summaries
//! - [`customer`] - Customer summaries
//! - [`product`] - Product reads (stock is written only by [`stock`])
//! - [`stock`] - The stock ledger: conditional stock updates + movements
//! - [`sequence`] - Per-tenant invoice number counter
//! - [`invoice`] - Invoices and their items
//! - [`payment`] - Payments

pub mod customer;
pub mod invoice;
pub mod payment;
pub mod product;
pub mod sequence;
pub mod stock;
pub mod tenant;

/// Generates a new entity id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
