//! HTTP handlers, one module per resource.
//!
//! Handlers stay thin: decode, call a service, map the result. Role checks
//! and every business rule live in the kardex-db services.

pub mod health;
pub mod invoices;
pub mod payments;
