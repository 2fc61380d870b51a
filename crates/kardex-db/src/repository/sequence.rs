//! # Numbering Sequencer
//!
//! Per-tenant invoice numbers from an atomic counter row.
//!
//! ```text
//! invoice_sequences
//! ┌──────────────┬────────────┐
//! │ tenant_id PK │ last_value │   UPDATE ... SET last_value = last_value + 1
//! ├──────────────┼────────────┤              RETURNING last_value
//! │ tenant-a     │ 41         │ ──────────► 42 ──► "INV-000042"
//! └──────────────┴────────────┘
//! ```
//!
//! The increment happens inside the creation transaction, so a rolled-back
//! creation also rolls back its number.

use kardex_core::numbering::{format_invoice_number, parse_sequence};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::DbResult;

/// Draws the next invoice number for a tenant.
///
/// The first call for a tenant creates its counter, seeded from the highest
/// number already issued under `prefix`.
pub async fn next_invoice_number(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    prefix: &str,
) -> DbResult<String> {
    let created = sqlx::query(
        "INSERT OR IGNORE INTO invoice_sequences (tenant_id, last_value) VALUES (?1, 0)",
    )
    .bind(tenant_id)
    .execute(&mut *conn)
    .await?
    .rows_affected()
        == 1;

    if created {
        let seed = highest_issued(conn, tenant_id, prefix).await?;
        if seed > 0 {
            info!(tenant_id = %tenant_id, seed, "Seeding invoice sequence from existing numbers");
            sqlx::query("UPDATE invoice_sequences SET last_value = ?1 WHERE tenant_id = ?2")
                .bind(seed)
                .bind(tenant_id)
                .execute(&mut *conn)
                .await?;
        }
    }

    let value: i64 = sqlx::query_scalar(
        r#"
        UPDATE invoice_sequences
        SET last_value = last_value + 1
        WHERE tenant_id = ?1
        RETURNING last_value
        "#,
    )
    .bind(tenant_id)
    .fetch_one(&mut *conn)
    .await?;

    let number = format_invoice_number(prefix, value);
    debug!(tenant_id = %tenant_id, number = %number, "Drew invoice number");
    Ok(number)
}

/// Highest sequence among the tenant's invoice numbers issued under `prefix`.
async fn highest_issued(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    prefix: &str,
) -> DbResult<i64> {
    let numbers: Vec<String> = sqlx::query_scalar(
        "SELECT invoice_number FROM invoices WHERE tenant_id = ?1 AND invoice_number LIKE ?2",
    )
    .bind(tenant_id)
    .bind(format!("{}-%", prefix))
    .fetch_all(&mut *conn)
    .await?;

    Ok(numbers
        .iter()
        .filter_map(|n| parse_sequence(prefix, n))
        .max()
        .unwrap_or(0))
}
