//! # Stock Ledger
//!
//! The only writer of `products.stock` and of `stock_movements`.
//!
//! ## One Adjustment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  adjust(conn, { product, delta: -2, SALE, invoice })                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET stock = stock + delta                              │
//! │  WHERE id = ? AND tenant_id = ? AND stock + delta >= 0                  │
//! │  RETURNING stock                                                        │
//! │       │                                                                 │
//! │       ├── 1 row  → INSERT stock_movements (delta, stock_after)          │
//! │       │                                                                 │
//! │       └── 0 rows → product missing?  ProductNotFound                    │
//! │                    otherwise         InsufficientStock (never clamps)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The check and the write are one statement, so two concurrent sales can
//! never both pass a check that only one of them fits. Callers always run
//! this inside their own transaction.

use chrono::Utc;
use kardex_core::{CoreError, MovementType, StockMovement, ValidationError};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbResult, EngineResult};

/// One requested stock change.
#[derive(Debug, Clone)]
pub struct StockAdjustment<'a> {
    pub tenant_id: &'a str,
    pub product_id: &'a str,
    /// Signed: negative removes units, positive returns them.
    pub delta: i64,
    pub movement_type: MovementType,
    pub reason: String,
    pub invoice_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
}

/// Applies a stock change and appends its movement.
pub async fn adjust(
    conn: &mut SqliteConnection,
    adjustment: &StockAdjustment<'_>,
) -> EngineResult<StockMovement> {
    if adjustment.delta == 0 {
        return Err(ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "stock adjustment must be non-zero".to_string(),
        }
        .into());
    }

    let now = Utc::now();

    let stock_after: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock = stock + ?1, updated_at = ?2
        WHERE id = ?3 AND tenant_id = ?4 AND stock + ?1 >= 0
        RETURNING stock
        "#,
    )
    .bind(adjustment.delta)
    .bind(now)
    .bind(adjustment.product_id)
    .bind(adjustment.tenant_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(stock_after) = stock_after else {
        let current: Option<(String, i64)> =
            sqlx::query_as("SELECT name, stock FROM products WHERE id = ?1 AND tenant_id = ?2")
                .bind(adjustment.product_id)
                .bind(adjustment.tenant_id)
                .fetch_optional(&mut *conn)
                .await?;

        return Err(match current {
            None => CoreError::ProductNotFound(adjustment.product_id.to_string()),
            Some((name, available)) => CoreError::InsufficientStock {
                product: name,
                available,
                requested: -adjustment.delta,
            },
        }
        .into());
    };

    let movement = StockMovement {
        id: super::new_id(),
        tenant_id: adjustment.tenant_id.to_string(),
        product_id: Some(adjustment.product_id.to_string()),
        movement_type: adjustment.movement_type,
        quantity: adjustment.delta,
        stock_after,
        invoice_id: adjustment.invoice_id.map(str::to_string),
        user_id: adjustment.user_id.map(str::to_string),
        reason: adjustment.reason.clone(),
        created_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, tenant_id, product_id, movement_type, quantity, stock_after,
            invoice_id, user_id, reason, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.tenant_id)
    .bind(&movement.product_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(movement.stock_after)
    .bind(&movement.invoice_id)
    .bind(&movement.user_id)
    .bind(&movement.reason)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(
        product_id = %adjustment.product_id,
        delta = movement.quantity,
        stock_after = movement.stock_after,
        movement_type = ?movement.movement_type,
        "Stock adjusted"
    );

    Ok(movement)
}

/// Movements recorded against an invoice, oldest first.
pub async fn movements_for_invoice(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    invoice_id: &str,
) -> DbResult<Vec<StockMovement>> {
    let movements = sqlx::query_as::<_, StockMovement>(
        r#"
        SELECT * FROM stock_movements
        WHERE tenant_id = ?1 AND invoice_id = ?2
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(tenant_id)
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(movements)
}

/// Movements of a product, oldest first.
pub async fn movements_for_product(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    product_id: &str,
) -> DbResult<Vec<StockMovement>> {
    let movements = sqlx::query_as::<_, StockMovement>(
        r#"
        SELECT * FROM stock_movements
        WHERE tenant_id = ?1 AND product_id = ?2
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(tenant_id)
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(movements)
}

/// Removes an invoice's movements. Only used when rolling back a DRAFT
/// invoice's own creation.
pub async fn delete_for_invoice(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    invoice_id: &str,
) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM stock_movements WHERE tenant_id = ?1 AND invoice_id = ?2")
        .bind(tenant_id)
        .bind(invoice_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
