//! Customer reads. Customer CRUD lives outside this engine.

use chrono::Utc;
use kardex_core::CustomerSummary;
use sqlx::SqliteConnection;

use crate::error::DbResult;

pub async fn find_summary(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    customer_id: &str,
) -> DbResult<Option<CustomerSummary>> {
    let customer = sqlx::query_as::<_, CustomerSummary>(
        "SELECT id, name, email, tax_id FROM customers WHERE id = ?1 AND tenant_id = ?2",
    )
    .bind(customer_id)
    .bind(tenant_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(customer)
}

/// Inserts a customer (seed binary and tests).
pub async fn insert(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    customer: &CustomerSummary,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO customers (id, tenant_id, name, email, tax_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&customer.id)
    .bind(tenant_id)
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.tax_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}
