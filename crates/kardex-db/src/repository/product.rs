//! # Product Repository
//!
//! Product reads for the invoice engine.
//!
//! Products are owned by the catalog. This engine only reads them; `stock`
//! changes go through [`super::stock::adjust`].

use chrono::Utc;
use kardex_core::Product;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

/// Gets a product by ID within the tenant.
pub async fn find_by_id(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, tenant_id, sku, name, price_cents, stock,
               created_at, updated_at
        FROM products
        WHERE id = ?1 AND tenant_id = ?2
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Current stock of a product, `None` when absent from the tenant.
pub async fn stock_level(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Option<i64>> {
    let stock = sqlx::query_scalar::<_, i64>(
        "SELECT stock FROM products WHERE id = ?1 AND tenant_id = ?2",
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(stock)
}

/// Inserts a product (seed binary and tests).
///
/// Initial stock is written directly; it is the opening balance, not a
/// movement.
pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(id = %product.id, sku = %product.sku, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, tenant_id, sku, name, price_cents, stock, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&product.id)
    .bind(&product.tenant_id)
    .bind(&product.sku)
    .bind(&product.name)
    .bind(product.price_cents)
    .bind(product.stock)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Builds a product value for fixtures.
pub fn new_product(
    tenant_id: &str,
    sku: &str,
    name: &str,
    price_cents: i64,
    stock: i64,
) -> Product {
    let now = Utc::now();
    Product {
        id: super::new_id(),
        tenant_id: tenant_id.to_string(),
        sku: sku.to_string(),
        name: name.to_string(),
        price_cents,
        stock,
        created_at: now,
        updated_at: now,
    }
}
