//! Tenant context: limits, the tenant claim, and user summaries.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use kardex_core::{Role, TenantLimits, UserSummary};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

/// Loads the limits of a tenant with a no-op write on its row.
///
/// Used as the first statement of an invoice creation: the write takes the
/// database write lock, so the quota count and numbering that follow cannot
/// race another creation.
pub async fn claim_limits(
    conn: &mut SqliteConnection,
    tenant_id: &str,
) -> DbResult<Option<TenantLimits>> {
    let limits = sqlx::query_as::<_, TenantLimits>(
        r#"
        UPDATE tenants
        SET invoice_prefix = invoice_prefix
        WHERE id = ?1
        RETURNING id AS tenant_id, invoice_prefix, max_invoices_per_month
        "#,
    )
    .bind(tenant_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(limits)
}

/// Counts invoices whose issue date falls in the UTC calendar month of `today`.
pub async fn count_invoices_in_month(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    today: NaiveDate,
) -> DbResult<i64> {
    let (start, end) = month_bounds(today);

    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM invoices
        WHERE tenant_id = ?1 AND issue_date >= ?2 AND issue_date < ?3
        "#,
    )
    .bind(tenant_id)
    .bind(start)
    .bind(end)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

/// First day of the month of `day`, and first day of the following month.
fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = day.with_day(1).unwrap_or(day);
    let end = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    }
    .unwrap_or(NaiveDate::MAX);
    (start, end)
}

/// Loads the summary of a user in the tenant.
pub async fn find_user(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    user_id: &str,
) -> DbResult<Option<UserSummary>> {
    let user = sqlx::query_as::<_, UserSummary>(
        "SELECT id, name, email, role FROM users WHERE id = ?1 AND tenant_id = ?2",
    )
    .bind(user_id)
    .bind(tenant_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}

// =============================================================================
// Fixtures (seed binary and tests)
// =============================================================================

/// Inserts a tenant.
pub async fn insert_tenant(
    conn: &mut SqliteConnection,
    id: &str,
    name: &str,
    invoice_prefix: &str,
    max_invoices_per_month: Option<i64>,
) -> DbResult<()> {
    debug!(tenant_id = %id, "Inserting tenant");

    sqlx::query(
        r#"
        INSERT INTO tenants (id, name, invoice_prefix, max_invoices_per_month, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(invoice_prefix)
    .bind(max_invoices_per_month)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts a user.
pub async fn insert_user(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    user: &UserSummary,
) -> DbResult<()> {
    let created_at: DateTime<Utc> = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (id, tenant_id, name, email, role, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&user.id)
    .bind(tenant_id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.role)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Convenience for fixtures: a user summary with the given role.
pub fn user(id: &str, name: &str, role: Role) -> UserSummary {
    UserSummary {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(month_bounds(d(2026, 3, 17)), (d(2026, 3, 1), d(2026, 4, 1)));
        assert_eq!(month_bounds(d(2026, 12, 31)), (d(2026, 12, 1), d(2027, 1, 1)));
    }
}
