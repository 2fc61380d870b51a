//! # Engine Services
//!
//! Transactional operations of the invoice engine.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate input (kardex-core)           no transaction yet             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │    first statement is a WRITE   ← tenant claim / status CAS / row claim │
//! │    reads (now under the write lock)                                    │
//! │    domain checks                ← any failure: ROLLBACK, nothing kept   │
//! │    writes + stock ledger                                               │
//! │  COMMIT                                                                │
//! │       │                                                                 │
//! │       └── DbError::Conflict?  retry once with a fresh transaction       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`invoice::InvoiceService`] - Invoice lifecycle manager
//! - [`payment::PaymentService`] - Payment reconciliation

use std::future::Future;

use tracing::warn;

use crate::error::EngineResult;

pub mod invoice;
pub mod payment;

/// Attempts per mutating operation: the first try plus one retry on conflict.
pub const MAX_ATTEMPTS: u32 = 2;

/// Runs `attempt` again when it fails with a conflict, up to [`MAX_ATTEMPTS`].
pub(crate) async fn with_retry<T, F, Fut>(
    operation: &'static str,
    mut attempt: F,
) -> EngineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = EngineResult<T>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(err) if err.is_conflict() && tries < MAX_ATTEMPTS => {
                warn!(operation, attempt = tries, error = %err, "Write conflict, retrying");
                tries += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the service tests.

    use kardex_core::{CallerIdentity, CustomerSummary, Product, Role};

    use crate::repository::{customer, product, tenant};
    use crate::{Database, DbConfig};

    pub const TENANT: &str = "tenant-a";
    pub const OTHER_TENANT: &str = "tenant-b";

    pub struct Fixture {
        pub db: Database,
        pub admin: CallerIdentity,
        pub laptop: Product,
        pub mouse: Product,
        pub customer: CustomerSummary,
    }

    pub async fn setup() -> Fixture {
        setup_with(Database::new(DbConfig::in_memory()).await.unwrap(), None).await
    }

    pub async fn setup_with_quota(max: i64) -> Fixture {
        setup_with(Database::new(DbConfig::in_memory()).await.unwrap(), Some(max)).await
    }

    pub async fn setup_with(db: Database, quota: Option<i64>) -> Fixture {
        let mut conn = db.pool().acquire().await.unwrap();

        tenant::insert_tenant(&mut conn, TENANT, "Acme", "INV", quota).await.unwrap();
        tenant::insert_tenant(&mut conn, OTHER_TENANT, "Globex", "GLX", None).await.unwrap();
        let admin = tenant::user("user-admin", "Ada Admin", Role::Admin);
        tenant::insert_user(&mut conn, TENANT, &admin).await.unwrap();
        let other = tenant::user("user-other", "Otto Other", Role::Admin);
        tenant::insert_user(&mut conn, OTHER_TENANT, &other).await.unwrap();

        let laptop = product::new_product(TENANT, "LAP-001", "Laptop", 10_000_000, 10);
        let mouse = product::new_product(TENANT, "MOU-001", "Mouse", 5_000, 3);
        product::insert(&mut conn, &laptop).await.unwrap();
        product::insert(&mut conn, &mouse).await.unwrap();

        let customer = CustomerSummary {
            id: crate::repository::new_id(),
            name: "Initech".to_string(),
            email: Some("billing@initech.test".to_string()),
            tax_id: Some("900-123".to_string()),
        };
        customer::insert(&mut conn, TENANT, &customer).await.unwrap();
        drop(conn);

        Fixture {
            db,
            admin: CallerIdentity::new(TENANT, "user-admin", Role::Admin),
            laptop,
            mouse,
            customer,
        }
    }

    pub async fn stock_of(db: &Database, product_id: &str) -> i64 {
        let mut conn = db.pool().acquire().await.unwrap();
        product::stock_level(&mut conn, TENANT, product_id).await.unwrap().unwrap()
    }
}
