//! # Seed Data Generator
//!
//! Populates a database with a demo tenant for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./kardex_dev.db
//! cargo run -p kardex-db --bin seed
//!
//! # Specify database path and a monthly invoice quota
//! cargo run -p kardex-db --bin seed -- --db ./data/kardex.db --quota 50
//! ```
//!
//! ## Generated Data
//! - Tenant `demo` (prefix `FAC`) and tenant `globex` (prefix `GLX`)
//! - One admin, one manager and one staff user per tenant
//! - A handful of customers
//! - Products across categories, stock 0 - 100

use std::env;

use anyhow::{bail, Context};
use kardex_core::{CustomerSummary, Role};
use kardex_db::repository::{customer, new_id, product, tenant};
use kardex_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TENANTS: &[(&str, &str, &str)] =
    &[("demo", "Demo Hardware", "FAC"), ("globex", "Globex", "GLX")];

/// (role, name)
const USERS: &[(Role, &str)] = &[
    (Role::Admin, "Ana Admin"),
    (Role::Manager, "Mario Manager"),
    (Role::Staff, "Sofia Staff"),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Initech", "900123456"),
    ("Umbrella Corp", "900654321"),
    ("Stark Industries", "800111222"),
];

/// (SKU prefix, names, base price in cents)
const CATEGORIES: &[(&str, &[&str], i64)] = &[
    ("TOOL", &["Hammer", "Screwdriver Set", "Wrench", "Pliers", "Tape Measure"], 2_500_000),
    ("ELEC", &["Drill", "Angle Grinder", "Jigsaw", "Heat Gun"], 18_000_000),
    ("FAST", &["Wood Screws 100", "Wall Anchors 50", "Bolts M8 20"], 900_000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kardex_dev.db");
    let mut quota: Option<i64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                let value = args.get(i + 1).context("--db needs a path")?;
                db_path = value.clone();
                i += 1;
            }
            "--quota" | "-q" => {
                let value = args.get(i + 1).context("--quota needs a number")?;
                quota = Some(value.parse().context("--quota must be an integer")?);
                i += 1;
            }
            "--help" | "-h" => {
                println!("Kardex Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kardex_dev.db)");
                println!("  -q, --quota <N>    Monthly invoice quota for the demo tenant");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    info!(db = %db_path, "Seeding database");
    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("failed to open database")?;

    let mut conn = db.pool().acquire().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants")
        .fetch_one(&mut *conn)
        .await?;
    if existing > 0 {
        warn!(tenants = existing, "Database already seeded, delete the file to regenerate");
        return Ok(());
    }

    let mut products = 0;
    for (index, (tenant_id, name, prefix)) in TENANTS.iter().enumerate() {
        let tenant_quota = if index == 0 { quota } else { None };
        tenant::insert_tenant(&mut conn, tenant_id, name, prefix, tenant_quota).await?;

        for (role, user_name) in USERS {
            let user_id = format!("{}-{}", tenant_id, role.as_str());
            let user = tenant::user(&user_id, user_name, *role);
            tenant::insert_user(&mut conn, tenant_id, &user).await?;
        }

        for (customer_name, tax_id) in CUSTOMERS {
            let summary = CustomerSummary {
                id: new_id(),
                name: customer_name.to_string(),
                email: None,
                tax_id: Some(tax_id.to_string()),
            };
            customer::insert(&mut conn, tenant_id, &summary).await?;
        }

        for (category, names, base_price) in CATEGORIES {
            for (seed, product_name) in names.iter().enumerate() {
                let sku = format!("{}-{:03}", category, seed + 1);
                let price_cents = base_price + (seed as i64 * 150_000);
                let stock = ((seed * 37 + index * 11) % 101) as i64;

                let item = product::new_product(tenant_id, &sku, product_name, price_cents, stock);
                product::insert(&mut conn, &item).await?;
                products += 1;
            }
        }

        info!(tenant_id = %tenant_id, prefix = %prefix, "Seeded tenant");
    }

    info!(
        tenants = TENANTS.len(),
        users = TENANTS.len() * USERS.len(),
        products,
        "Seed complete"
    );
    info!("Try: X-Tenant-Id: demo, X-User-Id: demo-admin, X-User-Role: admin");

    Ok(())
}
