//! Database seeders for built-in reference data
//!
//! Roles and the standard Romanian VAT rates are inserted on every start-up;
//! existing rows are left untouched.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use super::models::{RoleKey, UserKind};

/// Seed the built-in roles
pub async fn seed_roles(pool: &SqlitePool) -> Result<()> {
    let roles = [
        (RoleKey::Admin, "Administrator"),
        (RoleKey::SalesRep, "Agent vânzări"),
        (RoleKey::Customer, "Client"),
    ];

    for (key, name) in roles {
        sqlx::query("INSERT OR IGNORE INTO role (id, key, name) VALUES (?, ?, ?)")
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(key.as_str())
            .bind(name)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Seed default tax rates when the table is empty
pub async fn seed_tax_rates(pool: &SqlitePool) -> Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tax_rate")
        .fetch_one(pool)
        .await?;
    if count.0 > 0 {
        return Ok(());
    }

    info!("Seeding default tax rates...");

    let now = super::now();
    let rates: [(&str, f64); 4] = [
        ("TVA 21%", 21.0),
        ("TVA 11%", 11.0),
        ("TVA 5%", 5.0),
        ("Scutit TVA", 0.0),
    ];

    for (name, rate) in rates {
        sqlx::query("INSERT INTO tax_rate (id, name, rate, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(name)
            .bind(rate)
            .bind(&now)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Make sure the bootstrap administrator exists.
///
/// Does nothing when an account with the email is already present, so a
/// changed password in the config never overwrites a live account.
pub async fn ensure_admin_user(pool: &SqlitePool, email: &str, password: &str) -> Result<()> {
    let email = email.trim().to_lowercase();

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM app_user WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash = crate::api::auth::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {}", e))?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = super::now();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO app_user (id, email, password_hash, kind, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&email)
    .bind(&password_hash)
    .bind(UserKind::Staff.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    let linked = sqlx::query(
        "INSERT INTO user_role (user_id, role_id) SELECT ?, id FROM role WHERE key = ?",
    )
    .bind(&id)
    .bind(RoleKey::Admin.as_str())
    .execute(&mut *tx)
    .await?;
    if linked.rows_affected() == 0 {
        anyhow::bail!("Failed to seed admin user: ADMIN role is missing");
    }

    tx.commit().await?;

    info!(email = %email, "Created bootstrap admin user");
    Ok(())
}
