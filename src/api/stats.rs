//! Dashboard counters (`/api/admin/stats`).

use axum::{extract::State, response::IntoResponse};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::db::{CatalogStats, LatestProduct};
use crate::AppState;

use super::auth::RequireAdmin;
use super::error::ApiError;
use super::json::ok;

/// Products shown in the "latest" panel
const LATEST_PRODUCTS: i64 = 8;

async fn count(pool: &SqlitePool, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(sql).fetch_one(pool).await
}

/// Catalog counters and the most recently added products
pub async fn load_stats(pool: &SqlitePool) -> Result<CatalogStats, sqlx::Error> {
    let latest_products = sqlx::query_as::<_, LatestProduct>(
        r#"
        SELECT id, sku, name, price_gross, is_active, created_at
        FROM product
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(LATEST_PRODUCTS)
    .fetch_all(pool)
    .await?;

    Ok(CatalogStats {
        products: count(pool, "SELECT COUNT(*) FROM product").await?,
        active_products: count(pool, "SELECT COUNT(*) FROM product WHERE is_active = 1").await?,
        categories: count(pool, "SELECT COUNT(*) FROM category").await?,
        brands: count(pool, "SELECT COUNT(*) FROM brand").await?,
        tax_rates: count(pool, "SELECT COUNT(*) FROM tax_rate").await?,
        offers: count(pool, "SELECT COUNT(*) FROM offer").await?,
        latest_products,
    })
}

pub async fn get_stats(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ok(load_stats(&state.db).await?))
}
