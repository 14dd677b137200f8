//! Brand endpoints (`/api/admin/brands`).

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{self, Brand, BrandListItem, BrandPayload};
use crate::AppState;

use super::auth::RequireAdmin;
use super::error::{on_conflict, ApiError};
use super::json::{ok, ApiJson, IdResponse, Items};
use super::validation::validate_min_length;

const DUPLICATE_BRAND: &str = "Brand deja există.";
const BRAND_NOT_FOUND: &str = "Brand inexistent.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandDetail {
    pub item: Brand,
    pub product_count: i64,
}

fn validate_name(req: &BrandPayload) -> Result<String, ApiError> {
    validate_min_length(req.name.as_deref(), 2, "Numele este obligatoriu.")
        .map_err(|e| ApiError::validation_field("name", e))?;
    Ok(req.name.clone().unwrap_or_default())
}

/// All brands with product counts
pub async fn list_brands(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let items = sqlx::query_as::<_, BrandListItem>(
        r#"
        SELECT b.id, b.name, (SELECT COUNT(*) FROM product p WHERE p.brand_id = b.id) AS product_count
        FROM brand b
        ORDER BY b.name
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(ok(Items { items }))
}

pub async fn create_brand(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<BrandPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_name(&req)?;
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query("INSERT INTO brand (id, name, created_at) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(&name)
        .bind(db::now())
        .execute(&state.db)
        .await
        .map_err(on_conflict(DUPLICATE_BRAND))?;

    tracing::info!(brand_id = %id, name = %name, "Brand created");

    Ok(ok(IdResponse { id }))
}

pub async fn get_brand(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item = sqlx::query_as::<_, Brand>("SELECT id, name FROM brand WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found(BRAND_NOT_FOUND))?;

    let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE brand_id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(ok(BrandDetail {
        item,
        product_count,
    }))
}

/// Rename a brand
pub async fn update_brand(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<BrandPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_name(&req)?;

    let result = sqlx::query("UPDATE brand SET name = ? WHERE id = ?")
        .bind(&name)
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(on_conflict(DUPLICATE_BRAND))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(BRAND_NOT_FOUND));
    }

    Ok(ok(IdResponse { id }))
}

/// Delete a brand no product references
pub async fn delete_brand(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let used: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM product WHERE brand_id = ? LIMIT 1")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;
    if used.is_some() {
        return Err(ApiError::conflict(
            "Brand-ul are produse asociate. Elimină brand-ul din produse înainte de ștergere.",
        ));
    }

    let result = sqlx::query("DELETE FROM brand WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(BRAND_NOT_FOUND));
    }

    tracing::info!(brand_id = %id, "Brand deleted");

    Ok(ok(IdResponse { id }))
}
