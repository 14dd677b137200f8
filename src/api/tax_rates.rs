//! Tax rate endpoints (`/api/admin/tax-rates`).

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::db::{self, TaxRate, TaxRatePayload};
use crate::AppState;

use super::auth::RequireAdmin;
use super::error::{ApiError, ValidationErrorBuilder};
use super::json::{ok, ApiJson, IdResponse, Items};
use super::validation::validate_min_length;

/// Tax rates, highest first
pub async fn list_tax_rates(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let items = sqlx::query_as::<_, TaxRate>(
        "SELECT id, name, rate FROM tax_rate ORDER BY rate DESC, name ASC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(ok(Items { items }))
}

pub async fn create_tax_rate(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<TaxRatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check(
        "name",
        validate_min_length(req.name.as_deref(), 2, "Numele este obligatoriu."),
    );
    match req.rate {
        Some(rate) if (0.0..=100.0).contains(&rate) => {}
        _ => {
            errors.add("rate", "Cota TVA trebuie să fie între 0 și 100.");
        }
    }
    errors.finish()?;

    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO tax_rate (id, name, rate, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(req.name.as_deref().unwrap_or_default())
        .bind(req.rate.unwrap_or_default())
        .bind(db::now())
        .execute(&state.db)
        .await?;

    tracing::info!(tax_rate_id = %id, "Tax rate created");

    Ok(ok(IdResponse { id }))
}

/// Delete a tax rate no product references
pub async fn delete_tax_rate(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let used: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM product WHERE tax_rate_id = ? LIMIT 1")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;
    if used.is_some() {
        return Err(ApiError::conflict(
            "Cota TVA este folosită de produse și nu poate fi ștearsă.",
        ));
    }

    let result = sqlx::query("DELETE FROM tax_rate WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Cota TVA nu există."));
    }

    Ok(ok(IdResponse { id }))
}
