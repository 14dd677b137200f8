//! Vehicle lookup by VIN or plate (`/api/admin/vehicles/search`).

use axum::{extract::Query, extract::State, response::IntoResponse};
use std::sync::Arc;

use crate::db::{Vehicle, VehicleSearchQuery, VehicleSearchResponse};
use crate::AppState;

use super::auth::RequireStaff;
use super::error::ApiError;
use super::json::ok;
use super::validation::like_pattern;

/// First vehicle whose VIN or plate contains the term, newest first.
///
/// Terms shorter than three characters return `vehicle: null`.
pub async fn search_vehicle(
    _staff: RequireStaff,
    State(state): State<Arc<AppState>>,
    Query(query): Query<VehicleSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.q.as_deref().unwrap_or("").trim().to_string();
    if term.chars().count() < 3 {
        return Ok(ok(VehicleSearchResponse { vehicle: None }));
    }
    let pattern = like_pattern(&term);

    let vehicle = sqlx::query_as::<_, Vehicle>(
        r#"
        SELECT id, customer_id, vin, plate_number, brand, model, year, created_at
        FROM vehicle
        WHERE vin LIKE ? ESCAPE '\' OR plate_number LIKE ? ESCAPE '\'
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .fetch_optional(&state.db)
    .await?;

    Ok(ok(VehicleSearchResponse { vehicle }))
}
