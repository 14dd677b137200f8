//! Offer (price quotation) endpoints (`/api/admin/offers`).
//!
//! Create and update write the header, the vehicle and every line in one
//! transaction. Totals are always recomputed from the submitted lines.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;

use crate::db::{
    self, normalize_items, parse_valid_until, CreateOfferRequest, OfferDetail, OfferHeaderRow,
    OfferItemRow, OfferLine, OfferListItem, OfferListRow, OfferTotals, OfferUpdated,
    UpdateOfferRequest, Vehicle, VehicleInput, OFFER_STATUS_DRAFT,
};
use crate::AppState;

use super::auth::RequireStaff;
use super::error::ApiError;
use super::json::{ok, ApiJson, IdResponse};

pub const OFFER_NOT_FOUND: &str = "Oferta nu există.";

/// Number of offers shown in the list
const LIST_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct OfferList {
    pub offers: Vec<OfferListItem>,
}

#[derive(Debug, Serialize)]
pub struct OfferData<T: Serialize> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct OfferUpdateResponse {
    pub message: &'static str,
    pub data: OfferUpdated,
}

/// Header, customer, vehicle and ordered lines of one offer
pub async fn load_offer_detail(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<OfferDetail>, sqlx::Error> {
    let header = sqlx::query_as::<_, OfferHeaderRow>(
        r#"
        SELECT
            o.id, o.status, o.notes, o.valid_until, o.total_net, o.total_tax, o.total_gross,
            o.created_at, o.customer_id, c.kind,
            ci.first_name, ci.last_name, ci.phone,
            cc.company_name, cc.vat_id, cc.reg_no, cc.contact_email,
            o.vehicle_id, v.vin, v.plate_number, v.brand, v.model, v.year
        FROM offer o
        JOIN customer c ON c.id = o.customer_id
        LEFT JOIN customer_individual ci ON ci.customer_id = c.id
        LEFT JOIN customer_company cc ON cc.customer_id = c.id
        LEFT JOIN vehicle v ON v.id = o.vehicle_id
        WHERE o.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(header) = header else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, OfferItemRow>(
        r#"
        SELECT id, product_id, name, quantity, unit_price, tax_percentage
        FROM offer_item
        WHERE offer_id = ?
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(OfferDetail::from_rows(header, items)))
}

fn validate_valid_until(raw: Option<&str>) -> Result<Option<String>, ApiError> {
    match raw {
        None => Ok(None),
        Some(raw) => parse_valid_until(raw)
            .map(Some)
            .ok_or_else(|| ApiError::validation_field("validUntil", "Dată invalidă.")),
    }
}

async fn ensure_customer_exists(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> Result<(), ApiError> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM customer WHERE id = ?")
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(ApiError::validation_field("customerId", "Clientul nu există."));
    }
    Ok(())
}

async fn insert_vehicle(
    conn: &mut SqliteConnection,
    customer_id: Option<&str>,
    vehicle: &VehicleInput,
) -> Result<String, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO vehicle (id, customer_id, vin, plate_number, brand, model, year, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(customer_id)
    .bind(vehicle.vin())
    .bind(vehicle.plate_number())
    .bind(vehicle.brand())
    .bind(vehicle.model())
    .bind(vehicle.year)
    .bind(db::now())
    .execute(&mut *conn)
    .await?;

    tracing::debug!(vehicle_id = %id, "Vehicle inserted");
    Ok(id)
}

/// Replace every line of an offer, keeping submission order
async fn replace_items(
    conn: &mut SqliteConnection,
    offer_id: &str,
    lines: &[OfferLine],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM offer_item WHERE offer_id = ?")
        .bind(offer_id)
        .execute(&mut *conn)
        .await?;

    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO offer_item
                (id, offer_id, position, product_id, name, quantity, unit_price, tax_percentage)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(offer_id)
        .bind(position as i64)
        .bind(&line.product_id)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.tax_percentage)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// The 50 most recent offers
pub async fn list_offers(
    _staff: RequireStaff,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, OfferListRow>(
        r#"
        SELECT
            o.id, o.total_gross, o.created_at, o.status, c.kind,
            ci.first_name, ci.last_name, cc.company_name,
            v.plate_number, v.brand, v.model
        FROM offer o
        JOIN customer c ON c.id = o.customer_id
        LEFT JOIN customer_individual ci ON ci.customer_id = c.id
        LEFT JOIN customer_company cc ON cc.customer_id = c.id
        LEFT JOIN vehicle v ON v.id = o.vehicle_id
        ORDER BY o.created_at DESC
        LIMIT ?
        "#,
    )
    .bind(LIST_LIMIT)
    .fetch_all(&state.db)
    .await?;

    Ok(ok(OfferList {
        offers: rows.into_iter().map(OfferListItem::from).collect(),
    }))
}

/// Create a draft offer.
///
/// A vehicle with a VIN already on file is reused; otherwise a new row is
/// inserted when the payload carries a VIN or a plate.
pub async fn create_offer(
    RequireStaff(user): RequireStaff,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateOfferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let customer_id = req
        .customer_id
        .clone()
        .ok_or_else(|| ApiError::validation_field("customerId", "Selectează clientul."))?;
    let lines = normalize_items(&req.items).map_err(|e| ApiError::validation_field("items", e))?;
    let valid_until = validate_valid_until(req.valid_until.as_deref())?;
    let totals = OfferTotals::from_lines(&lines);

    let mut tx = state.db.begin().await?;

    ensure_customer_exists(&mut tx, &customer_id).await?;

    let vehicle_id = match req.vehicle.as_ref().filter(|v| v.is_identifiable()) {
        Some(vehicle) => {
            let existing: Option<(String,)> = if vehicle.vin().is_empty() {
                None
            } else {
                sqlx::query_as("SELECT id FROM vehicle WHERE vin = ? LIMIT 1")
                    .bind(vehicle.vin())
                    .fetch_optional(&mut *tx)
                    .await?
            };
            match existing {
                Some((id,)) => Some(id),
                None => Some(insert_vehicle(&mut tx, Some(&customer_id), vehicle).await?),
            }
        }
        None => None,
    };

    let id = uuid::Uuid::new_v4().to_string();
    let now = db::now();

    sqlx::query(
        r#"
        INSERT INTO offer (
            id, customer_id, vehicle_id, status, notes, valid_until,
            total_net, total_tax, total_gross, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&customer_id)
    .bind(&vehicle_id)
    .bind(OFFER_STATUS_DRAFT)
    .bind(&req.notes)
    .bind(&valid_until)
    .bind(totals.total_net)
    .bind(totals.total_tax)
    .bind(totals.total_gross)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    replace_items(&mut tx, &id, &lines).await?;

    tx.commit().await?;

    tracing::info!(
        offer_id = %id,
        user_id = %user.id,
        items = lines.len(),
        total_gross = totals.total_gross,
        "Offer created"
    );

    Ok(ok(IdResponse { id }))
}

pub async fn get_offer(
    _staff: RequireStaff,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = load_offer_detail(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(OFFER_NOT_FOUND))?;

    Ok(ok(OfferData { data: detail }))
}

/// Replace an offer's lines and header.
///
/// The submitted vehicle is compared with the linked one on VIN, plate,
/// brand and model. Identical data keeps the id; anything else inserts a
/// new vehicle and repoints the offer. Old vehicle rows are kept.
pub async fn update_offer(
    RequireStaff(user): RequireStaff,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateOfferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let lines = normalize_items(&req.items).map_err(|e| ApiError::validation_field("items", e))?;
    let valid_until = validate_valid_until(req.valid_until.as_deref())?;
    let totals = OfferTotals::from_lines(&lines);

    let mut tx = state.db.begin().await?;

    let current: (String, Option<String>) =
        sqlx::query_as("SELECT customer_id, vehicle_id FROM offer WHERE id = ?")
            .bind(&id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found(OFFER_NOT_FOUND))?;
    let (current_customer_id, current_vehicle_id) = current;

    let customer_id = match req.customer_id {
        Some(customer_id) => {
            ensure_customer_exists(&mut tx, &customer_id).await?;
            customer_id
        }
        None => current_customer_id,
    };

    let mut vehicle_id = req.vehicle_id.clone().or(current_vehicle_id);

    if let Some(vehicle) = req.vehicle.as_ref().filter(|v| v.is_identifiable()) {
        let linked = match vehicle_id.as_deref() {
            Some(vehicle_id) => {
                sqlx::query_as::<_, Vehicle>(
                    r#"
                    SELECT id, customer_id, vin, plate_number, brand, model, year, created_at
                    FROM vehicle
                    WHERE id = ?
                    "#,
                )
                .bind(vehicle_id)
                .fetch_optional(&mut *tx)
                .await?
            }
            None => None,
        };

        if !linked.as_ref().is_some_and(|v| vehicle.matches(v)) {
            vehicle_id = Some(insert_vehicle(&mut tx, Some(&customer_id), vehicle).await?);
        }
    }

    sqlx::query(
        r#"
        UPDATE offer
        SET customer_id = ?, vehicle_id = ?, notes = ?, valid_until = ?,
            total_net = ?, total_tax = ?, total_gross = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&customer_id)
    .bind(&vehicle_id)
    .bind(&req.notes)
    .bind(&valid_until)
    .bind(totals.total_net)
    .bind(totals.total_tax)
    .bind(totals.total_gross)
    .bind(db::now())
    .bind(&id)
    .execute(&mut *tx)
    .await?;

    replace_items(&mut tx, &id, &lines).await?;

    tx.commit().await?;

    tracing::info!(
        offer_id = %id,
        user_id = %user.id,
        items = lines.len(),
        total_gross = totals.total_gross,
        "Offer updated"
    );

    Ok(ok(OfferUpdateResponse {
        message: "Oferta a fost actualizată.",
        data: OfferUpdated {
            total_net: totals.total_net,
            total_tax: totals.total_tax,
            total_gross: totals.total_gross,
            vehicle_id,
        },
    }))
}

pub async fn delete_offer(
    _staff: RequireStaff,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    sqlx::query("DELETE FROM offer_item WHERE offer_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM offer WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(OFFER_NOT_FOUND));
    }

    tx.commit().await?;

    tracing::info!(offer_id = %id, "Offer deleted");

    Ok(ok(IdResponse { id }))
}
