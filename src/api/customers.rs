//! Customer search and staff-side create-or-update (`/api/admin/customers`).

use axum::{extract::Query, extract::State, response::IntoResponse};
use std::sync::Arc;

use crate::db::{
    self, CustomerKind, CustomerPayload, CustomerRow, CustomerSaved, CustomerSummary, ListQuery,
    CUSTOMER_COLUMNS,
};
use crate::AppState;

use super::auth::RequireStaff;
use super::error::ApiError;
use super::json::{ok, ApiJson, Items};
use super::validation::like_pattern;

const SEARCH_LIMIT: i64 = 20;

/// Search customers by company name, VAT id, contact, person name or phone.
///
/// Only the detail row matching the customer's current kind is searched.
pub async fn search_customers(
    _staff: RequireStaff,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.term();
    if term.chars().count() < 2 {
        return Ok(ok(Items::<CustomerSummary> { items: vec![] }));
    }
    let pattern = like_pattern(&term);

    let rows = sqlx::query_as::<_, CustomerRow>(&format!(
        r#"
        SELECT {CUSTOMER_COLUMNS}
        FROM customer c
        LEFT JOIN customer_company cc ON cc.customer_id = c.id
        LEFT JOIN customer_individual ci ON ci.customer_id = c.id
        WHERE (c.kind = 'company' AND (
                cc.company_name LIKE ? ESCAPE '\'
                OR cc.vat_id LIKE ? ESCAPE '\'
                OR cc.contact_name LIKE ? ESCAPE '\'
                OR cc.contact_phone LIKE ? ESCAPE '\'
                OR cc.contact_email LIKE ? ESCAPE '\'
           ))
           OR (c.kind = 'individual' AND (
                ci.first_name LIKE ? ESCAPE '\'
                OR ci.last_name LIKE ? ESCAPE '\'
                OR (ci.first_name || ' ' || ci.last_name) LIKE ? ESCAPE '\'
                OR ci.phone LIKE ? ESCAPE '\'
           ))
        ORDER BY c.created_at DESC
        LIMIT ?
        "#
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(&state.db)
    .await?;

    let items = rows.into_iter().map(CustomerSummary::from).collect::<Vec<_>>();
    Ok(ok(Items { items }))
}

/// Create a customer without an account, or update an existing one.
///
/// The detail row matching `kind` is upserted; the customer's own kind is
/// updated to follow it.
pub async fn upsert_customer(
    _staff: RequireStaff,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    match req.kind {
        CustomerKind::Company if req.company_name.is_none() => {
            return Err(ApiError::validation_field(
                "company_name",
                "Numele firmei este obligatoriu.",
            ));
        }
        CustomerKind::Individual if req.first_name.is_none() || req.last_name.is_none() => {
            return Err(ApiError::validation_field(
                "first_name",
                "Numele și prenumele sunt obligatorii.",
            ));
        }
        _ => {}
    }

    let mut tx = state.db.begin().await?;

    let (customer_id, created) = match req.id.as_deref() {
        Some(id) => {
            let result = sqlx::query("UPDATE customer SET kind = ? WHERE id = ?")
                .bind(req.kind.as_str())
                .bind(id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(ApiError::not_found("Clientul nu există."));
            }
            (id.to_string(), false)
        }
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            sqlx::query("INSERT INTO customer (id, kind, user_id, created_at) VALUES (?, ?, NULL, ?)")
                .bind(&id)
                .bind(req.kind.as_str())
                .bind(db::now())
                .execute(&mut *tx)
                .await?;
            (id, true)
        }
    };

    match req.kind {
        CustomerKind::Company => {
            sqlx::query(
                r#"
                INSERT INTO customer_company
                    (customer_id, company_name, vat_id, reg_no, contact_name, contact_phone, contact_email)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(customer_id) DO UPDATE SET
                    company_name = excluded.company_name,
                    vat_id = excluded.vat_id,
                    reg_no = excluded.reg_no,
                    contact_name = excluded.contact_name,
                    contact_phone = excluded.contact_phone,
                    contact_email = excluded.contact_email
                "#,
            )
            .bind(&customer_id)
            .bind(&req.company_name)
            .bind(&req.vat_id)
            .bind(&req.reg_no)
            .bind(&req.contact_name)
            .bind(&req.contact_phone)
            .bind(&req.contact_email)
            .execute(&mut *tx)
            .await?;
        }
        CustomerKind::Individual => {
            sqlx::query(
                r#"
                INSERT INTO customer_individual (customer_id, first_name, last_name, phone)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(customer_id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    phone = excluded.phone
                "#,
            )
            .bind(&customer_id)
            .bind(&req.first_name)
            .bind(&req.last_name)
            .bind(&req.phone)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    tracing::info!(customer_id = %customer_id, created, kind = %req.kind, "Customer saved");

    Ok(ok(CustomerSaved {
        customer_id,
        created,
    }))
}
