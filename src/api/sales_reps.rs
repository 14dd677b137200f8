//! Sales agent accounts (`/api/admin/sales-reps`).

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{
    self, CreateSalesRepRequest, DeleteSalesRepRequest, RoleKey, SalesRep, SalesRepDeleted,
    UserKind,
};
use crate::AppState;

use super::auth::{check_origin, hash_password, AuthError, RequireAdmin};
use super::error::{on_conflict, ApiError};
use super::json::{ok, ApiJson, Items};
use super::validation::{normalize_email, validate_email, validate_password_strength};

const EMAIL_TAKEN: &str = "Există deja un cont cu acest email.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRepCreated {
    pub user_id: String,
}

fn no_store() -> [(header::HeaderName, HeaderValue); 1] {
    [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))]
}

/// Staff accounts holding SALES_REP
pub async fn list_sales_reps(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let items = sqlx::query_as::<_, SalesRep>(
        r#"
        SELECT u.id, u.email, u.is_active, u.created_at
        FROM app_user u
        JOIN user_role ur ON ur.user_id = u.id
        JOIN role r ON r.id = ur.role_id
        WHERE u.kind = 'staff' AND r.key = ?
        ORDER BY u.created_at DESC
        "#,
    )
    .bind(RoleKey::SalesRep.as_str())
    .fetch_all(&state.db)
    .await?;

    Ok((no_store(), ok(Items { items })))
}

/// Create a staff account with the SALES_REP role
pub async fn create_sales_rep(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CreateSalesRepRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_origin(&state.config, &headers)?;

    let email = normalize_email(req.email.as_deref().unwrap_or(""));
    let password = req.password.clone().unwrap_or_default();
    validate_email(&email).map_err(ApiError::bad_request)?;
    validate_password_strength(&password).map_err(ApiError::bad_request)?;

    let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM app_user WHERE email = ? LIMIT 1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_some() {
        return Err(ApiError::conflict(EMAIL_TAKEN));
    }

    let password_hash = hash_password(&password).map_err(|e| AuthError::Hash(e.to_string()))?;

    let mut tx = state.db.begin().await?;

    let role_id: Option<String> = sqlx::query_scalar("SELECT id FROM role WHERE key = ? LIMIT 1")
        .bind(RoleKey::SalesRep.as_str())
        .fetch_optional(&mut *tx)
        .await?;
    let Some(role_id) = role_id else {
        tracing::error!("SALES_REP role is missing");
        return Err(ApiError::internal("Rolul SALES_REP lipsește din baza de date."));
    };

    let user_id = uuid::Uuid::new_v4().to_string();
    let now = db::now();

    sqlx::query(
        r#"
        INSERT INTO app_user (id, email, password_hash, kind, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&user_id)
    .bind(&email)
    .bind(&password_hash)
    .bind(UserKind::Staff.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(on_conflict(EMAIL_TAKEN))?;

    sqlx::query("INSERT OR IGNORE INTO user_role (user_id, role_id) VALUES (?, ?)")
        .bind(&user_id)
        .bind(&role_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(user_id = %user_id, email = %email, "Sales agent created");

    Ok((no_store(), ok(SalesRepCreated { user_id })))
}

/// Delete a sales agent.
///
/// Administrators cannot be deleted here; an id that no longer exists is
/// reported as already deleted.
pub async fn delete_sales_rep(
    RequireAdmin(me): RequireAdmin,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<DeleteSalesRepRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_origin(&state.config, &headers)?;

    let user_id = req
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("Lipsește userId."))?;

    if user_id == me.id {
        return Err(ApiError::bad_request("Nu îți poți șterge propriul cont."));
    }

    let mut tx = state.db.begin().await?;

    let target: Option<(String, i64)> = sqlx::query_as(
        r#"
        SELECT u.kind, EXISTS (
            SELECT 1 FROM user_role ur
            JOIN role r ON r.id = ur.role_id
            WHERE ur.user_id = u.id AND r.key = ?
        ) AS is_admin
        FROM app_user u
        WHERE u.id = ?
        "#,
    )
    .bind(RoleKey::Admin.as_str())
    .bind(&user_id)
    .fetch_optional(&mut *tx)
    .await?;

    match target {
        None => {
            return Ok((
                no_store(),
                ok(SalesRepDeleted {
                    user_id,
                    already_deleted: true,
                }),
            ));
        }
        Some((_, is_admin)) if is_admin != 0 => {
            return Err(ApiError::forbidden("Un administrator nu poate fi șters."));
        }
        Some((kind, _)) if kind != UserKind::Staff.as_str() => {
            return Err(ApiError::not_found("Agentul nu a fost găsit."));
        }
        Some(_) => {}
    }

    sqlx::query("DELETE FROM session WHERE user_id = ?")
        .bind(&user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM user_role WHERE user_id = ?")
        .bind(&user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM app_user WHERE id = ?")
        .bind(&user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(user_id = %user_id, deleted_by = %me.id, "Sales agent deleted");

    Ok((
        no_store(),
        ok(SalesRepDeleted {
            user_id,
            already_deleted: false,
        }),
    ))
}
