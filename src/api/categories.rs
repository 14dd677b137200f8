//! Category endpoints (`/api/admin/categories`).

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{self, Category, CategoryChild, CategoryListItem, CategoryListQuery, CategoryPayload};
use crate::AppState;

use super::auth::RequireAdmin;
use super::error::{on_conflict, ApiError, ValidationErrorBuilder};
use super::json::{ok, ApiJson, IdResponse, Page};
use super::validation::{like_pattern, validate_min_length};

const DUPLICATE_SLUG: &str = "Slug deja există.";
const CATEGORY_NOT_FOUND: &str = "Categoria nu a fost găsită.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    pub item: Category,
    pub product_count: i64,
    pub children: Vec<CategoryChild>,
}

/// Validated name, slug and parent
fn validate_category(req: &CategoryPayload) -> Result<(String, String, Option<String>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check(
        "name",
        validate_min_length(req.name.as_deref(), 2, "Numele este obligatoriu."),
    );
    errors.check("slug", validate_min_length(req.slug.as_deref(), 2, "Slug invalid."));
    errors.finish()?;

    Ok((
        req.name.clone().unwrap_or_default(),
        req.slug.clone().unwrap_or_default(),
        req.parent_id.clone(),
    ))
}

async fn ensure_parent_exists(state: &AppState, parent_id: Option<&str>) -> Result<(), ApiError> {
    if let Some(parent_id) = parent_id {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM category WHERE id = ?")
            .bind(parent_id)
            .fetch_optional(&state.db)
            .await?;
        if exists.is_none() {
            return Err(ApiError::validation_field(
                "parent_id",
                "Categoria părinte nu există.",
            ));
        }
    }
    Ok(())
}

/// List categories with product counts
pub async fn list_categories(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.page.term();
    let pattern = like_pattern(&term);
    let parent_id = query.parent_id.as_deref().unwrap_or("").trim().to_string();
    let limit = query.page.limit();
    let offset = query.page.offset();

    let items = sqlx::query_as::<_, CategoryListItem>(
        r#"
        SELECT
            c.id, c.name, c.slug, c.parent_id,
            (SELECT COUNT(*) FROM product_category pc WHERE pc.category_id = c.id) AS product_count
        FROM category c
        WHERE (? = '' OR c.name LIKE ? ESCAPE '\' OR c.slug LIKE ? ESCAPE '\')
          AND (? = '' OR c.parent_id = ?)
        ORDER BY c.name
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&term)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&parent_id)
    .bind(&parent_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    Ok(ok(Page {
        items,
        limit,
        offset,
    }))
}

/// Create a category
pub async fn create_category(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let (name, slug, parent_id) = validate_category(&req)?;
    ensure_parent_exists(&state, parent_id.as_deref()).await?;

    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO category (id, name, slug, parent_id, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(&id)
        .bind(&name)
        .bind(&slug)
        .bind(&parent_id)
        .bind(db::now())
        .execute(&state.db)
        .await
        .map_err(on_conflict(DUPLICATE_SLUG))?;

    tracing::info!(category_id = %id, slug = %slug, "Category created");

    Ok(ok(IdResponse { id }))
}

/// Category with product count and direct children
pub async fn get_category(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, parent_id FROM category WHERE id = ?",
    )
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found(CATEGORY_NOT_FOUND))?;

    let product_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product_category WHERE category_id = ?")
            .bind(&id)
            .fetch_one(&state.db)
            .await?;

    let children = sqlx::query_as::<_, CategoryChild>(
        "SELECT id, name, slug FROM category WHERE parent_id = ? ORDER BY name LIMIT 500",
    )
    .bind(&id)
    .fetch_all(&state.db)
    .await?;

    Ok(ok(CategoryDetail {
        item,
        product_count,
        children,
    }))
}

/// Update name, slug and parent
pub async fn update_category(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let (name, slug, parent_id) = validate_category(&req)?;
    if parent_id.as_deref() == Some(id.as_str()) {
        return Err(ApiError::validation_field(
            "parent_id",
            "parent_id nu poate fi egal cu id.",
        ));
    }
    ensure_parent_exists(&state, parent_id.as_deref()).await?;

    let result = sqlx::query("UPDATE category SET name = ?, slug = ?, parent_id = ? WHERE id = ?")
        .bind(&name)
        .bind(&slug)
        .bind(&parent_id)
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(on_conflict(DUPLICATE_SLUG))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(CATEGORY_NOT_FOUND));
    }

    Ok(ok(IdResponse { id }))
}

/// Delete a category that has neither children nor linked products
pub async fn delete_category(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let child: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM category WHERE parent_id = ? LIMIT 1")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?;
    if child.is_some() {
        return Err(ApiError::conflict(
            "Categoria are subcategorii. Șterge/relochează subcategoriile întâi.",
        ));
    }

    let used: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM product_category WHERE category_id = ? LIMIT 1")
            .bind(&id)
            .fetch_optional(&state.db)
            .await?;
    if used.is_some() {
        return Err(ApiError::conflict(
            "Categoria are produse asociate. Elimină asocierea înainte de ștergere.",
        ));
    }

    let result = sqlx::query("DELETE FROM category WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(CATEGORY_NOT_FOUND));
    }

    tracing::info!(category_id = %id, "Category deleted");

    Ok(ok(IdResponse { id }))
}
