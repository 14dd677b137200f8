//! Product catalog endpoints (`/api/admin/products`).

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::SqliteConnection;
use std::sync::Arc;

use crate::db::{
    self, ListQuery, Product, ProductCode, ProductDetail, ProductListItem, ProductListQuery,
    ProductPayload, ProductSearchItem, PRODUCT_COLUMNS,
};
use crate::AppState;

use super::auth::{RequireAdmin, RequireStaff};
use super::error::{on_conflict, ApiError, ValidationErrorBuilder};
use super::json::{ok, ApiJson, IdResponse, Items, Page};
use super::validation::{like_pattern, normalize_code, slugify, validate_min_length};

const DUPLICATE_PRODUCT: &str = "SKU sau slug deja există.";
const PRODUCT_NOT_FOUND: &str = "Produsul nu există.";

/// Maximum number of autocomplete results
const SEARCH_LIMIT: i64 = 20;

/// Product fields after validation and defaulting
#[derive(Debug)]
struct ValidProduct {
    sku: String,
    name: String,
    slug: String,
    description: Option<String>,
    price_gross: f64,
    tax_rate_id: String,
    brand_id: Option<String>,
    is_active: bool,
    external_code: Option<String>,
    uom: String,
    weight_kg: Option<f64>,
    length_mm: Option<f64>,
    width_mm: Option<f64>,
    height_mm: Option<f64>,
}

/// Validate a create/update payload.
///
/// A missing slug is derived from the name.
fn validate_product(req: &ProductPayload) -> Result<ValidProduct, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    errors.check("sku", validate_min_length(req.sku.as_deref(), 2, "SKU invalid."));
    errors.check(
        "name",
        validate_min_length(req.name.as_deref(), 2, "Numele este obligatoriu."),
    );

    let slug = req
        .slug
        .as_deref()
        .map(slugify)
        .or_else(|| req.name.as_deref().map(slugify))
        .unwrap_or_default();
    if slug.is_empty() {
        errors.add("slug", "Slug invalid.");
    }

    if req.tax_rate_id.is_none() {
        errors.add("tax_rate_id", "Selectează TVA.");
    }

    let price_gross = req.price_gross.unwrap_or(0.0);
    if price_gross < 0.0 {
        errors.add("price_gross", "Preț invalid.");
    }

    for (field, value) in [
        ("weight_kg", req.weight_kg),
        ("length_mm", req.length_mm),
        ("width_mm", req.width_mm),
        ("height_mm", req.height_mm),
    ] {
        if value.is_some_and(|v| v < 0.0) {
            errors.add(field, "Valoarea nu poate fi negativă.");
        }
    }

    errors.finish()?;

    Ok(ValidProduct {
        sku: req.sku.clone().unwrap_or_default(),
        name: req.name.clone().unwrap_or_default(),
        slug,
        description: req.description.clone(),
        price_gross: db::round_money(price_gross),
        tax_rate_id: req.tax_rate_id.clone().unwrap_or_default(),
        brand_id: req.brand_id.clone(),
        is_active: req.is_active.unwrap_or(true),
        external_code: req.external_code.clone(),
        uom: req.uom.clone().unwrap_or_else(|| "buc".to_string()),
        weight_kg: req.weight_kg,
        length_mm: req.length_mm,
        width_mm: req.width_mm,
        height_mm: req.height_mm,
    })
}

/// Replace the category links of a product
async fn replace_categories(
    conn: &mut SqliteConnection,
    product_id: &str,
    category_ids: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM product_category WHERE product_id = ?")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    for category_id in category_ids {
        sqlx::query("INSERT OR IGNORE INTO product_category (product_id, category_id) VALUES (?, ?)")
            .bind(product_id)
            .bind(category_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Set the primary part code stored on the product row
async fn set_primary_code(
    conn: &mut SqliteConnection,
    product_id: &str,
    code: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE product SET code = ?, code_normalized = ? WHERE id = ?")
        .bind(code)
        .bind(normalize_code(code))
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Replace the non-primary equivalent codes of a product
async fn replace_equivalent_codes(
    conn: &mut SqliteConnection,
    product_id: &str,
    codes: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM product_code WHERE product_id = ? AND is_primary = 0")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    for code in codes.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        let normalized = normalize_code(code);
        if normalized.is_empty() {
            continue;
        }
        sqlx::query(
            r#"
            INSERT INTO product_code (id, product_id, code, code_normalized, code_type, is_primary)
            VALUES (?, ?, ?, ?, 'other', 0)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(product_id)
        .bind(code)
        .bind(normalized)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// List products with brand and category names
pub async fn list_products(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.page.term();
    let pattern = like_pattern(&term);
    let brand_id = query.brand_id.as_deref().unwrap_or("").trim().to_string();
    let category_id = query.category_id.as_deref().unwrap_or("").trim().to_string();
    let limit = query.page.limit();
    let offset = query.page.offset();

    let items = sqlx::query_as::<_, ProductListItem>(
        r#"
        SELECT
            p.id, p.sku, p.slug, p.name, p.price_gross, p.is_active, p.brand_id,
            COALESCE(b.name, '') AS brand_name,
            COALESCE((
                SELECT GROUP_CONCAT(c.name, ', ')
                FROM product_category pc
                JOIN category c ON c.id = pc.category_id
                WHERE pc.product_id = p.id
            ), '') AS categories
        FROM product p
        LEFT JOIN brand b ON b.id = p.brand_id
        WHERE (
                ? = ''
                OR p.name LIKE ? ESCAPE '\'
                OR p.sku LIKE ? ESCAPE '\'
                OR p.slug LIKE ? ESCAPE '\'
            )
          AND (? = '' OR p.brand_id = ?)
          AND (? = '' OR EXISTS (
                SELECT 1 FROM product_category pc2
                WHERE pc2.product_id = p.id AND pc2.category_id = ?
            ))
        ORDER BY p.created_at DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&term)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&brand_id)
    .bind(&brand_id)
    .bind(&category_id)
    .bind(&category_id)
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

/// Create a product with its category links and codes
pub async fn create_product(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = validate_product(&req)?;
    let id = uuid::Uuid::new_v4().to_string();
    let now = db::now();

    let mut tx = state.db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO product (
            id, sku, slug, name, description, brand_id, tax_rate_id, price_gross, is_active,
            external_code, uom, weight_kg, length_mm, width_mm, height_mm, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&product.sku)
    .bind(&product.slug)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.brand_id)
    .bind(&product.tax_rate_id)
    .bind(product.price_gross)
    .bind(product.is_active)
    .bind(&product.external_code)
    .bind(&product.uom)
    .bind(product.weight_kg)
    .bind(product.length_mm)
    .bind(product.width_mm)
    .bind(product.height_mm)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(on_conflict(DUPLICATE_PRODUCT))?;

    let category_ids = req.category_ids();
    if !category_ids.is_empty() {
        replace_categories(&mut tx, &id, &category_ids).await?;
    }
    if let Some(code) = req.code.as_deref() {
        set_primary_code(&mut tx, &id, code).await?;
    }
    if let Some(codes) = req.equivalent_codes.as_deref() {
        replace_equivalent_codes(&mut tx, &id, codes).await?;
    }

    tx.commit().await?;

    tracing::info!(product_id = %id, sku = %product.sku, "Product created");

    Ok(ok(IdResponse { id }))
}

/// Product detail with brand, equivalent codes and category ids
pub async fn get_product(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM product p
        LEFT JOIN brand b ON b.id = p.brand_id
        LEFT JOIN tax_rate t ON t.id = p.tax_rate_id
        WHERE p.id = ?
        "#
    ))
    .bind(&id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found(PRODUCT_NOT_FOUND))?;

    let codes = sqlx::query_as::<_, ProductCode>(
        r#"
        SELECT id, code, code_type, is_primary
        FROM product_code
        WHERE product_id = ?
        ORDER BY is_primary DESC, code
        "#,
    )
    .bind(&id)
    .fetch_all(&state.db)
    .await?;

    let category_ids: Vec<String> =
        sqlx::query_scalar("SELECT category_id FROM product_category WHERE product_id = ?")
            .bind(&id)
            .fetch_all(&state.db)
            .await?;

    Ok(ok(ProductDetail {
        item,
        codes,
        category_ids,
    }))
}

/// Full product update
pub async fn update_product(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if req.sku.is_none() || req.name.is_none() {
        return Err(ApiError::bad_request("SKU și Nume sunt obligatorii."));
    }
    let product = validate_product(&req)?;

    let mut tx = state.db.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE product
        SET sku = ?, name = ?, slug = ?, description = ?, price_gross = ?, tax_rate_id = ?,
            is_active = ?, external_code = ?, brand_id = ?, uom = ?,
            weight_kg = ?, length_mm = ?, width_mm = ?, height_mm = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&product.sku)
    .bind(&product.name)
    .bind(&product.slug)
    .bind(&product.description)
    .bind(product.price_gross)
    .bind(&product.tax_rate_id)
    .bind(product.is_active)
    .bind(&product.external_code)
    .bind(&product.brand_id)
    .bind(&product.uom)
    .bind(product.weight_kg)
    .bind(product.length_mm)
    .bind(product.width_mm)
    .bind(product.height_mm)
    .bind(db::now())
    .bind(&id)
    .execute(&mut *tx)
    .await
    .map_err(on_conflict(DUPLICATE_PRODUCT))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(PRODUCT_NOT_FOUND));
    }

    if req.category_ids.is_some() {
        replace_categories(&mut tx, &id, &req.category_ids()).await?;
    }
    if let Some(code) = req.code.as_deref() {
        set_primary_code(&mut tx, &id, code).await?;
    }
    if let Some(codes) = req.equivalent_codes.as_deref() {
        replace_equivalent_codes(&mut tx, &id, codes).await?;
    }

    tx.commit().await?;

    tracing::info!(product_id = %id, "Product updated");

    Ok(ok(IdResponse { id }))
}

/// Delete a product together with its links and codes
pub async fn delete_product(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    sqlx::query("DELETE FROM product_category WHERE product_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM product_code WHERE product_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM product WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(PRODUCT_NOT_FOUND));
    }

    tx.commit().await?;

    tracing::info!(product_id = %id, "Product deleted");

    Ok(ok(IdResponse { id }))
}

/// Offer-editor autocomplete by name, SKU, part code or equivalent code
pub async fn search_products(
    _staff: RequireStaff,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.term();
    if term.chars().count() < 2 {
        return Ok(ok(Items::<ProductSearchItem> { items: vec![] }));
    }

    let pattern = like_pattern(&term);
    let normalized = normalize_code(&term);

    let items = sqlx::query_as::<_, ProductSearchItem>(
        r#"
        SELECT p.id, p.name, p.sku, p.price_gross AS price, COALESCE(t.rate, 0) AS vat_percent
        FROM product p
        LEFT JOIN tax_rate t ON t.id = p.tax_rate_id
        WHERE p.name LIKE ? ESCAPE '\'
           OR p.sku LIKE ? ESCAPE '\'
           OR p.code LIKE ? ESCAPE '\'
           OR (? <> '' AND (
                p.code_normalized LIKE '%' || ? || '%'
                OR EXISTS (
                    SELECT 1 FROM product_code pc
                    WHERE pc.product_id = p.id AND pc.code_normalized LIKE '%' || ? || '%'
                )
           ))
        ORDER BY p.name
        LIMIT ?
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&normalized)
    .bind(&normalized)
    .bind(&normalized)
    .bind(SEARCH_LIMIT)
    .fetch_all(&state.db)
    .await?;

    Ok(ok(Items { items }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> ProductPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_validate_product_defaults() {
        let product = validate_product(&payload(serde_json::json!({
            "sku": "FLT-1",
            "name": "Filtru aer Scania",
            "tax_rate_id": "t1",
            "price_gross": "99,9"
        })))
        .unwrap();

        assert_eq!(product.slug, "filtru-aer-scania");
        assert_eq!(product.price_gross, 99.9);
        assert!(product.is_active);
        assert_eq!(product.uom, "buc");
        assert!(product.brand_id.is_none());
    }

    #[test]
    fn test_validate_product_slugifies_given_slug() {
        let product = validate_product(&payload(serde_json::json!({
            "sku": "FLT-1",
            "name": "Filtru",
            "slug": "Filtru Ulei Față",
            "tax_rate_id": "t1"
        })))
        .unwrap();
        assert_eq!(product.slug, "filtru-ulei-fata");
    }

    #[test]
    fn test_validate_product_collects_errors() {
        let err = validate_product(&payload(serde_json::json!({
            "sku": "F",
            "name": "",
            "price_gross": -1
        })))
        .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        // sku, name, slug, tax_rate_id, price_gross
        assert!(err.message().contains('5'));
    }
}
