//! Catalog models: products, categories, brands and tax rates.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::common::{lenient_f64, trimmed_string, ListQuery};

// -------------------------------------------------------------------------
// Brands
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Brand {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BrandListItem {
    pub id: String,
    pub name: String,
    pub product_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct BrandPayload {
    #[serde(default, deserialize_with = "trimmed_string")]
    pub name: Option<String>,
}

// -------------------------------------------------------------------------
// Tax rates
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaxRate {
    pub id: String,
    pub name: String,
    /// Percent, e.g. `21.0`
    pub rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct TaxRatePayload {
    #[serde(default, deserialize_with = "trimmed_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rate: Option<f64>,
}

// -------------------------------------------------------------------------
// Categories
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryListItem {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<String>,
    pub product_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryChild {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryListQuery {
    #[serde(flatten)]
    pub page: ListQuery,
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    #[serde(default, deserialize_with = "trimmed_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub parent_id: Option<String>,
}

// -------------------------------------------------------------------------
// Products
// -------------------------------------------------------------------------

/// Full product row joined with its brand name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub brand_id: Option<String>,
    pub brand_name: Option<String>,
    pub tax_rate_id: String,
    pub tax_rate: Option<f64>,
    pub price_gross: f64,
    pub is_active: bool,
    pub external_code: Option<String>,
    pub uom: String,
    pub weight_kg: Option<f64>,
    pub length_mm: Option<f64>,
    pub width_mm: Option<f64>,
    pub height_mm: Option<f64>,
    pub code: Option<String>,
    pub code_normalized: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Columns selected for a [`Product`]; expects `product p` and `LEFT JOIN brand b`
/// plus `LEFT JOIN tax_rate t`
pub const PRODUCT_COLUMNS: &str = r#"
    p.id, p.sku, p.slug, p.name, p.description, p.brand_id, b.name AS brand_name,
    p.tax_rate_id, t.rate AS tax_rate, p.price_gross, p.is_active, p.external_code, p.uom,
    p.weight_kg, p.length_mm, p.width_mm, p.height_mm, p.code, p.code_normalized,
    p.created_at, p.updated_at
"#;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductListItem {
    pub id: String,
    pub sku: String,
    pub slug: String,
    pub name: String,
    pub price_gross: f64,
    pub is_active: bool,
    pub brand_id: Option<String>,
    pub brand_name: String,
    /// Comma-joined category names
    pub categories: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    #[serde(flatten)]
    pub page: ListQuery,
    #[serde(rename = "brandId")]
    pub brand_id: Option<String>,
    #[serde(rename = "categoryId")]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductCode {
    pub id: String,
    pub code: String,
    pub code_type: String,
    pub is_primary: bool,
}

/// Offer-editor autocomplete entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductSearchItem {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price: f64,
    pub vat_percent: f64,
}

/// Product create/update payload (snake_case, as sent by the admin forms)
#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    #[serde(default, deserialize_with = "trimmed_string")]
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_gross: Option<f64>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub tax_rate_id: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub brand_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub external_code: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub uom: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub length_mm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub width_mm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub height_mm: Option<f64>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub code: Option<String>,
    #[serde(default)]
    pub category_ids: Option<Vec<String>>,
    #[serde(default)]
    pub equivalent_codes: Option<Vec<String>>,
}

impl ProductPayload {
    /// Category ids with blanks and duplicates removed, order kept
    pub fn category_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in self.category_ids.iter().flatten() {
            let id = id.trim();
            if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub item: Product,
    pub codes: Vec<ProductCode>,
    pub category_ids: Vec<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct LatestProduct {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub price_gross: f64,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogStats {
    pub products: i64,
    pub active_products: i64,
    pub categories: i64,
    pub brands: i64,
    pub tax_rates: i64,
    pub offers: i64,
    pub latest_products: Vec<LatestProduct>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_payload_lenient_fields() {
        let payload: ProductPayload = serde_json::from_str(
            r#"{
                "sku": " FLT-001 ",
                "name": "Filtru ulei",
                "price_gross": "149,90",
                "tax_rate_id": "t1",
                "brand_id": "",
                "category_ids": ["c1", " ", "c2", "c1"]
            }"#,
        )
        .unwrap();

        assert_eq!(payload.sku.as_deref(), Some("FLT-001"));
        assert_eq!(payload.price_gross, Some(149.9));
        assert!(payload.brand_id.is_none());
        assert!(payload.is_active.is_none());
        assert_eq!(payload.category_ids(), vec!["c1", "c2"]);
        assert!(payload.equivalent_codes.is_none());
    }

    #[test]
    fn test_list_queries_flatten_paging() {
        let query: ProductListQuery =
            serde_json::from_str(r#"{"q":"disc","limit":"10","brandId":"b1"}"#).unwrap();
        assert_eq!(query.page.term(), "disc");
        assert_eq!(query.page.limit(), 10);
        assert_eq!(query.brand_id.as_deref(), Some("b1"));
        assert!(query.category_id.is_none());

        let query: CategoryListQuery = serde_json::from_str(r#"{"parentId":"p1"}"#).unwrap();
        assert_eq!(query.parent_id.as_deref(), Some("p1"));
        assert_eq!(query.page.offset(), 0);
    }
}
