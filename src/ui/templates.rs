// Askama template definitions

use askama::Template;
use sqlx::FromRow;

use crate::db::{CatalogStats, CategoryChild, OfferDetail, Product, RegisterRequest, SessionUser};

/// Custom filters for Askama templates
mod filters {
    /// `1234.5` -> `1234.50`
    pub fn money(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:.2}", value))
    }

    /// Date part of a stored timestamp
    pub fn date(value: &str) -> ::askama::Result<String> {
        Ok(value.split('T').next().unwrap_or(value).to_string())
    }
}

/// Product tile on the storefront
#[derive(Debug, FromRow)]
pub struct ProductCard {
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub price_gross: f64,
    pub brand_name: String,
}

// Storefront home
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: Option<SessionUser>,
    pub categories: Vec<CategoryChild>,
    pub products: Vec<ProductCard>,
}

// Product page
#[derive(Template)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub user: Option<SessionUser>,
    pub product: Product,
    pub codes: Vec<String>,
}

// Category page
#[derive(Template)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub user: Option<SessionUser>,
    pub name: String,
    pub children: Vec<CategoryChild>,
    pub products: Vec<ProductCard>,
}

// Login form
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub email: String,
}

/// Values echoed back into the signup form; the password never is
#[derive(Debug, Default)]
pub struct SignupValues {
    pub kind: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub company_name: String,
    pub vat_id: String,
    pub reg_no: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: String,
}

impl From<&RegisterRequest> for SignupValues {
    fn from(req: &RegisterRequest) -> Self {
        let value = |v: &Option<String>| v.as_deref().unwrap_or("").trim().to_string();
        Self {
            kind: value(&req.kind),
            email: value(&req.email),
            first_name: value(&req.first_name),
            last_name: value(&req.last_name),
            phone: value(&req.phone),
            company_name: value(&req.company_name),
            vat_id: value(&req.vat_id),
            reg_no: value(&req.reg_no),
            contact_name: value(&req.contact_name),
            contact_phone: value(&req.contact_phone),
            contact_email: value(&req.contact_email),
        }
    }
}

// Customer signup form
#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub error: Option<String>,
    pub form: SignupValues,
}

// Customer account
#[derive(Template)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub user: SessionUser,
}

// Back-office dashboard
#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboardTemplate {
    pub user: SessionUser,
    pub is_admin: bool,
    pub stats: CatalogStats,
}

// Printable offer
#[derive(Template)]
#[template(path = "offer_document.html")]
pub struct OfferDocumentTemplate {
    pub offer: OfferDetail,
}

// 404 page
#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub message: String,
}
