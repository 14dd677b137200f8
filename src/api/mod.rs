pub mod auth;
mod brands;
mod categories;
mod customers;
pub mod error;
pub mod json;
pub mod offers;
mod products;
mod sales_reps;
mod stats;
mod tax_rates;
pub mod validation;
mod vehicles;


pub use stats::load_stats;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    // Back-office routes; each handler checks its own role
    let admin_routes = Router::new()
        // Products
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/products/search", get(products::search_products))
        .route(
            "/products/:id",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        // Categories
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/:id",
            get(categories::get_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
        // Brands
        .route("/brands", get(brands::list_brands).post(brands::create_brand))
        .route(
            "/brands/:id",
            get(brands::get_brand)
                .patch(brands::update_brand)
                .delete(brands::delete_brand),
        )
        // Tax rates
        .route(
            "/tax-rates",
            get(tax_rates::list_tax_rates).post(tax_rates::create_tax_rate),
        )
        .route("/tax-rates/:id", axum::routing::delete(tax_rates::delete_tax_rate))
        // Customers and vehicles
        .route(
            "/customers",
            get(customers::search_customers).post(customers::upsert_customer),
        )
        .route("/vehicles/search", get(vehicles::search_vehicle))
        // Offers
        .route("/offers", get(offers::list_offers).post(offers::create_offer))
        .route(
            "/offers/:id",
            get(offers::get_offer)
                .put(offers::update_offer)
                .delete(offers::delete_offer),
        )
        // Sales agents
        .route(
            "/sales-reps",
            get(sales_reps::list_sales_reps)
                .post(sales_reps::create_sales_rep)
                .delete(sales_reps::delete_sales_rep),
        )
        .route("/stats", get(stats::get_stats));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .merge(crate::ui::create_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error::expose_error_details,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
