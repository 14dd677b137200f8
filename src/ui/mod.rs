//! Server-rendered pages: storefront, login and signup forms, back-office
//! dashboard and the printable offer document. Uses Askama templates.

mod templates;

use askama::Template;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::auth::{
    authenticate, check_origin, create_session, register_customer, session_cookie, AuthError,
    MaybeUser, INVALID_CREDENTIALS,
};
use crate::api::{load_stats, offers::load_offer_detail};
use crate::db::{CategoryChild, Product, RegisterRequest, RoleKey, SessionUser, PRODUCT_COLUMNS};
use crate::AppState;

pub use templates::*;

/// Products shown on the storefront home page
const HOME_PRODUCTS: i64 = 24;

// Helper to render templates and handle errors
fn render_template<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Eroare internă.").into_response()
        }
    }
}

fn not_found_page(message: &str) -> Response {
    let template = NotFoundTemplate {
        message: message.to_string(),
    };
    (StatusCode::NOT_FOUND, render_template(template)).into_response()
}

fn server_error(e: sqlx::Error) -> Response {
    tracing::error!("Page query failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Eroare internă.").into_response()
}

fn is_back_office(user: &SessionUser) -> bool {
    user.is_staff() && user.has_any_role(&[RoleKey::Admin, RoleKey::SalesRep])
}

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        // Storefront
        .route("/", get(home))
        .route("/produs/:slug", get(product_page))
        .route("/categorie/:slug", get(category_page))
        .route("/login", get(login_page).post(login_submit))
        .route("/signup", get(signup_page).post(signup_submit))
        .route("/account", get(account_page))
        // Back office
        .route("/admin", get(admin_dashboard))
        .route("/admin/oferte/:id/document", get(offer_document))
        .fallback(fallback)
}

async fn active_products_in(
    state: &AppState,
    category_id: Option<&str>,
    limit: i64,
) -> Result<Vec<ProductCard>, sqlx::Error> {
    sqlx::query_as::<_, ProductCard>(
        r#"
        SELECT p.name, p.slug, p.sku, p.price_gross, COALESCE(b.name, '') AS brand_name
        FROM product p
        LEFT JOIN brand b ON b.id = p.brand_id
        WHERE p.is_active = 1
          AND (? IS NULL OR EXISTS (
                SELECT 1 FROM product_category pc
                WHERE pc.product_id = p.id AND pc.category_id = ?
          ))
        ORDER BY p.created_at DESC
        LIMIT ?
        "#,
    )
    .bind(category_id)
    .bind(category_id)
    .bind(limit)
    .fetch_all(&state.db)
    .await
}

// Storefront home
async fn home(State(state): State<Arc<AppState>>, MaybeUser(user): MaybeUser) -> Response {
    let categories = match sqlx::query_as::<_, CategoryChild>(
        "SELECT id, name, slug FROM category WHERE parent_id IS NULL ORDER BY name",
    )
    .fetch_all(&state.db)
    .await
    {
        Ok(categories) => categories,
        Err(e) => return server_error(e),
    };

    let products = match active_products_in(&state, None, HOME_PRODUCTS).await {
        Ok(products) => products,
        Err(e) => return server_error(e),
    };

    render_template(HomeTemplate {
        user,
        categories,
        products,
    })
}

// Product page; inactive products are hidden
async fn product_page(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
) -> Response {
    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM product p
        LEFT JOIN brand b ON b.id = p.brand_id
        LEFT JOIN tax_rate t ON t.id = p.tax_rate_id
        WHERE p.slug = ? AND p.is_active = 1
        "#
    ))
    .bind(&slug)
    .fetch_optional(&state.db)
    .await;

    let product = match product {
        Ok(Some(product)) => product,
        Ok(None) => return not_found_page("Produsul nu a fost găsit."),
        Err(e) => return server_error(e),
    };

    let codes: Vec<String> = match sqlx::query_scalar(
        "SELECT code FROM product_code WHERE product_id = ? AND is_primary = 0 ORDER BY code",
    )
    .bind(&product.id)
    .fetch_all(&state.db)
    .await
    {
        Ok(codes) => codes,
        Err(e) => return server_error(e),
    };

    render_template(ProductTemplate {
        user,
        product,
        codes,
    })
}

// Category page with subcategories and active products
async fn category_page(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
) -> Response {
    let category: Option<(String, String)> =
        match sqlx::query_as("SELECT id, name FROM category WHERE slug = ?")
            .bind(&slug)
            .fetch_optional(&state.db)
            .await
        {
            Ok(category) => category,
            Err(e) => return server_error(e),
        };

    let Some((id, name)) = category else {
        return not_found_page("Categoria nu a fost găsită.");
    };

    let children = match sqlx::query_as::<_, CategoryChild>(
        "SELECT id, name, slug FROM category WHERE parent_id = ? ORDER BY name",
    )
    .bind(&id)
    .fetch_all(&state.db)
    .await
    {
        Ok(children) => children,
        Err(e) => return server_error(e),
    };

    let products = match active_products_in(&state, Some(&id), 200).await {
        Ok(products) => products,
        Err(e) => return server_error(e),
    };

    render_template(CategoryTemplate {
        user,
        name,
        children,
        products,
    })
}

// Login page
async fn login_page(MaybeUser(user): MaybeUser) -> Response {
    if let Some(user) = user {
        return Redirect::to(user.home_path()).into_response();
    }
    render_template(LoginTemplate {
        error: None,
        email: String::new(),
    })
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

fn login_error(status: StatusCode, message: &str, email: String) -> Response {
    let template = LoginTemplate {
        error: Some(message.to_string()),
        email,
    };
    (status, render_template(template)).into_response()
}

// Login submit: sets the session cookie and redirects by role
async fn login_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if check_origin(&state.config, &headers).is_err() {
        return login_error(
            StatusCode::FORBIDDEN,
            "Cerere respinsă (origine invalidă).",
            form.email,
        );
    }

    let user = match authenticate(&state.db, &form.email, &form.password).await {
        Ok(user) => user,
        Err(AuthError::Database(e)) => return server_error(e),
        Err(_) => return login_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS, form.email),
    };

    match create_session(&state.db, &user.id, state.config.auth.session_ttl_days).await {
        Ok(session) => {
            tracing::info!(user_id = %user.id, "User logged in via form");
            let jar = jar.add(session_cookie(&state.config, session.token));
            (jar, Redirect::to(user.home_path())).into_response()
        }
        Err(e) => server_error(e),
    }
}

// Signup page
async fn signup_page(MaybeUser(user): MaybeUser) -> Response {
    if let Some(user) = user {
        return Redirect::to(user.home_path()).into_response();
    }
    render_template(SignupTemplate {
        error: None,
        form: SignupValues {
            kind: "individual".to_string(),
            ..Default::default()
        },
    })
}

fn signup_error(status: StatusCode, message: &str, form: SignupValues) -> Response {
    let template = SignupTemplate {
        error: Some(message.to_string()),
        form,
    };
    (status, render_template(template)).into_response()
}

// Signup submit: creates the customer account, signs it in and opens the account page
async fn signup_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<RegisterRequest>,
) -> Response {
    let values = SignupValues::from(&form);

    if check_origin(&state.config, &headers).is_err() {
        return signup_error(
            StatusCode::FORBIDDEN,
            "Cerere respinsă (origine invalidă).",
            values,
        );
    }

    let registration = match register_customer(&state.db, &form).await {
        Ok(registration) => registration,
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!("Signup failed: {}", e);
            }
            return signup_error(e.status(), e.message(), values);
        }
    };

    match create_session(
        &state.db,
        &registration.user_id,
        state.config.auth.session_ttl_days,
    )
    .await
    {
        Ok(session) => {
            let jar = jar.add(session_cookie(&state.config, session.token));
            (jar, Redirect::to("/account")).into_response()
        }
        Err(e) => server_error(e),
    }
}

// Customer account page
async fn account_page(MaybeUser(user): MaybeUser) -> Response {
    match user {
        Some(user) => render_template(AccountTemplate { user }),
        None => Redirect::to("/login").into_response(),
    }
}

// Back-office dashboard
async fn admin_dashboard(State(state): State<Arc<AppState>>, MaybeUser(user): MaybeUser) -> Response {
    let Some(user) = user.filter(is_back_office) else {
        return Redirect::to("/login").into_response();
    };

    let stats = match load_stats(&state.db).await {
        Ok(stats) => stats,
        Err(e) => return server_error(e),
    };

    render_template(AdminDashboardTemplate {
        is_admin: user.has_role(RoleKey::Admin),
        user,
        stats,
    })
}

// Printable offer document
async fn offer_document(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Response {
    if !user.as_ref().is_some_and(is_back_office) {
        return Redirect::to("/login").into_response();
    }

    match load_offer_detail(&state.db, &id).await {
        Ok(Some(offer)) => render_template(OfferDocumentTemplate { offer }),
        Ok(None) => not_found_page("Oferta nu există."),
        Err(e) => server_error(e),
    }
}

async fn fallback() -> Response {
    not_found_page("Pagina nu a fost găsită.")
}
