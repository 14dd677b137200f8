//! Authentication: password hashing, opaque session tokens, request
//! extractors and the `/api/auth/*` handlers.
//!
//! A session token is 32 random bytes, base64url encoded. Only its SHA-256
//! hex digest is stored. Web clients carry the token in an httpOnly cookie,
//! mobile clients send it as a bearer token.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::sync::Arc;

use super::error::ApiError;
use super::json::{ok, ApiJson, Empty};
use super::validation::{normalize_email, validate_email, validate_signup_password};
use crate::config::Config;
use crate::db::{
    self, CustomerKind, LoginMode, LoginRequest, LoginResponse, MeResponse, RegisterRequest,
    RegisterResponse, RoleKey, SessionUser, SessionUserRow, UserCredentials, UserKind,
};
use crate::AppState;

/// Shared message for every login failure, so callers cannot probe accounts
pub const INVALID_CREDENTIALS: &str = "Email sau parolă incorecte.";

const EMAIL_TAKEN: &str = "Există deja un cont cu acest email.";

/// Typed authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no valid session")]
    Unauthenticated,
    #[error("insufficient role")]
    Forbidden,
    #[error("cross-origin request rejected")]
    OriginRejected,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized(INVALID_CREDENTIALS),
            AuthError::Unauthenticated => ApiError::unauthorized("Neautorizat."),
            AuthError::Forbidden => ApiError::forbidden("Acces interzis."),
            AuthError::OriginRejected => ApiError::forbidden("Cerere respinsă (origine invalidă)."),
            AuthError::Hash(cause) => {
                tracing::error!("Password hashing failed: {}", cause);
                ApiError::internal("Eroare internă.").with_debug(cause)
            }
            AuthError::Database(e) => ApiError::from(e),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a new session token (32 random bytes, base64url without padding)
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token for storage
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: String,
}

/// Store a new session for `user_id` and return its plain token
pub async fn create_session(
    pool: &SqlitePool,
    user_id: &str,
    ttl_days: i64,
) -> Result<IssuedSession, sqlx::Error> {
    let token = generate_token();
    let now = Utc::now();
    let expires_at = db::timestamp(now + chrono::Duration::days(ttl_days));

    sqlx::query(
        "INSERT INTO session (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(hash_token(&token))
    .bind(&expires_at)
    .bind(db::timestamp(now))
    .execute(pool)
    .await?;

    Ok(IssuedSession { token, expires_at })
}

/// Remove expired sessions
pub async fn sweep_expired_sessions(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM session WHERE expires_at < ?")
        .bind(db::now())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Mark the session carrying `token` as revoked
pub async fn revoke_session(pool: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE session SET revoked_at = ? WHERE token_hash = ? AND revoked_at IS NULL")
        .bind(db::now())
        .bind(hash_token(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Load the owner of an unrevoked, unexpired session whose account is active
pub async fn resolve_session(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<SessionUser>, sqlx::Error> {
    let row: Option<SessionUserRow> = sqlx::query_as(
        r#"
        SELECT u.id, u.email, u.kind, GROUP_CONCAT(r.key) AS roles
        FROM session s
        JOIN app_user u ON u.id = s.user_id
        LEFT JOIN user_role ur ON ur.user_id = u.id
        LEFT JOIN role r ON r.id = ur.role_id
        WHERE s.token_hash = ?
          AND s.revoked_at IS NULL
          AND s.expires_at > ?
          AND u.is_active = 1
        GROUP BY u.id
        LIMIT 1
        "#,
    )
    .bind(hash_token(token))
    .bind(db::now())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(SessionUser::from))
}

/// Check an email/password pair and return the account on success.
///
/// Every failure mode maps to [`AuthError::InvalidCredentials`].
pub async fn authenticate(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<SessionUser, AuthError> {
    let email = normalize_email(email);
    if validate_email(&email).is_err()
        || password.is_empty()
        || password.chars().count() > super::validation::MAX_LOGIN_PASSWORD_LENGTH
    {
        return Err(AuthError::InvalidCredentials);
    }

    let swept = sweep_expired_sessions(pool).await?;
    if swept > 0 {
        tracing::debug!(count = swept, "Removed expired sessions");
    }

    let user: Option<UserCredentials> = sqlx::query_as(
        r#"
        SELECT u.id, u.email, u.password_hash, u.kind, u.is_active, GROUP_CONCAT(r.key) AS roles
        FROM app_user u
        LEFT JOIN user_role ur ON ur.user_id = u.id
        LEFT JOIN role r ON r.id = ur.role_id
        WHERE lower(u.email) = ?
        GROUP BY u.id
        LIMIT 1
        "#,
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?;

    let user = match user {
        Some(u) if u.is_active => u,
        _ => return Err(AuthError::InvalidCredentials),
    };

    if !verify_password(password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(SessionUser::from(user))
}

/// Pick the session token from a request: bearer header first, cookie second.
///
/// A present but empty bearer header yields no token at all.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if value.len() >= 7 && value[..7].eq_ignore_ascii_case("bearer ") {
            let token = value[7..].trim();
            return (!token.is_empty()).then(|| token.to_string());
        }
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// True when the `Origin` host equals the `Host` header
pub fn same_origin(headers: &HeaderMap) -> bool {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());

    match (origin, host) {
        (Some(origin), Some(host)) => match origin.split_once("://") {
            Some((_, rest)) => {
                let origin_host = rest.split('/').next().unwrap_or("");
                !origin_host.is_empty() && origin_host.eq_ignore_ascii_case(host)
            }
            None => false,
        },
        _ => false,
    }
}

/// Reject cross-origin cookie-setting requests in production
pub fn check_origin(config: &Config, headers: &HeaderMap) -> Result<(), AuthError> {
    if config.server.environment.is_production() && !same_origin(headers) {
        return Err(AuthError::OriginRejected);
    }
    Ok(())
}

/// Build the session cookie for a freshly issued token
pub fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((config.auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.server.environment.is_production())
        .max_age(time::Duration::days(config.auth.session_ttl_days))
        .build()
}

/// Cookie that clears the session cookie on the client
fn removal_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((config.auth.cookie_name.clone(), "")).path("/").build()
}

async fn load_user(parts: &Parts, state: &AppState) -> Result<Option<SessionUser>, AuthError> {
    let Some(token) = session_token(&parts.headers, &state.config.auth.cookie_name) else {
        return Ok(None);
    };
    Ok(resolve_session(&state.db, &token).await?)
}

// -------------------------------------------------------------------------
// Extractors
// -------------------------------------------------------------------------

/// The session user, if any
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<SessionUser>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(load_user(parts, state).await?))
    }
}

/// Any authenticated user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        load_user(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Staff holding ADMIN or SALES_REP
#[derive(Debug, Clone)]
pub struct RequireStaff(pub SessionUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireStaff {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.is_staff() && user.has_any_role(&[RoleKey::Admin, RoleKey::SalesRep]) {
            Ok(RequireStaff(user))
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

/// Staff holding ADMIN
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub SessionUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.is_staff() && user.has_role(RoleKey::Admin) {
            Ok(RequireAdmin(user))
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

// -------------------------------------------------------------------------
// Handlers
// -------------------------------------------------------------------------

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let mode = LoginMode::parse(request.mode.as_deref());
    if mode.sets_cookie() {
        check_origin(&state.config, &headers)?;
    }

    let user = authenticate(
        &state.db,
        request.email.as_deref().unwrap_or(""),
        request.password.as_deref().unwrap_or(""),
    )
    .await?;

    let session = create_session(&state.db, &user.id, state.config.auth.session_ttl_days).await?;
    tracing::info!(user_id = %user.id, mode = ?mode, "User logged in");

    let jar = if mode.sets_cookie() {
        jar.add(session_cookie(&state.config, session.token.clone()))
    } else {
        jar
    };

    let (token, expires_at) = if mode.returns_token() {
        (Some(session.token), Some(session.expires_at))
    } else {
        (None, None)
    };

    let body = LoginResponse {
        redirect_to: user.home_path().to_string(),
        user,
        token,
        expires_at,
    };

    Ok((jar, ok(body)).into_response())
}

/// Outcome of a successful customer signup
#[derive(Debug, Clone)]
pub struct Registration {
    pub user_id: String,
    pub customer_id: String,
    /// True when an existing staff-created customer was linked to the new account
    pub adopted_customer: bool,
}

/// Create a customer account with its CUSTOMER role and customer record.
///
/// An individual with a phone adopts a staff-created customer with that phone
/// instead of creating a new one. All writes share one transaction.
pub async fn register_customer(
    pool: &SqlitePool,
    request: &RegisterRequest,
) -> Result<Registration, ApiError> {
    let kind: CustomerKind = request
        .kind
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(|_| ApiError::bad_request("Tip client invalid."))?;

    let email = normalize_email(request.email.as_deref().unwrap_or(""));
    let password = request.password.as_deref().unwrap_or("");
    validate_email(&email).map_err(ApiError::bad_request)?;
    validate_signup_password(password).map_err(ApiError::bad_request)?;

    let trimmed = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let first_name = trimmed(&request.first_name);
    let last_name = trimmed(&request.last_name);
    let phone = trimmed(&request.phone);
    let company_name = trimmed(&request.company_name);

    match kind {
        CustomerKind::Individual if first_name.is_none() || last_name.is_none() => {
            return Err(ApiError::bad_request("Completează numele și prenumele."));
        }
        CustomerKind::Company if company_name.is_none() => {
            return Err(ApiError::bad_request("Completează numele firmei."));
        }
        _ => {}
    }

    let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM app_user WHERE email = ? LIMIT 1")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    if exists.is_some() {
        return Err(ApiError::conflict(EMAIL_TAKEN));
    }

    let password_hash = hash_password(password).map_err(|e| AuthError::Hash(e.to_string()))?;

    let user_id = uuid::Uuid::new_v4().to_string();
    let now = db::now();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO app_user (id, email, password_hash, kind, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&user_id)
    .bind(&email)
    .bind(&password_hash)
    .bind(UserKind::Customer.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(super::error::on_conflict(EMAIL_TAKEN))?;

    sqlx::query(
        "INSERT OR IGNORE INTO user_role (user_id, role_id) SELECT ?, id FROM role WHERE key = ?",
    )
    .bind(&user_id)
    .bind(RoleKey::Customer.as_str())
    .execute(&mut *tx)
    .await?;

    let orphan: Option<(String,)> = match (&kind, &phone) {
        (CustomerKind::Individual, Some(phone)) => {
            sqlx::query_as(
                r#"
                SELECT c.id
                FROM customer c
                JOIN customer_individual ci ON ci.customer_id = c.id
                WHERE ci.phone = ? AND c.user_id IS NULL AND c.kind = 'individual'
                LIMIT 1
                "#,
            )
            .bind(phone)
            .fetch_optional(&mut *tx)
            .await?
        }
        _ => None,
    };

    let adopted_customer = orphan.is_some();
    let customer_id = if let Some((customer_id,)) = orphan {
        sqlx::query("UPDATE customer SET user_id = ? WHERE id = ?")
            .bind(&user_id)
            .bind(&customer_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE customer_individual SET first_name = ?, last_name = ? WHERE customer_id = ?",
        )
        .bind(&first_name)
        .bind(&last_name)
        .bind(&customer_id)
        .execute(&mut *tx)
        .await?;
        customer_id
    } else {
        let customer_id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO customer (id, kind, user_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(&customer_id)
            .bind(kind.as_str())
            .bind(&user_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        match kind {
            CustomerKind::Individual => {
                sqlx::query(
                    "INSERT INTO customer_individual (customer_id, first_name, last_name, phone) VALUES (?, ?, ?, ?)",
                )
                .bind(&customer_id)
                .bind(&first_name)
                .bind(&last_name)
                .bind(&phone)
                .execute(&mut *tx)
                .await?;
            }
            CustomerKind::Company => {
                sqlx::query(
                    r#"
                    INSERT INTO customer_company
                        (customer_id, company_name, vat_id, reg_no, contact_name, contact_phone, contact_email)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&customer_id)
                .bind(&company_name)
                .bind(trimmed(&request.vat_id))
                .bind(trimmed(&request.reg_no))
                .bind(trimmed(&request.contact_name))
                .bind(trimmed(&request.contact_phone))
                .bind(trimmed(&request.contact_email).unwrap_or_else(|| email.clone()))
                .execute(&mut *tx)
                .await?;
            }
        }
        customer_id
    };

    tx.commit().await?;

    tracing::info!(
        user_id = %user_id,
        customer_id = %customer_id,
        adopted = adopted_customer,
        "Customer registered"
    );

    Ok(Registration {
        user_id,
        customer_id,
        adopted_customer,
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Response, ApiError> {
    let registration = register_customer(&state.db, &request).await?;

    let session = create_session(
        &state.db,
        &registration.user_id,
        state.config.auth.session_ttl_days,
    )
    .await?;
    let jar = jar.add(session_cookie(&state.config, session.token));

    let body = RegisterResponse {
        redirect_to: "/account".to_string(),
        user_id: registration.user_id,
        customer_id: registration.customer_id,
        adopted_customer: registration.adopted_customer,
    };

    Ok((jar, ok(body)).into_response())
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers, &state.config.auth.cookie_name) {
        revoke_session(&state.db, &token).await?;
    }

    let jar = jar.remove(removal_cookie(&state.config));

    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);

    if wants_json {
        Ok((jar, ok(Empty {})).into_response())
    } else {
        Ok((jar, Redirect::to("/")).into_response())
    }
}

/// GET /api/auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    ok(MeResponse { user })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("parola123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("parola123", &hash));
        assert!(!verify_password("parola124", &hash));
        assert!(!verify_password("parola123", "not-a-phc-string"));
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        // 32 bytes -> 43 base64url characters without padding
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_hash_token_is_sha256_hex() {
        let hash = hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_session_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session=from-cookie"));
        assert_eq!(session_token(&headers, "session").as_deref(), Some("from-cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(session_token(&headers, "session").as_deref(), Some("from-header"));

        // An empty bearer token does not fall back to the cookie
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer   "));
        assert_eq!(session_token(&headers, "session"), None);
    }

    #[test]
    fn test_same_origin() {
        let mut headers = HeaderMap::new();
        assert!(!same_origin(&headers));

        headers.insert(header::HOST, HeaderValue::from_static("piese.ro"));
        headers.insert(header::ORIGIN, HeaderValue::from_static("https://piese.ro"));
        assert!(same_origin(&headers));

        headers.insert(header::ORIGIN, HeaderValue::from_static("https://evil.example"));
        assert!(!same_origin(&headers));

        headers.insert(header::ORIGIN, HeaderValue::from_static("null"));
        assert!(!same_origin(&headers));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = Config::default();
        let cookie = session_cookie(&config, "tok".to_string());
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.path(), Some("/"));

        config.server.environment = crate::config::Environment::Production;
        assert_eq!(session_cookie(&config, "tok".to_string()).secure(), Some(true));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let pool = db::test_pool().await;
        db::ensure_admin_user(&pool, "Admin@Firma.ro", "parola123")
            .await
            .unwrap();

        let user = authenticate(&pool, " admin@firma.RO ", "parola123").await.unwrap();
        assert!(user.is_staff());
        assert_eq!(user.roles, vec!["ADMIN"]);

        let session = create_session(&pool, &user.id, 14).await.unwrap();
        let resolved = resolve_session(&pool, &session.token).await.unwrap();
        assert_eq!(resolved.as_ref().map(|u| u.id.as_str()), Some(user.id.as_str()));

        revoke_session(&pool, &session.token).await.unwrap();
        assert!(resolve_session(&pool, &session.token).await.unwrap().is_none());

        // Expired sessions are neither resolved nor kept
        let expired = create_session(&pool, &user.id, -1).await.unwrap();
        assert!(resolve_session(&pool, &expired.token).await.unwrap().is_none());
        assert!(sweep_expired_sessions(&pool).await.unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_uniform() {
        let pool = db::test_pool().await;
        db::ensure_admin_user(&pool, "admin@firma.ro", "parola123")
            .await
            .unwrap();

        for (email, password) in [
            ("admin@firma.ro", "gresita1"),
            ("nimeni@firma.ro", "parola123"),
            ("fara-arond", "parola123"),
            ("admin@firma.ro", ""),
        ] {
            let err = authenticate(&pool, email, password).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }

        sqlx::query("UPDATE app_user SET is_active = 0")
            .execute(&pool)
            .await
            .unwrap();
        let err = authenticate(&pool, "admin@firma.ro", "parola123")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
