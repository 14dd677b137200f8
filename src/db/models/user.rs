//! User, role and session models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    /// Back-office personnel (administrators, sales agents)
    Staff,
    /// Self-registered storefront customer
    Customer,
}

impl UserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserKind::Staff => "staff",
            UserKind::Customer => "customer",
        }
    }
}

impl std::fmt::Display for UserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(UserKind::Staff),
            "customer" => Ok(UserKind::Customer),
            _ => Err(format!("Unknown user kind: {}", s)),
        }
    }
}

/// Role keys stored in the `role` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleKey {
    Admin,
    SalesRep,
    Customer,
}

impl RoleKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKey::Admin => "ADMIN",
            RoleKey::SalesRep => "SALES_REP",
            RoleKey::Customer => "CUSTOMER",
        }
    }
}

impl std::fmt::Display for RoleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User row joined with its aggregated role keys (login lookup)
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub kind: String,
    pub is_active: bool,
    /// Comma-separated role keys from `GROUP_CONCAT`
    pub roles: Option<String>,
}

/// Session owner as seen by request handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub kind: String,
    pub roles: Vec<String>,
}

impl SessionUser {
    pub fn is_staff(&self) -> bool {
        self.kind == UserKind::Staff.as_str()
    }

    pub fn has_role(&self, role: RoleKey) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }

    pub fn has_any_role(&self, roles: &[RoleKey]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }

    /// Where the client should land after login
    pub fn home_path(&self) -> &'static str {
        if self.is_staff() {
            if self.has_any_role(&[RoleKey::Admin, RoleKey::SalesRep]) {
                "/admin"
            } else {
                "/"
            }
        } else {
            "/account"
        }
    }
}

/// Split a `GROUP_CONCAT` result into role keys
pub fn split_roles(roles: Option<&str>) -> Vec<String> {
    let mut keys: Vec<String> = roles
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

impl From<UserCredentials> for SessionUser {
    fn from(user: UserCredentials) -> Self {
        Self {
            roles: split_roles(user.roles.as_deref()),
            id: user.id,
            email: user.email,
            kind: user.kind,
        }
    }
}

/// Row shape of the session lookup query
#[derive(Debug, Clone, FromRow)]
pub struct SessionUserRow {
    pub id: String,
    pub email: String,
    pub kind: String,
    pub roles: Option<String>,
}

impl From<SessionUserRow> for SessionUser {
    fn from(row: SessionUserRow) -> Self {
        Self {
            roles: split_roles(row.roles.as_deref()),
            id: row.id,
            email: row.email,
            kind: row.kind,
        }
    }
}

/// Login mode: web clients want a cookie, mobile clients want the token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginMode {
    #[default]
    Cookie,
    Token,
    Both,
}

impl LoginMode {
    /// Unknown values fall back to cookie mode
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("token") => LoginMode::Token,
            Some("both") => LoginMode::Both,
            _ => LoginMode::Cookie,
        }
    }

    pub fn sets_cookie(&self) -> bool {
        matches!(self, LoginMode::Cookie | LoginMode::Both)
    }

    pub fn returns_token(&self) -> bool {
        matches!(self, LoginMode::Token | LoginMode::Both)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub redirect_to: String,
    pub user: SessionUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Self-registration payload (camelCase, as sent by the signup form)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub kind: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub vat_id: Option<String>,
    pub reg_no: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub redirect_to: String,
    pub user_id: String,
    pub customer_id: String,
    /// True when an existing staff-created customer was linked to the new account
    pub adopted_customer: bool,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: SessionUser,
}

/// Sales agent list entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SalesRep {
    pub id: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalesRepRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Accepted for form compatibility, not stored
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSalesRepRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRepDeleted {
    pub user_id: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(kind: &str, roles: &[&str]) -> SessionUser {
        SessionUser {
            id: "u1".to_string(),
            email: "a@b.ro".to_string(),
            kind: kind.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_split_roles() {
        assert_eq!(split_roles(Some("SALES_REP,ADMIN,ADMIN")), vec!["ADMIN", "SALES_REP"]);
        assert!(split_roles(None).is_empty());
        assert!(split_roles(Some("")).is_empty());
    }

    #[test]
    fn test_home_path() {
        assert_eq!(user("staff", &["ADMIN"]).home_path(), "/admin");
        assert_eq!(user("staff", &["SALES_REP"]).home_path(), "/admin");
        assert_eq!(user("staff", &[]).home_path(), "/");
        assert_eq!(user("customer", &["CUSTOMER"]).home_path(), "/account");
        // A customer account never reaches the back-office, whatever its roles
        assert_eq!(user("customer", &["ADMIN"]).home_path(), "/account");
    }

    #[test]
    fn test_login_mode_parse() {
        assert_eq!(LoginMode::parse(None), LoginMode::Cookie);
        assert_eq!(LoginMode::parse(Some("token")), LoginMode::Token);
        assert_eq!(LoginMode::parse(Some("both")), LoginMode::Both);
        assert_eq!(LoginMode::parse(Some("bogus")), LoginMode::Cookie);
        assert!(LoginMode::Both.sets_cookie() && LoginMode::Both.returns_token());
        assert!(!LoginMode::Token.sets_cookie());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&RoleKey::SalesRep).unwrap(), "\"SALES_REP\"");
        assert_eq!("staff".parse::<UserKind>().unwrap(), UserKind::Staff);
        assert!("admin".parse::<UserKind>().is_err());
    }
}
