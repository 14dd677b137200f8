//! Customer models: a parent `customer` row plus one kind-specific detail row.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::common::trimmed_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerKind {
    Individual,
    Company,
}

impl CustomerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerKind::Individual => "individual",
            CustomerKind::Company => "company",
        }
    }
}

impl std::fmt::Display for CustomerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CustomerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "individual" => Ok(CustomerKind::Individual),
            "company" => Ok(CustomerKind::Company),
            _ => Err(format!("Unknown customer kind: {}", s)),
        }
    }
}

/// Customer joined with both detail tables; exactly one side is populated
#[derive(Debug, Clone, FromRow)]
pub struct CustomerRow {
    pub id: String,
    pub kind: String,
    pub user_id: Option<String>,
    pub company_name: Option<String>,
    pub vat_id: Option<String>,
    pub reg_no: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Columns selected by every query that builds a [`CustomerRow`]
pub const CUSTOMER_COLUMNS: &str = r#"
    c.id, c.kind, c.user_id,
    cc.company_name, cc.vat_id, cc.reg_no, cc.contact_name, cc.contact_phone, cc.contact_email,
    ci.first_name, ci.last_name, ci.phone
"#;

/// Build a customer display name from its parts
pub fn display_name(
    kind: &str,
    company_name: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> String {
    if kind == CustomerKind::Company.as_str() {
        company_name.unwrap_or("").to_string()
    } else {
        format!("{} {}", first_name.unwrap_or(""), last_name.unwrap_or(""))
            .trim()
            .to_string()
    }
}

impl CustomerRow {
    pub fn display_name(&self) -> String {
        display_name(
            &self.kind,
            self.company_name.as_deref(),
            self.first_name.as_deref(),
            self.last_name.as_deref(),
        )
    }
}

/// Customer as returned by the search endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    pub id: String,
    pub kind: String,
    pub display_name: String,
    pub has_account: bool,
    pub company_name: Option<String>,
    pub vat_id: Option<String>,
    pub reg_no: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl From<CustomerRow> for CustomerSummary {
    fn from(row: CustomerRow) -> Self {
        Self {
            display_name: row.display_name(),
            has_account: row.user_id.is_some(),
            id: row.id,
            kind: row.kind,
            company_name: row.company_name,
            vat_id: row.vat_id,
            reg_no: row.reg_no,
            contact_name: row.contact_name,
            contact_phone: row.contact_phone,
            contact_email: row.contact_email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
        }
    }
}

/// Staff-side create-or-update payload (snake_case, as sent by the admin UI)
#[derive(Debug, Deserialize)]
pub struct CustomerPayload {
    #[serde(default, deserialize_with = "trimmed_string")]
    pub id: Option<String>,
    pub kind: CustomerKind,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub vat_id: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub reg_no: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub contact_name: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub contact_phone: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub contact_email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSaved {
    pub customer_id: String,
    pub created: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("company", Some("Trans SRL"), None, None), "Trans SRL");
        assert_eq!(
            display_name("individual", None, Some("Ion"), Some("Popescu")),
            "Ion Popescu"
        );
        assert_eq!(display_name("individual", None, None, Some("Popescu")), "Popescu");
        assert_eq!(display_name("company", None, None, None), "");
    }

    #[test]
    fn test_payload_kind_is_required() {
        assert!(serde_json::from_str::<CustomerPayload>(r#"{"first_name":"Ion"}"#).is_err());
        assert!(serde_json::from_str::<CustomerPayload>(r#"{"kind":"other"}"#).is_err());

        let payload: CustomerPayload =
            serde_json::from_str(r#"{"kind":"company","company_name":" Trans SRL ","id":""}"#)
                .unwrap();
        assert_eq!(payload.kind, CustomerKind::Company);
        assert_eq!(payload.company_name.as_deref(), Some("Trans SRL"));
        assert!(payload.id.is_none());
    }
}
