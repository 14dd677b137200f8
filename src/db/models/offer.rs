//! Offer (price quotation) models and total computation.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::common::{lenient_f64, round_money, trimmed_string};
use super::customer::display_name;
use super::vehicle::VehicleInput;

/// Status given to every new offer
pub const OFFER_STATUS_DRAFT: &str = "draft";

/// Line name used when the editor leaves it blank
pub const DEFAULT_ITEM_NAME: &str = "Produs";

/// Offer line as submitted by the editor.
///
/// The edit page sends `qty`/`tax`/`productId`, the document view sends
/// `quantity`/`tax_percentage`/`product_id`; both spellings are accepted and
/// the short one wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferItemInput {
    #[serde(default, rename = "productId", deserialize_with = "trimmed_string")]
    pub product_id: Option<String>,
    #[serde(default, rename = "product_id", deserialize_with = "trimmed_string")]
    pub product_id_alt: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub qty: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tax: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tax_percentage: Option<f64>,
}

/// Normalized offer line, ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct OfferLine {
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub tax_percentage: f64,
}

impl OfferItemInput {
    /// Apply defaults and reject impossible values.
    ///
    /// A missing or zero quantity becomes 1, a missing price or tax becomes 0.
    pub fn normalize(&self) -> Result<OfferLine, &'static str> {
        let quantity = match self.qty.or(self.quantity) {
            Some(q) if q < 0.0 => return Err("Cantitate invalidă."),
            Some(q) if q > 0.0 => q,
            _ => 1.0,
        };

        let unit_price = self.price.unwrap_or(0.0);
        if unit_price < 0.0 {
            return Err("Preț invalid.");
        }

        let tax_percentage = self.tax.or(self.tax_percentage).unwrap_or(0.0);
        if !(0.0..=100.0).contains(&tax_percentage) {
            return Err("Cota TVA invalidă.");
        }

        Ok(OfferLine {
            product_id: self.product_id.clone().or_else(|| self.product_id_alt.clone()),
            name: self
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_ITEM_NAME.to_string()),
            quantity,
            unit_price,
            tax_percentage,
        })
    }
}

impl OfferLine {
    pub fn net(&self) -> f64 {
        self.quantity * self.unit_price
    }

    pub fn tax(&self) -> f64 {
        self.net() * self.tax_percentage / 100.0
    }
}

/// Offer totals; always recomputed from the full item list
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OfferTotals {
    pub total_net: f64,
    pub total_tax: f64,
    pub total_gross: f64,
}

impl OfferTotals {
    pub fn from_lines(lines: &[OfferLine]) -> Self {
        let net: f64 = lines.iter().map(OfferLine::net).sum();
        let tax: f64 = lines.iter().map(OfferLine::tax).sum();
        let total_net = round_money(net);
        let total_tax = round_money(tax);
        Self {
            total_net,
            total_tax,
            total_gross: round_money(total_net + total_tax),
        }
    }
}

/// Normalize every submitted item, stopping at the first invalid one
pub fn normalize_items(items: &[OfferItemInput]) -> Result<Vec<OfferLine>, &'static str> {
    items.iter().map(OfferItemInput::normalize).collect()
}

/// Accept `YYYY-MM-DD` or a full RFC 3339 timestamp; stored as a date
pub fn parse_valid_until(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    #[serde(default, deserialize_with = "trimmed_string")]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub vehicle: Option<VehicleInput>,
    #[serde(default)]
    pub items: Vec<OfferItemInput>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub valid_until: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfferRequest {
    #[serde(default, deserialize_with = "trimmed_string")]
    pub customer_id: Option<String>,
    /// Vehicle currently shown in the editor
    #[serde(default, deserialize_with = "trimmed_string")]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub vehicle: Option<VehicleInput>,
    #[serde(default)]
    pub items: Vec<OfferItemInput>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub valid_until: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OfferUpdated {
    pub total_net: f64,
    pub total_tax: f64,
    pub total_gross: f64,
    pub vehicle_id: Option<String>,
}

/// Row of the offer list query
#[derive(Debug, Clone, FromRow)]
pub struct OfferListRow {
    pub id: String,
    pub total_gross: f64,
    pub created_at: String,
    pub status: String,
    pub kind: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub plate_number: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferListItem {
    pub id: String,
    pub date: String,
    pub total: f64,
    pub status: String,
    pub client_name: String,
    pub vehicle: String,
}

/// Human label for a vehicle: `B-123-ABC (Volvo FH)`, or `-` without a plate
pub fn vehicle_label(plate: Option<&str>, brand: Option<&str>, model: Option<&str>) -> String {
    match plate.filter(|p| !p.is_empty()) {
        Some(plate) => format!(
            "{} ({} {})",
            plate,
            brand.unwrap_or(""),
            model.unwrap_or("")
        ),
        None => "-".to_string(),
    }
}

impl From<OfferListRow> for OfferListItem {
    fn from(row: OfferListRow) -> Self {
        Self {
            client_name: display_name(
                &row.kind,
                row.company_name.as_deref(),
                row.first_name.as_deref(),
                row.last_name.as_deref(),
            ),
            vehicle: vehicle_label(
                row.plate_number.as_deref(),
                row.brand.as_deref(),
                row.model.as_deref(),
            ),
            id: row.id,
            date: row.created_at,
            total: row.total_gross,
            status: row.status,
        }
    }
}

/// Offer header joined with customer and vehicle
#[derive(Debug, Clone, FromRow)]
pub struct OfferHeaderRow {
    pub id: String,
    pub status: String,
    pub notes: Option<String>,
    pub valid_until: Option<String>,
    pub total_net: f64,
    pub total_tax: f64,
    pub total_gross: f64,
    pub created_at: String,
    pub customer_id: String,
    pub kind: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub vat_id: Option<String>,
    pub reg_no: Option<String>,
    pub contact_email: Option<String>,
    pub vehicle_id: Option<String>,
    pub vin: Option<String>,
    pub plate_number: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OfferItemRow {
    pub id: String,
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub tax_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferCustomer {
    pub id: String,
    pub kind: String,
    pub display_name: String,
    pub vat_id: Option<String>,
    pub reg_no: Option<String>,
    pub email: Option<String>,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferVehicle {
    pub id: Option<String>,
    pub vin: String,
    pub plate_number: String,
    pub brand: String,
    pub model: String,
    pub year: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferItemView {
    pub id: String,
    pub product_id: Option<String>,
    pub name: String,
    pub qty: f64,
    pub quantity: f64,
    pub price: f64,
    pub tax: f64,
    pub line_net: f64,
    pub line_gross: f64,
}

impl From<OfferItemRow> for OfferItemView {
    fn from(row: OfferItemRow) -> Self {
        let quantity = if row.quantity > 0.0 { row.quantity } else { 1.0 };
        let line_net = round_money(quantity * row.unit_price);
        let line_tax = round_money(quantity * row.unit_price * row.tax_percentage / 100.0);
        Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            qty: quantity,
            quantity,
            price: row.unit_price,
            tax: row.tax_percentage,
            line_net,
            line_gross: round_money(line_net + line_tax),
        }
    }
}

/// Offer as returned by `GET /api/admin/offers/:id` and rendered in the document page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDetail {
    pub id: String,
    pub status: String,
    pub notes: Option<String>,
    /// `YYYY-MM-DD` or empty
    pub valid_until: String,
    pub created_at: String,
    pub client_name: String,
    pub customer: OfferCustomer,
    pub vehicle_id: Option<String>,
    pub vehicle: OfferVehicle,
    pub items: Vec<OfferItemView>,
    pub totals: OfferTotals,
}

impl OfferDetail {
    pub fn from_rows(header: OfferHeaderRow, items: Vec<OfferItemRow>) -> Self {
        let client_name = display_name(
            &header.kind,
            header.company_name.as_deref(),
            header.first_name.as_deref(),
            header.last_name.as_deref(),
        );

        Self {
            valid_until: header
                .valid_until
                .as_deref()
                .and_then(parse_valid_until)
                .unwrap_or_default(),
            customer: OfferCustomer {
                id: header.customer_id,
                kind: header.kind,
                display_name: client_name.clone(),
                vat_id: header.vat_id,
                reg_no: header.reg_no,
                email: header.contact_email,
                phone: header.phone.unwrap_or_default(),
            },
            client_name,
            vehicle: OfferVehicle {
                id: header.vehicle_id.clone(),
                vin: header.vin.unwrap_or_default(),
                plate_number: header.plate_number.unwrap_or_default(),
                brand: header.brand.unwrap_or_default(),
                model: header.model.unwrap_or_default(),
                year: header.year,
            },
            vehicle_id: header.vehicle_id,
            items: items.into_iter().map(OfferItemView::from).collect(),
            totals: OfferTotals {
                total_net: header.total_net,
                total_tax: header.total_tax,
                total_gross: header.total_gross,
            },
            id: header.id,
            status: header.status,
            notes: header.notes,
            created_at: header.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: serde_json::Value) -> OfferItemInput {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_normalize_defaults() {
        let line = item(serde_json::json!({ "price": 10 })).normalize().unwrap();
        assert_eq!(line.quantity, 1.0);
        assert_eq!(line.tax_percentage, 0.0);
        assert_eq!(line.name, "Produs");
        assert!(line.product_id.is_none());

        let line = item(serde_json::json!({ "qty": 0, "price": 10, "name": "  " }))
            .normalize()
            .unwrap();
        assert_eq!(line.quantity, 1.0);
        assert_eq!(line.name, "Produs");
    }

    #[test]
    fn test_normalize_accepts_both_spellings() {
        let line = item(serde_json::json!({
            "product_id": "p1",
            "quantity": "2,5",
            "price": 4,
            "tax_percentage": 21
        }))
        .normalize()
        .unwrap();
        assert_eq!(line.product_id.as_deref(), Some("p1"));
        assert_eq!(line.quantity, 2.5);
        assert_eq!(line.tax_percentage, 21.0);

        // Short spelling wins when both are present
        let line = item(serde_json::json!({
            "productId": "p2",
            "product_id": "p1",
            "qty": 3,
            "quantity": 5,
            "tax": 5,
            "tax_percentage": 21
        }))
        .normalize()
        .unwrap();
        assert_eq!(line.product_id.as_deref(), Some("p2"));
        assert_eq!(line.quantity, 3.0);
        assert_eq!(line.tax_percentage, 5.0);
    }

    #[test]
    fn test_normalize_rejects_invalid_values() {
        assert!(item(serde_json::json!({ "qty": -1 })).normalize().is_err());
        assert!(item(serde_json::json!({ "price": -0.5 })).normalize().is_err());
        assert!(item(serde_json::json!({ "tax": 150 })).normalize().is_err());
    }

    #[test]
    fn test_totals_rounded_to_cent() {
        let lines = normalize_items(&[
            item(serde_json::json!({ "qty": 3, "price": 19.99, "tax": 21 })),
            item(serde_json::json!({ "qty": 1, "price": 0.333, "tax": 5 })),
        ])
        .unwrap();

        let totals = OfferTotals::from_lines(&lines);
        // net = 59.97 + 0.333 = 60.303, tax = 12.5937 + 0.01665 = 12.61035
        assert_eq!(totals.total_net, 60.3);
        assert_eq!(totals.total_tax, 12.61);
        assert_eq!(totals.total_gross, 72.91);
    }

    #[test]
    fn test_totals_empty() {
        assert_eq!(OfferTotals::from_lines(&[]), OfferTotals::default());
    }

    #[test]
    fn test_parse_valid_until() {
        assert_eq!(parse_valid_until("2026-03-01").as_deref(), Some("2026-03-01"));
        assert_eq!(
            parse_valid_until("2026-03-01T10:00:00.000Z").as_deref(),
            Some("2026-03-01")
        );
        assert!(parse_valid_until("01.03.2026").is_none());
    }

    #[test]
    fn test_vehicle_label() {
        assert_eq!(
            vehicle_label(Some("B-123-ABC"), Some("Volvo"), Some("FH")),
            "B-123-ABC (Volvo FH)"
        );
        assert_eq!(vehicle_label(None, Some("Volvo"), None), "-");
        assert_eq!(vehicle_label(Some(""), None, None), "-");
    }
}
