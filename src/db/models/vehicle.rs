//! Vehicle models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::common::{lenient_i64, trimmed_string};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: String,
    pub customer_id: Option<String>,
    pub vin: String,
    pub plate_number: String,
    pub brand: String,
    pub model: String,
    pub year: Option<i64>,
    pub created_at: String,
}

/// Vehicle details submitted together with an offer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleInput {
    #[serde(default, deserialize_with = "trimmed_string")]
    pub vin: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub plate_number: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "trimmed_string")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub year: Option<i64>,
}

impl VehicleInput {
    pub fn vin(&self) -> &str {
        self.vin.as_deref().unwrap_or("")
    }

    pub fn plate_number(&self) -> &str {
        self.plate_number.as_deref().unwrap_or("")
    }

    pub fn brand(&self) -> &str {
        self.brand.as_deref().unwrap_or("")
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("")
    }

    /// A payload identifies a vehicle only when it carries a VIN or a plate
    pub fn is_identifiable(&self) -> bool {
        !self.vin().is_empty() || !self.plate_number().is_empty()
    }

    /// True when the payload describes the stored vehicle.
    ///
    /// Compared fields: VIN, plate, brand, model. The year is not compared,
    /// so correcting only the year keeps the existing row.
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        self.vin() == vehicle.vin
            && self.plate_number() == vehicle.plate_number
            && self.brand() == vehicle.brand
            && self.model() == vehicle.model
    }
}

#[derive(Debug, Deserialize)]
pub struct VehicleSearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VehicleSearchResponse {
    pub vehicle: Option<Vehicle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Vehicle {
        Vehicle {
            id: "v1".to_string(),
            customer_id: None,
            vin: "YV2RT40A8KB123456".to_string(),
            plate_number: "B-123-ABC".to_string(),
            brand: "Volvo".to_string(),
            model: "FH".to_string(),
            year: Some(2019),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn input(vin: &str, plate: &str, brand: &str, model: &str) -> VehicleInput {
        serde_json::from_value(serde_json::json!({
            "vin": vin,
            "plate_number": plate,
            "brand": brand,
            "model": model,
            "year": 2020
        }))
        .unwrap()
    }

    #[test]
    fn test_matches_ignores_year() {
        let v = stored();
        assert!(input("YV2RT40A8KB123456", "B-123-ABC", "Volvo", "FH").matches(&v));
    }

    #[test]
    fn test_any_compared_field_change_breaks_match() {
        let v = stored();
        assert!(!input("YV2RT40A8KB000000", "B-123-ABC", "Volvo", "FH").matches(&v));
        assert!(!input("YV2RT40A8KB123456", "B-999-ABC", "Volvo", "FH").matches(&v));
        assert!(!input("YV2RT40A8KB123456", "B-123-ABC", "Scania", "FH").matches(&v));
        assert!(!input("YV2RT40A8KB123456", "B-123-ABC", "Volvo", "FM").matches(&v));
    }

    #[test]
    fn test_missing_fields_compare_as_empty() {
        let mut v = stored();
        v.brand = String::new();
        v.model = String::new();
        let payload: VehicleInput = serde_json::from_value(serde_json::json!({
            "vin": "YV2RT40A8KB123456",
            "plate_number": "B-123-ABC"
        }))
        .unwrap();
        assert!(payload.matches(&v));
    }

    #[test]
    fn test_is_identifiable() {
        assert!(!VehicleInput::default().is_identifiable());
        assert!(input("", "B-1-XYZ", "", "").is_identifiable());
        assert!(input("VIN1", "", "", "").is_identifiable());
        assert!(!input("", "", "MAN", "TGX").is_identifiable());
    }
}
