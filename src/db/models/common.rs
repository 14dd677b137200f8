//! Shared helpers for request DTOs: lenient number parsing, pagination and money rounding.

use serde::{de::Error as _, Deserialize, Deserializer};

/// Round a money amount to two decimals
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a number typed by a person: surrounding whitespace is ignored and a
/// decimal comma is accepted ("12,50").
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts a JSON number, a numeric string, `null` or an empty string.
///
/// Form-driven clients send quantities and prices as either numbers or
/// strings. Blank strings mean "not given"; any other text that is not a
/// finite number fails deserialization, so the request is answered with 400.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => None,
        Some(NumberOrString::Text(s)) => match parse_decimal(&s) {
            Some(n) => Some(n),
            None => return Err(D::Error::custom(format!("invalid number: {:?}", s))),
        },
        None => None,
    })
}

/// Integer flavour of [`lenient_f64`]; fractional values are truncated.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?.map(|v| v as i64))
}

/// Accepts a string or a JSON number and trims it; empty strings become `None`.
pub fn trimmed_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::Text(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(StringOrNumber::Number(n)) => Some(n.to_string()),
        None => None,
    })
}

/// Common list query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;

    /// Trimmed search term ("" when absent)
    pub fn term(&self) -> String {
        self.q.as_deref().unwrap_or("").trim().to_string()
    }

    /// Page size clamped to `1..=200`
    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(parse_decimal)
            .map(|v| v as i64)
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Non-negative row offset
    pub fn offset(&self) -> i64 {
        self.offset
            .as_deref()
            .and_then(parse_decimal)
            .map(|v| v as i64)
            .unwrap_or(0)
            .max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_f64")]
        price: Option<f64>,
        #[serde(default, deserialize_with = "lenient_i64")]
        year: Option<i64>,
        #[serde(default, deserialize_with = "trimmed_string")]
        name: Option<String>,
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(22.9881), 22.99);
        assert_eq!(round_money(0.125), 0.13);
        assert_eq!(round_money(10.0), 10.0);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("12,50"), Some(12.5));
        assert_eq!(parse_decimal(" 3 "), Some(3.0));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("NaN"), None);
    }

    #[test]
    fn test_lenient_fields() {
        let s: Sample =
            serde_json::from_str(r#"{"price": "99,99", "year": "2019", "name": "  Disc  "}"#)
                .unwrap();
        assert_eq!(s.price, Some(99.99));
        assert_eq!(s.year, Some(2019));
        assert_eq!(s.name.as_deref(), Some("Disc"));

        let s: Sample = serde_json::from_str(r#"{"price": 5, "year": null, "name": ""}"#).unwrap();
        assert_eq!(s.price, Some(5.0));
        assert_eq!(s.year, None);
        assert_eq!(s.name, None);

        let s: Sample = serde_json::from_str("{}").unwrap();
        assert!(s.price.is_none() && s.year.is_none() && s.name.is_none());

        let s: Sample = serde_json::from_str(r#"{"price": "  ", "year": ""}"#).unwrap();
        assert!(s.price.is_none() && s.year.is_none());
    }

    #[test]
    fn test_lenient_fields_reject_garbage() {
        assert!(serde_json::from_str::<Sample>(r#"{"price": "12x5"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"price": "1O0"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"year": "doi"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"price": "inf"}"#).is_err());
    }

    #[test]
    fn test_list_query_clamps() {
        let query = ListQuery {
            q: Some("  filtru ".to_string()),
            limit: Some("1000".to_string()),
            offset: Some("-5".to_string()),
        };
        assert_eq!(query.term(), "filtru");
        assert_eq!(query.limit(), 200);
        assert_eq!(query.offset(), 0);

        let query = ListQuery::default();
        assert_eq!(query.term(), "");
        assert_eq!(query.limit(), 50);
        assert_eq!(query.offset(), 0);

        let query = ListQuery {
            limit: Some("0".to_string()),
            ..Default::default()
        };
        assert_eq!(query.limit(), 1);
    }
}
