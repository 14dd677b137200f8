//! JSON request/response plumbing shared by every handler.

use axum::{extract::FromRequest, Json};
use serde::Serialize;

use super::error::ApiError;

/// JSON body extractor whose rejections use the API error envelope.
///
/// A missing or wrong `Content-Type` becomes 415, malformed JSON becomes 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Success envelope: `{"ok": true, ...data}`
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

/// Wrap a payload in a success envelope
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope { ok: true, data })
}

/// Body of a bare `{"ok": true}`
#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct Items<T: Serialize> {
    pub items: Vec<T>,
}

/// Items plus the effective paging window
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_flattens_payload() {
        let Json(body) = ok(IdResponse {
            id: "abc".to_string(),
        });
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, serde_json::json!({ "ok": true, "id": "abc" }));

        let Json(body) = ok(Empty {});
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, serde_json::json!({ "ok": true }));
    }

    #[test]
    fn test_page_shape() {
        let Json(body) = ok(Page {
            items: vec![1, 2],
            limit: 50,
            offset: 0,
        });
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["items"], serde_json::json!([1, 2]));
        assert_eq!(value["limit"], 50);
    }
}
