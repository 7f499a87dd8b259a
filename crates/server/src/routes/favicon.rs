//! `POST /api/favicon`.

use axum::{Json, body::Bytes, extract::State};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaviconResponse {
    pub favicon_url: String,
}

/// The `url` string from a request body, if it has a non-empty one.
///
/// Bodies that are not JSON objects count as missing.
fn requested_url(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let url = value.get("url")?.as_str()?;
    (!url.trim().is_empty()).then(|| url.to_string())
}

pub async fn resolve_favicon(State(state): State<AppState>, body: Bytes) -> Result<Json<FaviconResponse>, ApiError> {
    let url = requested_url(&body).ok_or(ApiError::MissingUrl)?;

    let resolved = state.resolver.resolve(&url).await?;
    tracing::info!(url = %url, source = ?resolved.source, favicon = %resolved.favicon_url, "favicon resolved");

    Ok(Json(FaviconResponse { favicon_url: resolved.favicon_url }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{http::StatusCode, response::IntoResponse};
    use navhub_core::{RecordStore, RecordWriteMode};

    use crate::routes::test_support::{body_json, test_state};

    async fn call(state: AppState, body: &'static str) -> axum::response::Response {
        resolve_favicon(State(state), Bytes::from_static(body.as_bytes()))
            .await
            .into_response()
    }

    #[test]
    fn test_requested_url() {
        assert_eq!(requested_url(br#"{"url":"https://a.test/"}"#).as_deref(), Some("https://a.test/"));
        assert_eq!(requested_url(br#"{"url":""}"#), None);
        assert_eq!(requested_url(br#"{"url":"  "}"#), None);
        assert_eq!(requested_url(br#"{"url":42}"#), None);
        assert_eq!(requested_url(br#"{"link":"https://a.test/"}"#), None);
        assert_eq!(requested_url(br#"["https://a.test/"]"#), None);
        assert_eq!(requested_url(b"url=https://a.test/"), None);
        assert_eq!(requested_url(b""), None);
    }

    #[tokio::test]
    async fn test_missing_url_is_400() {
        for body in [r#"{}"#, r#"{"url":""}"#, r#"{"url":null}"#, "not json"] {
            let response = call(test_state().await, body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(body_json(response).await["error"], "missing url");
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_400() {
        let response = call(test_state().await, r#"{"url":"not a url"}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("invalid url: "));
    }

    #[tokio::test]
    async fn test_cached_icon_is_returned() {
        let state = test_state().await;
        state
            .db
            .write_icon("https://example.com/", "http://localhost:8080/storage/favicons/example.com.ico", RecordWriteMode::Upsert)
            .await
            .unwrap();

        let response = call(state, r#"{"url":"https://example.com/"}"#).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["faviconUrl"], "http://localhost:8080/storage/favicons/example.com.ico");
    }
}
