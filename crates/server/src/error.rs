//! HTTP error responses.
//!
//! Every error body is `{"error": "<message>"}`. Internal failures are
//! logged and reported without detail.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use navhub_core::Error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Favicon request without a usable `url` field.
    #[error("missing url")]
    MissingUrl,

    #[error(transparent)]
    Core(#[from] Error),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::MissingUrl => (StatusCode::BAD_REQUEST, "missing url".into()),
            ApiError::Core(err) => match err {
                Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                Error::InvalidUrl(msg) => (StatusCode::BAD_REQUEST, format!("invalid url: {msg}")),
                Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                Error::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                Error::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".into()),
                Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
                other => {
                    tracing::error!(error = %other, "request failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::MissingUrl, StatusCode::BAD_REQUEST, "missing url"),
            (ApiError::from(Error::InvalidUrl("nope".into())), StatusCode::BAD_REQUEST, "invalid url: nope"),
            (ApiError::from(Error::NotFound("link 3".into())), StatusCode::NOT_FOUND, "link 3"),
            (ApiError::from(Error::Conflict("dup".into())), StatusCode::CONFLICT, "dup"),
            (ApiError::from(Error::Unauthorized), StatusCode::UNAUTHORIZED, "unauthorized"),
            (ApiError::from(Error::Forbidden("x".into())), StatusCode::FORBIDDEN, "x"),
            (ApiError::from(Error::StoreTimeout("put_blob".into())), StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
        ];

        for (err, status, message) in cases {
            let (got_status, got_message) = err.status_and_message();
            assert_eq!(got_status, status);
            assert_eq!(got_message, message);
        }
    }
}
