//! `GET /storage/*key`: serves stored blobs.
//!
//! Blobs hold bytes fetched from arbitrary sites and share the API's
//! origin, so every response forbids sniffing and runs sandboxed with no
//! script or subresource access.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_SECURITY_POLICY, CONTENT_TYPE, ETAG, IF_NONE_MATCH, X_CONTENT_TYPE_OPTIONS},
    },
    response::{IntoResponse, Response},
};

use navhub_core::{BlobStore, Error};

use crate::error::ApiError;
use crate::state::AppState;

const BLOB_CSP: &str = "default-src 'none'; sandbox";

/// True when an `If-None-Match` value matches `etag`.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .map(|candidate| candidate.trim().trim_start_matches("W/"))
        .any(|candidate| candidate == "*" || candidate == etag)
}

pub async fn serve_blob(
    State(state): State<AppState>, Path(key): Path<String>, headers: HeaderMap,
) -> Result<Response, ApiError> {
    let blob = state
        .blobs
        .get_blob(&key)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no blob at {key}")))?;

    let etag = format!("\"{}\"", blob.digest);

    let not_modified = headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| etag_matches(v, &etag));

    let header_value = |value: &str| HeaderValue::from_str(value).map_err(|e| Error::InvalidInput(e.to_string()));
    let etag_header = header_value(&etag)?;
    let cache_header = header_value(&blob.cache_control)?;

    if not_modified {
        return Ok((StatusCode::NOT_MODIFIED, [(ETAG, etag_header), (CACHE_CONTROL, cache_header)]).into_response());
    }

    let content_type = header_value(&blob.content_type)?;
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type),
            (CACHE_CONTROL, cache_header),
            (ETAG, etag_header),
            (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (CONTENT_SECURITY_POLICY, HeaderValue::from_static(BLOB_CSP)),
        ],
        Body::from(blob.bytes),
    )
        .into_response())
}
