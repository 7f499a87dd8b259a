//! Link directory endpoints.
//!
//! Reads are public. Mutations require the `X-Auth-Email` identity to be
//! an admin; the identity is checked before the request body is parsed.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use navhub_core::store::{CategoryCount, LinkPatch, NewLink};
use navhub_core::{Error, Link};

use super::AUTH_EMAIL_HEADER;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let identity = headers.get(&AUTH_EMAIL_HEADER).and_then(|v| v.to_str().ok());
    state.policy.authorize(identity)?;
    Ok(())
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| Error::InvalidInput(format!("invalid body: {e}")).into())
}

pub async fn list_links(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Result<Json<Vec<Link>>, ApiError> {
    Ok(Json(state.db.list_links(query.q.as_deref()).await?))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>, ApiError> {
    Ok(Json(state.db.list_categories().await?))
}

pub async fn create_link(
    State(state): State<AppState>, headers: HeaderMap, body: Bytes,
) -> Result<(StatusCode, Json<Link>), ApiError> {
    require_admin(&state, &headers)?;
    let new: NewLink = parse_body(&body)?;
    let link = state.db.create_link(new).await?;
    tracing::info!(id = link.id, url = %link.url, "link created");
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn update_link(
    State(state): State<AppState>, Path(id): Path<i64>, headers: HeaderMap, body: Bytes,
) -> Result<Json<Link>, ApiError> {
    require_admin(&state, &headers)?;
    let patch: LinkPatch = parse_body(&body)?;
    let link = state.db.update_link(id, patch).await?;
    tracing::info!(id, "link updated");
    Ok(Json(link))
}

pub async fn delete_link(
    State(state): State<AppState>, Path(id): Path<i64>, headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    require_admin(&state, &headers)?;
    state.db.delete_link(id).await?;
    tracing::info!(id, "link deleted");
    Ok(StatusCode::NO_CONTENT)
}
