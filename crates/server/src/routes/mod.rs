//! HTTP routes.

use std::time::Duration;

use axum::{
    Json, Router,
    http::{
        HeaderName, Method,
        header::{CONTENT_TYPE, ETAG},
    },
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub mod favicon;
pub mod links;
pub mod storage;

/// Identity header set by the authenticating proxy in front of the service.
pub const AUTH_EMAIL_HEADER: HeaderName = HeaderName::from_static("x-auth-email");

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTH_EMAIL_HEADER])
        .expose_headers([ETAG])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/favicon", post(favicon::resolve_favicon))
        .route("/storage/*key", get(storage::serve_blob))
        .route("/api/links", get(links::list_links).post(links::create_link))
        .route("/api/links/:id", put(links::update_link).delete(links::delete_link))
        .route("/api/categories", get(links::list_categories))
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_healthz() {
        let Json(body) = healthz().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_router_builds() {
        let state = test_support::test_state().await;
        let _router = router(state);
    }
}
