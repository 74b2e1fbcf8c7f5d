use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod rpc;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new().nest("/orders", orders::router())
}

/// Every route the service exposes, with state bound. Middleware is layered on in `main`.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .nest("/rpc", rpc::router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
