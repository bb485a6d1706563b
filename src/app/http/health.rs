use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::SharedState;

pub(super) fn router() -> Router<SharedState> {
    Router::new().route("/health", get(health))
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
