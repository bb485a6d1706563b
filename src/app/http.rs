// ==========================================
// 工单流转追踪系统 - HTTP 传输层
// ==========================================
// 职责: axum 路由，将 JSON 请求转交 ScannerApi
// 约定: 核心调用是阻塞的（SQLite），统一放到 spawn_blocking
// ==========================================

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app::state::AppState;

mod common;
mod health;
mod scanner;

pub use common::ErrorResponse;

/// 共享状态
pub type SharedState = Arc<AppState>;

/// 构建完整路由（含中间件）
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .merge(health::router())
        .route("/api/locations", get(scanner::list_locations))
        .nest("/api/scanner", scanner_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn scanner_routes() -> Router<SharedState> {
    Router::new()
        .route("/part/{part_number}", get(scanner::lookup_part))
        .route("/work-orders/{wo_number}/context", get(scanner::get_context))
        .route("/work-orders/{wo_number}/history", get(scanner::get_history))
        .route("/register", post(scanner::register))
        .route("/scrap", post(scanner::scrap))
        .route("/rework", post(scanner::rework))
}
