// ==========================================
// 工单流转追踪系统 - 应用层
// ==========================================
// 职责: 状态装配，HTTP 接入
// ==========================================

pub mod http;
pub mod state;

// 重导出
pub use http::{build_router, SharedState};
pub use state::AppState;
