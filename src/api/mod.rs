// ==========================================
// 工单流转追踪系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 HTTP 层调用
// ==========================================

pub mod error;
pub mod scanner_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ErrorKind};
pub use scanner_api::ScannerApi;
pub use validator::{Actor, ScanOperationValidator};
