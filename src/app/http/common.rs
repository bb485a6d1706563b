use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult, ErrorKind};
use crate::api::ScannerApi;

use super::SharedState;

// ==========================================
// 公共工具：错误映射、阻塞调用
// ==========================================

/// 错误响应（返回给调用方）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 拒绝分类
    pub kind: ErrorKind,
}

/// 错误分类 → HTTP 状态码
pub(super) fn status_for(err: &ApiError) -> StatusCode {
    if matches!(err, ApiError::Unauthorized(_)) {
        return StatusCode::UNAUTHORIZED;
    }
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::StateConflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "请求处理失败");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.reason(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

/// 在阻塞线程池中调用 ScannerApi，并保留当前 span
pub(super) async fn run_blocking<T, F>(state: &SharedState, f: F) -> ApiResult<Json<T>>
where
    F: FnOnce(&ScannerApi) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let api = state.scanner_api.clone();
    let span = tracing::Span::current();

    tokio::task::spawn_blocking(move || {
        let _guard = span.enter();
        f(&api)
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("后台任务失败: {}", e)))?
    .map(Json)
}
