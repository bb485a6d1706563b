// ==========================================
// 工单流转追踪系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户可读的拒绝原因
// 约定: 所有拒绝都携带可读原因
// ==========================================

use crate::engine::RoutingRejection;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 操作员或设备无效
    #[error("身份校验失败: {0}")]
    Unauthorized(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// WIP 状态不符 / 错站 / 重复登记 / 终态工单 / 数量超限
    #[error("状态冲突: {0}")]
    StateConflict(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("乐观锁冲突: {0}")]
    OptimisticLockFailure(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// ErrorKind - 拒绝分类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// 必填字段为空/为零，未做任何查询
    Validation,
    /// 用户/设备/工单/产品/路线缺失或停用
    NotFound,
    /// 状态不允许本次操作
    StateConflict,
    Internal,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidInput(_) => ErrorKind::Validation,
            ApiError::Unauthorized(_) | ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::StateConflict(_) | ApiError::OptimisticLockFailure(_) => ErrorKind::StateConflict,
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_) => ErrorKind::Internal,
        }
    }

    /// 稳定的错误码（供调用方分支判断）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::StateConflict(_) => "STATE_CONFLICT",
            ApiError::OptimisticLockFailure(_) => "OPTIMISTIC_LOCK_FAILURE",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::DatabaseTransactionError(_) => "DATABASE_TRANSACTION_ERROR",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// 不带分类前缀的原因文本
    pub fn reason(&self) -> String {
        match self {
            ApiError::InvalidInput(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::StateConflict(msg)
            | ApiError::OptimisticLockFailure(msg)
            | ApiError::DatabaseError(msg)
            | ApiError::DatabaseConnectionError(msg)
            | ApiError::DatabaseTransactionError(msg)
            | ApiError::InternalError(msg) => msg.clone(),
            ApiError::Other(err) => err.to_string(),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                entity,
                id,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure(format!(
                "{}(id={})已被其他请求修改（期望revision={}，实际revision={}）",
                entity, id, expected, actual
            )),
            // 唯一约束: 并发下的重复建单/重复登记
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::StateConflict(format!("记录已存在: {}", msg))
            }

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从引擎拒绝原因转换
// ==========================================
impl From<RoutingRejection> for ApiError {
    fn from(rejection: RoutingRejection) -> Self {
        match rejection {
            RoutingRejection::EmptyRoute => ApiError::NotFound(rejection.to_string()),
            _ => ApiError::StateConflict(rejection.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        RepositoryError::from(err).into()
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_projection() {
        assert_eq!(ApiError::InvalidInput("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(ApiError::Unauthorized("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(ApiError::StateConflict("x".into()).kind(), ErrorKind::StateConflict);
        assert_eq!(ApiError::DatabaseError("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_repository_conflicts_become_state_conflicts() {
        let err: ApiError = RepositoryError::OptimisticLockFailure {
            entity: "WipItem".to_string(),
            id: 1,
            expected: 0,
            actual: 1,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::StateConflict);

        let err: ApiError = RepositoryError::UniqueConstraintViolation("UNIQUE".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::StateConflict);

        let err: ApiError = RepositoryError::NotFound {
            entity: "WorkOrder".to_string(),
            id: "7".to_string(),
        }
        .into();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_routing_rejection_mapping() {
        let err: ApiError = RoutingRejection::AlreadyFinalStep { current_step_id: 3 }.into();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert_eq!(err.reason(), "工单已处于末道工序");

        let err: ApiError = RoutingRejection::EmptyRoute.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
