// ==========================================
// 工单流转追踪系统 - 扫码 API
// ==========================================
// 职责: 工单上下文预览、登记扫码、报废、返工，以及零件/站点/履历查询
// 并发: 所有写操作在同一个 BEGIN IMMEDIATE 事务内完成，
//       WIP/工单更新另带 revision 校验；预览只读，不开事务
// 审计: 错站/重复登记被拒绝时，先回滚业务事务，再单独追加 ERROR 扫码事件
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{Actor, ScanOperationValidator};
use crate::domain::types::ScanType;
use crate::engine::{AutoProvisioningPolicy, RoutingRejection};
use crate::repository::{
    CatalogRepository, RepositoryError, StepLedgerRepository, WipRepository, WorkOrderRepository,
};

mod context;
mod lookup;
mod register;
mod rework;
mod scrap;
pub mod types;

pub use lookup::MSG_PART_NOT_REGISTERED;
pub use register::{
    MSG_PART_MISMATCH, MSG_PRODUCT_INACTIVE, MSG_PRODUCT_NOT_FOUND_FOR_CREATE,
    MSG_PROVISIONING_NOT_ALLOWED, MSG_REGISTERED,
};
pub use rework::{MSG_REWORK_CLOSED_ORDER, MSG_REWORK_CLOSED_WIP, MSG_REWORK_HOLD, MSG_REWORK_RELEASED};
pub use scrap::{MSG_SCRAPPED, MSG_SCRAP_FINISHED};
pub use types::*;

pub use crate::api::validator::MSG_INVALID_DEVICE;
pub use crate::engine::routing_core::MSG_WIP_ON_REWORK;

// ==========================================
// 提示信息
// ==========================================
pub const MSG_WORK_ORDER_NOT_FOUND: &str = "工单不存在";
pub const MSG_NO_ACTIVE_ROUTE: &str = "子族未指定工艺路线";
pub const MSG_ROUTE_HAS_NO_STEPS: &str = "工艺路线未配置工序";
pub const MSG_WIP_NOT_ACTIVE: &str = "WIP 未处于激活状态";
pub const MSG_WIP_NOT_FOUND: &str = "WIP 不存在";
pub const MSG_WORK_ORDER_CANCELLED: &str = "工单已取消";
pub const MSG_WORK_ORDER_FINISHED: &str = "工单已完工";
pub const MSG_WRONG_LOCATION: &str = "设备不在当前工序站点";
pub const MSG_STEP_ALREADY_REGISTERED: &str = "该工序已登记";

// ==========================================
// Rejection - 写操作拒绝（可附带审计事件）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AuditEntry {
    wip_item_id: i64,
    route_step_id: i64,
}

#[derive(Debug)]
struct Rejection {
    error: ApiError,
    audit: Option<AuditEntry>,
}

impl Rejection {
    fn audited(error: ApiError, audit: Option<AuditEntry>) -> Self {
        Self { error, audit }
    }
}

impl From<ApiError> for Rejection {
    fn from(error: ApiError) -> Self {
        Self { error, audit: None }
    }
}

impl From<RepositoryError> for Rejection {
    fn from(err: RepositoryError) -> Self {
        ApiError::from(err).into()
    }
}

impl From<RoutingRejection> for Rejection {
    fn from(rejection: RoutingRejection) -> Self {
        ApiError::from(rejection).into()
    }
}

// ==========================================
// ScannerApi - 扫码 API
// ==========================================

/// 扫码API
///
/// 职责：
/// 1. 预览工单下一步（只读）
/// 2. 登记扫码（推进 WIP，追加工序台账）
/// 3. 报废 / 返工挂起与放行
/// 4. 零件查询、站点列表、工单履历
pub struct ScannerApi {
    conn: Arc<Mutex<Connection>>,
    catalog_repo: Arc<CatalogRepository>,
    work_order_repo: Arc<WorkOrderRepository>,
    wip_repo: Arc<WipRepository>,
    ledger_repo: Arc<StepLedgerRepository>,
    provisioning: Arc<dyn AutoProvisioningPolicy>,
}

impl ScannerApi {
    /// 创建新的ScannerApi实例
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        catalog_repo: Arc<CatalogRepository>,
        work_order_repo: Arc<WorkOrderRepository>,
        wip_repo: Arc<WipRepository>,
        ledger_repo: Arc<StepLedgerRepository>,
        provisioning: Arc<dyn AutoProvisioningPolicy>,
    ) -> Self {
        Self {
            conn,
            catalog_repo,
            work_order_repo,
            wip_repo,
            ledger_repo,
            provisioning,
        }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> ApiResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()).into())
    }

    /// 在 IMMEDIATE 事务内执行写操作
    ///
    /// - Ok: 提交
    /// - Err: 回滚；若拒绝附带审计事件，另开事务追加 ERROR 扫码事件
    fn run_write<T>(
        &self,
        operation: &'static str,
        wo_number: &str,
        f: impl FnOnce(&Transaction) -> Result<T, Rejection>,
    ) -> ApiResult<T> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;
                Ok(value)
            }
            Err(rejection) => {
                if let Err(e) = tx.rollback() {
                    tracing::error!(operation, wo_number, error = %e, "事务回滚失败");
                }
                if let Some(audit) = rejection.audit {
                    if let Err(e) = append_error_event(&mut conn, audit) {
                        tracing::error!(operation, wo_number, error = %e, "ERROR 扫码事件写入失败");
                    }
                }
                tracing::warn!(
                    operation,
                    wo_number,
                    code = rejection.error.code(),
                    reason = %rejection.error.reason(),
                    "操作被拒绝"
                );
                Err(rejection.error)
            }
        }
    }
}

/// 独立事务追加 ERROR 扫码事件
fn append_error_event(conn: &mut Connection, audit: AuditEntry) -> ApiResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    StepLedgerRepository::append_scan_event_tx(&tx, audit.wip_item_id, audit.route_step_id, ScanType::Error)?;
    tx.commit()?;
    tracing::warn!(
        wip_item_id = audit.wip_item_id,
        route_step_id = audit.route_step_id,
        "已记录 ERROR 扫码事件"
    );
    Ok(())
}

/// 非空原因（去除首尾空白）
fn normalize_reason(reason: Option<&str>) -> Option<String> {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}
