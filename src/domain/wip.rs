// ==========================================
// 工单流转追踪系统 - WIP 与工序台账实体
// ==========================================
// WipItem: 工单的唯一在制记录（首次登记成功时创建，永不删除）
// WipStepExecution / ScanEvent / WipReworkLog: 只追加
// ==========================================

use crate::domain::types::{ScanType, WipStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 在制品记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WipItem {
    pub wip_item_id: i64,
    pub work_order_id: i64,
    /// 当前所在工序
    pub current_step_id: i64,
    pub status: WipStatus,
    pub created_at: NaiveDateTime,
    /// 创建时冻结的路线（后续路线切换不影响已开工的 WIP）
    pub route_id: i64,
    /// 乐观锁版本号
    pub revision: i64,
}

/// 工序执行记录（每个 WIP 每道工序最多一条）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WipStepExecution {
    pub execution_id: i64,
    pub wip_item_id: i64,
    pub route_step_id: i64,
    pub user_id: i64,
    pub device_id: i64,
    pub location_id: i64,
    pub created_at: NaiveDateTime,
    /// 带入该工序的数量（下一道工序的数量上限）
    pub qty_in: u32,
    pub qty_scrap: u32,
}

/// 待写入的工序执行记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStepExecution {
    pub wip_item_id: i64,
    pub route_step_id: i64,
    pub user_id: i64,
    pub device_id: i64,
    pub location_id: i64,
    pub qty_in: u32,
}

/// 扫码审计事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    pub scan_event_id: i64,
    pub wip_item_id: i64,
    pub route_step_id: i64,
    pub scan_type: ScanType,
    pub ts: NaiveDateTime,
}

/// 返工记录（每次挂起/放行各一条）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WipReworkLog {
    pub rework_log_id: i64,
    pub wip_item_id: i64,
    pub location_id: i64,
    pub user_id: i64,
    pub device_id: i64,
    pub qty: u32,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

/// 待写入的返工记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReworkLog {
    pub wip_item_id: i64,
    pub location_id: i64,
    pub user_id: i64,
    pub device_id: i64,
    pub qty: u32,
    pub reason: Option<String>,
}
