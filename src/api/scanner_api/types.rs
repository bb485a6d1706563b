// ==========================================
// 工单流转追踪系统 - 扫码 API 请求/响应类型
// ==========================================
// JSON 字段使用 camelCase
// ==========================================

use crate::domain::types::{WipStatus, WorkOrderStatus};
use crate::domain::wip::{ScanEvent, WipItem, WipReworkLog, WipStepExecution};
use crate::domain::work_order::WorkOrder;
use serde::{Deserialize, Serialize};

// ==========================================
// 工单上下文预览
// ==========================================

/// 工单上下文（下一步去哪、能带多少数量、能否推进）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderContextResponse {
    pub found: bool,
    pub message: Option<String>,
    pub work_order_id: Option<i64>,
    pub work_order_status: Option<WorkOrderStatus>,
    pub product_id: Option<i64>,
    pub part_number: Option<String>,
    pub route_id: Option<i64>,
    pub current_step_id: Option<i64>,
    pub next_step_id: Option<i64>,
    pub next_step_number: Option<u32>,
    pub next_step_location_id: Option<i64>,
    pub next_step_location_name: Option<String>,
    pub previous_qty: Option<u32>,
    pub max_qty: Option<u32>,
    pub is_first_step: bool,
    pub can_proceed: bool,
}

impl WorkOrderContextResponse {
    /// 工单不存在
    pub fn not_found(message: &str) -> Self {
        Self {
            found: false,
            message: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// 已找到工单，但无法给出下一步
    pub fn blocked(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self.can_proceed = false;
        self
    }
}

// ==========================================
// 登记扫码
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterScanRequest {
    pub work_order_number: String,
    pub part_number: String,
    pub quantity: u32,
    pub user_id: i64,
    pub device_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterScanResponse {
    pub message: String,
    pub work_order_id: i64,
    pub wip_item_id: i64,
    pub route_step_id: i64,
    pub is_final_step: bool,
}

// ==========================================
// 报废
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapRequest {
    pub work_order_number: String,
    pub user_id: i64,
    pub device_id: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapResponse {
    pub message: String,
    pub work_order_id: i64,
    pub wip_item_id: Option<i64>,
}

// ==========================================
// 返工
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReworkRequest {
    pub work_order_number: String,
    pub quantity: u32,
    pub user_id: i64,
    pub device_id: i64,
    #[serde(default)]
    pub reason: Option<String>,
    /// true: 返工完成放行；false: 挂起
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReworkResponse {
    pub message: String,
    pub work_order_id: i64,
    pub wip_item_id: i64,
    pub wip_status: WipStatus,
}

// ==========================================
// 零件查询 / 站点 / 履历
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartLookupResponse {
    pub found: bool,
    pub message: Option<String>,
    pub part_number: String,
    pub product_id: Option<i64>,
    pub subfamily_id: Option<i64>,
    pub subfamily_name: Option<String>,
    pub active_route_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    pub id: i64,
    pub name: String,
}

/// 工单履历（工序台账只读视图）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderHistoryResponse {
    pub work_order: WorkOrder,
    pub wip_item: Option<WipItem>,
    pub executions: Vec<WipStepExecution>,
    pub scan_events: Vec<ScanEvent>,
    pub rework_logs: Vec<WipReworkLog>,
}
