// ==========================================
// 工单流转追踪系统 - 工单实体
// ==========================================
// 工单拥有零或一个 WIP（通过 wip_item.work_order_id 查找），
// 工单本身不持有 WIP 引用
// ==========================================

use crate::domain::types::WorkOrderStatus;
use serde::{Deserialize, Serialize};

/// 工单（一个生产批次）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub work_order_id: i64,
    /// 业务单号（唯一）
    pub wo_number: String,
    pub product_id: i64,
    pub status: WorkOrderStatus,
    /// 乐观锁版本号
    pub revision: i64,
}
