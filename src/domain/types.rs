// ==========================================
// 工单流转追踪系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工单状态 (Work Order Status)
// ==========================================
// 流转: OPEN → IN_PROGRESS → FINISHED
//       任意非 FINISHED 状态 → CANCELLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    Open,       // 已创建，未开工
    InProgress, // 生产中
    Finished,   // 已完工
    Cancelled,  // 已报废/取消
}

impl WorkOrderStatus {
    /// 从数据库字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OPEN" => Some(WorkOrderStatus::Open),
            "IN_PROGRESS" => Some(WorkOrderStatus::InProgress),
            "FINISHED" => Some(WorkOrderStatus::Finished),
            "CANCELLED" => Some(WorkOrderStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Open => "OPEN",
            WorkOrderStatus::InProgress => "IN_PROGRESS",
            WorkOrderStatus::Finished => "FINISHED",
            WorkOrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// 是否为终态（不可再推进）
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Finished | WorkOrderStatus::Cancelled)
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// WIP 状态 (WIP Status)
// ==========================================
// ACTIVE ⇄ HOLD 由返工切换；FINISHED / SCRAPPED 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WipStatus {
    Active,   // 正常流转
    Hold,     // 返工挂起
    Finished, // 已走完路线
    Scrapped, // 已报废
}

impl WipStatus {
    /// 从数据库字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => Some(WipStatus::Active),
            "HOLD" => Some(WipStatus::Hold),
            "FINISHED" => Some(WipStatus::Finished),
            "SCRAPPED" => Some(WipStatus::Scrapped),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WipStatus::Active => "ACTIVE",
            WipStatus::Hold => "HOLD",
            WipStatus::Finished => "FINISHED",
            WipStatus::Scrapped => "SCRAPPED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WipStatus::Finished | WipStatus::Scrapped)
    }
}

impl fmt::Display for WipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 扫码事件类型 (Scan Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanType {
    Entry, // 登记成功
    Error, // 错站/重复登记/报废
}

impl ScanType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ENTRY" => Some(ScanType::Entry),
            "ERROR" => Some(ScanType::Error),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScanType::Entry => "ENTRY",
            ScanType::Error => "ERROR",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
