// ==========================================
// 工单流转追踪系统 - 主数据实体
// ==========================================
// 说明: 主数据（站点/用户/设备/产品）由外部维护，
//       本系统只读取（测试与初始化脚本除外）
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 站点（扫码位置）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: i64,
    pub name: String,
    pub active: bool,
}

/// 操作员
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub active: bool,
}

/// 扫码设备
///
/// 每台设备固定在一个站点，并绑定到一个操作员
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: i64,
    pub device_uid: String,
    pub location_id: i64,
    /// 绑定的操作员（未绑定时为 None）
    pub user_id: Option<i64>,
    pub name: Option<String>,
    pub active: bool,
}

impl Device {
    /// 设备是否绑定到指定操作员
    pub fn is_bound_to(&self, user_id: i64) -> bool {
        self.user_id == Some(user_id)
    }
}

/// 产品子族（决定产品走哪条工艺路线）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfamily {
    pub subfamily_id: i64,
    pub name: String,
    pub active: bool,
    /// 当前指定的工艺路线
    pub active_route_id: Option<i64>,
}

/// 产品（零件号）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub subfamily_id: i64,
    pub part_number: String,
    pub active: bool,
}

impl Product {
    /// 零件号比对（忽略大小写与首尾空白）
    pub fn matches_part_number(&self, part_number: &str) -> bool {
        self.part_number.trim().to_lowercase() == part_number.trim().to_lowercase()
    }
}

/// 未登记零件（扫到但产品库中不存在）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnregisteredPart {
    pub part_id: i64,
    pub part_number: String,
    pub creation_datetime: NaiveDateTime,
    pub active: bool,
}
