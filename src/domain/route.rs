// ==========================================
// 工单流转追踪系统 - 工艺路线实体
// ==========================================
// 路线 = 按工序号升序排列的工序序列，每道工序绑定一个站点
// 下一道工序通过 next_step_id 显式指向（写入路线时计算），
// 不依赖工序号连续
// ==========================================

use serde::{Deserialize, Serialize};

/// 工艺路线
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: i64,
    pub subfamily_id: i64,
    pub name: String,
    pub version: String,
    pub active: bool,
}

/// 路线工序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStep {
    pub route_step_id: i64,
    pub route_id: i64,
    /// 工序号（定义全序）
    pub step_number: u32,
    /// 执行该工序所需的站点
    pub location_id: i64,
    /// 下一道工序（末道工序为 None）
    pub next_step_id: Option<i64>,
}

impl RouteStep {
    /// 是否为末道工序
    pub fn is_final(&self) -> bool {
        self.next_step_id.is_none()
    }
}

/// 新建路线时的工序定义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewRouteStep {
    pub step_number: u32,
    pub location_id: i64,
}
