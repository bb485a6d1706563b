// ==========================================
// 工单流转追踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、状态类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod route;
pub mod types;
pub mod wip;
pub mod work_order;

// 重导出核心类型
pub use catalog::{Device, Location, Product, Subfamily, UnregisteredPart, User};
pub use route::{NewRouteStep, Route, RouteStep};
pub use types::{ScanType, WipStatus, WorkOrderStatus};
pub use wip::{
    NewReworkLog, NewStepExecution, ScanEvent, WipItem, WipReworkLog, WipStepExecution,
};
pub use work_order::WorkOrder;
