// ==========================================
// 工单流转追踪系统 - 引擎层
// ==========================================
// 职责: 工序流转的纯决策逻辑
// 红线: 不直接访问数据库，由 API 层加载数据后调用
// ==========================================

pub mod provisioning;
pub mod routing_core;

pub use provisioning::{AutoProvisioningPolicy, ConfiguredProvisioningPolicy};
pub use routing_core::{Eligibility, RoutingCore, RoutingRejection, TargetStep};
