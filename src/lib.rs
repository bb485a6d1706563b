// ==========================================
// 工单流转追踪系统 - 核心库
// ==========================================
// 技术栈: axum + Rust + SQLite
// 系统定位: 扫码驱动的在制品工序流转与审计
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 流转规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配与 HTTP
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ScanType, WipStatus, WorkOrderStatus};

// 领域实体
pub use domain::{RouteStep, WipItem, WipStepExecution, WorkOrder};

// 引擎
pub use engine::{AutoProvisioningPolicy, RoutingCore};

// API
pub use api::{ApiError, ApiResult, ScannerApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工单流转追踪系统";
