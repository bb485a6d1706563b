// ==========================================
// 工单流转追踪系统 - 配置层
// ==========================================
// 职责: 现场配置（config_kv 表）与进程配置（环境变量）
// ==========================================

pub mod app_config;
pub mod config_manager;

// 重导出核心配置管理器
pub use app_config::{get_default_db_path, AppConfig};
pub use config_manager::{config_keys, ConfigManager};
