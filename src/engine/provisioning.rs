// ==========================================
// 工单流转追踪系统 - 自动建单策略
// ==========================================
// 职责: 判断设备所在站点是否允许在首次扫码时隐式创建工单
// 说明: 站点清单来自 config_kv，不在代码中写死
// 约定: 在调用方的事务连接上读取，不另行加锁
// ==========================================

use crate::config::ConfigManager;
use crate::domain::catalog::{Device, Location};
use rusqlite::Connection;
use std::error::Error;

// ==========================================
// Trait: AutoProvisioningPolicy
// ==========================================
pub trait AutoProvisioningPolicy: Send + Sync {
    /// 设备所在站点是否允许自动建单
    ///
    /// # 参数
    /// - conn: 调用方持有的连接（通常是登记事务）
    /// - device: 已校验的设备
    /// - location: 设备所在站点（站点记录缺失时为 None）
    fn is_auto_provisioning_location(
        &self,
        conn: &Connection,
        device: &Device,
        location: Option<&Location>,
    ) -> Result<bool, Box<dyn Error + Send + Sync>>;
}

// ==========================================
// ConfiguredProvisioningPolicy - 基于配置表的策略
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfiguredProvisioningPolicy;

impl ConfiguredProvisioningPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl AutoProvisioningPolicy for ConfiguredProvisioningPolicy {
    fn is_auto_provisioning_location(
        &self,
        conn: &Connection,
        device: &Device,
        location: Option<&Location>,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let ids = ConfigManager::auto_provision_location_ids_tx(conn)?;
        if ids.contains(&device.location_id) {
            return Ok(true);
        }

        let Some(location) = location else {
            return Ok(false);
        };
        let names = ConfigManager::auto_provision_location_names_tx(conn)?;
        let name = location.name.trim().to_lowercase();
        Ok(names.iter().any(|n| *n == name))
    }
}
