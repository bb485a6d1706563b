// ==========================================
// 工单流转追踪系统 - 配置管理器
// ==========================================
// 职责: 现场配置的查询与覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 全局作用域标识
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        Ok(Self::get_global_config_value_tx(&conn, key)?)
    }

    /// 在给定连接（或事务）上读取 global scope 的配置值
    pub fn get_global_config_value_tx(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        )
        .optional()
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> Result<HashMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    // ===== 自动建单配置 =====

    /// 允许自动建单的站点ID列表
    pub fn auto_provision_location_ids(&self) -> Result<Vec<i64>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        Ok(Self::auto_provision_location_ids_tx(&conn)?)
    }

    /// 允许自动建单的站点ID列表（事务内读取）
    ///
    /// 格式: 逗号分隔的整数，无法解析的项会被忽略并告警
    pub fn auto_provision_location_ids_tx(conn: &Connection) -> rusqlite::Result<Vec<i64>> {
        let raw = Self::get_global_config_value_tx(conn, config_keys::AUTO_PROVISION_LOCATION_IDS)?
            .unwrap_or_default();

        let ids = split_list(&raw)
            .filter_map(|item| match item.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!(
                        config_key = config_keys::AUTO_PROVISION_LOCATION_IDS,
                        item,
                        "站点ID配置格式错误，已忽略"
                    );
                    None
                }
            })
            .collect();
        Ok(ids)
    }

    /// 允许自动建单的站点名称列表（已转小写）
    pub fn auto_provision_location_names(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        Ok(Self::auto_provision_location_names_tx(&conn)?)
    }

    /// 允许自动建单的站点名称列表（事务内读取）
    pub fn auto_provision_location_names_tx(conn: &Connection) -> rusqlite::Result<Vec<String>> {
        let raw = Self::get_global_config_value_tx(conn, config_keys::AUTO_PROVISION_LOCATION_NAMES)?
            .unwrap_or_default();
        Ok(split_list(&raw).map(|s| s.to_lowercase()).collect())
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // ===== 自动建单 =====
    pub const AUTO_PROVISION_LOCATION_IDS: &str = "auto_provision.location_ids";
    pub const AUTO_PROVISION_LOCATION_NAMES: &str = "auto_provision.location_names";
}
