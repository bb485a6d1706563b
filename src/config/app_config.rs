// ==========================================
// 工单流转追踪系统 - 进程配置
// ==========================================
// 来源: 环境变量（未设置时使用默认值）
// - TRACKII_DB_PATH: 数据库文件路径
// - TRACKII_BIND_ADDR: HTTP 监听地址
// ==========================================

use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TRACKII_DB_PATH";
pub const ENV_BIND_ADDR: &str = "TRACKII_BIND_ADDR";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5080";

/// 进程级配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// 从环境变量加载
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_raw = non_empty_env(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("{}={} 无法解析: {}", ENV_BIND_ADDR, bind_raw, e))?;

        Ok(Self {
            db_path: get_default_db_path(),
            bind_addr,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用 TRACKII_DB_PATH；否则放在用户数据目录下
pub fn get_default_db_path() -> String {
    if let Some(path) = non_empty_env(ENV_DB_PATH) {
        return path;
    }

    let mut path = PathBuf::from("./trackii.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("trackii");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "无法创建数据目录，使用当前目录");
        } else {
            path = dir.join("trackii.db");
        }
    }

    path.to_string_lossy().to_string()
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
