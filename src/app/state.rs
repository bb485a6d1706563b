// ==========================================
// 工单流转追踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::ScannerApi;
use crate::config::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::{AutoProvisioningPolicy, ConfiguredProvisioningPolicy};
use crate::repository::{
    CatalogRepository, RouteCatalogRepository, StepLedgerRepository, WipRepository,
    WorkOrderRepository,
};

/// 应用状态
///
/// 所有仓储共享同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 扫码API
    pub scanner_api: Arc<ScannerApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 主数据仓储（站点/设备/产品维护）
    pub catalog_repo: Arc<CatalogRepository>,

    /// 工艺路线仓储（路线维护）
    pub route_catalog_repo: Arc<RouteCatalogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并初始化 schema
    /// 2. 初始化所有Repository
    /// 3. 创建API实例（自动建单策略读取 config_kv）
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库 schema 初始化失败: {}", e))?;

        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// 基于已初始化的连接创建（测试复用）
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("配置管理器初始化失败: {}", e))?,
        );
        let provisioning: Arc<dyn AutoProvisioningPolicy> =
            Arc::new(ConfiguredProvisioningPolicy::new());

        Ok(Self::with_policy(db_path, conn, config_manager, provisioning))
    }

    /// 指定自动建单策略创建
    pub fn with_policy(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        config_manager: Arc<ConfigManager>,
        provisioning: Arc<dyn AutoProvisioningPolicy>,
    ) -> Self {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let catalog_repo = Arc::new(CatalogRepository::new(conn.clone()));
        let route_catalog_repo = Arc::new(RouteCatalogRepository::new(conn.clone()));
        let work_order_repo = Arc::new(WorkOrderRepository::new(conn.clone()));
        let wip_repo = Arc::new(WipRepository::new(conn.clone()));
        let ledger_repo = Arc::new(StepLedgerRepository::new(conn.clone()));

        // ==========================================
        // 初始化API层
        // ==========================================
        let scanner_api = Arc::new(ScannerApi::new(
            conn,
            catalog_repo.clone(),
            work_order_repo,
            wip_repo,
            ledger_repo,
            provisioning,
        ));

        tracing::info!("AppState初始化完成");

        Self {
            db_path,
            scanner_api,
            config_manager,
            catalog_repo,
            route_catalog_repo,
        }
    }
}
