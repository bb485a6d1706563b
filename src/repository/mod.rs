// ==========================================
// 工单流转追踪系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: 每个读写都有 `*_tx` 关联函数版本（接收 &Connection /
//       &Transaction），供 API 层在同一事务内组合调用
// ==========================================

pub mod catalog_repo;
pub mod error;
pub mod route_catalog_repo;
pub mod step_ledger_repo;
pub mod wip_repo;
pub mod work_order_repo;

// 重导出核心仓储
pub use catalog_repo::CatalogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use route_catalog_repo::RouteCatalogRepository;
pub use step_ledger_repo::StepLedgerRepository;
pub use wip_repo::WipRepository;
pub use work_order_repo::WorkOrderRepository;

use chrono::NaiveDateTime;

/// 时间戳存储格式（毫秒精度，保证同一秒内的记录可排序）
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 当前 UTC 时间的存储字符串
pub(crate) fn now_ts() -> String {
    chrono::Utc::now().naive_utc().format(TS_FORMAT).to_string()
}

/// 读取时间戳列（兼容无毫秒的历史数据）
pub(crate) fn parse_ts(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// 读取状态列并解析为枚举
pub(crate) fn parse_enum<T>(
    row: &rusqlite::Row,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("未知的状态值: {}", raw).into(),
        )
    })
}
