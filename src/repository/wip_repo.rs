// ==========================================
// 工单流转追踪系统 - WIP 仓储
// ==========================================
// 职责: 维护每个工单唯一的在制记录（当前工序指针 + 生命周期状态）
// 并发: 指针/状态更新带 revision 乐观锁
// ==========================================

use crate::domain::types::WipStatus;
use crate::domain::wip::WipItem;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{now_ts, parse_enum, parse_ts};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT wip_item_id, work_order_id, current_step_id, status, created_at, route_id, revision
    FROM wip_item
"#;

// ==========================================
// WipRepository - WIP 仓储
// ==========================================
pub struct WipRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WipRepository {
    /// 创建新的 WIP 仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询工单的 WIP
    pub fn find_by_work_order(&self, work_order_id: i64) -> RepositoryResult<Option<WipItem>> {
        let conn = self.get_conn()?;
        Self::find_by_work_order_tx(&conn, work_order_id)
    }

    pub fn find_by_work_order_tx(conn: &Connection, work_order_id: i64) -> RepositoryResult<Option<WipItem>> {
        let sql = format!("{} WHERE work_order_id = ?1", SELECT_COLUMNS);
        let wip = conn
            .query_row(&sql, params![work_order_id], map_row)
            .optional()?;
        Ok(wip)
    }

    /// 按ID查询 WIP
    pub fn find_by_id(&self, wip_item_id: i64) -> RepositoryResult<Option<WipItem>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE wip_item_id = ?1", SELECT_COLUMNS);
        let wip = conn
            .query_row(&sql, params![wip_item_id], map_row)
            .optional()?;
        Ok(wip)
    }

    // ==========================================
    // 写入操作（仅事务内）
    // ==========================================

    /// 创建 WIP（ACTIVE，指向首道工序，冻结路线）
    pub fn insert_tx(
        tx: &Transaction,
        work_order_id: i64,
        first_step_id: i64,
        route_id: i64,
    ) -> RepositoryResult<WipItem> {
        let created_at = now_ts();
        tx.execute(
            r#"
            INSERT INTO wip_item (work_order_id, current_step_id, status, created_at, route_id, revision)
            VALUES (?1, ?2, ?3, ?4, ?5, 0)
            "#,
            params![
                work_order_id,
                first_step_id,
                WipStatus::Active.to_db_str(),
                created_at,
                route_id
            ],
        )?;

        let sql = format!("{} WHERE wip_item_id = ?1", SELECT_COLUMNS);
        let wip = tx.query_row(&sql, params![tx.last_insert_rowid()], map_row)?;
        Ok(wip)
    }

    /// 推进当前工序指针并设置状态（乐观锁）
    ///
    /// # 返回
    /// - Ok(new_revision)
    pub fn advance_tx(
        tx: &Transaction,
        wip: &WipItem,
        current_step_id: i64,
        status: WipStatus,
    ) -> RepositoryResult<i64> {
        let rows = tx.execute(
            r#"
            UPDATE wip_item
            SET current_step_id = ?1, status = ?2, revision = revision + 1
            WHERE wip_item_id = ?3 AND revision = ?4
            "#,
            params![current_step_id, status.to_db_str(), wip.wip_item_id, wip.revision],
        )?;

        if rows == 0 {
            return Err(revision_mismatch(tx, wip));
        }
        Ok(wip.revision + 1)
    }

    /// 仅更新状态（乐观锁）
    pub fn update_status_tx(tx: &Transaction, wip: &WipItem, status: WipStatus) -> RepositoryResult<i64> {
        Self::advance_tx(tx, wip, wip.current_step_id, status)
    }
}

/// 判断是记录不存在还是 revision 冲突
fn revision_mismatch(conn: &Connection, wip: &WipItem) -> RepositoryError {
    let actual = conn
        .query_row(
            "SELECT revision FROM wip_item WHERE wip_item_id = ?1",
            params![wip.wip_item_id],
            |row| row.get::<_, i64>(0),
        )
        .optional();

    match actual {
        Ok(Some(actual)) => RepositoryError::OptimisticLockFailure {
            entity: "WipItem".to_string(),
            id: wip.wip_item_id,
            expected: wip.revision,
            actual,
        },
        Ok(None) => RepositoryError::NotFound {
            entity: "WipItem".to_string(),
            id: wip.wip_item_id.to_string(),
        },
        Err(e) => e.into(),
    }
}

fn map_row(row: &Row) -> rusqlite::Result<WipItem> {
    Ok(WipItem {
        wip_item_id: row.get(0)?,
        work_order_id: row.get(1)?,
        current_step_id: row.get(2)?,
        status: parse_enum(row, 3, WipStatus::from_str)?,
        created_at: parse_ts(row, 4)?,
        route_id: row.get(5)?,
        revision: row.get(6)?,
    })
}
