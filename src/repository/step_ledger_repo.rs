// ==========================================
// 工单流转追踪系统 - 工序台账仓储
// ==========================================
// 覆盖: 工序执行记录 / 扫码审计事件 / 返工记录
// 红线: 只追加，不更新、不删除
// ==========================================

use crate::domain::types::ScanType;
use crate::domain::wip::{NewReworkLog, NewStepExecution, ScanEvent, WipReworkLog, WipStepExecution};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{now_ts, parse_enum, parse_ts};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// StepLedgerRepository - 工序台账仓储
// ==========================================
pub struct StepLedgerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StepLedgerRepository {
    /// 创建新的工序台账仓储
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
    // 工序执行记录
    // ==========================================

    /// 查询某 WIP 在某工序的执行记录
    pub fn find_execution_tx(
        conn: &Connection,
        wip_item_id: i64,
        route_step_id: i64,
    ) -> RepositoryResult<Option<WipStepExecution>> {
        let exec = conn
            .query_row(
                r#"
                SELECT execution_id, wip_item_id, route_step_id, user_id, device_id,
                       location_id, created_at, qty_in, qty_scrap
                FROM wip_step_execution
                WHERE wip_item_id = ?1 AND route_step_id = ?2
                "#,
                params![wip_item_id, route_step_id],
                map_execution,
            )
            .optional()?;
        Ok(exec)
    }

    /// 查询 WIP 的全部执行记录（按写入顺序）
    pub fn list_executions(&self, wip_item_id: i64) -> RepositoryResult<Vec<WipStepExecution>> {
        let conn = self.get_conn()?;
        Self::list_executions_tx(&conn, wip_item_id)
    }

    pub fn list_executions_tx(conn: &Connection, wip_item_id: i64) -> RepositoryResult<Vec<WipStepExecution>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT execution_id, wip_item_id, route_step_id, user_id, device_id,
                   location_id, created_at, qty_in, qty_scrap
            FROM wip_step_execution
            WHERE wip_item_id = ?1
            ORDER BY execution_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![wip_item_id], map_execution)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 追加工序执行记录
    ///
    /// 同一 (WIP, 工序) 重复写入会触发唯一约束（UniqueConstraintViolation）
    pub fn insert_execution_tx(tx: &Transaction, exec: &NewStepExecution) -> RepositoryResult<i64> {
        tx.execute(
            r#"
            INSERT INTO wip_step_execution (
                wip_item_id, route_step_id, user_id, device_id, location_id,
                created_at, qty_in, qty_scrap
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)
            "#,
            params![
                exec.wip_item_id,
                exec.route_step_id,
                exec.user_id,
                exec.device_id,
                exec.location_id,
                now_ts(),
                exec.qty_in,
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    // ==========================================
    // 扫码审计事件
    // ==========================================

    /// 追加扫码事件
    pub fn append_scan_event_tx(
        tx: &Transaction,
        wip_item_id: i64,
        route_step_id: i64,
        scan_type: ScanType,
    ) -> RepositoryResult<i64> {
        tx.execute(
            r#"
            INSERT INTO scan_event (wip_item_id, route_step_id, scan_type, ts)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![wip_item_id, route_step_id, scan_type.to_db_str(), now_ts()],
        )?;
        Ok(tx.last_insert_rowid())
    }

    /// 查询 WIP 的扫码事件（按写入顺序）
    pub fn list_scan_events(&self, wip_item_id: i64) -> RepositoryResult<Vec<ScanEvent>> {
        let conn = self.get_conn()?;
        Self::list_scan_events_tx(&conn, wip_item_id)
    }

    pub fn list_scan_events_tx(conn: &Connection, wip_item_id: i64) -> RepositoryResult<Vec<ScanEvent>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT scan_event_id, wip_item_id, route_step_id, scan_type, ts
            FROM scan_event
            WHERE wip_item_id = ?1
            ORDER BY scan_event_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![wip_item_id], |row| {
                Ok(ScanEvent {
                    scan_event_id: row.get(0)?,
                    wip_item_id: row.get(1)?,
                    route_step_id: row.get(2)?,
                    scan_type: parse_enum(row, 3, ScanType::from_str)?,
                    ts: parse_ts(row, 4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ==========================================
    // 返工记录
    // ==========================================

    /// 追加返工记录
    pub fn append_rework_log_tx(tx: &Transaction, log: &NewReworkLog) -> RepositoryResult<i64> {
        tx.execute(
            r#"
            INSERT INTO wip_rework_log (
                wip_item_id, location_id, user_id, device_id, qty, reason, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                log.wip_item_id,
                log.location_id,
                log.user_id,
                log.device_id,
                log.qty,
                log.reason,
                now_ts(),
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    /// 查询 WIP 的返工记录（按写入顺序）
    pub fn list_rework_logs(&self, wip_item_id: i64) -> RepositoryResult<Vec<WipReworkLog>> {
        let conn = self.get_conn()?;
        Self::list_rework_logs_tx(&conn, wip_item_id)
    }

    pub fn list_rework_logs_tx(conn: &Connection, wip_item_id: i64) -> RepositoryResult<Vec<WipReworkLog>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT rework_log_id, wip_item_id, location_id, user_id, device_id,
                   qty, reason, created_at
            FROM wip_rework_log
            WHERE wip_item_id = ?1
            ORDER BY rework_log_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![wip_item_id], |row| {
                Ok(WipReworkLog {
                    rework_log_id: row.get(0)?,
                    wip_item_id: row.get(1)?,
                    location_id: row.get(2)?,
                    user_id: row.get(3)?,
                    device_id: row.get(4)?,
                    qty: row.get(5)?,
                    reason: row.get(6)?,
                    created_at: parse_ts(row, 7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_execution(row: &Row) -> rusqlite::Result<WipStepExecution> {
    Ok(WipStepExecution {
        execution_id: row.get(0)?,
        wip_item_id: row.get(1)?,
        route_step_id: row.get(2)?,
        user_id: row.get(3)?,
        device_id: row.get(4)?,
        location_id: row.get(5)?,
        created_at: parse_ts(row, 6)?,
        qty_in: row.get(7)?,
        qty_scrap: row.get(8)?,
    })
}
