// ==========================================
// 工单流转追踪系统 - 工单仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 并发: 状态更新带 revision 乐观锁
// ==========================================

use crate::domain::types::WorkOrderStatus;
use crate::domain::work_order::WorkOrder;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_enum;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// WorkOrderRepository - 工单仓储
// ==========================================
pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
    /// 创建新的工单仓储
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

    /// 按业务单号查询工单
    pub fn find_by_number(&self, wo_number: &str) -> RepositoryResult<Option<WorkOrder>> {
        let conn = self.get_conn()?;
        Self::find_by_number_tx(&conn, wo_number)
    }

    pub fn find_by_number_tx(conn: &Connection, wo_number: &str) -> RepositoryResult<Option<WorkOrder>> {
        let wo = conn
            .query_row(
                r#"
                SELECT work_order_id, wo_number, product_id, status, revision
                FROM work_order
                WHERE wo_number = ?1
                "#,
                params![wo_number.trim()],
                map_row,
            )
            .optional()?;
        Ok(wo)
    }

    /// 按ID查询工单
    pub fn find_by_id(&self, work_order_id: i64) -> RepositoryResult<Option<WorkOrder>> {
        let conn = self.get_conn()?;
        let wo = conn
            .query_row(
                r#"
                SELECT work_order_id, wo_number, product_id, status, revision
                FROM work_order
                WHERE work_order_id = ?1
                "#,
                params![work_order_id],
                map_row,
            )
            .optional()?;
        Ok(wo)
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 新建工单（OPEN）
    pub fn create(&self, wo_number: &str, product_id: i64) -> RepositoryResult<WorkOrder> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let wo = Self::insert_tx(&tx, wo_number, product_id)?;
        tx.commit()?;
        Ok(wo)
    }

    /// 在事务中新建工单（OPEN）
    pub fn insert_tx(tx: &Transaction, wo_number: &str, product_id: i64) -> RepositoryResult<WorkOrder> {
        let wo_number = wo_number.trim();
        tx.execute(
            r#"
            INSERT INTO work_order (wo_number, product_id, status, revision)
            VALUES (?1, ?2, ?3, 0)
            "#,
            params![wo_number, product_id, WorkOrderStatus::Open.to_db_str()],
        )?;

        Ok(WorkOrder {
            work_order_id: tx.last_insert_rowid(),
            wo_number: wo_number.to_string(),
            product_id,
            status: WorkOrderStatus::Open,
            revision: 0,
        })
    }

    /// 在事务中更新工单状态（乐观锁）
    ///
    /// # 返回
    /// - Ok(new_revision)
    /// - Err(OptimisticLockFailure): 工单已被其他请求修改
    pub fn update_status_tx(
        tx: &Transaction,
        work_order: &WorkOrder,
        status: WorkOrderStatus,
    ) -> RepositoryResult<i64> {
        let rows = tx.execute(
            r#"
            UPDATE work_order
            SET status = ?1, revision = revision + 1
            WHERE work_order_id = ?2 AND revision = ?3
            "#,
            params![status.to_db_str(), work_order.work_order_id, work_order.revision],
        )?;

        if rows == 0 {
            return Err(revision_mismatch(tx, work_order));
        }
        Ok(work_order.revision + 1)
    }
}

/// 判断是记录不存在还是 revision 冲突
fn revision_mismatch(conn: &Connection, work_order: &WorkOrder) -> RepositoryError {
    let actual = conn
        .query_row(
            "SELECT revision FROM work_order WHERE work_order_id = ?1",
            params![work_order.work_order_id],
            |row| row.get::<_, i64>(0),
        )
        .optional();

    match actual {
        Ok(Some(actual)) => RepositoryError::OptimisticLockFailure {
            entity: "WorkOrder".to_string(),
            id: work_order.work_order_id,
            expected: work_order.revision,
            actual,
        },
        Ok(None) => RepositoryError::NotFound {
            entity: "WorkOrder".to_string(),
            id: work_order.work_order_id.to_string(),
        },
        Err(e) => e.into(),
    }
}

fn map_row(row: &Row) -> rusqlite::Result<WorkOrder> {
    Ok(WorkOrder {
        work_order_id: row.get(0)?,
        wo_number: row.get(1)?,
        product_id: row.get(2)?,
        status: parse_enum(row, 3, WorkOrderStatus::from_str)?,
        revision: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::CatalogRepository;

    fn setup() -> (Arc<Mutex<Connection>>, WorkOrderRepository, i64) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let catalog = CatalogRepository::new(conn.clone());
        let sf = catalog.insert_subfamily("SF").unwrap();
        let product = catalog.insert_product(sf, "PN-1", true).unwrap();
        (conn.clone(), WorkOrderRepository::new(conn), product)
    }

    #[test]
    fn test_create_and_find_by_number() {
        let (_conn, repo, product) = setup();
        let wo = repo.create(" 1000001 ", product).unwrap();
        assert_eq!(wo.wo_number, "1000001");
        assert_eq!(wo.status, WorkOrderStatus::Open);

        let found = repo.find_by_number("1000001").unwrap().unwrap();
        assert_eq!(found, wo);
        assert!(repo.find_by_number("404").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_number_rejected() {
        let (_conn, repo, product) = setup();
        repo.create("1000001", product).unwrap();
        let result = repo.create("1000001", product);
        assert!(matches!(result, Err(RepositoryError::UniqueConstraintViolation(_))));
    }

    #[test]
    fn test_update_status_detects_stale_revision() {
        let (conn, repo, product) = setup();
        let wo = repo.create("1000001", product).unwrap();

        {
            let mut guard = conn.lock().unwrap();
            let tx = guard.transaction().unwrap();
            let rev = WorkOrderRepository::update_status_tx(&tx, &wo, WorkOrderStatus::InProgress).unwrap();
            assert_eq!(rev, 1);
            tx.commit().unwrap();
        }

        // 使用旧 revision 再次更新
        let mut guard = conn.lock().unwrap();
        let tx = guard.transaction().unwrap();
        let result = WorkOrderRepository::update_status_tx(&tx, &wo, WorkOrderStatus::Cancelled);
        assert!(matches!(
            result,
            Err(RepositoryError::OptimisticLockFailure { expected: 0, actual: 1, .. })
        ));
    }
}
