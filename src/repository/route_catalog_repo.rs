// ==========================================
// 工单流转追踪系统 - 工艺路线仓储
// ==========================================
// 职责: 按路线ID返回按工序号升序排列的工序序列
// 说明: next_step_id 在写入路线时按工序号顺序计算，
//       引擎只沿指针前进，不做“工序号+1”推算
// ==========================================

use crate::domain::route::{NewRouteStep, Route, RouteStep};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::sync::{Arc, Mutex};

// ==========================================
// RouteCatalogRepository - 工艺路线仓储
// ==========================================
pub struct RouteCatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RouteCatalogRepository {
    /// 创建新的工艺路线仓储
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

    /// 按ID查询路线
    pub fn find_route(&self, route_id: i64) -> RepositoryResult<Option<Route>> {
        let conn = self.get_conn()?;
        let route = conn
            .query_row(
                r#"
                SELECT route_id, subfamily_id, name, version, active
                FROM route
                WHERE route_id = ?1
                "#,
                params![route_id],
                |row| {
                    Ok(Route {
                        route_id: row.get(0)?,
                        subfamily_id: row.get(1)?,
                        name: row.get(2)?,
                        version: row.get(3)?,
                        active: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(route)
    }

    /// 查询路线工序（按工序号升序）
    ///
    /// # 返回
    /// - 空 Vec: 路线不存在或未配置工序，调用方应视为“路线未配置”
    pub fn find_steps(&self, route_id: i64) -> RepositoryResult<Vec<RouteStep>> {
        let conn = self.get_conn()?;
        Self::find_steps_tx(&conn, route_id)
    }

    pub fn find_steps_tx(conn: &Connection, route_id: i64) -> RepositoryResult<Vec<RouteStep>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT route_step_id, route_id, step_number, location_id, next_step_id
            FROM route_step
            WHERE route_id = ?1
            ORDER BY step_number ASC
            "#,
        )?;

        let steps = stmt
            .query_map(params![route_id], |row| {
                Ok(RouteStep {
                    route_step_id: row.get(0)?,
                    route_id: row.get(1)?,
                    step_number: row.get(2)?,
                    location_id: row.get(3)?,
                    next_step_id: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(steps)
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 创建路线及其工序
    ///
    /// 工序按工序号排序后依次串联 next_step_id，末道工序指针为空。
    /// 工序号可以不连续。
    ///
    /// # 返回
    /// - Ok(route_id)
    pub fn create_route(
        &self,
        subfamily_id: i64,
        name: &str,
        version: &str,
        steps: &[NewRouteStep],
    ) -> RepositoryResult<i64> {
        let mut sorted = steps.to_vec();
        sorted.sort_by_key(|s| s.step_number);
        if sorted.windows(2).any(|w| w[0].step_number == w[1].step_number) {
            return Err(RepositoryError::FieldValueError {
                field: "step_number".to_string(),
                message: "同一路线内工序号重复".to_string(),
            });
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO route (subfamily_id, name, version, active) VALUES (?1, ?2, ?3, 1)",
            params![subfamily_id, name, version],
        )?;
        let route_id = tx.last_insert_rowid();

        let mut step_ids = Vec::with_capacity(sorted.len());
        for step in &sorted {
            tx.execute(
                r#"
                INSERT INTO route_step (route_id, step_number, location_id, next_step_id)
                VALUES (?1, ?2, ?3, NULL)
                "#,
                params![route_id, step.step_number, step.location_id],
            )?;
            step_ids.push(tx.last_insert_rowid());
        }

        // 串联指针
        for pair in step_ids.windows(2) {
            tx.execute(
                "UPDATE route_step SET next_step_id = ?1 WHERE route_step_id = ?2",
                params![pair[1], pair[0]],
            )?;
        }

        tx.commit()?;
        tracing::info!(route_id, steps = step_ids.len(), "工艺路线已创建");
        Ok(route_id)
    }

    /// 指定子族当前使用的路线
    ///
    /// 已开工的 WIP 继续沿用创建时冻结的路线
    pub fn activate_route(&self, subfamily_id: i64, route_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE subfamily SET active_route_id = ?1 WHERE subfamily_id = ?2",
            params![route_id, subfamily_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Subfamily".to_string(),
                id: subfamily_id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::CatalogRepository;

    fn setup() -> (CatalogRepository, RouteCatalogRepository, i64, Vec<i64>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let catalog = CatalogRepository::new(conn.clone());
        let routes = RouteCatalogRepository::new(conn);
        let sf = catalog.insert_subfamily("SF").unwrap();
        let locs = ["A", "B", "C"]
            .iter()
            .map(|n| catalog.insert_location(n, true).unwrap())
            .collect();
        (catalog, routes, sf, locs)
    }

    #[test]
    fn test_steps_are_ordered_and_chained() {
        let (_catalog, routes, sf, locs) = setup();
        // 故意乱序 + 不连续工序号
        let route_id = routes
            .create_route(
                sf,
                "R",
                "1",
                &[
                    NewRouteStep { step_number: 30, location_id: locs[2] },
                    NewRouteStep { step_number: 10, location_id: locs[0] },
                    NewRouteStep { step_number: 20, location_id: locs[1] },
                ],
            )
            .unwrap();

        let steps = routes.find_steps(route_id).unwrap();
        let numbers: Vec<u32> = steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![10, 20, 30]);
        assert_eq!(steps[0].next_step_id, Some(steps[1].route_step_id));
        assert_eq!(steps[1].next_step_id, Some(steps[2].route_step_id));
        assert!(steps[2].is_final());
    }

    #[test]
    fn test_duplicate_step_numbers_rejected() {
        let (_catalog, routes, sf, locs) = setup();
        let result = routes.create_route(
            sf,
            "R",
            "1",
            &[
                NewRouteStep { step_number: 1, location_id: locs[0] },
                NewRouteStep { step_number: 1, location_id: locs[1] },
            ],
        );
        assert!(matches!(result, Err(RepositoryError::FieldValueError { .. })));
    }

    #[test]
    fn test_unknown_route_has_no_steps() {
        let (_catalog, routes, _sf, _locs) = setup();
        assert!(routes.find_steps(999).unwrap().is_empty());
        assert!(routes.find_route(999).unwrap().is_none());
    }

    #[test]
    fn test_activate_route_on_missing_subfamily() {
        let (_catalog, routes, _sf, _locs) = setup();
        let result = routes.activate_route(999, 1);
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }
}
