// ==========================================
// 工单流转追踪系统 - 主数据仓储
// ==========================================
// 覆盖: 站点 / 操作员 / 设备 / 子族 / 产品 / 未登记零件
// 说明: 主数据维护不在本系统职责内，写入方法仅用于初始化与测试
// ==========================================

use crate::domain::catalog::{Device, Location, Product, Subfamily, UnregisteredPart, User};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{now_ts, parse_ts};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// CatalogRepository - 主数据仓储
// ==========================================
pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    /// 创建新的主数据仓储
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

    /// 按ID查询操作员
    pub fn find_user(&self, user_id: i64) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        Self::find_user_tx(&conn, user_id)
    }

    pub fn find_user_tx(conn: &Connection, user_id: i64) -> RepositoryResult<Option<User>> {
        let user = conn
            .query_row(
                "SELECT user_id, username, active FROM app_user WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(User {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        active: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// 按ID查询设备
    pub fn find_device(&self, device_id: i64) -> RepositoryResult<Option<Device>> {
        let conn = self.get_conn()?;
        Self::find_device_tx(&conn, device_id)
    }

    pub fn find_device_tx(conn: &Connection, device_id: i64) -> RepositoryResult<Option<Device>> {
        let device = conn
            .query_row(
                r#"
                SELECT device_id, device_uid, location_id, user_id, name, active
                FROM device
                WHERE device_id = ?1
                "#,
                params![device_id],
                map_device,
            )
            .optional()?;
        Ok(device)
    }

    /// 按ID查询站点
    pub fn find_location(&self, location_id: i64) -> RepositoryResult<Option<Location>> {
        let conn = self.get_conn()?;
        Self::find_location_tx(&conn, location_id)
    }

    pub fn find_location_tx(conn: &Connection, location_id: i64) -> RepositoryResult<Option<Location>> {
        let location = conn
            .query_row(
                "SELECT location_id, name, active FROM location WHERE location_id = ?1",
                params![location_id],
                map_location,
            )
            .optional()?;
        Ok(location)
    }

    /// 查询所有启用站点（按名称排序）
    pub fn list_active_locations(&self) -> RepositoryResult<Vec<Location>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT location_id, name, active FROM location WHERE active = 1 ORDER BY name",
        )?;
        let locations = stmt
            .query_map([], map_location)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(locations)
    }

    /// 按ID查询产品
    pub fn find_product_tx(conn: &Connection, product_id: i64) -> RepositoryResult<Option<Product>> {
        let product = conn
            .query_row(
                r#"
                SELECT product_id, subfamily_id, part_number, active
                FROM product
                WHERE product_id = ?1
                "#,
                params![product_id],
                map_product,
            )
            .optional()?;
        Ok(product)
    }

    /// 按零件号查询启用中的产品（精确匹配，首尾空白已去除）
    pub fn find_active_product_by_part(&self, part_number: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        Self::find_active_product_by_part_tx(&conn, part_number)
    }

    pub fn find_active_product_by_part_tx(
        conn: &Connection,
        part_number: &str,
    ) -> RepositoryResult<Option<Product>> {
        let product = conn
            .query_row(
                r#"
                SELECT product_id, subfamily_id, part_number, active
                FROM product
                WHERE part_number = ?1 AND active = 1
                "#,
                params![part_number.trim()],
                map_product,
            )
            .optional()?;
        Ok(product)
    }

    /// 按ID查询子族
    pub fn find_subfamily_tx(conn: &Connection, subfamily_id: i64) -> RepositoryResult<Option<Subfamily>> {
        let subfamily = conn
            .query_row(
                r#"
                SELECT subfamily_id, name, active, active_route_id
                FROM subfamily
                WHERE subfamily_id = ?1
                "#,
                params![subfamily_id],
                |row| {
                    Ok(Subfamily {
                        subfamily_id: row.get(0)?,
                        name: row.get(1)?,
                        active: row.get(2)?,
                        active_route_id: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(subfamily)
    }

    /// 产品当前指定的工艺路线（产品 → 子族 → active_route_id）
    pub fn find_designated_route_id_tx(conn: &Connection, product: &Product) -> RepositoryResult<Option<i64>> {
        Ok(Self::find_subfamily_tx(conn, product.subfamily_id)?
            .and_then(|sf| sf.active_route_id))
    }

    /// 查询未登记零件记录（按时间倒序）
    pub fn list_unregistered_parts(&self, limit: usize) -> RepositoryResult<Vec<UnregisteredPart>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT part_id, part_number, creation_datetime, active
            FROM unregistered_part
            ORDER BY part_id DESC
            LIMIT ?1
            "#,
        )?;
        let parts = stmt
            .query_map(params![limit as i64], |row| {
                Ok(UnregisteredPart {
                    part_id: row.get(0)?,
                    part_number: row.get(1)?,
                    creation_datetime: parse_ts(row, 2)?,
                    active: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(parts)
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 记录未登记零件
    pub fn insert_unregistered_part(&self, part_number: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO unregistered_part (part_number, creation_datetime, active)
            VALUES (?1, ?2, 1)
            "#,
            params![part_number.trim(), now_ts()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 新增站点
    pub fn insert_location(&self, name: &str, active: bool) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO location (name, active) VALUES (?1, ?2)",
            params![name, active],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 新增操作员
    pub fn insert_user(&self, username: &str, active: bool) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO app_user (username, active) VALUES (?1, ?2)",
            params![username, active],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 新增设备
    pub fn insert_device(
        &self,
        device_uid: &str,
        location_id: i64,
        user_id: Option<i64>,
        active: bool,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO device (device_uid, location_id, user_id, name, active)
            VALUES (?1, ?2, ?3, ?1, ?4)
            "#,
            params![device_uid, location_id, user_id, active],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 新增子族（尚未指定路线）
    pub fn insert_subfamily(&self, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO subfamily (name, active) VALUES (?1, 1)",
            params![name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 新增产品
    pub fn insert_product(&self, subfamily_id: i64, part_number: &str, active: bool) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO product (subfamily_id, part_number, active) VALUES (?1, ?2, ?3)",
            params![subfamily_id, part_number, active],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 设置产品启用状态
    pub fn set_product_active(&self, product_id: i64, active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE product SET active = ?1 WHERE product_id = ?2",
            params![active, product_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Product".to_string(),
                id: product_id.to_string(),
            });
        }
        Ok(())
    }
}

fn map_location(row: &Row) -> rusqlite::Result<Location> {
    Ok(Location {
        location_id: row.get(0)?,
        name: row.get(1)?,
        active: row.get(2)?,
    })
}

fn map_device(row: &Row) -> rusqlite::Result<Device> {
    Ok(Device {
        device_id: row.get(0)?,
        device_uid: row.get(1)?,
        location_id: row.get(2)?,
        user_id: row.get(3)?,
        name: row.get(4)?,
        active: row.get(5)?,
    })
}

fn map_product(row: &Row) -> rusqlite::Result<Product> {
    Ok(Product {
        product_id: row.get(0)?,
        subfamily_id: row.get(1)?,
        part_number: row.get(2)?,
        active: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> CatalogRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        CatalogRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_device_binding_and_lookup() {
        let repo = setup_repo();
        let loc = repo.insert_location("Alloy", true).unwrap();
        let user = repo.insert_user("op1", true).unwrap();
        let dev = repo.insert_device("DEV-1", loc, Some(user), true).unwrap();

        let device = repo.find_device(dev).unwrap().unwrap();
        assert_eq!(device.location_id, loc);
        assert!(device.is_bound_to(user));
        assert!(!device.is_bound_to(user + 1));
        assert!(repo.find_device(dev + 100).unwrap().is_none());
    }

    #[test]
    fn test_find_active_product_by_part_skips_inactive() {
        let repo = setup_repo();
        let sf = repo.insert_subfamily("SF-A").unwrap();
        let active = repo.insert_product(sf, "PN-100", true).unwrap();
        repo.insert_product(sf, "PN-200", false).unwrap();

        let found = repo.find_active_product_by_part("  PN-100 ").unwrap().unwrap();
        assert_eq!(found.product_id, active);
        assert!(repo.find_active_product_by_part("PN-200").unwrap().is_none());
    }

    #[test]
    fn test_list_active_locations_sorted_by_name() {
        let repo = setup_repo();
        repo.insert_location("Pack", true).unwrap();
        repo.insert_location("Alloy", true).unwrap();
        repo.insert_location("Retired", false).unwrap();

        let names: Vec<String> = repo
            .list_active_locations()
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Alloy".to_string(), "Pack".to_string()]);
    }

    #[test]
    fn test_unregistered_part_log() {
        let repo = setup_repo();
        repo.insert_unregistered_part(" X-1 ").unwrap();
        repo.insert_unregistered_part("X-2").unwrap();

        let parts = repo.list_unregistered_parts(10).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].part_number, "X-2");
        assert_eq!(parts[1].part_number, "X-1");
    }
}
