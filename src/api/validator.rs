// ==========================================
// 工单流转追踪系统 - 扫码操作校验器
// ==========================================
// 职责: 各扫码操作共用的前置校验
// 1. 必填字段（不做任何查询）
// 2. 操作员/设备身份（设备必须绑定到该操作员）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::catalog::{Device, User};
use crate::repository::CatalogRepository;
use rusqlite::Connection;

pub const MSG_WO_REQUIRED: &str = "工单号不能为空";
pub const MSG_WO_AND_PART_REQUIRED: &str = "工单号与零件号不能为空";
pub const MSG_PART_REQUIRED: &str = "零件号不能为空";
pub const MSG_INVALID_QTY: &str = "数量无效";
pub const MSG_INVALID_USER: &str = "操作员无效";
pub const MSG_INVALID_DEVICE: &str = "设备无效";

/// 已通过身份校验的操作员与设备
#[derive(Debug, Clone)]
pub struct Actor {
    pub user: User,
    pub device: Device,
}

// ==========================================
// ScanOperationValidator - 扫码操作校验器
// ==========================================
pub struct ScanOperationValidator;

impl ScanOperationValidator {
    /// 校验工单号非空，返回去除首尾空白后的工单号
    pub fn require_wo_number(wo_number: &str) -> ApiResult<&str> {
        let trimmed = wo_number.trim();
        if trimmed.is_empty() {
            return Err(ApiError::InvalidInput(MSG_WO_REQUIRED.to_string()));
        }
        Ok(trimmed)
    }

    /// 校验零件号非空
    pub fn require_part_number(part_number: &str) -> ApiResult<&str> {
        let trimmed = part_number.trim();
        if trimmed.is_empty() {
            return Err(ApiError::InvalidInput(MSG_PART_REQUIRED.to_string()));
        }
        Ok(trimmed)
    }

    /// 校验数量非零
    pub fn require_quantity(qty: u32) -> ApiResult<u32> {
        if qty == 0 {
            return Err(ApiError::InvalidInput(MSG_INVALID_QTY.to_string()));
        }
        Ok(qty)
    }

    /// 登记扫码的输入校验
    ///
    /// # 返回
    /// - Ok((工单号, 零件号)): 均已去除首尾空白
    pub fn validate_register_input<'a>(
        wo_number: &'a str,
        part_number: &'a str,
        qty: u32,
    ) -> ApiResult<(&'a str, &'a str)> {
        let wo = wo_number.trim();
        let part = part_number.trim();
        if wo.is_empty() || part.is_empty() {
            return Err(ApiError::InvalidInput(MSG_WO_AND_PART_REQUIRED.to_string()));
        }
        Self::require_quantity(qty)?;
        Ok((wo, part))
    }

    /// 校验操作员与设备
    ///
    /// # 规则
    /// - 操作员存在且启用
    /// - 设备存在、启用且绑定到该操作员
    pub fn validate_actor_tx(conn: &Connection, user_id: i64, device_id: i64) -> ApiResult<Actor> {
        let user = CatalogRepository::find_user_tx(conn, user_id)?
            .filter(|u| u.active)
            .ok_or_else(|| ApiError::Unauthorized(MSG_INVALID_USER.to_string()))?;

        let device = CatalogRepository::find_device_tx(conn, device_id)?
            .filter(|d| d.active && d.is_bound_to(user.user_id))
            .ok_or_else(|| ApiError::Unauthorized(MSG_INVALID_DEVICE.to_string()))?;

        Ok(Actor { user, device })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorKind;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_register_input_checks() {
        assert!(matches!(
            ScanOperationValidator::validate_register_input(" ", "PN", 1),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            ScanOperationValidator::validate_register_input("WO", "", 1),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            ScanOperationValidator::validate_register_input("WO", "PN", 0),
            Err(ApiError::InvalidInput(_))
        ));
        assert_eq!(
            ScanOperationValidator::validate_register_input(" WO ", " PN ", 5).unwrap(),
            ("WO", "PN")
        );
    }

    #[test]
    fn test_actor_must_be_bound() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let catalog = CatalogRepository::new(conn.clone());

        let loc = catalog.insert_location("A", true).unwrap();
        let alice = catalog.insert_user("alice", true).unwrap();
        let bob = catalog.insert_user("bob", true).unwrap();
        let retired = catalog.insert_user("retired", false).unwrap();
        let dev = catalog.insert_device("DEV-1", loc, Some(alice), true).unwrap();
        let off = catalog.insert_device("DEV-2", loc, Some(alice), false).unwrap();

        let guard = conn.lock().unwrap();
        let actor = ScanOperationValidator::validate_actor_tx(&guard, alice, dev).unwrap();
        assert_eq!(actor.device.location_id, loc);

        let err = ScanOperationValidator::validate_actor_tx(&guard, bob, dev).unwrap_err();
        assert_eq!(err.reason(), MSG_INVALID_DEVICE);
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = ScanOperationValidator::validate_actor_tx(&guard, retired, dev).unwrap_err();
        assert_eq!(err.reason(), MSG_INVALID_USER);

        assert!(ScanOperationValidator::validate_actor_tx(&guard, alice, off).is_err());
        assert!(ScanOperationValidator::validate_actor_tx(&guard, 999, dev).is_err());
    }
}
