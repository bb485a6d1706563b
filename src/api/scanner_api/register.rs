use super::*;
use crate::domain::types::{WipStatus, WorkOrderStatus};
use crate::domain::wip::NewStepExecution;
use crate::domain::work_order::WorkOrder;
use crate::engine::RoutingCore;
use crate::repository::RouteCatalogRepository;

pub const MSG_REGISTERED: &str = "登记完成";
pub const MSG_PROVISIONING_NOT_ALLOWED: &str = "工单不存在，当前站点不允许自动建单";
pub const MSG_PRODUCT_NOT_FOUND_FOR_CREATE: &str = "未找到可用于建单的产品";
pub const MSG_PRODUCT_INACTIVE: &str = "产品未启用";
pub const MSG_PART_MISMATCH: &str = "零件号与工单不符";

impl ScannerApi {
    // ==========================================
    // 登记扫码
    // ==========================================

    /// 登记一次扫码
    ///
    /// # 校验顺序（任一失败即拒绝，无任何部分写入）
    /// 1. 工单号/零件号非空，数量非零
    /// 2. 操作员启用，设备启用且绑定该操作员
    /// 3. 工单不存在时，仅自动建单站点可隐式建单
    /// 4. 产品启用、零件号匹配、工单非终态
    /// 5. 路线及工序存在
    /// 6. WIP 处于 ACTIVE
    /// 7. 目标工序解析与数量上限
    /// 8. 设备站点 = 目标工序站点（否则记录 ERROR 扫码事件）
    /// 9. 目标工序未登记过（否则记录 ERROR 扫码事件）
    ///
    /// # 返回
    /// - Ok(RegisterScanResponse): 是否为末道工序
    pub fn register_scan(&self, request: &RegisterScanRequest) -> ApiResult<RegisterScanResponse> {
        let (wo_number, part_number) = ScanOperationValidator::validate_register_input(
            &request.work_order_number,
            &request.part_number,
            request.quantity,
        )?;

        let (response, created) = self.run_write("register_scan", wo_number, |tx| {
            let actor = ScanOperationValidator::validate_actor_tx(tx, request.user_id, request.device_id)?;
            self.register_scan_tx(tx, &actor, wo_number, part_number, request.quantity)
        })?;

        if created {
            tracing::info!(
                wo_number,
                work_order_id = response.work_order_id,
                device_id = request.device_id,
                "工单已自动创建"
            );
        }
        tracing::info!(
            wo_number,
            work_order_id = response.work_order_id,
            wip_item_id = response.wip_item_id,
            route_step_id = response.route_step_id,
            qty = request.quantity,
            is_final_step = response.is_final_step,
            "扫码登记完成"
        );
        Ok(response)
    }

    /// 事务内登记逻辑
    ///
    /// # 返回
    /// - Ok((响应, 是否自动建单))
    fn register_scan_tx(
        &self,
        tx: &Transaction,
        actor: &Actor,
        wo_number: &str,
        part_number: &str,
        qty: u32,
    ) -> Result<(RegisterScanResponse, bool), Rejection> {
        let device = &actor.device;

        // 3. 工单（必要时隐式创建）
        let (mut work_order, created) = match WorkOrderRepository::find_by_number_tx(tx, wo_number)? {
            Some(wo) => (wo, false),
            None => (self.provision_work_order_tx(tx, actor, wo_number, part_number)?, true),
        };

        // 4. 产品与工单状态
        let product = CatalogRepository::find_product_tx(tx, work_order.product_id)?
            .ok_or_else(|| ApiError::NotFound(MSG_WORK_ORDER_NOT_FOUND.to_string()))?;
        if !product.active {
            return Err(ApiError::NotFound(MSG_PRODUCT_INACTIVE.to_string()).into());
        }
        if !product.matches_part_number(part_number) {
            return Err(ApiError::InvalidInput(MSG_PART_MISMATCH.to_string()).into());
        }
        match work_order.status {
            WorkOrderStatus::Cancelled => {
                return Err(ApiError::StateConflict(MSG_WORK_ORDER_CANCELLED.to_string()).into())
            }
            WorkOrderStatus::Finished => {
                return Err(ApiError::StateConflict(MSG_WORK_ORDER_FINISHED.to_string()).into())
            }
            WorkOrderStatus::Open | WorkOrderStatus::InProgress => {}
        }

        // 5. 路线与工序（已开工的 WIP 沿用冻结的路线）
        let wip = WipRepository::find_by_work_order_tx(tx, work_order.work_order_id)?;
        let route_id = match &wip {
            Some(wip) => wip.route_id,
            None => CatalogRepository::find_designated_route_id_tx(tx, &product)?
                .ok_or_else(|| ApiError::NotFound(MSG_NO_ACTIVE_ROUTE.to_string()))?,
        };
        let steps = RouteCatalogRepository::find_steps_tx(tx, route_id)?;
        if steps.is_empty() {
            return Err(ApiError::NotFound(MSG_ROUTE_HAS_NO_STEPS.to_string()).into());
        }

        // 6. WIP 状态
        if let Some(wip) = &wip {
            match wip.status {
                WipStatus::Active => {}
                WipStatus::Hold => {
                    return Err(ApiError::StateConflict(MSG_WIP_ON_REWORK.to_string()).into())
                }
                WipStatus::Finished | WipStatus::Scrapped => {
                    return Err(ApiError::StateConflict(MSG_WIP_NOT_ACTIVE.to_string()).into())
                }
            }
        }

        // 7. 目标工序与数量上限
        let target = RoutingCore::resolve_target(&steps, wip.as_ref().map(|w| w.current_step_id))?;
        if let (Some(wip), Some(current)) = (&wip, target.current) {
            let previous = StepLedgerRepository::find_execution_tx(tx, wip.wip_item_id, current.route_step_id)?;
            RoutingCore::check_quantity(qty, false, previous.map(|e| e.qty_in))?;
        }
        let target_step = target.target;

        // 8. 站点校验
        if target_step.location_id != device.location_id {
            let Some(wip) = &wip else {
                return Err(ApiError::StateConflict(MSG_WRONG_LOCATION.to_string()).into());
            };
            let attempted = RoutingCore::attempted_step(&steps, device.location_id, target_step);
            let already_done =
                StepLedgerRepository::find_execution_tx(tx, wip.wip_item_id, attempted.route_step_id)?
                    .is_some();
            let message = if already_done {
                MSG_STEP_ALREADY_REGISTERED
            } else {
                MSG_WRONG_LOCATION
            };
            return Err(Rejection::audited(
                ApiError::StateConflict(message.to_string()),
                Some(AuditEntry {
                    wip_item_id: wip.wip_item_id,
                    route_step_id: attempted.route_step_id,
                }),
            ));
        }

        // 9. 重复登记
        if let Some(wip) = &wip {
            if StepLedgerRepository::find_execution_tx(tx, wip.wip_item_id, target_step.route_step_id)?
                .is_some()
            {
                return Err(Rejection::audited(
                    ApiError::StateConflict(MSG_STEP_ALREADY_REGISTERED.to_string()),
                    Some(AuditEntry {
                        wip_item_id: wip.wip_item_id,
                        route_step_id: target_step.route_step_id,
                    }),
                ));
            }
        }

        // 10. 提交: WIP 指针 + 执行记录 + ENTRY 事件 + 状态
        let is_final_step = target.is_final_step();
        let wip_status = if is_final_step {
            WipStatus::Finished
        } else {
            WipStatus::Active
        };

        let wip_item_id = match &wip {
            None => {
                let created_wip =
                    WipRepository::insert_tx(tx, work_order.work_order_id, target_step.route_step_id, route_id)?;
                if wip_status != WipStatus::Active {
                    WipRepository::update_status_tx(tx, &created_wip, wip_status)?;
                }
                created_wip.wip_item_id
            }
            Some(existing) => {
                WipRepository::advance_tx(tx, existing, target_step.route_step_id, wip_status)?;
                existing.wip_item_id
            }
        };

        StepLedgerRepository::insert_execution_tx(
            tx,
            &NewStepExecution {
                wip_item_id,
                route_step_id: target_step.route_step_id,
                user_id: actor.user.user_id,
                device_id: device.device_id,
                location_id: device.location_id,
                qty_in: qty,
            },
        )?;
        StepLedgerRepository::append_scan_event_tx(tx, wip_item_id, target_step.route_step_id, ScanType::Entry)?;

        let next_wo_status = next_work_order_status(&work_order, is_final_step);
        if next_wo_status != work_order.status {
            work_order.revision = WorkOrderRepository::update_status_tx(tx, &work_order, next_wo_status)?;
            work_order.status = next_wo_status;
        }

        Ok((
            RegisterScanResponse {
                message: MSG_REGISTERED.to_string(),
                work_order_id: work_order.work_order_id,
                wip_item_id,
                route_step_id: target_step.route_step_id,
                is_final_step,
            },
            created,
        ))
    }

    /// 隐式建单（仅自动建单站点）
    fn provision_work_order_tx(
        &self,
        tx: &Transaction,
        actor: &Actor,
        wo_number: &str,
        part_number: &str,
    ) -> Result<WorkOrder, Rejection> {
        let location = CatalogRepository::find_location_tx(tx, actor.device.location_id)?;
        let allowed = self
            .provisioning
            .is_auto_provisioning_location(tx, &actor.device, location.as_ref())
            .map_err(|e| ApiError::InternalError(format!("自动建单策略读取失败: {}", e)))?;
        if !allowed {
            return Err(ApiError::NotFound(MSG_PROVISIONING_NOT_ALLOWED.to_string()).into());
        }

        let product = CatalogRepository::find_active_product_by_part_tx(tx, part_number)?
            .ok_or_else(|| ApiError::NotFound(MSG_PRODUCT_NOT_FOUND_FOR_CREATE.to_string()))?;

        Ok(WorkOrderRepository::insert_tx(tx, wo_number, product.product_id)?)
    }
}

/// 登记成功后的工单状态
///
/// - 末道工序: FINISHED
/// - 首次开工: OPEN → IN_PROGRESS
fn next_work_order_status(work_order: &WorkOrder, is_final_step: bool) -> WorkOrderStatus {
    if is_final_step {
        WorkOrderStatus::Finished
    } else if work_order.status == WorkOrderStatus::Open {
        WorkOrderStatus::InProgress
    } else {
        work_order.status
    }
}
