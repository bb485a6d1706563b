use super::*;
use crate::domain::types::WipStatus;
use crate::domain::wip::NewReworkLog;

pub const MSG_REWORK_HOLD: &str = "返工已登记";
pub const MSG_REWORK_RELEASED: &str = "返工完成";
pub const MSG_REWORK_CLOSED_ORDER: &str = "工单已结束，不能返工";
pub const MSG_REWORK_CLOSED_WIP: &str = "WIP 已结束，不能返工";

impl ScannerApi {
    // ==========================================
    // 返工
    // ==========================================

    /// 返工挂起（completed=false）或放行（completed=true）
    ///
    /// # 规则
    /// - 工单与 WIP 必须存在
    /// - 已结束的工单或 WIP 拒绝返工
    /// - 每次调用追加一条返工记录（记录设备所在站点）
    pub fn rework(&self, request: &ReworkRequest) -> ApiResult<ReworkResponse> {
        let wo_number = ScanOperationValidator::require_wo_number(&request.work_order_number)?;
        let qty = ScanOperationValidator::require_quantity(request.quantity)?;
        let reason = normalize_reason(request.reason.as_deref());

        let response = self.run_write("rework", wo_number, |tx| {
            let actor = ScanOperationValidator::validate_actor_tx(tx, request.user_id, request.device_id)?;

            let work_order = WorkOrderRepository::find_by_number_tx(tx, wo_number)?
                .ok_or_else(|| ApiError::NotFound(MSG_WORK_ORDER_NOT_FOUND.to_string()))?;
            let wip = WipRepository::find_by_work_order_tx(tx, work_order.work_order_id)?
                .ok_or_else(|| ApiError::NotFound(MSG_WIP_NOT_FOUND.to_string()))?;

            if work_order.status.is_terminal() {
                return Err(ApiError::StateConflict(MSG_REWORK_CLOSED_ORDER.to_string()).into());
            }
            if wip.status.is_terminal() {
                return Err(ApiError::StateConflict(MSG_REWORK_CLOSED_WIP.to_string()).into());
            }

            StepLedgerRepository::append_rework_log_tx(
                tx,
                &NewReworkLog {
                    wip_item_id: wip.wip_item_id,
                    location_id: actor.device.location_id,
                    user_id: actor.user.user_id,
                    device_id: actor.device.device_id,
                    qty,
                    reason: reason.clone(),
                },
            )?;

            let wip_status = if request.completed {
                WipStatus::Active
            } else {
                WipStatus::Hold
            };
            WipRepository::update_status_tx(tx, &wip, wip_status)?;

            Ok(ReworkResponse {
                message: if request.completed {
                    MSG_REWORK_RELEASED
                } else {
                    MSG_REWORK_HOLD
                }
                .to_string(),
                work_order_id: work_order.work_order_id,
                wip_item_id: wip.wip_item_id,
                wip_status,
            })
        })?;

        tracing::info!(
            wo_number,
            wip_item_id = response.wip_item_id,
            qty,
            completed = request.completed,
            wip_status = %response.wip_status,
            "返工已记录"
        );
        Ok(response)
    }
}
