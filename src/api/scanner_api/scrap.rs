use super::*;
use crate::domain::types::{WipStatus, WorkOrderStatus};

pub const MSG_SCRAPPED: &str = "工单已取消";
pub const MSG_SCRAP_FINISHED: &str = "工单已完工，不能报废";

impl ScannerApi {
    // ==========================================
    // 报废
    // ==========================================

    /// 报废工单
    ///
    /// # 规则
    /// - 工单 → CANCELLED；已有 WIP 时 → SCRAPPED，并在当前工序记录 ERROR 扫码事件
    /// - 已完工或已取消的工单拒绝报废
    /// - reason 只写入日志
    pub fn scrap(&self, request: &ScrapRequest) -> ApiResult<ScrapResponse> {
        let wo_number = ScanOperationValidator::require_wo_number(&request.work_order_number)?;
        let reason = normalize_reason(request.reason.as_deref());

        let response = self.run_write("scrap", wo_number, |tx| {
            let _actor = ScanOperationValidator::validate_actor_tx(tx, request.user_id, request.device_id)?;

            let work_order = WorkOrderRepository::find_by_number_tx(tx, wo_number)?
                .ok_or_else(|| ApiError::NotFound(MSG_WORK_ORDER_NOT_FOUND.to_string()))?;
            match work_order.status {
                WorkOrderStatus::Finished => {
                    return Err(ApiError::StateConflict(MSG_SCRAP_FINISHED.to_string()).into())
                }
                WorkOrderStatus::Cancelled => {
                    return Err(ApiError::StateConflict(MSG_WORK_ORDER_CANCELLED.to_string()).into())
                }
                WorkOrderStatus::Open | WorkOrderStatus::InProgress => {}
            }

            WorkOrderRepository::update_status_tx(tx, &work_order, WorkOrderStatus::Cancelled)?;

            let wip = WipRepository::find_by_work_order_tx(tx, work_order.work_order_id)?;
            if let Some(wip) = &wip {
                WipRepository::update_status_tx(tx, wip, WipStatus::Scrapped)?;
                StepLedgerRepository::append_scan_event_tx(
                    tx,
                    wip.wip_item_id,
                    wip.current_step_id,
                    ScanType::Error,
                )?;
            }

            Ok(ScrapResponse {
                message: MSG_SCRAPPED.to_string(),
                work_order_id: work_order.work_order_id,
                wip_item_id: wip.map(|w| w.wip_item_id),
            })
        })?;

        tracing::info!(
            wo_number,
            work_order_id = response.work_order_id,
            wip_item_id = ?response.wip_item_id,
            user_id = request.user_id,
            device_id = request.device_id,
            reason = reason.as_deref().unwrap_or(""),
            "工单已报废"
        );
        Ok(response)
    }
}
