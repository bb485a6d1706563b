use super::*;
use crate::engine::RoutingCore;
use crate::repository::RouteCatalogRepository;

impl ScannerApi {
    // ==========================================
    // 工单上下文预览（只读）
    // ==========================================

    /// 预览工单的下一道工序
    ///
    /// # 参数
    /// - wo_number: 工单号
    /// - device_id: 发起预览的设备
    ///
    /// # 返回
    /// - Ok(WorkOrderContextResponse): 除工单号为空外，所有情况都以上下文形式返回
    /// - Err(InvalidInput): 工单号为空
    ///
    /// # 说明
    /// 结果仅供参考，登记时会重新校验
    pub fn get_work_order_context(
        &self,
        wo_number: &str,
        device_id: i64,
    ) -> ApiResult<WorkOrderContextResponse> {
        let wo_number = ScanOperationValidator::require_wo_number(wo_number)?;
        let conn = self.get_conn()?;

        // 1. 工单与产品
        let Some(work_order) = WorkOrderRepository::find_by_number_tx(&conn, wo_number)? else {
            return Ok(WorkOrderContextResponse::not_found(MSG_WORK_ORDER_NOT_FOUND));
        };
        let Some(product) = CatalogRepository::find_product_tx(&conn, work_order.product_id)? else {
            return Ok(WorkOrderContextResponse::not_found(MSG_WORK_ORDER_NOT_FOUND));
        };

        let mut ctx = WorkOrderContextResponse {
            found: true,
            work_order_id: Some(work_order.work_order_id),
            work_order_status: Some(work_order.status),
            product_id: Some(product.product_id),
            part_number: Some(product.part_number.clone()),
            ..Default::default()
        };

        // 2. 路线（已开工的 WIP 沿用冻结的路线）
        let wip = WipRepository::find_by_work_order_tx(&conn, work_order.work_order_id)?;
        let route_id = match &wip {
            Some(wip) => Some(wip.route_id),
            None => CatalogRepository::find_designated_route_id_tx(&conn, &product)?,
        };
        let Some(route_id) = route_id else {
            return Ok(ctx.blocked(MSG_NO_ACTIVE_ROUTE));
        };
        ctx.route_id = Some(route_id);

        // 3. 设备
        let device = CatalogRepository::find_device_tx(&conn, device_id)?.filter(|d| d.active);
        let device_location = match &device {
            Some(d) => CatalogRepository::find_location_tx(&conn, d.location_id)?,
            None => None,
        };
        if device_location.is_none() {
            return Ok(ctx.blocked(MSG_INVALID_DEVICE));
        }

        // 4. 工序
        let steps = RouteCatalogRepository::find_steps_tx(&conn, route_id)?;
        if steps.is_empty() {
            return Ok(ctx.blocked(MSG_ROUTE_HAS_NO_STEPS));
        }

        let current_step_id = wip.as_ref().map(|w| w.current_step_id);
        ctx.is_first_step = wip.is_none();

        // 当前工序的执行数量即下一道工序的上限
        let previous_qty = match &wip {
            Some(w) => StepLedgerRepository::find_execution_tx(&conn, w.wip_item_id, w.current_step_id)?
                .map(|e| e.qty_in),
            None => None,
        };

        let target = match RoutingCore::resolve_target(&steps, current_step_id) {
            Ok(target) => target,
            Err(rejection @ RoutingRejection::InvalidCurrentStep { .. }) => {
                ctx.current_step_id = current_step_id;
                return Ok(ctx.blocked(&rejection.to_string()));
            }
            Err(rejection) => {
                ctx.current_step_id = current_step_id;
                ctx.previous_qty = previous_qty;
                ctx.max_qty = previous_qty;
                return Ok(ctx.blocked(&rejection.to_string()));
            }
        };

        // 5. 下一道工序与可推进判定
        let next_location = CatalogRepository::find_location_tx(&conn, target.target.location_id)?;
        let eligibility = RoutingCore::eligibility(wip.as_ref().map(|w| w.status), work_order.status);

        ctx.current_step_id = target.current.map(|s| s.route_step_id);
        ctx.next_step_id = Some(target.target.route_step_id);
        ctx.next_step_number = Some(target.target.step_number);
        ctx.next_step_location_id = Some(target.target.location_id);
        ctx.next_step_location_name = next_location.map(|l| l.name);
        ctx.previous_qty = previous_qty;
        ctx.max_qty = previous_qty;
        ctx.can_proceed = eligibility.can_proceed();
        ctx.message = eligibility.message().map(str::to_string);

        tracing::debug!(
            wo_number,
            device_id,
            next_step_id = target.target.route_step_id,
            can_proceed = ctx.can_proceed,
            "工单上下文预览"
        );
        Ok(ctx)
    }
}
