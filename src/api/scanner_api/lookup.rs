use super::*;

pub const MSG_PART_NOT_REGISTERED: &str = "产品未登记，请联系工程部门";

impl ScannerApi {
    // ==========================================
    // 零件查询
    // ==========================================

    /// 按零件号查询产品
    ///
    /// 产品不存在或未启用时记录一条未登记零件，供工程部门补录
    pub fn lookup_part(&self, part_number: &str) -> ApiResult<PartLookupResponse> {
        let part_number = ScanOperationValidator::require_part_number(part_number)?;

        let found = {
            let conn = self.get_conn()?;
            match CatalogRepository::find_active_product_by_part_tx(&conn, part_number)? {
                Some(product) => CatalogRepository::find_subfamily_tx(&conn, product.subfamily_id)?
                    .map(|subfamily| (product, subfamily)),
                None => None,
            }
        };

        let Some((product, subfamily)) = found else {
            let part_id = self.catalog_repo.insert_unregistered_part(part_number)?;
            tracing::warn!(part_number, part_id, "扫到未登记零件");
            return Ok(PartLookupResponse {
                found: false,
                message: Some(MSG_PART_NOT_REGISTERED.to_string()),
                part_number: part_number.to_string(),
                product_id: None,
                subfamily_id: None,
                subfamily_name: None,
                active_route_id: None,
            });
        };

        Ok(PartLookupResponse {
            found: true,
            message: None,
            part_number: part_number.to_string(),
            product_id: Some(product.product_id),
            subfamily_id: Some(subfamily.subfamily_id),
            subfamily_name: Some(subfamily.name),
            active_route_id: subfamily.active_route_id,
        })
    }

    // ==========================================
    // 站点列表
    // ==========================================

    /// 启用站点（按名称排序）
    pub fn list_active_locations(&self) -> ApiResult<Vec<LocationDto>> {
        let locations = self.catalog_repo.list_active_locations()?;
        Ok(locations
            .into_iter()
            .map(|l| LocationDto {
                id: l.location_id,
                name: l.name,
            })
            .collect())
    }

    // ==========================================
    // 工单履历
    // ==========================================

    /// 工单履历（工序执行、扫码事件、返工记录）
    pub fn get_work_order_history(&self, wo_number: &str) -> ApiResult<WorkOrderHistoryResponse> {
        let wo_number = ScanOperationValidator::require_wo_number(wo_number)?;

        let work_order = self
            .work_order_repo
            .find_by_number(wo_number)?
            .ok_or_else(|| ApiError::NotFound(MSG_WORK_ORDER_NOT_FOUND.to_string()))?;

        let Some(wip_item) = self.wip_repo.find_by_work_order(work_order.work_order_id)? else {
            return Ok(WorkOrderHistoryResponse {
                work_order,
                wip_item: None,
                executions: Vec::new(),
                scan_events: Vec::new(),
                rework_logs: Vec::new(),
            });
        };

        let executions = self.ledger_repo.list_executions(wip_item.wip_item_id)?;
        let scan_events = self.ledger_repo.list_scan_events(wip_item.wip_item_id)?;
        let rework_logs = self.ledger_repo.list_rework_logs(wip_item.wip_item_id)?;

        Ok(WorkOrderHistoryResponse {
            work_order,
            wip_item: Some(wip_item),
            executions,
            scan_events,
            rework_logs,
        })
    }
}
