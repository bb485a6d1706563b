// ==========================================
// 扫码相关 HTTP 处理函数
// ==========================================

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiResult;
use crate::api::scanner_api::{
    LocationDto, PartLookupResponse, RegisterScanRequest, RegisterScanResponse, ReworkRequest,
    ReworkResponse, ScrapRequest, ScrapResponse, WorkOrderContextResponse,
    WorkOrderHistoryResponse,
};

use super::common::run_blocking;
use super::SharedState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ContextQuery {
    #[serde(default)]
    device_id: i64,
}

/// GET /api/locations
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub(super) async fn list_locations(State(state): State<SharedState>) -> ApiResult<Json<Vec<LocationDto>>> {
    run_blocking(&state, |api| api.list_active_locations()).await
}

/// GET /api/scanner/part/{part_number}
#[tracing::instrument(skip(state), fields(request_id = %uuid::Uuid::new_v4()))]
pub(super) async fn lookup_part(
    State(state): State<SharedState>,
    Path(part_number): Path<String>,
) -> ApiResult<Json<PartLookupResponse>> {
    run_blocking(&state, move |api| api.lookup_part(&part_number)).await
}

/// GET /api/scanner/work-orders/{wo_number}/context?deviceId=
#[tracing::instrument(skip(state), fields(request_id = %uuid::Uuid::new_v4()))]
pub(super) async fn get_context(
    State(state): State<SharedState>,
    Path(wo_number): Path<String>,
    Query(query): Query<ContextQuery>,
) -> ApiResult<Json<WorkOrderContextResponse>> {
    run_blocking(&state, move |api| {
        api.get_work_order_context(&wo_number, query.device_id)
    })
    .await
}

/// GET /api/scanner/work-orders/{wo_number}/history
#[tracing::instrument(skip(state), fields(request_id = %uuid::Uuid::new_v4()))]
pub(super) async fn get_history(
    State(state): State<SharedState>,
    Path(wo_number): Path<String>,
) -> ApiResult<Json<WorkOrderHistoryResponse>> {
    run_blocking(&state, move |api| api.get_work_order_history(&wo_number)).await
}

/// POST /api/scanner/register
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub(super) async fn register(
    State(state): State<SharedState>,
    Json(request): Json<RegisterScanRequest>,
) -> ApiResult<Json<RegisterScanResponse>> {
    run_blocking(&state, move |api| api.register_scan(&request)).await
}

/// POST /api/scanner/scrap
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub(super) async fn scrap(
    State(state): State<SharedState>,
    Json(request): Json<ScrapRequest>,
) -> ApiResult<Json<ScrapResponse>> {
    run_blocking(&state, move |api| api.scrap(&request)).await
}

/// POST /api/scanner/rework
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub(super) async fn rework(
    State(state): State<SharedState>,
    Json(request): Json<ReworkRequest>,
) -> ApiResult<Json<ReworkResponse>> {
    run_blocking(&state, move |api| api.rework(&request)).await
}
