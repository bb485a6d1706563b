// ==========================================
// 报废 / 返工集成测试
// ==========================================


use test_helpers::seed_facility;
use trackii_wip::api::error::ErrorKind;
use trackii_wip::api::scanner_api::{
    ReworkRequest, ScrapRequest, MSG_REWORK_CLOSED_ORDER, MSG_REWORK_CLOSED_WIP, MSG_REWORK_HOLD,
    MSG_REWORK_RELEASED, MSG_SCRAPPED, MSG_SCRAP_FINISHED, MSG_WIP_NOT_FOUND, MSG_WIP_ON_REWORK,
    MSG_WORK_ORDER_CANCELLED, MSG_WORK_ORDER_NOT_FOUND,
};
use trackii_wip::domain::ScanType;
use trackii_wip::{ApiError, WipStatus, WorkOrderStatus};

// ==========================================
// 报废
// ==========================================

#[test]
fn test_scrap_with_wip_cancels_order_and_scraps_wip() {
    let f = seed_facility();
    let wo = f.create_work_order("WO-SCRAP");
    f.scan("WO-SCRAP", f.dev_a, 10).unwrap();
    let second = f.scan("WO-SCRAP", f.dev_b, 10).unwrap();

    let response = f.scrap("WO-SCRAP", f.dev_b).unwrap();
    assert_eq!(response.message, MSG_SCRAPPED);
    assert_eq!(response.work_order_id, wo.work_order_id);
    assert_eq!(response.wip_item_id, Some(second.wip_item_id));

    assert_eq!(
        f.find_work_order("WO-SCRAP").unwrap().status,
        WorkOrderStatus::Cancelled
    );
    let wip = f.wip_repo().find_by_id(second.wip_item_id).unwrap().unwrap();
    assert_eq!(wip.status, WipStatus::Scrapped);

    // ERROR 事件记录在当前工序
    let events = f.ledger_repo().list_scan_events(wip.wip_item_id).unwrap();
    let last = events.last().unwrap();
    assert_eq!(last.scan_type, ScanType::Error);
    assert_eq!(last.route_step_id, f.step(2).route_step_id);

    // 报废后登记被拒绝
    let err = f.scan("WO-SCRAP", f.dev_c, 10).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
    assert_eq!(err.reason(), MSG_WORK_ORDER_CANCELLED);
}

#[test]
fn test_scrap_without_wip_only_cancels_order() {
    let f = seed_facility();
    f.create_work_order("WO-EARLY");

    let response = f.scrap("WO-EARLY", f.dev_warehouse).unwrap();
    assert_eq!(response.wip_item_id, None);
    assert_eq!(
        f.find_work_order("WO-EARLY").unwrap().status,
        WorkOrderStatus::Cancelled
    );
    assert_eq!(f.count("SELECT COUNT(*) FROM scan_event"), 0);
}

#[test]
fn test_scrap_rejects_terminal_orders() {
    let f = seed_facility();
    f.create_work_order("WO-DONE");
    f.scan("WO-DONE", f.dev_a, 10).unwrap();
    f.scan("WO-DONE", f.dev_b, 10).unwrap();
    f.scan("WO-DONE", f.dev_c, 10).unwrap();

    let err = f.scrap("WO-DONE", f.dev_c).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
    assert_eq!(err.reason(), MSG_SCRAP_FINISHED);

    f.create_work_order("WO-TWICE");
    f.scrap("WO-TWICE", f.dev_a).unwrap();
    let err = f.scrap("WO-TWICE", f.dev_a).unwrap_err();
    assert_eq!(err.reason(), MSG_WORK_ORDER_CANCELLED);
}

#[test]
fn test_scrap_validates_actor_and_order() {
    let f = seed_facility();
    f.create_work_order("WO-GUARD");

    let err = f
        .state
        .scanner_api
        .scrap(&ScrapRequest {
            work_order_number: "WO-GUARD".to_string(),
            user_id: f.other_user_id,
            device_id: f.dev_a,
            reason: None,
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(
        f.find_work_order("WO-GUARD").unwrap().status,
        WorkOrderStatus::Open
    );

    let err = f.scrap("WO-MISSING", f.dev_a).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.reason(), MSG_WORK_ORDER_NOT_FOUND);

    let err = f.scrap("", f.dev_a).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ==========================================
// 返工
// ==========================================

#[test]
fn test_rework_hold_blocks_scans_until_released() {
    let f = seed_facility();
    f.create_work_order("WO-RW");
    let first = f.scan("WO-RW", f.dev_a, 30).unwrap();

    let held = f.rework("WO-RW", f.dev_a, false).unwrap();
    assert_eq!(held.message, MSG_REWORK_HOLD);
    assert_eq!(held.wip_status, WipStatus::Hold);
    assert_eq!(held.wip_item_id, first.wip_item_id);

    let err = f.scan("WO-RW", f.dev_b, 30).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
    assert_eq!(err.reason(), MSG_WIP_ON_REWORK);

    let released = f.rework("WO-RW", f.dev_a, true).unwrap();
    assert_eq!(released.message, MSG_REWORK_RELEASED);
    assert_eq!(released.wip_status, WipStatus::Active);

    let second = f.scan("WO-RW", f.dev_b, 30).unwrap();
    assert_eq!(second.route_step_id, f.step(2).route_step_id);

    // 每次返工各一条记录，记录设备所在站点
    let logs = f.ledger_repo().list_rework_logs(first.wip_item_id).unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l.location_id == f.loc_a && l.qty == 5));
    assert_eq!(logs[0].reason.as_deref(), Some("尺寸超差"));
}

#[test]
fn test_rework_requires_existing_wip() {
    let f = seed_facility();
    f.create_work_order("WO-NOWIP");

    let err = f.rework("WO-NOWIP", f.dev_a, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.reason(), MSG_WIP_NOT_FOUND);

    let err = f.rework("WO-MISSING", f.dev_a, false).unwrap_err();
    assert_eq!(err.reason(), MSG_WORK_ORDER_NOT_FOUND);
}

#[test]
fn test_rework_rejects_closed_orders() {
    let f = seed_facility();
    f.create_work_order("WO-CLOSED");
    f.scan("WO-CLOSED", f.dev_a, 10).unwrap();
    f.scrap("WO-CLOSED", f.dev_a).unwrap();

    let err = f.rework("WO-CLOSED", f.dev_a, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
    assert_eq!(err.reason(), MSG_REWORK_CLOSED_ORDER);
    assert_eq!(f.count("SELECT COUNT(*) FROM wip_rework_log"), 0);

    // 工单仍在生产但 WIP 已结束的情况通过直接改库构造
    f.create_work_order("WO-WIPDONE");
    let first = f.scan("WO-WIPDONE", f.dev_a, 10).unwrap();
    {
        let conn = f.conn.lock().unwrap();
        conn.execute(
            "UPDATE wip_item SET status = 'FINISHED' WHERE wip_item_id = ?1",
            [first.wip_item_id],
        )
        .unwrap();
    }
    let err = f.rework("WO-WIPDONE", f.dev_a, true).unwrap_err();
    assert_eq!(err.reason(), MSG_REWORK_CLOSED_WIP);
}

#[test]
fn test_rework_validates_quantity() {
    let f = seed_facility();
    f.create_work_order("WO-RWQ");
    f.scan("WO-RWQ", f.dev_a, 10).unwrap();

    let err = f
        .state
        .scanner_api
        .rework(&ReworkRequest {
            work_order_number: "WO-RWQ".to_string(),
            quantity: 0,
            user_id: f.user_id,
            device_id: f.dev_a,
            reason: None,
            completed: false,
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ==========================================
// 履历与查询
// ==========================================

#[test]
fn test_history_reflects_ledger() {
    let f = seed_facility();
    f.create_work_order("WO-HIST");
    f.scan("WO-HIST", f.dev_a, 10).unwrap();
    f.rework("WO-HIST", f.dev_a, false).unwrap();
    f.rework("WO-HIST", f.dev_a, true).unwrap();
    f.scan("WO-HIST", f.dev_b, 10).unwrap();
    let _ = f.scan("WO-HIST", f.dev_b, 10).unwrap_err();

    let history = f.state.scanner_api.get_work_order_history("WO-HIST").unwrap();
    assert_eq!(history.work_order.wo_number, "WO-HIST");
    assert!(history.wip_item.is_some());
    assert_eq!(history.executions.len(), 2);
    assert_eq!(history.rework_logs.len(), 2);
    let types: Vec<ScanType> = history.scan_events.iter().map(|e| e.scan_type).collect();
    assert_eq!(types, vec![ScanType::Entry, ScanType::Entry, ScanType::Error]);

    let history = {
        f.create_work_order("WO-FRESH");
        f.state.scanner_api.get_work_order_history("WO-FRESH").unwrap()
    };
    assert!(history.wip_item.is_none());
    assert!(history.executions.is_empty());

    let err = f.state.scanner_api.get_work_order_history("WO-NONE").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_lookup_part_records_unregistered_parts() {
    let f = seed_facility();

    let found = f.state.scanner_api.lookup_part(test_helpers::PART_NUMBER).unwrap();
    assert!(found.found);
    assert_eq!(found.product_id, Some(f.product_id));
    assert_eq!(found.subfamily_name.as_deref(), Some("Harness"));
    assert_eq!(found.active_route_id, Some(f.route_id));

    let missing = f.state.scanner_api.lookup_part("PN-UNKNOWN").unwrap();
    assert!(!missing.found);
    assert!(missing.message.is_some());

    let parts = f.state.catalog_repo.list_unregistered_parts(10).unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].part_number, "PN-UNKNOWN");
}

#[test]
fn test_active_locations_sorted_by_name() {
    let f = seed_facility();
    f.state.catalog_repo.insert_location("Closed", false).unwrap();

    let names: Vec<String> = f
        .state
        .scanner_api
        .list_active_locations()
        .unwrap()
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(names, vec!["LocA", "LocB", "LocC", "Warehouse"]);
}
