// ==========================================
// 工单上下文预览集成测试
// ==========================================


use test_helpers::{seed_facility, PART_NUMBER};
use trackii_wip::api::error::ErrorKind;
use trackii_wip::api::scanner_api::{
    MSG_INVALID_DEVICE, MSG_NO_ACTIVE_ROUTE, MSG_WIP_ON_REWORK, MSG_WORK_ORDER_NOT_FOUND,
};
use trackii_wip::WorkOrderStatus;

#[test]
fn test_unknown_order_is_not_found() {
    let f = seed_facility();
    let ctx = f.state.scanner_api.get_work_order_context("NOPE", f.dev_a).unwrap();
    assert!(!ctx.found);
    assert!(!ctx.can_proceed);
    assert_eq!(ctx.message.as_deref(), Some(MSG_WORK_ORDER_NOT_FOUND));
}

#[test]
fn test_empty_order_number_is_validation_error() {
    let f = seed_facility();
    let err = f.state.scanner_api.get_work_order_context(" ", f.dev_a).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_new_order_targets_first_step() {
    let f = seed_facility();
    let wo = f.create_work_order("WO-CTX");

    let ctx = f.state.scanner_api.get_work_order_context("WO-CTX", f.dev_a).unwrap();
    assert!(ctx.found);
    assert!(ctx.can_proceed);
    assert!(ctx.is_first_step);
    assert_eq!(ctx.message, None);
    assert_eq!(ctx.work_order_id, Some(wo.work_order_id));
    assert_eq!(ctx.work_order_status, Some(WorkOrderStatus::Open));
    assert_eq!(ctx.part_number.as_deref(), Some(PART_NUMBER));
    assert_eq!(ctx.route_id, Some(f.route_id));
    assert_eq!(ctx.current_step_id, None);
    assert_eq!(ctx.next_step_id, Some(f.step(1).route_step_id));
    assert_eq!(ctx.next_step_number, Some(1));
    assert_eq!(ctx.next_step_location_id, Some(f.loc_a));
    assert_eq!(ctx.next_step_location_name.as_deref(), Some("LocA"));
    assert_eq!(ctx.previous_qty, None);
    assert_eq!(ctx.max_qty, None);
}

#[test]
fn test_started_order_surfaces_quantity_ceiling() {
    let f = seed_facility();
    f.create_work_order("WO-CEIL");
    f.scan("WO-CEIL", f.dev_a, 42).unwrap();

    let ctx = f.state.scanner_api.get_work_order_context("WO-CEIL", f.dev_b).unwrap();
    assert!(ctx.can_proceed);
    assert!(!ctx.is_first_step);
    assert_eq!(ctx.current_step_id, Some(f.step(1).route_step_id));
    assert_eq!(ctx.next_step_id, Some(f.step(2).route_step_id));
    assert_eq!(ctx.next_step_location_name.as_deref(), Some("LocB"));
    assert_eq!(ctx.previous_qty, Some(42));
    assert_eq!(ctx.max_qty, Some(42));
    assert_eq!(ctx.work_order_status, Some(WorkOrderStatus::InProgress));
}

#[test]
fn test_final_step_blocks_preview() {
    let f = seed_facility();
    f.create_work_order("WO-END");
    f.scan("WO-END", f.dev_a, 10).unwrap();
    f.scan("WO-END", f.dev_b, 10).unwrap();
    f.scan("WO-END", f.dev_c, 9).unwrap();

    let ctx = f.state.scanner_api.get_work_order_context("WO-END", f.dev_c).unwrap();
    assert!(ctx.found);
    assert!(!ctx.can_proceed);
    assert_eq!(ctx.message.as_deref(), Some("工单已处于末道工序"));
    assert_eq!(ctx.current_step_id, Some(f.step(3).route_step_id));
    assert_eq!(ctx.next_step_id, None);
    assert_eq!(ctx.max_qty, Some(9));
}

#[test]
fn test_hold_blocks_preview_with_rework_message() {
    let f = seed_facility();
    f.create_work_order("WO-HOLD");
    f.scan("WO-HOLD", f.dev_a, 10).unwrap();
    f.rework("WO-HOLD", f.dev_a, false).unwrap();

    let ctx = f.state.scanner_api.get_work_order_context("WO-HOLD", f.dev_b).unwrap();
    assert!(!ctx.can_proceed);
    assert_eq!(ctx.message.as_deref(), Some(MSG_WIP_ON_REWORK));
    assert_eq!(ctx.next_step_id, Some(f.step(2).route_step_id));
}

#[test]
fn test_cancelled_order_blocks_preview() {
    let f = seed_facility();
    f.create_work_order("WO-CAN");
    f.scrap("WO-CAN", f.dev_a).unwrap();

    let ctx = f.state.scanner_api.get_work_order_context("WO-CAN", f.dev_a).unwrap();
    assert!(ctx.found);
    assert!(!ctx.can_proceed);
    assert_eq!(ctx.work_order_status, Some(WorkOrderStatus::Cancelled));
    assert!(ctx.message.is_some());
    assert_ne!(ctx.message.as_deref(), Some(MSG_WIP_ON_REWORK));
}

#[test]
fn test_invalid_device_references_order_only() {
    let f = seed_facility();
    let wo = f.create_work_order("WO-DEV");

    let ctx = f.state.scanner_api.get_work_order_context("WO-DEV", 9999).unwrap();
    assert!(ctx.found);
    assert!(!ctx.can_proceed);
    assert_eq!(ctx.message.as_deref(), Some(MSG_INVALID_DEVICE));
    assert_eq!(ctx.work_order_id, Some(wo.work_order_id));
    assert_eq!(ctx.next_step_id, None);
}

#[test]
fn test_subfamily_without_route_blocks_preview() {
    let f = seed_facility();
    let catalog = f.state.catalog_repo.clone();
    let bare_subfamily = catalog.insert_subfamily("Bare").unwrap();
    let bare_product = catalog.insert_product(bare_subfamily, "PN-BARE", true).unwrap();
    f.work_order_repo().create("WO-BARE", bare_product).unwrap();

    let ctx = f.state.scanner_api.get_work_order_context("WO-BARE", f.dev_a).unwrap();
    assert!(ctx.found);
    assert!(!ctx.can_proceed);
    assert_eq!(ctx.message.as_deref(), Some(MSG_NO_ACTIVE_ROUTE));
    assert_eq!(ctx.route_id, None);
    assert_eq!(ctx.next_step_id, None);
}

#[test]
fn test_preview_performs_no_writes() {
    let f = seed_facility();
    f.create_work_order("WO-RO");
    for _ in 0..3 {
        f.state.scanner_api.get_work_order_context("WO-RO", f.dev_a).unwrap();
    }
    assert_eq!(f.count("SELECT COUNT(*) FROM wip_item"), 0);
    assert_eq!(f.count("SELECT COUNT(*) FROM scan_event"), 0);
}
