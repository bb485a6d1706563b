// ==========================================
// 工单流转追踪系统 - Routing Core 纯函数库
// ==========================================
// 职责: 目标工序解析、数量上限校验、错站归因、预览可推进判定
// 红线: 无状态、无副作用、无 I/O 操作
// 约定: 工序序列按工序号升序传入；下一道工序沿 next_step_id 查找
// ==========================================

use crate::domain::route::RouteStep;
use crate::domain::types::{WipStatus, WorkOrderStatus};
use thiserror::Error;

// ==========================================
// 引擎拒绝原因
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingRejection {
    #[error("路线未配置工序")]
    EmptyRoute,

    #[error("当前工序无效")]
    InvalidCurrentStep { current_step_id: i64 },

    #[error("工单已处于末道工序")]
    AlreadyFinalStep { current_step_id: i64 },

    #[error("未找到上一工序的数量记录")]
    MissingPreviousQuantity,

    #[error("数量超过允许上限（{qty} > {max_qty}）")]
    QuantityExceedsCeiling { qty: u32, max_qty: u32 },
}

// ==========================================
// TargetStep - 目标工序解析结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetStep<'a> {
    /// 当前所在工序（尚未开工时为 None）
    pub current: Option<&'a RouteStep>,
    /// 本次登记应落到的工序
    pub target: &'a RouteStep,
}

impl TargetStep<'_> {
    pub fn is_first_step(&self) -> bool {
        self.current.is_none()
    }

    /// 目标工序是否为路线末道工序
    pub fn is_final_step(&self) -> bool {
        self.target.is_final()
    }
}

/// WIP 挂起返工时的提示（预览与登记共用）
pub const MSG_WIP_ON_REWORK: &str = "WIP 正在返工";

// ==========================================
// Eligibility - 预览可推进判定
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    CanProceed,
    OnRework,
    Blocked,
}

impl Eligibility {
    pub fn can_proceed(&self) -> bool {
        matches!(self, Eligibility::CanProceed)
    }

    /// 不可推进时给出提示
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Eligibility::CanProceed => None,
            Eligibility::OnRework => Some(MSG_WIP_ON_REWORK),
            Eligibility::Blocked => Some("工单当前状态不允许推进"),
        }
    }
}

// ==========================================
// RoutingCore - 纯函数工具类
// ==========================================
pub struct RoutingCore;

impl RoutingCore {
    /// 按ID在工序序列中查找
    pub fn find_step(steps: &[RouteStep], route_step_id: i64) -> Option<&RouteStep> {
        steps.iter().find(|s| s.route_step_id == route_step_id)
    }

    /// 解析本次登记的目标工序
    ///
    /// # 规则
    /// - 无 WIP: 首道工序（工序号最小）
    /// - 有 WIP: 当前工序的 next_step_id 所指工序
    ///
    /// # 返回
    /// - Err(EmptyRoute): 工序序列为空
    /// - Err(InvalidCurrentStep): 当前工序不在序列中，或其后继指针悬空
    /// - Err(AlreadyFinalStep): 当前工序已是末道
    pub fn resolve_target(
        steps: &[RouteStep],
        current_step_id: Option<i64>,
    ) -> Result<TargetStep<'_>, RoutingRejection> {
        let first = steps.first().ok_or(RoutingRejection::EmptyRoute)?;

        let Some(current_step_id) = current_step_id else {
            return Ok(TargetStep {
                current: None,
                target: first,
            });
        };

        let current = Self::find_step(steps, current_step_id)
            .ok_or(RoutingRejection::InvalidCurrentStep { current_step_id })?;

        let next_id = current
            .next_step_id
            .ok_or(RoutingRejection::AlreadyFinalStep { current_step_id })?;

        let target = Self::find_step(steps, next_id)
            .ok_or(RoutingRejection::InvalidCurrentStep { current_step_id })?;

        Ok(TargetStep {
            current: Some(current),
            target,
        })
    }

    /// 校验登记数量是否在上一工序带入数量之内
    ///
    /// # 参数
    /// - is_first_step: 首道工序不设上限
    /// - previous_qty: 当前工序执行记录中的数量
    pub fn check_quantity(
        qty: u32,
        is_first_step: bool,
        previous_qty: Option<u32>,
    ) -> Result<(), RoutingRejection> {
        if is_first_step {
            return Ok(());
        }

        let max_qty = previous_qty.ok_or(RoutingRejection::MissingPreviousQuantity)?;
        if qty > max_qty {
            return Err(RoutingRejection::QuantityExceedsCeiling { qty, max_qty });
        }
        Ok(())
    }

    /// 错站归因: 审计事件记到设备所在站点对应的工序上，找不到时记到目标工序
    pub fn attempted_step<'a>(
        steps: &'a [RouteStep],
        device_location_id: i64,
        target: &'a RouteStep,
    ) -> &'a RouteStep {
        steps
            .iter()
            .find(|s| s.location_id == device_location_id)
            .unwrap_or(target)
    }

    /// 预览用: 综合 WIP 状态与工单状态判定是否可推进
    pub fn eligibility(wip_status: Option<WipStatus>, work_order_status: WorkOrderStatus) -> Eligibility {
        if wip_status == Some(WipStatus::Hold) {
            return Eligibility::OnRework;
        }
        if work_order_status.is_terminal() {
            return Eligibility::Blocked;
        }
        Eligibility::CanProceed
    }
}
