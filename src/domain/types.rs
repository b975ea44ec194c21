// ==========================================
// 车队取货容量分配引擎 - 领域类型定义
// ==========================================
// 职责: 跨层共享的值类型（归一化键、分配原因、校验问题）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 单元 ID（数据集内稳定，按导入顺序从 0 递增）
pub type UnitId = usize;

/// 车辆 ID（登记顺序，从 1 递增）
pub type VehicleId = usize;

// ==========================================
// 键归一化
// ==========================================

/// 归一化城市/地址/产品编码
///
/// 规则: TRIM + 合并内部连续空白 + UPPER
///
/// # 示例
/// ```
/// use fleet_pickup_alloc::domain::types::normalize_key;
/// assert_eq!(normalize_key("  calle 10   # 4-20 "), "CALLE 10 # 4-20");
/// ```
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

// ==========================================
// 分配原因 (Allocation Reason)
// ==========================================
// 红线: 每辆车的分配结果必须输出 reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
pub enum AllocationReason {
    /// 已分配至少一个地址块
    Assigned,
    /// 车辆城市池内没有任何待取单元
    NoUnitsForPool,
    /// 城市池内的单元全部因特殊编码被取消勾选
    AllSpecialDeselected,
    /// 存在候选地址块，但每个块的重量都超过车辆容量
    CapacityTooSmall { smallest_block_weight: u32 },
    /// 候选地址块已全部被之前的车辆占用
    AllClaimedEarlier,
}

impl AllocationReason {
    pub fn is_assigned(&self) -> bool {
        matches!(self, AllocationReason::Assigned)
    }
}

impl fmt::Display for AllocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationReason::Assigned => write!(f, "ASSIGNED"),
            AllocationReason::NoUnitsForPool => write!(f, "NO_UNITS_FOR_POOL"),
            AllocationReason::AllSpecialDeselected => write!(f, "ALL_SPECIAL_DESELECTED"),
            AllocationReason::CapacityTooSmall {
                smallest_block_weight,
            } => write!(
                f,
                "CAPACITY_TOO_SMALL: smallest_block_weight={}",
                smallest_block_weight
            ),
            AllocationReason::AllClaimedEarlier => write!(f, "ALL_CLAIMED_EARLIER"),
        }
    }
}

// ==========================================
// 校验问题 (Validation Issue)
// ==========================================
// 用途: 运行前校验失败的具体原因（不修改任何运行状态）
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("尚未加载数据集")]
    NoDataset,

    #[error("尚未登记任何车辆")]
    NoVehicles,

    #[error("车辆容量必须为正数: plate={plate}, capacity={capacity}")]
    NonPositiveCapacity { plate: String, capacity: i64 },

    #[error("车辆城市池为空: plate={plate}")]
    EmptyCityPool { plate: String },

    #[error("数据集缺少必需列: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}
