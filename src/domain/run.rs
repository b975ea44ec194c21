// ==========================================
// 车队取货容量分配引擎 - 运行状态与结果
// ==========================================
// 职责: 单次规划运行的排他状态、每车结果、运行结局
// 红线: RunState 只增不减；各车的地址块集合/单元集合两两不相交
// ==========================================

use crate::domain::block::BlockKey;
use crate::domain::types::{AllocationReason, UnitId, VehicleId};
use crate::domain::vehicle::Vehicle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// VehicleAllocation - 单车分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleAllocation {
    pub vehicle: Vehicle,
    pub sequence_no: usize,       // 处理顺序（从 1 开始）
    pub blocks: Vec<BlockKey>,    // 选中的地址块
    pub unit_ids: Vec<UnitId>,    // 分配的单元
    pub occupied_weight: u32,     // 已占用容量
    pub reason: AllocationReason,
}

impl VehicleAllocation {
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// 选中块的地址（处理顺序）
    pub fn addresses(&self) -> Vec<&str> {
        self.blocks.iter().map(|k| k.address.as_str()).collect()
    }

    pub fn unit_count(&self) -> usize {
        self.unit_ids.len()
    }

    pub fn free_capacity(&self) -> u32 {
        self.vehicle.capacity.saturating_sub(self.occupied_weight)
    }
}

// ==========================================
// RunState - 运行期排他状态
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RunState {
    used_blocks: HashSet<BlockKey>,
    used_unit_ids: HashSet<UnitId>,
    allocations: Vec<VehicleAllocation>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn used_blocks(&self) -> &HashSet<BlockKey> {
        &self.used_blocks
    }

    pub fn used_unit_ids(&self) -> &HashSet<UnitId> {
        &self.used_unit_ids
    }

    pub fn allocations(&self) -> &[VehicleAllocation] {
        &self.allocations
    }

    /// 原子提交单车结果
    ///
    /// 先整体校验，再写入；任何地址块或单元已被占用、或超出容量时拒绝提交，
    /// 状态保持不变。
    ///
    /// # 返回
    /// - Ok(()): 提交成功
    /// - Err(String): 违反排他/容量约束的诊断信息
    pub fn commit(&mut self, allocation: VehicleAllocation) -> Result<(), String> {
        if allocation.occupied_weight > allocation.vehicle.capacity {
            return Err(format!(
                "vehicle {} occupied_weight {} exceeds capacity {}",
                allocation.vehicle.plate, allocation.occupied_weight, allocation.vehicle.capacity
            ));
        }
        if let Some(key) = allocation
            .blocks
            .iter()
            .find(|k| self.used_blocks.contains(*k))
        {
            return Err(format!("block {} already committed", key));
        }
        if let Some(id) = allocation
            .unit_ids
            .iter()
            .find(|id| self.used_unit_ids.contains(*id))
        {
            return Err(format!("unit {} already committed", id));
        }

        self.used_blocks.extend(allocation.blocks.iter().cloned());
        self.used_unit_ids.extend(allocation.unit_ids.iter().copied());
        self.allocations.push(allocation);
        Ok(())
    }

    pub fn total_units_assigned(&self) -> usize {
        self.allocations.iter().map(|a| a.unit_count()).sum()
    }

    pub fn into_allocations(self) -> Vec<VehicleAllocation> {
        self.allocations
    }
}

// ==========================================
// RunReport - 有分配的运行结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub dataset_batch_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub contention_detected: bool,
    pub allocations: Vec<VehicleAllocation>, // 处理顺序
    pub total_units_assigned: usize,
    pub total_weight_assigned: u64,
    pub units_left_unassigned: usize,
}

impl RunReport {
    pub fn allocation_for(&self, vehicle_id: VehicleId) -> Option<&VehicleAllocation> {
        self.allocations.iter().find(|a| a.vehicle.id == vehicle_id)
    }
}

// ==========================================
// EmptyRunReport - 零分配结局的诊断
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmptyRunReport {
    pub run_id: String,
    pub dataset_batch_id: String,
    pub active_units: usize,
    pub vehicle_reasons: Vec<(VehicleId, String, AllocationReason)>, // (车辆 ID, 车牌, 原因)
}

impl EmptyRunReport {
    /// 多行诊断文本（供调用方展示）
    pub fn diagnosis(&self) -> String {
        let mut lines = vec![format!(
            "no units assigned (active units in dataset: {})",
            self.active_units
        )];
        for (id, plate, reason) in &self.vehicle_reasons {
            lines.push(format!("  vehicle #{} [{}]: {}", id, plate, reason));
        }
        lines.join("\n")
    }
}

// ==========================================
// RunOutcome - 运行结局
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    Assigned(RunReport),
    NoAssignment(EmptyRunReport),
}

impl RunOutcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, RunOutcome::Assigned(_))
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Assigned(report) => Some(report),
            RunOutcome::NoAssignment(_) => None,
        }
    }
}
