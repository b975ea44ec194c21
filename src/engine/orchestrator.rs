// ==========================================
// 车队取货容量分配引擎 - 分配编排器
// ==========================================
// 用途: 协调一次完整规划运行
// 流程: 排序器定顺序 → 逐车聚合候选块（排除已占用）→ 背包选块 → 原子提交
// 红线: 车辆严格按顺序逐一处理；后车永远看不到前车已提交的地址块/单元
// ==========================================

use crate::domain::block::BlockSet;
use crate::domain::run::{EmptyRunReport, RunOutcome, RunReport, RunState, VehicleAllocation};
use crate::domain::types::{AllocationReason, ValidationIssue};
use crate::domain::unit::Dataset;
use crate::domain::vehicle::Vehicle;
use crate::engine::block_aggregator::{AggregationStats, BlockAggregator};
use crate::engine::capacity_allocator::CapacityAllocator;
use crate::engine::equivalence::EquivalenceResolver;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::special_reference::{SelectionStore, SpecialReferenceFilter};
use crate::engine::vehicle_sequencer::VehicleSequencer;
use chrono::Utc;
use tracing::{debug, info, instrument};

// ==========================================
// RunContext - 单次运行上下文
// ==========================================
// 用途: 运行期间只读的快照引用（数据集、车辆、等价表、勾选表）
pub struct RunContext<'a> {
    pub dataset: &'a Dataset,
    pub vehicles: &'a [Vehicle],
    pub resolver: &'a EquivalenceResolver,
    pub selection: &'a SelectionStore,
}

impl<'a> RunContext<'a> {
    /// 校验并构造运行上下文
    ///
    /// # 返回
    /// - Err(EngineError::Validation): 未加载数据集 / 无车辆 / 车辆参数非法
    pub fn new(
        dataset: Option<&'a Dataset>,
        vehicles: &'a [Vehicle],
        resolver: &'a EquivalenceResolver,
        selection: &'a SelectionStore,
    ) -> EngineResult<Self> {
        let dataset = dataset.ok_or(ValidationIssue::NoDataset)?;
        if vehicles.is_empty() {
            return Err(ValidationIssue::NoVehicles.into());
        }
        for v in vehicles {
            if v.capacity == 0 {
                return Err(ValidationIssue::NonPositiveCapacity {
                    plate: v.plate.clone(),
                    capacity: 0,
                }
                .into());
            }
            if v.city_pool.is_empty() {
                return Err(ValidationIssue::EmptyCityPool {
                    plate: v.plate.clone(),
                }
                .into());
            }
        }

        Ok(Self {
            dataset,
            vehicles,
            resolver,
            selection,
        })
    }
}

// ==========================================
// AllocationDriver - 分配编排器
// ==========================================
pub struct AllocationDriver {
    sequencer: VehicleSequencer,
    allocator: CapacityAllocator,
}

impl AllocationDriver {
    pub fn new() -> Self {
        Self {
            sequencer: VehicleSequencer::new(),
            allocator: CapacityAllocator::new(),
        }
    }

    /// 执行一次完整规划运行
    ///
    /// 运行状态只存在于本函数内部：任何计算失败都会丢弃整个 RunState，
    /// 不产生部分结果。
    ///
    /// # 返回
    /// - Ok(RunOutcome::Assigned): 至少分配了一个单元
    /// - Ok(RunOutcome::NoAssignment): 零分配（附诊断）
    /// - Err(EngineError::Computation): 内部失败
    #[instrument(skip_all, fields(
        dataset = %ctx.dataset.batch_id,
        units_count = ctx.dataset.len(),
        vehicles_count = ctx.vehicles.len()
    ))]
    pub fn run(&self, ctx: &RunContext<'_>) -> EngineResult<RunOutcome> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let units = ctx.dataset.units.as_slice();

        let aggregator = BlockAggregator::new(SpecialReferenceFilter::new(ctx.resolver, ctx.selection));

        // 1. 车辆顺序
        let contention_detected = self.sequencer.has_real_contention(ctx.vehicles);
        let order = self
            .sequencer
            .order(ctx.vehicles, |pool| aggregator.earliest_date_for_pool(units, pool));
        info!(run_id = %run_id, contention_detected, "开始规划运行");

        // 2. 逐车分配
        let mut state = RunState::new();
        for (position, vehicle) in order.into_iter().enumerate() {
            let (blocks, stats) = aggregator.build_blocks_with_stats(
                units,
                &vehicle.city_pool,
                state.used_blocks(),
                state.used_unit_ids(),
            )?;
            let allocation = self.allocate_vehicle(vehicle, position + 1, &blocks, stats)?;

            info!(
                vehicle = %vehicle.plate,
                capacity = vehicle.capacity,
                candidates = blocks.len(),
                selected_blocks = allocation.block_count(),
                occupied_weight = allocation.occupied_weight,
                reason = %allocation.reason,
                "车辆分配完成"
            );

            state
                .commit(allocation)
                .map_err(|msg| EngineError::computation("commit", msg))?;
        }

        // 3. 汇总结局
        let total_units_assigned = state.total_units_assigned();
        if total_units_assigned == 0 {
            let vehicle_reasons = state
                .allocations()
                .iter()
                .map(|a| (a.vehicle.id, a.vehicle.plate.clone(), a.reason))
                .collect();
            info!(run_id = %run_id, "本次运行零分配");
            return Ok(RunOutcome::NoAssignment(EmptyRunReport {
                run_id,
                dataset_batch_id: ctx.dataset.batch_id.clone(),
                active_units: ctx.dataset.len(),
                vehicle_reasons,
            }));
        }

        let allocations = state.into_allocations();
        let total_weight_assigned = allocations
            .iter()
            .map(|a| u64::from(a.occupied_weight))
            .sum();

        info!(
            run_id = %run_id,
            total_units_assigned,
            total_weight_assigned,
            "规划运行完成"
        );

        Ok(RunOutcome::Assigned(RunReport {
            run_id,
            dataset_batch_id: ctx.dataset.batch_id.clone(),
            started_at,
            finished_at: Utc::now(),
            contention_detected,
            allocations,
            total_units_assigned,
            total_weight_assigned,
            units_left_unassigned: ctx.dataset.len().saturating_sub(total_units_assigned),
        }))
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 单车选块并组装结果
    fn allocate_vehicle(
        &self,
        vehicle: &Vehicle,
        sequence_no: usize,
        blocks: &BlockSet,
        stats: AggregationStats,
    ) -> EngineResult<VehicleAllocation> {
        let selection = self.allocator.allocate(vehicle.capacity, blocks.as_slice());
        let chosen = self.allocator.selected_blocks(&selection, blocks.as_slice());

        let mut occupied_weight: u32 = 0;
        let mut keys = Vec::with_capacity(chosen.len());
        let mut unit_ids = Vec::new();
        for block in &chosen {
            occupied_weight = occupied_weight.checked_add(block.total_weight).ok_or_else(|| {
                EngineError::computation("allocation", format!("weight overflow at {}", block.key()))
            })?;
            keys.push(block.key());
            unit_ids.extend_from_slice(&block.unit_ids);
        }

        if u64::from(occupied_weight) != selection.weight {
            return Err(EngineError::computation(
                "allocation",
                format!(
                    "selected weight mismatch for {}: {} != {}",
                    vehicle.plate, occupied_weight, selection.weight
                ),
            ));
        }

        let reason = if chosen.is_empty() {
            diagnose(blocks, stats)
        } else {
            AllocationReason::Assigned
        };
        debug!(vehicle = %vehicle.plate, ?stats, %reason, "单车选块");

        Ok(VehicleAllocation {
            vehicle: vehicle.clone(),
            sequence_no,
            blocks: keys,
            unit_ids,
            occupied_weight,
            reason,
        })
    }
}

impl Default for AllocationDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// 车辆未分配到任何块时的原因
fn diagnose(blocks: &BlockSet, stats: AggregationStats) -> AllocationReason {
    if let Some(smallest_block_weight) = blocks.smallest_weight() {
        return AllocationReason::CapacityTooSmall {
            smallest_block_weight,
        };
    }
    if stats.claimed > 0 {
        AllocationReason::AllClaimedEarlier
    } else if stats.deselected > 0 {
        AllocationReason::AllSpecialDeselected
    } else {
        AllocationReason::NoUnitsForPool
    }
}
