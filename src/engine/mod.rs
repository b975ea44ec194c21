// ==========================================
// 车队取货容量分配引擎 - 引擎层
// ==========================================
// 职责: 容量分配核心（等价解析、特殊编码过滤、地址块聚合、背包分配、车辆排序、编排）
// 红线: 引擎不读写文件；所有未分配结果必须输出 reason
// ==========================================

pub mod block_aggregator;
pub mod capacity_allocator;
pub mod equivalence;
pub mod error;
pub mod orchestrator;
pub mod special_reference;
pub mod vehicle_sequencer;

// 重导出核心引擎
pub use block_aggregator::{AggregationStats, BlockAggregator};
pub use capacity_allocator::{CapacityAllocator, SelectionScore};
pub use equivalence::{EquivalenceResolver, EquivalenceTable};
pub use error::{EngineError, EngineResult};
pub use orchestrator::{AllocationDriver, RunContext};
pub use special_reference::{SelectionStore, SpecialReference, SpecialReferenceFilter};
pub use vehicle_sequencer::VehicleSequencer;
