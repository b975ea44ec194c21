// ==========================================
// 车队取货容量分配引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型
// 红线: 不含文件读写逻辑,不含引擎逻辑
// ==========================================

pub mod block;
pub mod run;
pub mod types;
pub mod unit;
pub mod vehicle;

// 重导出核心类型
pub use block::{age_score, AddressBlock, BlockKey, BlockSet};
pub use run::{EmptyRunReport, RunOutcome, RunReport, RunState, VehicleAllocation};
pub use types::{normalize_key, AllocationReason, UnitId, ValidationIssue, VehicleId};
pub use unit::{Dataset, PendingUnit};
pub use vehicle::{Vehicle, VehicleRegistration, VehicleRegistry};
