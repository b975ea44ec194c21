// ==========================================
// 车队取货容量分配引擎 - 核心库
// ==========================================
// 职责: 待取单元 → 地址块 → 逐车多准则 0/1 背包分配
// 红线: 同一次运行内地址/单元排他；占用不超容量
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 分配核心
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 导出层 - 运行结果文档
pub mod export;

// 配置层 - 规划配置与等价表
pub mod config;

// 日志系统
pub mod logging;

// API 层 - 规划上下文
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    AddressBlock, AllocationReason, Dataset, EmptyRunReport, PendingUnit, RunOutcome, RunReport,
    RunState, ValidationIssue, Vehicle, VehicleAllocation, VehicleRegistration, VehicleRegistry,
};

// 引擎
pub use engine::{
    AllocationDriver, BlockAggregator, CapacityAllocator, EngineError, EquivalenceResolver,
    EquivalenceTable, RunContext, SelectionScore, SelectionStore, SpecialReferenceFilter,
    VehicleSequencer,
};

// API
pub use api::{ApiError, PlanResponse, PlannerApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车队取货容量分配引擎";
