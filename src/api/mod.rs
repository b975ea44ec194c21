// ==========================================
// 车队取货容量分配引擎 - API层
// ==========================================
// 职责: 面向调用方（CLI / 宿主程序）的规划上下文与错误汇总
// ==========================================

pub mod error;
pub mod planner_api;

pub use error::{ApiError, ApiResult};
pub use planner_api::{PlanResponse, PlannerApi};
