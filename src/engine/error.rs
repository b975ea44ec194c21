// ==========================================
// 车队取货容量分配引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::ValidationIssue;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 运行前校验失败（未修改任何运行状态）
    #[error("校验失败: {0}")]
    Validation(#[from] ValidationIssue),

    /// 运行中的意外内部失败（本次运行整体作废）
    #[error("计算失败 (阶段 {stage}): {message}")]
    Computation { stage: &'static str, message: String },
}

impl EngineError {
    pub fn computation(stage: &'static str, message: impl Into<String>) -> Self {
        EngineError::Computation {
            stage,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
