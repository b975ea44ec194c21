// ==========================================
// 车队取货容量分配引擎 - API层错误类型
// ==========================================
// 职责: 汇总各层错误，区分 "校验失败" 与 "计算失败"
// ==========================================

use crate::config::ConfigError;
use crate::domain::types::ValidationIssue;
use crate::engine::EngineError;
use crate::export::ExportError;
use crate::importer::ImportError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 运行前校验（未修改任何状态）
    // ==========================================
    #[error("校验失败: {0}")]
    Validation(#[from] ValidationIssue),

    // ==========================================
    // 运行中失败（本次运行作废，上次结果保留）
    // ==========================================
    #[error("计算失败: {0}")]
    Computation(String),

    // ==========================================
    // 外围协作方错误
    // ==========================================
    #[error("数据集导入失败: {0}")]
    Import(ImportError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("导出失败: {0}")]
    Export(#[from] ExportError),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(issue) => ApiError::Validation(issue),
            computation @ EngineError::Computation { .. } => ApiError::Computation(computation.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// 必需列缺失属于校验失败
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::MissingColumns(columns) => {
                ApiError::Validation(ValidationIssue::MissingColumns(columns))
            }
            other => ApiError::Import(other),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
