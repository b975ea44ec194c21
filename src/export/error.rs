// ==========================================
// 车队取货容量分配引擎 - 导出模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::UnitId;
use thiserror::Error;

/// 导出模块错误类型
#[derive(Error, Debug)]
pub enum ExportError {
    // ===== 组装错误 =====
    #[error("运行结果无分配单元，不生成导出文档")]
    EmptyDocument,

    #[error("分配结果引用了数据集中不存在的单元: {unit_id}")]
    MissingUnit { unit_id: UnitId },

    // ===== 写出错误 =====
    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result 类型别名
pub type ExportResult<T> = Result<T, ExportError>;
