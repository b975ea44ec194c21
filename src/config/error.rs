// ==========================================
// 车队取货容量分配引擎 - 配置层错误类型
// ==========================================

use std::path::PathBuf;
use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("配置文件解析失败 ({path}): {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("配置值非法 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("等价表格式不支持: {0}（仅支持 .json/.csv）")]
    UnsupportedFormat(String),

    #[error("配置序列化失败: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
