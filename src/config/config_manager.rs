// ==========================================
// 车队取货容量分配引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、快照
// 来源优先级: 显式路径 > 环境变量 > 用户配置目录 > 内置默认值
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ==========================================
// ColumnConfig - 必需列名（含别名）
// ==========================================
// 每个列表的第一个名称为标准列名，其余为别名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub status: Vec<String>,
    pub city: Vec<String>,
    pub address: Vec<String>,
    pub product_code: Vec<String>,
    pub reservation_date: Vec<String>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            status: names(&["Estado", "Status"]),
            city: names(&["Ciudad", "City"]),
            address: names(&["Direccion", "Dirección", "Address"]),
            product_code: names(&["Codigo", "Código", "Referencia", "Articulo"]),
            reservation_date: names(&["FechaReserva", "Fecha Reserva", "Fecha"]),
        }
    }
}

// ==========================================
// ExportConfig - 导出参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub section_name_max_len: usize,   // 分节名最大长度（Excel 工作表名上限 31）
    pub fallback_section_name: String, // 车牌清洗后为空时的分节名
    pub document_prefix: String,       // 文档名前缀
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            section_name_max_len: 31,
            fallback_section_name: "VEHICULO".to_string(),
            document_prefix: "plan_recogida".to_string(),
        }
    }
}

// ==========================================
// PlannerConfig - 规划配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub columns: ColumnConfig,
    pub active_status: String,                // 有效状态哨兵值
    pub display_columns: Option<Vec<String>>, // 透传列；None = 所有非必需列
    pub equivalence_path: Option<PathBuf>,    // 等价表路径
    pub export: ExportConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            columns: ColumnConfig::default(),
            active_status: "ACTIVO".to_string(),
            display_columns: None,
            equivalence_path: None,
            export: ExportConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// 校验配置值
    pub fn validate(&self) -> ConfigResult<()> {
        if self.active_status.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: config_keys::ACTIVE_STATUS.to_string(),
                value: self.active_status.clone(),
                message: "有效状态哨兵值不能为空".to_string(),
            });
        }
        if self.export.section_name_max_len < 4 {
            return Err(ConfigError::InvalidValue {
                key: config_keys::SECTION_NAME_MAX_LEN.to_string(),
                value: self.export.section_name_max_len.to_string(),
                message: "分节名长度上限至少为 4".to_string(),
            });
        }
        let required = [
            (config_keys::COLUMNS_STATUS, &self.columns.status),
            (config_keys::COLUMNS_CITY, &self.columns.city),
            (config_keys::COLUMNS_ADDRESS, &self.columns.address),
            (config_keys::COLUMNS_PRODUCT_CODE, &self.columns.product_code),
            (config_keys::COLUMNS_RESERVATION_DATE, &self.columns.reservation_date),
        ];
        for (key, names) in required {
            if names.iter().all(|n| n.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: "[]".to_string(),
                    message: "必需列至少需要一个列名".to_string(),
                });
            }
        }
        Ok(())
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: PlannerConfig,
    source: Option<PathBuf>, // None = 内置默认值
}

impl ConfigManager {
    /// 按优先级加载配置
    ///
    /// # 参数
    /// - explicit: 显式指定的配置文件（必须存在）
    ///
    /// # 返回
    /// - Ok(ConfigManager): 加载成功（无配置文件时使用默认值）
    /// - Err(ConfigError): 文件读取/解析失败或配置值非法
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(env_path) = std::env::var(config_keys::CONFIG_PATH_ENV) {
            if !env_path.trim().is_empty() {
                return Self::from_file(Path::new(env_path.trim()));
            }
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        debug!("未找到配置文件，使用内置默认配置");
        Ok(Self::from_config(PlannerConfig::default()))
    }

    /// 从 JSON 文件加载
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: PlannerConfig = serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;

        info!(path = %path.display(), "配置已加载");
        Ok(Self {
            config,
            source: Some(path.to_path_buf()),
        })
    }

    /// 直接使用给定配置（测试与嵌入场景）
    pub fn from_config(config: PlannerConfig) -> Self {
        Self {
            config,
            source: None,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn active_status(&self) -> &str {
        &self.config.active_status
    }

    pub fn columns(&self) -> &ColumnConfig {
        &self.config.columns
    }

    /// 等价表路径（相对路径按配置文件所在目录解析）
    pub fn equivalence_path(&self) -> Option<PathBuf> {
        let path = self.config.equivalence_path.as_ref()?;
        if path.is_absolute() {
            return Some(path.clone());
        }
        match self.source.as_ref().and_then(|s| s.parent()) {
            Some(dir) => Some(dir.join(path)),
            None => Some(path.clone()),
        }
    }

    /// 获取配置快照（JSON格式，随运行结果一并记录）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string(&self.config)?)
    }
}

/// 用户配置目录下的默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| {
        dir.join(config_keys::APP_DIR_NAME)
            .join(config_keys::CONFIG_FILE_NAME)
    })
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 配置来源
    pub const CONFIG_PATH_ENV: &str = "FLEET_PICKUP_CONFIG";
    pub const APP_DIR_NAME: &str = "fleet-pickup-alloc";
    pub const CONFIG_FILE_NAME: &str = "config.json";

    // 数据集
    pub const ACTIVE_STATUS: &str = "active_status";
    pub const COLUMNS_STATUS: &str = "columns.status";
    pub const COLUMNS_CITY: &str = "columns.city";
    pub const COLUMNS_ADDRESS: &str = "columns.address";
    pub const COLUMNS_PRODUCT_CODE: &str = "columns.product_code";
    pub const COLUMNS_RESERVATION_DATE: &str = "columns.reservation_date";

    // 等价表
    pub const EQUIVALENCE_PATH: &str = "equivalence_path";

    // 导出
    pub const SECTION_NAME_MAX_LEN: &str = "export.section_name_max_len";
}
