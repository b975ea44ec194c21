// ==========================================
// 车队取货容量分配引擎 - 配置层
// ==========================================
// 职责: 规划配置加载（JSON 文件 / 环境变量 / 默认值）与等价表加载
// ==========================================

pub mod config_manager;
pub mod equivalence_loader;
pub mod error;

// 重导出核心配置管理器
pub use config_manager::{
    config_keys, default_config_path, ColumnConfig, ConfigManager, ExportConfig, PlannerConfig,
};
pub use equivalence_loader::load_equivalence_table;
pub use error::{ConfigError, ConfigResult};
