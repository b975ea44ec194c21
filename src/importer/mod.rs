// ==========================================
// 车队取货容量分配引擎 - 导入层
// ==========================================
// 职责: 外部表格 → 已校验的 Dataset 快照
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod dataset_importer;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use dataset_importer::DatasetImporter;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ColumnMapping, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use importer_trait::{FileParser, RawRow, RawTable};
