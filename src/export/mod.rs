// ==========================================
// 车队取货容量分配引擎 - 导出层
// ==========================================
// 职责: 运行结果 → 导出文档 → CSV 目录 / JSON
// 红线: 零分配的运行不生成文档
// ==========================================

pub mod document;
pub mod error;
pub mod writer;

pub use document::{document_name, sanitize, ExportDocument, ExportSection, SectionNamer, VehicleSummary};
pub use error::{ExportError, ExportResult};
pub use writer::{CsvDirectoryWriter, ExportWriter, JsonExportWriter, SUMMARY_FILE_NAME};
