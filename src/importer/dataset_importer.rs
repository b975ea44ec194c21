// ==========================================
// 车队取货容量分配引擎 - 数据集导入器
// ==========================================
// 职责: 整合导入流程，从文件到 Dataset 快照
// 流程: 解析 → 列映射 → 有效状态过滤 → 清洗 → 组装
// ==========================================

use crate::config::PlannerConfig;
use crate::domain::unit::Dataset;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::RawTable;
use chrono::Utc;
use std::path::Path;
use tracing::{debug, info, instrument};
use uuid::Uuid;

// ==========================================
// DatasetImporter - 数据集导入器
// ==========================================
pub struct DatasetImporter<'a> {
    config: &'a PlannerConfig,
    file_parser: UniversalFileParser,
    data_cleaner: DataCleaner,
}

impl<'a> DatasetImporter<'a> {
    pub fn new(config: &'a PlannerConfig) -> Self {
        Self {
            config,
            file_parser: UniversalFileParser,
            data_cleaner: DataCleaner,
        }
    }

    /// 从文件导入数据集（.csv / .xlsx / .xls）
    ///
    /// # 返回
    /// - Ok(Dataset): 仅包含有效状态的行；可能为空
    /// - Err(ImportError): 文件错误或必需列缺失
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Dataset> {
        let path = file_path.as_ref();
        info!("开始导入数据集");

        // === 步骤 1: 解析文件 ===
        let table = self.file_parser.parse(path)?;
        debug!(rows = table.rows.len(), columns = table.headers.len(), "文件解析完成");

        let source_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        self.import_table(&source_name, &table)
    }

    /// 从已解析的原始表构建数据集
    pub fn import_table(&self, source_name: &str, table: &RawTable) -> ImportResult<Dataset> {
        // === 步骤 2: 列映射 ===
        let mapper = FieldMapper::new(
            &self.config.columns,
            self.config.display_columns.as_deref(),
        );
        let mapping = mapper.resolve(&table.headers)?;

        // === 步骤 3: 有效状态过滤 + 清洗 ===
        let mut units = Vec::new();
        let mut inactive_rows = 0;
        for row in &table.rows {
            if !mapper.is_active(&mapping, row, &self.config.active_status) {
                inactive_rows += 1;
                continue;
            }
            let id = units.len();
            units.push(mapper.map_row(&mapping, row, id, &self.data_cleaner));
        }

        let dataset = Dataset {
            batch_id: Uuid::new_v4().to_string(),
            source_name: source_name.to_string(),
            loaded_at: Utc::now(),
            display_columns: mapping.display_columns,
            units,
            total_rows: table.rows.len(),
            inactive_rows,
        };

        info!(
            batch_id = %dataset.batch_id,
            total_rows = dataset.total_rows,
            active_rows = dataset.len(),
            inactive_rows = dataset.inactive_rows,
            "数据集导入完成"
        );
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::ImportError;
    use crate::importer::importer_trait::RawRow;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let rows = rows
            .iter()
            .enumerate()
            .map(|(idx, cells)| RawRow {
                row_number: idx + 2,
                values: headers
                    .iter()
                    .cloned()
                    .zip(cells.iter().map(|c| c.to_string()))
                    .collect(),
            })
            .collect();
        RawTable { headers, rows }
    }

    #[test]
    fn test_import_table_filters_inactive_and_assigns_ids() {
        let config = PlannerConfig::default();
        let importer = DatasetImporter::new(&config);
        let raw = table(
            &["Estado", "Ciudad", "Direccion", "Codigo", "FechaReserva"],
            &[
                &["ACTIVO", "Cali", "Calle 1", "A", "2024-01-01"],
                &["ANULADO", "Cali", "Calle 2", "A", ""],
                &["activo", "Buga", "Calle 3", "B", "fecha"],
            ],
        );

        let dataset = importer.import_table("t.csv", &raw).unwrap();
        assert_eq!(dataset.total_rows, 3);
        assert_eq!(dataset.inactive_rows, 1);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.units[0].id, 0);
        assert_eq!(dataset.units[1].id, 1);
        assert_eq!(dataset.units[1].address, "CALLE 3");
        assert_eq!(dataset.units[1].reservation_date, None);
        assert!(dataset.display_columns.is_empty());
    }

    #[test]
    fn test_import_table_all_inactive_is_empty_dataset() {
        let config = PlannerConfig::default();
        let importer = DatasetImporter::new(&config);
        let raw = table(
            &["Estado", "Ciudad", "Direccion", "Codigo", "FechaReserva"],
            &[&["CERRADO", "Cali", "Calle 1", "A", ""]],
        );

        let dataset = importer.import_table("t.csv", &raw).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.inactive_rows, 1);
    }

    #[test]
    fn test_import_table_missing_columns() {
        let config = PlannerConfig::default();
        let importer = DatasetImporter::new(&config);
        let raw = table(&["Estado", "Ciudad"], &[]);

        assert!(matches!(
            importer.import_table("t.csv", &raw),
            Err(ImportError::MissingColumns(_))
        ));
    }
}
