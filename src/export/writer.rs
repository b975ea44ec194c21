// ==========================================
// 车队取货容量分配引擎 - 导出写出器
// ==========================================
// 实现者: CsvDirectoryWriter（每分节一个 CSV + resumen.csv）
//         JsonExportWriter（整份文档一个 JSON）
// ==========================================

use crate::export::document::{ExportDocument, ExportSection};
use crate::export::error::ExportResult;
use csv::WriterBuilder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

pub const SUMMARY_FILE_NAME: &str = "resumen.csv";

const SUMMARY_HEADERS: [&str; 11] = [
    "Orden",
    "Seccion",
    "Placa",
    "Transportadora",
    "Conductor",
    "Ciudades",
    "Capacidad",
    "Ocupado",
    "Bloques",
    "Unidades",
    "Vehiculo",
];

// ==========================================
// ExportWriter Trait
// ==========================================
pub trait ExportWriter {
    /// 写出文档到输出目录
    ///
    /// # 返回
    /// - Ok(Vec<PathBuf>): 生成的文件列表
    fn write(&self, document: &ExportDocument, output_dir: &Path) -> ExportResult<Vec<PathBuf>>;
}

// ==========================================
// CsvDirectoryWriter
// ==========================================
// 输出: {output_dir}/{文档名}/{分节名}.csv + resumen.csv
pub struct CsvDirectoryWriter;

impl ExportWriter for CsvDirectoryWriter {
    fn write(&self, document: &ExportDocument, output_dir: &Path) -> ExportResult<Vec<PathBuf>> {
        let dir = output_dir.join(&document.name);
        fs::create_dir_all(&dir)?;

        let mut written = Vec::with_capacity(document.sections.len() + 1);
        for section in &document.sections {
            let path = dir.join(format!("{}.csv", section.name));
            write_section(section, &path)?;
            written.push(path);
        }

        let summary_path = dir.join(SUMMARY_FILE_NAME);
        write_summary(document, &summary_path)?;
        written.push(summary_path);

        info!(dir = %dir.display(), files = written.len(), "CSV 导出完成");
        Ok(written)
    }
}

fn write_section(section: &ExportSection, path: &Path) -> ExportResult<()> {
    let mut writer = WriterBuilder::new()
        .flexible(true) // 摘要区两列，明细区列数不同
        .from_path(path)?;

    for (label, value) in section.summary.rows() {
        writer.write_record([label, value.as_str()])?;
    }
    writer.write_record(&section.columns)?;
    for row in &section.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_summary(document: &ExportDocument, path: &Path) -> ExportResult<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(SUMMARY_HEADERS)?;
    for s in &document.summary {
        writer.write_record([
            s.sequence_no.to_string(),
            s.section_name.clone().unwrap_or_default(),
            s.plate.clone(),
            s.carrier.clone(),
            s.driver.clone(),
            s.cities.clone(),
            s.capacity.to_string(),
            s.occupied_weight.to_string(),
            s.block_count.to_string(),
            s.unit_count.to_string(),
            s.vehicle_id.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

// ==========================================
// JsonExportWriter
// ==========================================
// 输出: {output_dir}/{文档名}.json
#[derive(Default)]
pub struct JsonExportWriter {
    pub pretty: bool,
}

impl ExportWriter for JsonExportWriter {
    fn write(&self, document: &ExportDocument, output_dir: &Path) -> ExportResult<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("{}.json", document.name));
        let file = File::create(&path)?;
        if self.pretty {
            serde_json::to_writer_pretty(file, document)?;
        } else {
            serde_json::to_writer(file, document)?;
        }

        info!(path = %path.display(), "JSON 导出完成");
        Ok(vec![path])
    }
}
