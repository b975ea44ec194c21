// ==========================================
// 车队取货容量分配引擎 - 导出文档组装
// ==========================================
// 职责: RunReport + Dataset → 导出文档（每个有分配的车辆一个分节）
// 红线: 分节名只含 [A-Za-z0-9_-]，长度受限且在文档内唯一
// ==========================================

use crate::config::ExportConfig;
use crate::domain::run::{RunReport, VehicleAllocation};
use crate::domain::types::VehicleId;
use crate::domain::unit::Dataset;
use crate::export::error::{ExportError, ExportResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

// 单元明细的固定前置列
const UNIT_BASE_COLUMNS: [&str; 4] = ["Ciudad", "Direccion", "Codigo", "FechaReserva"];

// ==========================================
// VehicleSummary - 车辆摘要
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSummary {
    pub vehicle_id: VehicleId,
    pub sequence_no: usize,
    pub plate: String,
    pub carrier: String,
    pub driver: String,
    pub cities: String,
    pub capacity: u32,
    pub occupied_weight: u32,
    pub block_count: usize,
    pub unit_count: usize,
    pub section_name: Option<String>, // 无分配的车辆没有分节
}

impl VehicleSummary {
    fn from_allocation(allocation: &VehicleAllocation) -> Self {
        let vehicle = &allocation.vehicle;
        Self {
            vehicle_id: vehicle.id,
            sequence_no: allocation.sequence_no,
            plate: vehicle.plate.clone(),
            carrier: vehicle.carrier.clone(),
            driver: vehicle.driver.clone(),
            cities: vehicle.cities_label(),
            capacity: vehicle.capacity,
            occupied_weight: allocation.occupied_weight,
            block_count: allocation.block_count(),
            unit_count: allocation.unit_count(),
            section_name: None,
        }
    }

    /// 摘要键值对（分节表头区）
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Placa", self.plate.clone()),
            ("Transportadora", self.carrier.clone()),
            ("Conductor", self.driver.clone()),
            ("Ciudades", self.cities.clone()),
            ("Capacidad", self.capacity.to_string()),
            ("Ocupado", self.occupied_weight.to_string()),
            ("Bloques", self.block_count.to_string()),
            ("Unidades", self.unit_count.to_string()),
        ]
    }
}

// ==========================================
// ExportSection - 单车分节
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSection {
    pub name: String,
    pub summary: VehicleSummary,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ==========================================
// ExportDocument - 单次运行的导出文档
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub name: String,
    pub run_id: String,
    pub dataset_batch_id: String,
    pub generated_at: DateTime<Utc>,
    pub summary: Vec<VehicleSummary>, // 所有车辆（处理顺序）
    pub sections: Vec<ExportSection>, // 仅有分配的车辆
    pub total_units_assigned: usize,
    pub total_weight_assigned: u64,
}

impl ExportDocument {
    /// 组装导出文档
    ///
    /// # 参数
    /// - report: 有分配的运行结果
    /// - dataset: 运行所用的数据集（提供透传列）
    /// - config: 导出参数
    ///
    /// # 返回
    /// - Ok(ExportDocument)
    /// - Err(ExportError::EmptyDocument): 总分配单元为 0
    /// - Err(ExportError::MissingUnit): 分配引用的单元不在数据集中
    pub fn assemble(report: &RunReport, dataset: &Dataset, config: &ExportConfig) -> ExportResult<Self> {
        if report.total_units_assigned == 0 {
            return Err(ExportError::EmptyDocument);
        }

        let mut columns: Vec<String> = UNIT_BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(dataset.display_columns.iter().cloned());

        let mut names = SectionNamer::new(config);
        let mut summary = Vec::with_capacity(report.allocations.len());
        let mut sections = Vec::new();

        for allocation in &report.allocations {
            let mut vehicle_summary = VehicleSummary::from_allocation(allocation);
            if allocation.unit_ids.is_empty() {
                summary.push(vehicle_summary);
                continue;
            }

            let rows = unit_rows(allocation, dataset)?;
            let name = names.next_name(&allocation.vehicle.plate);
            vehicle_summary.section_name = Some(name.clone());

            sections.push(ExportSection {
                name,
                summary: vehicle_summary.clone(),
                columns: columns.clone(),
                rows,
            });
            summary.push(vehicle_summary);
        }

        let document = Self {
            name: document_name(&config.document_prefix, report.finished_at),
            run_id: report.run_id.clone(),
            dataset_batch_id: report.dataset_batch_id.clone(),
            generated_at: report.finished_at,
            summary,
            sections,
            total_units_assigned: report.total_units_assigned,
            total_weight_assigned: report.total_weight_assigned,
        };
        debug!(document = %document.name, sections = document.sections.len(), "导出文档已组装");
        Ok(document)
    }

    pub fn section(&self, name: &str) -> Option<&ExportSection> {
        self.sections.iter().find(|s| s.name == name)
    }
}

fn unit_rows(allocation: &VehicleAllocation, dataset: &Dataset) -> ExportResult<Vec<Vec<String>>> {
    allocation
        .unit_ids
        .iter()
        .map(|&unit_id| {
            let unit = dataset
                .unit(unit_id)
                .ok_or(ExportError::MissingUnit { unit_id })?;
            let mut row = vec![
                unit.city.clone(),
                unit.address.clone(),
                unit.product_code.clone(),
                unit.reservation_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ];
            row.extend(
                dataset
                    .display_columns
                    .iter()
                    .map(|col| unit.attribute(col).to_string()),
            );
            Ok(row)
        })
        .collect()
}

/// 文档名: {前缀}_{YYYYMMDD_HHMMSS}
pub fn document_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}", prefix, at.format("%Y%m%d_%H%M%S"))
}

// ==========================================
// SectionNamer - 分节名生成（清洗 + 截断 + 去重）
// ==========================================
pub struct SectionNamer {
    max_len: usize,
    fallback: String,
    used: HashSet<String>, // 小写比较（工作表名不区分大小写）
}

impl SectionNamer {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            max_len: config.section_name_max_len.max(1),
            fallback: sanitize(&config.fallback_section_name),
            used: HashSet::new(),
        }
    }

    /// 由车牌生成唯一分节名
    pub fn next_name(&mut self, plate: &str) -> String {
        let mut base = sanitize(plate.trim());
        if base.is_empty() {
            base = self.fallback.clone();
        }
        if base.is_empty() {
            base = "_".to_string();
        }
        base.truncate(self.max_len);

        // n = 2..=used+2 的候选两两不同，必有一个未被占用（名字空间耗尽时除外）
        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate.to_lowercase()) {
            if n > self.used.len() + 2 {
                warn!(name = %candidate, max_len = self.max_len, "分节名空间耗尽，名称重复");
                break;
            }
            candidate = self.suffixed(&base, n);
            n += 1;
        }

        self.used.insert(candidate.to_lowercase());
        candidate
    }

    /// {截断的 base}_{n}；后缀本身超长时取其末尾 max_len 个字符
    fn suffixed(&self, base: &str, n: usize) -> String {
        let suffix = format!("_{}", n);
        if suffix.len() > self.max_len {
            return suffix[suffix.len() - self.max_len..].to_string();
        }
        let mut stem = base.to_string();
        stem.truncate(self.max_len - suffix.len());
        format!("{}{}", stem, suffix)
    }
}

/// [A-Za-z0-9_-] 之外的字符替换为 '_'
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namer(max_len: usize) -> SectionNamer {
        SectionNamer::new(&ExportConfig {
            section_name_max_len: max_len,
            ..ExportConfig::default()
        })
    }

    #[test]
    fn test_sanitize_replaces_symbols() {
        assert_eq!(sanitize("ABC 123/ñ"), "ABC_123__");
        assert_eq!(sanitize("x-y_z"), "x-y_z");
    }

    #[test]
    fn test_section_names_truncated_and_deduplicated() {
        let mut names = namer(6);
        assert_eq!(names.next_name("ABC1234567"), "ABC123");
        assert_eq!(names.next_name("ABC123"), "ABC1_2");
        assert_eq!(names.next_name("abc123"), "abc1_3");
        assert_eq!(names.next_name("XYZ"), "XYZ");
    }

    #[test]
    fn test_long_suffix_stays_within_bound() {
        let mut names = namer(2);
        assert_eq!(names.next_name("XY"), "XY");
        for n in 2..=9 {
            assert_eq!(names.next_name("XY"), format!("_{}", n));
        }
        // "_10" 超长 → 取末尾两位
        assert_eq!(names.next_name("XY"), "10");
        assert_eq!(names.next_name("xy"), "11");
        assert!(names.used.iter().all(|n| n.len() <= 2));
    }

    #[test]
    fn test_tiny_bound_terminates() {
        let mut names = namer(1);
        let generated: Vec<String> = (0..15).map(|_| names.next_name("Z")).collect();

        assert!(generated.iter().all(|n| n.len() == 1));
        // Z + 2..9 + 0/1 共 11 个不同名称，之后名字空间耗尽
        let distinct: HashSet<&String> = generated.iter().collect();
        assert_eq!(distinct.len(), 11);
    }

    #[test]
    fn test_empty_plate_uses_fallback() {
        let mut names = namer(31);
        assert_eq!(names.next_name("   "), "VEHICULO");
        assert_eq!(names.next_name(""), "VEHICULO_2");
    }

    #[test]
    fn test_document_name_format() {
        let at = DateTime::parse_from_rfc3339("2024-03-09T07:05:01Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(document_name("plan_recogida", at), "plan_recogida_20240309_070501");
    }
}
