// ==========================================
// 车队取货容量分配引擎 - 字段映射器实现
// ==========================================
// 职责: 源列 → 标准语义列映射（含别名）+ 有效状态过滤 + 行 → PendingUnit
// 红线: 必需列缺失时一次性报告全部缺失列
// ==========================================

use crate::config::ColumnConfig;
use crate::domain::types::{normalize_key, UnitId};
use crate::domain::unit::PendingUnit;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::RawRow;
use std::collections::BTreeMap;
use tracing::warn;

// ==========================================
// ColumnMapping - 已解析的列映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub status: String,
    pub city: String,
    pub address: String,
    pub product_code: String,
    pub reservation_date: String,

    // 透传展示列（文件中的实际列名，保持顺序）
    pub display_columns: Vec<String>,
}

impl ColumnMapping {
    fn required(&self) -> [&str; 5] {
        [
            &self.status,
            &self.city,
            &self.address,
            &self.product_code,
            &self.reservation_date,
        ]
    }
}

// ==========================================
// FieldMapper
// ==========================================
pub struct FieldMapper<'a> {
    columns: &'a ColumnConfig,
    display_columns: Option<&'a [String]>,
}

impl<'a> FieldMapper<'a> {
    /// # 参数
    /// - columns: 必需列名及别名
    /// - display_columns: 显式透传列；None = 所有非必需列
    pub fn new(columns: &'a ColumnConfig, display_columns: Option<&'a [String]>) -> Self {
        Self {
            columns,
            display_columns,
        }
    }

    /// 按表头解析列映射
    ///
    /// # 返回
    /// - Ok(ColumnMapping)
    /// - Err(ImportError::MissingColumns): 列出所有缺失列的标准名
    pub fn resolve(&self, headers: &[String]) -> ImportResult<ColumnMapping> {
        let mut missing = Vec::new();
        let mut find = |names: &[String]| -> String {
            match find_header(headers, names) {
                Some(h) => h.to_string(),
                None => {
                    missing.push(names.first().cloned().unwrap_or_default());
                    String::new()
                }
            }
        };

        let status = find(&self.columns.status);
        let city = find(&self.columns.city);
        let address = find(&self.columns.address);
        let product_code = find(&self.columns.product_code);
        let reservation_date = find(&self.columns.reservation_date);

        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing));
        }

        let mut mapping = ColumnMapping {
            status,
            city,
            address,
            product_code,
            reservation_date,
            display_columns: Vec::new(),
        };
        mapping.display_columns = self.resolve_display_columns(headers, &mapping);
        Ok(mapping)
    }

    fn resolve_display_columns(&self, headers: &[String], mapping: &ColumnMapping) -> Vec<String> {
        match self.display_columns {
            Some(wanted) => wanted
                .iter()
                .filter_map(|name| {
                    let found = find_header(headers, std::slice::from_ref(name));
                    if found.is_none() {
                        warn!(column = %name, "配置的透传列不在文件中，已忽略");
                    }
                    found.map(str::to_string)
                })
                .collect(),
            None => {
                let required = mapping.required();
                headers
                    .iter()
                    .filter(|h| !h.is_empty() && !required.contains(&h.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }

    /// 行是否通过有效状态过滤（归一化后相等）
    pub fn is_active(&self, mapping: &ColumnMapping, row: &RawRow, sentinel: &str) -> bool {
        let status = row.get(&mapping.status).unwrap_or("");
        normalize_key(status) == normalize_key(sentinel)
    }

    /// 原始行 → PendingUnit
    pub fn map_row(
        &self,
        mapping: &ColumnMapping,
        row: &RawRow,
        id: UnitId,
        cleaner: &DataCleaner,
    ) -> PendingUnit {
        let attributes: BTreeMap<String, String> = mapping
            .display_columns
            .iter()
            .map(|col| (col.clone(), row.get(col).unwrap_or("").to_string()))
            .collect();

        PendingUnit {
            id,
            city: cleaner.clean_key(row.get(&mapping.city).unwrap_or("")),
            address: cleaner.clean_key(row.get(&mapping.address).unwrap_or("")),
            product_code: cleaner.clean_key(row.get(&mapping.product_code).unwrap_or("")),
            reservation_date: cleaner.parse_date(row.get(&mapping.reservation_date), row.row_number),
            attributes,
        }
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 表头比较键: 忽略大小写、空白与下划线
fn header_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// 按名称列表顺序查找第一个匹配的表头
fn find_header<'h>(headers: &'h [String], names: &[String]) -> Option<&'h str> {
    names.iter().find_map(|name| {
        let key = header_key(name);
        if key.is_empty() {
            return None;
        }
        headers
            .iter()
            .find(|h| header_key(h) == key)
            .map(String::as_str)
    })
}
