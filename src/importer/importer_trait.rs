// ==========================================
// 车队取货容量分配引擎 - 导入管道 Trait
// ==========================================
// 职责: 定义文件解析接口（不包含实现）
// ==========================================

use crate::importer::error::ImportResult;
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// RawRow / RawTable - 原始行记录
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub row_number: usize,               // 文件中的行号（表头为第 1 行）
    pub values: HashMap<String, String>, // 列名 → 值（已 TRIM）
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>, // 保持文件中的列顺序
    pub rows: Vec<RawRow>,
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表（表头 + 行记录）
    ///
    /// # 返回
    /// - Ok(RawTable): 完全空白的行已跳过
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}
