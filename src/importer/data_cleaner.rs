// ==========================================
// 车队取货容量分配引擎 - 数据清洗器实现
// ==========================================
// 职责: TRIM / 空白折叠 / UPPER / NULL 标准化 / 日期解析
// 红线: 日期无法解析时记为 "无日期"，只告警不报错
// ==========================================

use crate::domain::types::normalize_key;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::warn;

// 支持的日期格式（按优先级）
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// Excel 序列号: 以 1899-12-30 为第 0 天（兼容 1900 闰年缺陷）
const EXCEL_SERIAL_MIN: f64 = 1.0;
const EXCEL_SERIAL_MAX: f64 = 2_958_465.0; // 9999-12-31

pub struct DataCleaner;

impl DataCleaner {
    /// 归一化键值（城市/地址/产品编码）
    pub fn clean_key(&self, value: &str) -> String {
        normalize_key(value)
    }

    /// 空串 → None，其余 TRIM
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 解析预约日期
    ///
    /// # 参数
    /// - value: 原始单元格文本
    /// - row_number: 文件行号（仅用于告警日志）
    ///
    /// # 返回
    /// - Some(NaiveDate): 解析成功
    /// - None: 空值或无法解析（已告警）
    pub fn parse_date(&self, value: Option<&str>, row_number: usize) -> Option<NaiveDate> {
        let raw = self.normalize_null(value)?;

        // 纯数字且非 8 位时优先按 Excel 序列号解析，避免被 %Y%m%d 误读
        let parsed = if looks_like_serial(&raw) {
            parse_excel_serial(&raw)
        } else {
            parse_date_text(&raw)
        };
        if parsed.is_none() {
            warn!(row = row_number, value = %raw, "预约日期无法解析，按无日期处理");
        }
        parsed
    }
}

fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn looks_like_serial(raw: &str) -> bool {
    raw.parse::<f64>().is_ok() && (raw.contains('.') || raw.len() < 8)
}

fn parse_excel_serial(raw: &str) -> Option<NaiveDate> {
    let serial = raw.parse::<f64>().ok()?;
    if !(EXCEL_SERIAL_MIN..=EXCEL_SERIAL_MAX).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial.trunc() as i64))
}
