// ==========================================
// 车队取货容量分配引擎 - 等价表加载
// ==========================================
// 支持: JSON ({"编码": 权重}) / CSV (编码,权重)
// 红线: 进程内加载一次；权重必须为正整数；归一化后同一编码不得有不同权重
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::normalize_key;
use crate::engine::equivalence::EquivalenceTable;
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::info;

const CODE_HEADERS: &[&str] = &["codigo", "código", "code", "referencia"];
const WEIGHT_HEADERS: &[&str] = &["equivalencia", "peso", "weight", "unidades"];

/// 按扩展名加载等价表
pub fn load_equivalence_table(path: &Path) -> ConfigResult<EquivalenceTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let entries = match ext.as_str() {
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        _ => return Err(ConfigError::UnsupportedFormat(ext)),
    };
    reject_conflicting_codes(&entries)?;

    let table = EquivalenceTable::from_entries(entries);
    info!(path = %path.display(), codes = table.len(), "等价表已加载");
    Ok(table)
}

fn load_json(path: &Path) -> ConfigResult<Vec<(String, u32)>> {
    let file = File::open(path).map_err(|e| read_error(path, e))?;
    let raw: BTreeMap<String, i64> =
        serde_json::from_reader(file).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut entries = Vec::with_capacity(raw.len());
    for (code, weight) in raw {
        entries.push((code.clone(), checked_weight(&code, &weight.to_string())?));
    }
    Ok(entries)
}

fn load_csv(path: &Path) -> ConfigResult<Vec<(String, u32)>> {
    let file = File::open(path).map_err(|e| read_error(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(path, e))?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    // 未识别表头时退回前两列
    let code_idx = headers
        .iter()
        .position(|h| CODE_HEADERS.contains(&h.as_str()))
        .unwrap_or(0);
    let weight_idx = headers
        .iter()
        .position(|h| WEIGHT_HEADERS.contains(&h.as_str()))
        .unwrap_or(1);

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_error(path, e))?;
        let code = record.get(code_idx).unwrap_or("").trim();
        if code.is_empty() {
            continue;
        }
        let weight = record.get(weight_idx).unwrap_or("").trim();
        entries.push((code.to_string(), checked_weight(code, weight)?));
    }
    Ok(entries)
}

/// 归一化后相同的编码必须权重一致
fn reject_conflicting_codes(entries: &[(String, u32)]) -> ConfigResult<()> {
    let mut seen: BTreeMap<String, (&str, u32)> = BTreeMap::new();
    for (code, weight) in entries {
        let key = normalize_key(code);
        match seen.get(&key) {
            Some(&(first, w)) if w != *weight => {
                return Err(ConfigError::InvalidValue {
                    key: format!("equivalence[{}]", key),
                    value: format!("{}={}, {}={}", first, w, code, weight),
                    message: "同一编码（归一化后）的等价权重冲突".to_string(),
                });
            }
            Some(_) => {}
            None => {
                seen.insert(key, (code.as_str(), *weight));
            }
        }
    }
    Ok(())
}

/// 权重必须为正整数（允许 "4.0" 这类整数值浮点写法）
fn checked_weight(code: &str, raw: &str) -> ConfigResult<u32> {
    let parsed = raw
        .parse::<u32>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u32)
        });

    match parsed {
        Some(w) if w > 0 => Ok(w),
        _ => Err(ConfigError::InvalidValue {
            key: format!("equivalence[{}]", code),
            value: raw.to_string(),
            message: "等价权重必须为正整数".to_string(),
        }),
    }
}

fn read_error(path: &Path, e: std::io::Error) -> ConfigError {
    ConfigError::ReadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn parse_error(path: &Path, e: csv::Error) -> ConfigError {
    ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::equivalence::EquivalenceResolver;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_load_csv_with_headers() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Codigo,Equivalencia").unwrap();
        writeln!(file, "CUATRIMOTO,4").unwrap();
        writeln!(file, " moto 250 ,2.0").unwrap();
        writeln!(file, ",9").unwrap(); // 空编码跳过

        let table = load_equivalence_table(file.path()).unwrap();
        let resolver = EquivalenceResolver::new(table);
        assert_eq!(resolver.weight_of("cuatrimoto"), 4);
        assert_eq!(resolver.weight_of("MOTO 250"), 2);
        assert_eq!(resolver.table().len(), 2);
    }

    #[test]
    fn test_load_json() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"B": 4, "A": 1}}"#).unwrap();

        let resolver = EquivalenceResolver::new(load_equivalence_table(file.path()).unwrap());
        assert_eq!(resolver.weight_of("B"), 4);
        assert_eq!(resolver.weight_of("A"), 1);
    }

    #[test]
    fn test_non_positive_weight_rejected() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"B": 0}}"#).unwrap();
        assert!(matches!(
            load_equivalence_table(file.path()),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "code,weight").unwrap();
        writeln!(file, "B,-2").unwrap();
        assert!(load_equivalence_table(file.path()).is_err());
    }

    #[test]
    fn test_conflicting_normalized_codes_rejected() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"moto 4": 4, "MOTO  4": 2}}"#).unwrap();
        match load_equivalence_table(file.path()) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "equivalence[MOTO 4]"),
            other => panic!("unexpected result: {other:?}"),
        }

        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "code,weight").unwrap();
        writeln!(file, "moto 4,4").unwrap();
        writeln!(file, "MOTO 4,3").unwrap();
        assert!(matches!(
            load_equivalence_table(file.path()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_repeated_code_with_same_weight_accepted() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"moto 4": 4, "MOTO 4": 4}}"#).unwrap();

        let resolver = EquivalenceResolver::new(load_equivalence_table(file.path()).unwrap());
        assert_eq!(resolver.weight_of("Moto 4"), 4);
        assert_eq!(resolver.table().len(), 1);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(
            load_equivalence_table(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
