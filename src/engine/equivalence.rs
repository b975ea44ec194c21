// ==========================================
// 车队取货容量分配引擎 - 等价重量解析器
// ==========================================
// 职责: 产品编码 → 正整数容量权重
// 红线: 纯函数、全函数、无失败模式；进程内加载一次后不可变
// ==========================================

use crate::domain::types::normalize_key;
use std::collections::HashMap;

/// 未登记编码的默认权重
pub const DEFAULT_WEIGHT: u32 = 1;

// ==========================================
// EquivalenceTable - 等价表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquivalenceTable {
    weights: HashMap<String, u32>,
}

impl EquivalenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由 (编码, 权重) 列表构造
    ///
    /// 编码在入表前归一化；权重为 0 的条目被忽略（按默认值 1 处理）。
    /// 同一编码重复出现时后者覆盖前者。
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let weights = entries
            .into_iter()
            .filter(|(_, w)| *w > 0)
            .map(|(code, w)| (normalize_key(code.as_ref()), w))
            .filter(|(code, _)| !code.is_empty())
            .collect();
        Self { weights }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

// ==========================================
// EquivalenceResolver - 等价重量解析器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct EquivalenceResolver {
    table: EquivalenceTable,
}

impl EquivalenceResolver {
    pub fn new(table: EquivalenceTable) -> Self {
        Self { table }
    }

    /// 查询编码的容量权重（>= 1）
    ///
    /// 编码先归一化（TRIM + 合并空白 + UPPER），缺失或空编码返回 1。
    pub fn weight_of(&self, code: &str) -> u32 {
        let key = normalize_key(code);
        if key.is_empty() {
            return DEFAULT_WEIGHT;
        }
        self.table.weights.get(&key).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// 权重 > 1 的编码视为特殊编码
    pub fn is_special(&self, code: &str) -> bool {
        self.weight_of(code) > DEFAULT_WEIGHT
    }

    pub fn table(&self) -> &EquivalenceTable {
        &self.table
    }
}
