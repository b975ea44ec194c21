// ==========================================
// 车队取货容量分配引擎 - 特殊编码过滤器
// ==========================================
// 职责: 按 (城市, 编码) 决定多单元编码（权重 > 1）是否参与分配
// 规则:
// 1) 权重 = 1 的编码永远参与（不是特殊编码）
// 2) 特殊编码查勾选表，首次出现默认勾选
// 3) 取消勾选的特殊编码整条剔除，而不是降权
// ==========================================

use crate::domain::types::normalize_key;
use crate::domain::unit::Dataset;
use crate::engine::equivalence::EquivalenceResolver;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

// ==========================================
// SpecialReference - 勾选表条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialReference {
    pub city: String,
    pub product_code: String,
    pub weight: u32,        // 等价权重（未在数据集中出现过的条目为 0）
    pub unit_count: usize,  // 数据集中的单元数
    pub included: bool,
}

// ==========================================
// SelectionStore - 勾选表
// ==========================================
// 生命周期: 每次导入新数据集时重置
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    entries: BTreeMap<(String, String), SpecialReference>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 清空并按数据集重新登记所有特殊编码（全部默认勾选）
    pub fn reset_for(&mut self, dataset: &Dataset, resolver: &EquivalenceResolver) {
        self.entries.clear();
        for unit in &dataset.units {
            let weight = resolver.weight_of(&unit.product_code);
            if weight <= 1 {
                continue;
            }
            let key = (normalize_key(&unit.city), normalize_key(&unit.product_code));
            let entry = self
                .entries
                .entry(key.clone())
                .or_insert_with(|| SpecialReference {
                    city: key.0,
                    product_code: key.1,
                    weight,
                    unit_count: 0,
                    included: true,
                });
            entry.unit_count += 1;
        }
        debug!(special_references = self.entries.len(), "勾选表已重置");
    }

    /// 查询勾选状态（未登记的条目默认勾选）
    pub fn is_selected(&self, city: &str, code: &str) -> bool {
        self.entries
            .get(&(normalize_key(city), normalize_key(code)))
            .map(|e| e.included)
            .unwrap_or(true)
    }

    /// 更新勾选状态（由调用方 UI 操作触发，引擎本身不调用）
    ///
    /// # 返回
    /// - true: 条目已存在
    /// - false: 条目此前未登记（已按给定状态新建）
    pub fn update(&mut self, city: &str, code: &str, include: bool) -> bool {
        let key = (normalize_key(city), normalize_key(code));
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.included = include;
                true
            }
            None => {
                self.entries.insert(
                    key.clone(),
                    SpecialReference {
                        city: key.0,
                        product_code: key.1,
                        weight: 0,
                        unit_count: 0,
                        included: include,
                    },
                );
                false
            }
        }
    }

    /// 列出全部特殊编码（按城市、编码排序）
    pub fn special_references(&self) -> Vec<SpecialReference> {
        self.entries.values().cloned().collect()
    }

    pub fn excluded_count(&self) -> usize {
        self.entries.values().filter(|e| !e.included).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ==========================================
// SpecialReferenceFilter - 特殊编码过滤器
// ==========================================
pub struct SpecialReferenceFilter<'a> {
    resolver: &'a EquivalenceResolver,
    selection: &'a SelectionStore,
}

impl<'a> SpecialReferenceFilter<'a> {
    pub fn new(resolver: &'a EquivalenceResolver, selection: &'a SelectionStore) -> Self {
        Self {
            resolver,
            selection,
        }
    }

    /// 判断 (城市, 编码) 是否参与分配
    pub fn is_included(&self, city: &str, code: &str) -> bool {
        if !self.resolver.is_special(code) {
            return true;
        }
        self.selection.is_selected(city, code)
    }

    pub fn resolver(&self) -> &EquivalenceResolver {
        self.resolver
    }
}
