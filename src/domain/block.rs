// ==========================================
// 车队取货容量分配引擎 - 地址块领域模型
// ==========================================
// 职责: 同一城市内同一归一化地址下的单元聚合（不可拆分的分配单位）
// 红线: total_weight = Σ 成员权重；地址块不跨车辆拆分
// ==========================================

use crate::domain::types::UnitId;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 计算日期的年龄分
///
/// 日期越早分数越高（严格递减）；无日期得最小值 0。
/// 所有合法日期的分数均 >= 1。
pub fn age_score(date: Option<NaiveDate>) -> i64 {
    match date {
        // 锚点取 chrono 可表示的最大日期之后一天
        Some(d) => {
            i64::from(NaiveDate::MAX.num_days_from_ce()) + 1 - i64::from(d.num_days_from_ce())
        }
        None => 0,
    }
}

// ==========================================
// BlockKey - 地址块键（城市 + 地址）
// ==========================================
// 不同城市的同名地址是不同的停靠点
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockKey {
    pub city: String,
    pub address: String,
}

impl BlockKey {
    pub fn new(city: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.city, self.address)
    }
}

// ==========================================
// AddressBlock - 地址块
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBlock {
    pub address: String,                  // 归一化地址
    pub city: String,                     // 归一化城市
    pub total_weight: u32,                // 成员等价重量之和
    pub unit_ids: Vec<UnitId>,            // 成员单元（输入顺序）
    pub earliest_date: Option<NaiveDate>, // 最早预约日期；None = 无日期
}

impl AddressBlock {
    pub fn new(address: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            city: city.into(),
            total_weight: 0,
            unit_ids: Vec::new(),
            earliest_date: None,
        }
    }

    pub fn key(&self) -> BlockKey {
        BlockKey::new(self.city.clone(), self.address.clone())
    }

    /// 追加成员（缺失日期不更新最小值）
    ///
    /// # 返回
    /// - Err(String): 总重量溢出 u32，块保持不变
    pub fn push(&mut self, unit_id: UnitId, weight: u32, date: Option<NaiveDate>) -> Result<(), String> {
        self.total_weight = self.total_weight.checked_add(weight).ok_or_else(|| {
            format!(
                "block {} weight overflow: {} + {}",
                self.key(),
                self.total_weight,
                weight
            )
        })?;
        self.unit_ids.push(unit_id);
        if let Some(d) = date {
            self.earliest_date = Some(match self.earliest_date {
                Some(current) => current.min(d),
                None => d,
            });
        }
        Ok(())
    }

    pub fn is_dateless(&self) -> bool {
        self.earliest_date.is_none()
    }

    pub fn age_score(&self) -> i64 {
        age_score(self.earliest_date)
    }
}

// ==========================================
// BlockSet - 有序地址块集合
// ==========================================
// 顺序 = 输入单元中地址首次出现的顺序（分配器依赖此顺序做确定性平局裁决）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSet {
    blocks: Vec<AddressBlock>,
    index: HashMap<BlockKey, usize>,
}

impl BlockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取 (城市, 地址) 对应的块，不存在时按首次出现顺序新建
    pub fn entry(&mut self, city: &str, address: &str) -> &mut AddressBlock {
        let key = BlockKey::new(city, address);
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.blocks.push(AddressBlock::new(address, city));
                let idx = self.blocks.len() - 1;
                self.index.insert(key, idx);
                idx
            }
        };
        &mut self.blocks[idx]
    }

    pub fn get(&self, city: &str, address: &str) -> Option<&AddressBlock> {
        self.index
            .get(&BlockKey::new(city, address))
            .map(|&idx| &self.blocks[idx])
    }

    pub fn as_slice(&self) -> &[AddressBlock] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AddressBlock> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// 最轻块的重量
    pub fn smallest_weight(&self) -> Option<u32> {
        self.blocks.iter().map(|b| b.total_weight).min()
    }
}

impl FromIterator<AddressBlock> for BlockSet {
    fn from_iter<I: IntoIterator<Item = AddressBlock>>(iter: I) -> Self {
        let mut set = BlockSet::new();
        for block in iter {
            let key = block.key();
            if set.index.contains_key(&key) {
                continue;
            }
            set.index.insert(key, set.blocks.len());
            set.blocks.push(block);
        }
        set
    }
}
