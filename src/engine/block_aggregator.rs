// ==========================================
// 车队取货容量分配引擎 - 地址块聚合器
// ==========================================
// 职责: 按 (城市, 归一化地址) 把合格单元聚合为带权重的地址块
// 输入: 单元列表 + 车辆城市池 + 已占用地址块/单元
// 输出: BlockSet（顺序 = 地址块在输入中首次出现的顺序）
// ==========================================

use crate::domain::block::{BlockKey, BlockSet};
use crate::domain::types::UnitId;
use crate::domain::unit::PendingUnit;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::special_reference::SpecialReferenceFilter;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

// ==========================================
// AggregationStats - 聚合统计（用于原因诊断）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub units_in_pool: usize,    // 城市属于城市池的单元
    pub claimed: usize,          // 单元或地址块已被本次运行占用
    pub empty_address: usize,    // 地址为空
    pub deselected: usize,       // 特殊编码被取消勾选
    pub aggregated: usize,       // 最终进入地址块的单元
}

// ==========================================
// BlockAggregator - 地址块聚合器
// ==========================================
pub struct BlockAggregator<'a> {
    filter: SpecialReferenceFilter<'a>,
}

impl<'a> BlockAggregator<'a> {
    pub fn new(filter: SpecialReferenceFilter<'a>) -> Self {
        Self { filter }
    }

    /// 构建候选地址块
    ///
    /// 跳过规则（按顺序）:
    /// 1) 城市不在城市池
    /// 2) 单元已被占用
    /// 3) 地址为空或 (城市, 地址) 已被占用
    /// 4) 特殊编码被取消勾选
    ///
    /// # 返回
    /// - Err(EngineError::Computation): 地址块总重量溢出
    pub fn build_blocks(
        &self,
        units: &[PendingUnit],
        city_pool: &BTreeSet<String>,
        excluded_blocks: &HashSet<BlockKey>,
        excluded_unit_ids: &HashSet<UnitId>,
    ) -> EngineResult<BlockSet> {
        self.build_blocks_with_stats(units, city_pool, excluded_blocks, excluded_unit_ids)
            .map(|(blocks, _)| blocks)
    }

    /// 构建候选地址块并返回聚合统计
    pub fn build_blocks_with_stats(
        &self,
        units: &[PendingUnit],
        city_pool: &BTreeSet<String>,
        excluded_blocks: &HashSet<BlockKey>,
        excluded_unit_ids: &HashSet<UnitId>,
    ) -> EngineResult<(BlockSet, AggregationStats)> {
        let mut blocks = BlockSet::new();
        let mut stats = AggregationStats::default();

        for unit in units {
            if !city_pool.contains(&unit.city) {
                continue;
            }
            stats.units_in_pool += 1;

            if excluded_unit_ids.contains(&unit.id) {
                stats.claimed += 1;
                continue;
            }
            if unit.address.is_empty() {
                stats.empty_address += 1;
                continue;
            }
            if excluded_blocks.contains(&BlockKey::new(unit.city.as_str(), unit.address.as_str())) {
                stats.claimed += 1;
                continue;
            }
            if !self.filter.is_included(&unit.city, &unit.product_code) {
                stats.deselected += 1;
                continue;
            }

            let weight = self.filter.resolver().weight_of(&unit.product_code);
            blocks
                .entry(&unit.city, &unit.address)
                .push(unit.id, weight, unit.reservation_date)
                .map_err(|msg| EngineError::computation("aggregation", msg))?;
            stats.aggregated += 1;
        }

        Ok((blocks, stats))
    }

    /// 城市池可达的最早预约日期（不考虑本次运行的占用）
    ///
    /// 与 build_blocks 使用相同的资格规则，但不累计重量
    pub fn earliest_date_for_pool(
        &self,
        units: &[PendingUnit],
        city_pool: &BTreeSet<String>,
    ) -> Option<NaiveDate> {
        units
            .iter()
            .filter(|u| city_pool.contains(&u.city) && !u.address.is_empty())
            .filter(|u| self.filter.is_included(&u.city, &u.product_code))
            .filter_map(|u| u.reservation_date)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::equivalence::{EquivalenceResolver, EquivalenceTable};
    use crate::engine::special_reference::SelectionStore;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn unit(id: UnitId, city: &str, address: &str, code: &str, date: Option<(i32, u32, u32)>) -> PendingUnit {
        PendingUnit {
            id,
            city: city.to_string(),
            address: address.to_string(),
            product_code: code.to_string(),
            reservation_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            attributes: Default::default(),
        }
    }

    fn pool(cities: &[&str]) -> BTreeSet<String> {
        cities.iter().map(|c| c.to_string()).collect()
    }

    fn resolver() -> EquivalenceResolver {
        EquivalenceResolver::new(EquivalenceTable::from_entries(vec![("A", 1), ("B", 4)]))
    }

    // ==========================================
    // 基础功能测试
    // ==========================================

    #[test]
    fn test_groups_by_address_in_first_seen_order() {
        let r = resolver();
        let store = SelectionStore::new();
        let aggregator = BlockAggregator::new(SpecialReferenceFilter::new(&r, &store));

        let units = vec![
            unit(0, "CALI", "Y", "B", Some((2024, 6, 1))),
            unit(1, "CALI", "X", "A", Some((2024, 1, 1))),
            unit(2, "CALI", "X", "A", None),
            unit(3, "CALI", "Y", "A", Some((2024, 5, 1))),
        ];

        let blocks = aggregator
            .build_blocks(&units, &pool(&["CALI"]), &HashSet::new(), &HashSet::new())
            .unwrap();

        let order: Vec<&str> = blocks.iter().map(|b| b.address.as_str()).collect();
        assert_eq!(order, vec!["Y", "X"]);

        let y = blocks.get("CALI", "Y").unwrap();
        assert_eq!(y.total_weight, 5); // 4 + 1
        assert_eq!(y.unit_ids, vec![0, 3]);
        assert_eq!(y.earliest_date, NaiveDate::from_ymd_opt(2024, 5, 1));

        let x = blocks.get("CALI", "X").unwrap();
        assert_eq!(x.total_weight, 2);
        assert_eq!(x.earliest_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_skips_out_of_pool_claimed_and_empty_address() {
        let r = resolver();
        let store = SelectionStore::new();
        let aggregator = BlockAggregator::new(SpecialReferenceFilter::new(&r, &store));

        let units = vec![
            unit(0, "BUGA", "X", "A", None),  // 城市不在池
            unit(1, "CALI", "X", "A", None),  // 单元已占用
            unit(2, "CALI", "", "A", None),   // 地址为空
            unit(3, "CALI", "Z", "A", None),  // 地址已占用
            unit(4, "CALI", "W", "A", None),  // 正常
        ];
        let used_blocks: HashSet<BlockKey> = [BlockKey::new("CALI", "Z")].into_iter().collect();
        let used_units: HashSet<UnitId> = [1].into_iter().collect();

        let (blocks, stats) = aggregator
            .build_blocks_with_stats(&units, &pool(&["CALI"]), &used_blocks, &used_units)
            .unwrap();

        assert_eq!(blocks.len(), 1);
        assert!(blocks.get("CALI", "W").is_some());
        assert_eq!(
            stats,
            AggregationStats {
                units_in_pool: 4,
                claimed: 2,
                empty_address: 1,
                deselected: 0,
                aggregated: 1,
            }
        );
    }

    #[test]
    fn test_deselected_special_code_dropped_not_downweighted() {
        let r = resolver();
        let mut store = SelectionStore::new();
        store.update("CALI", "B", false);
        let aggregator = BlockAggregator::new(SpecialReferenceFilter::new(&r, &store));

        let units = vec![
            unit(0, "CALI", "X", "B", Some((2023, 1, 1))),
            unit(1, "CALI", "X", "A", Some((2024, 1, 1))),
        ];
        let (blocks, stats) = aggregator
            .build_blocks_with_stats(&units, &pool(&["CALI"]), &HashSet::new(), &HashSet::new())
            .unwrap();

        let x = blocks.get("CALI", "X").unwrap();
        assert_eq!(x.total_weight, 1);
        assert_eq!(x.unit_ids, vec![1]);
        assert_eq!(x.earliest_date, NaiveDate::from_ymd_opt(2024, 1, 1)); // 被剔除单元的日期不计入
        assert_eq!(stats.deselected, 1);
    }

    // ==========================================
    // 城市维度测试
    // ==========================================

    #[test]
    fn test_same_address_in_two_cities_stays_separate() {
        let r = resolver();
        let store = SelectionStore::new();
        let aggregator = BlockAggregator::new(SpecialReferenceFilter::new(&r, &store));

        let units = vec![
            unit(0, "CALI", "CALLE 10 # 5-20", "A", Some((2024, 2, 1))),
            unit(1, "BUGA", "CALLE 10 # 5-20", "A", Some((2024, 1, 1))),
        ];
        let both = pool(&["CALI", "BUGA"]);

        let blocks = aggregator
            .build_blocks(&units, &both, &HashSet::new(), &HashSet::new())
            .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks.get("BUGA", "CALLE 10 # 5-20").unwrap().unit_ids, vec![1]);

        // CALI 的同名地址被占用，不影响 BUGA
        let used: HashSet<BlockKey> = [BlockKey::new("CALI", "CALLE 10 # 5-20")].into_iter().collect();
        let (blocks, stats) = aggregator
            .build_blocks_with_stats(&units, &both, &used, &HashSet::new())
            .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks.as_slice()[0].city, "BUGA");
        assert_eq!(stats.claimed, 1);
    }

    #[test]
    fn test_block_weight_overflow_is_computation_error() {
        let r = EquivalenceResolver::new(EquivalenceTable::from_entries(vec![("MAX", u32::MAX)]));
        let store = SelectionStore::new();
        let aggregator = BlockAggregator::new(SpecialReferenceFilter::new(&r, &store));

        let units = vec![unit(0, "CALI", "X", "MAX", None), unit(1, "CALI", "X", "MAX", None)];
        let err = aggregator
            .build_blocks(&units, &pool(&["CALI"]), &HashSet::new(), &HashSet::new())
            .unwrap_err();

        assert!(!err.is_validation());
        assert!(err.to_string().contains("CALI / X"));
    }

    #[test]
    fn test_earliest_date_for_pool_uses_eligible_units() {
        let r = resolver();
        let mut store = SelectionStore::new();
        store.update("CALI", "B", false);
        let aggregator = BlockAggregator::new(SpecialReferenceFilter::new(&r, &store));

        let units = vec![
            unit(0, "CALI", "X", "B", Some((2023, 1, 1))), // 取消勾选
            unit(1, "CALI", "", "A", Some((2023, 6, 1))),  // 地址为空
            unit(2, "BUGA", "Y", "A", Some((2022, 1, 1))), // 不在池
            unit(3, "CALI", "Z", "A", Some((2024, 3, 1))),
        ];

        assert_eq!(
            aggregator.earliest_date_for_pool(&units, &pool(&["CALI"])),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(aggregator.earliest_date_for_pool(&units, &pool(&["PALMIRA"])), None);
    }
}
