// ==========================================
// 车队取货容量分配引擎 - 容量分配器
// ==========================================
// 职责: 单车多目标 0/1 背包（地址块为物品，不拆分、不复用）
// 目标（严格字典序）:
// 1) 选中重量之和最大（允许欠装）
// 2) 年龄分之和最大（越早的预约越优先）
// 3) 选中块数最少（停靠点越少越好）
// 红线: 相同输入顺序与权重 → 相同选中集合
// ==========================================

use crate::domain::block::AddressBlock;
use std::cmp::Ordering;
use tracing::{debug, instrument};

// ==========================================
// SelectionScore - 选择方案评分（全序比较器）
// ==========================================
// 约定: a > b 表示 a 比 b 更优
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionScore {
    pub weight: u64,
    pub age_score: i64,
    pub block_count: usize,
    pub block_indices: Vec<usize>, // 升序（处理顺序）
}

impl SelectionScore {
    /// 空方案
    pub fn empty() -> Self {
        Self {
            weight: 0,
            age_score: 0,
            block_count: 0,
            block_indices: Vec::new(),
        }
    }

    /// 在当前方案上追加一个块（块下标必须大于已有下标）
    pub fn with_block(&self, index: usize, weight: u32, age_score: i64) -> Self {
        let mut block_indices = Vec::with_capacity(self.block_indices.len() + 1);
        block_indices.extend_from_slice(&self.block_indices);
        block_indices.push(index);
        Self {
            weight: self.weight + u64::from(weight),
            age_score: self.age_score.saturating_add(age_score),
            block_count: self.block_count + 1,
            block_indices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.block_indices.is_empty()
    }
}

impl Ord for SelectionScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| self.age_score.cmp(&other.age_score))
            // 块数少者更优
            .then_with(|| other.block_count.cmp(&self.block_count))
            // 完全平局: 下标序列字典序更小（更早处理）者更优
            .then_with(|| other.block_indices.cmp(&self.block_indices))
    }
}

impl PartialOrd for SelectionScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ==========================================
// CapacityAllocator - 容量分配器
// ==========================================
pub struct CapacityAllocator {
    // 无状态引擎，不需要注入依赖
}

impl CapacityAllocator {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 为单车选择地址块子集
    ///
    /// 动态规划: levels[c] 保存 "恰好占用 c" 时的最优方案；
    /// 按输入顺序逐块处理，容量从高到低扫描（经典 0/1 背包，不复用）。
    /// 重量超过容量的块直接不参与。最终取 0..=C' 所有层级中的最优方案，
    /// C' = min(C, 可装入块的重量之和)，最优方案的重量不可能超过 C'。
    ///
    /// # 参数
    /// - `capacity`: 车辆容量 C
    /// - `blocks`: 候选地址块（顺序决定平局裁决）
    ///
    /// # 返回
    /// 最优方案；没有任何可装入的块时返回空方案
    #[instrument(skip(self, blocks), fields(candidates_count = blocks.len()))]
    pub fn allocate(&self, capacity: u32, blocks: &[AddressBlock]) -> SelectionScore {
        let reachable: u64 = blocks
            .iter()
            .map(|b| u64::from(b.total_weight))
            .filter(|&w| w <= u64::from(capacity))
            .sum();
        let cap = reachable.min(u64::from(capacity)) as usize;
        debug!(capacity, levels = cap + 1, "背包层级");

        let mut levels: Vec<Option<SelectionScore>> = vec![None; cap + 1];
        levels[0] = Some(SelectionScore::empty());

        for (index, block) in blocks.iter().enumerate() {
            let w = block.total_weight as usize;
            if w > cap {
                debug!(address = %block.address, weight = w, "地址块超出容量，不参与分配");
                continue;
            }
            let block_age = block.age_score();

            for c in (w..=cap).rev() {
                let candidate = match &levels[c - w] {
                    Some(base) => base.with_block(index, block.total_weight, block_age),
                    None => continue,
                };
                // 严格更优才替换：平局保留先到者
                let replace = match &levels[c] {
                    Some(current) => candidate > *current,
                    None => true,
                };
                if replace {
                    levels[c] = Some(candidate);
                }
            }
        }

        let best = levels
            .into_iter()
            .flatten()
            .max()
            .unwrap_or_else(SelectionScore::empty);

        debug!(
            selected_weight = best.weight,
            selected_blocks = best.block_count,
            "分配完成"
        );
        best
    }

    /// 取方案对应的地址块
    pub fn selected_blocks<'b>(
        &self,
        selection: &SelectionScore,
        blocks: &'b [AddressBlock],
    ) -> Vec<&'b AddressBlock> {
        selection
            .block_indices
            .iter()
            .filter_map(|&i| blocks.get(i))
            .collect()
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for CapacityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn block(address: &str, weight: u32, date: Option<(i32, u32, u32)>) -> AddressBlock {
        let mut b = AddressBlock::new(address, "CALI");
        b.total_weight = weight;
        b.unit_ids = vec![0];
        b.earliest_date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        b
    }

    fn addresses(allocator: &CapacityAllocator, s: &SelectionScore, blocks: &[AddressBlock]) -> Vec<String> {
        allocator
            .selected_blocks(s, blocks)
            .iter()
            .map(|b| b.address.clone())
            .collect()
    }

    fn score(weight: u64, age: i64, count: usize, indices: Vec<usize>) -> SelectionScore {
        SelectionScore {
            weight,
            age_score: age,
            block_count: count,
            block_indices: indices,
        }
    }

    // ==========================================
    // 比较器测试
    // ==========================================

    #[test]
    fn test_comparator_weight_dominates() {
        assert!(score(5, 0, 3, vec![0, 1, 2]) > score(4, 1_000, 1, vec![0]));
    }

    #[test]
    fn test_comparator_age_breaks_weight_tie() {
        assert!(score(4, 20, 2, vec![0, 1]) > score(4, 10, 1, vec![2]));
    }

    #[test]
    fn test_comparator_fewer_blocks_break_age_tie() {
        assert!(score(4, 10, 1, vec![3]) > score(4, 10, 2, vec![0, 1]));
    }

    #[test]
    fn test_comparator_earlier_indices_break_full_tie() {
        assert!(score(4, 10, 1, vec![0]) > score(4, 10, 1, vec![1]));
        assert_eq!(score(4, 10, 1, vec![1]).cmp(&score(4, 10, 1, vec![1])), Ordering::Equal);
    }

    // ==========================================
    // 分配测试
    // ==========================================

    #[test]
    fn test_prefers_exact_fill_over_older_partial() {
        // 场景 A: X(2, 较早) vs Y(4, 较晚)，容量 4 → 选 Y
        let allocator = CapacityAllocator::new();
        let blocks = vec![block("X", 2, Some((2024, 1, 1))), block("Y", 4, Some((2024, 6, 1)))];

        let s = allocator.allocate(4, &blocks);
        assert_eq!(addresses(&allocator, &s, &blocks), vec!["Y"]);
        assert_eq!(s.weight, 4);
    }

    #[test]
    fn test_older_block_wins_equal_weight() {
        // 场景 B: 两个重量 3 的块，容量 3 → 只能选一个，较早者胜
        let allocator = CapacityAllocator::new();
        let blocks = vec![block("NEW", 3, Some((2024, 5, 1))), block("OLD", 3, Some((2024, 2, 1)))];

        let s = allocator.allocate(3, &blocks);
        assert_eq!(addresses(&allocator, &s, &blocks), vec!["OLD"]);
    }

    #[test]
    fn test_fewer_stops_when_weight_and_age_tie() {
        // 无日期块年龄分为 0：{BIG} 与 {S1, S2} 同重同分 → 选块数少者
        let allocator = CapacityAllocator::new();
        let blocks = vec![block("S1", 2, None), block("S2", 2, None), block("BIG", 4, None)];

        let s = allocator.allocate(4, &blocks);
        assert_eq!(addresses(&allocator, &s, &blocks), vec!["BIG"]);
    }

    #[test]
    fn test_dated_blocks_beat_dateless_at_equal_weight() {
        let allocator = CapacityAllocator::new();
        let blocks = vec![block("NODATE", 2, None), block("DATED", 2, Some((2030, 1, 1)))];

        let s = allocator.allocate(2, &blocks);
        assert_eq!(addresses(&allocator, &s, &blocks), vec!["DATED"]);
    }

    #[test]
    fn test_underfill_allowed() {
        let allocator = CapacityAllocator::new();
        let blocks = vec![block("A", 3, None), block("B", 5, None)];

        let s = allocator.allocate(7, &blocks);
        assert_eq!(addresses(&allocator, &s, &blocks), vec!["B"]);
        assert_eq!(s.weight, 5);
    }

    #[test]
    fn test_combines_blocks_to_fill() {
        let allocator = CapacityAllocator::new();
        let blocks = vec![block("A", 3, None), block("B", 5, None), block("C", 4, None)];

        let s = allocator.allocate(7, &blocks);
        assert_eq!(addresses(&allocator, &s, &blocks), vec!["A", "C"]);
        assert_eq!(s.weight, 7);
    }

    #[test]
    fn test_oversized_blocks_never_selected() {
        let allocator = CapacityAllocator::new();
        let blocks = vec![block("HUGE", 9, Some((2020, 1, 1)))];

        let s = allocator.allocate(8, &blocks);
        assert!(s.is_empty());
        assert_eq!(s.weight, 0);
    }

    #[test]
    fn test_empty_candidates() {
        let allocator = CapacityAllocator::new();
        assert!(allocator.allocate(10, &[]).is_empty());
    }

    #[test]
    fn test_huge_capacity_sized_by_eligible_weight() {
        let allocator = CapacityAllocator::new();
        let blocks: Vec<AddressBlock> = (0..40)
            .map(|i| block(&format!("DIR {}", i), 1, None))
            .collect();

        let s = allocator.allocate(u32::MAX, &blocks);
        assert_eq!(s.weight, 40);
        assert_eq!(s.block_count, 40);
    }

    #[test]
    fn test_full_tie_resolved_by_input_order() {
        let allocator = CapacityAllocator::new();
        let blocks = vec![block("FIRST", 2, None), block("SECOND", 2, None)];

        let s = allocator.allocate(2, &blocks);
        assert_eq!(addresses(&allocator, &s, &blocks), vec!["FIRST"]);

        // 重复执行结果一致
        for _ in 0..5 {
            assert_eq!(allocator.allocate(2, &blocks), s);
        }
    }
}
