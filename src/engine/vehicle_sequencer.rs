// ==========================================
// 车队取货容量分配引擎 - 车辆排序器
// ==========================================
// 职责: 检测城市池争用，仅在真实争用时重排争用车辆
// 规则:
// 1) 无争用（没有两辆车的城市池完全相同）→ 保持登记顺序
// 2) 有争用 → 争用车辆按 (城市池大小, 容量) 升序重排，
//    平局时城市池可达的最早预约日期越早越先；
//    城市池唯一的车辆保持原位置不动
// ==========================================

use crate::domain::vehicle::Vehicle;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

// ==========================================
// VehicleSequencer - 车辆排序器
// ==========================================
pub struct VehicleSequencer {
    // 无状态引擎，不需要注入依赖
}

impl VehicleSequencer {
    pub fn new() -> Self {
        Self {}
    }

    /// 是否存在真实争用（同一城市池被 >= 2 辆车共享，集合相等与顺序无关）
    pub fn has_real_contention(&self, vehicles: &[Vehicle]) -> bool {
        pool_counts(vehicles).values().any(|&n| n >= 2)
    }

    /// 计算处理顺序
    ///
    /// # 参数
    /// - `vehicles`: 登记顺序的车辆快照
    /// - `earliest_for_pool`: 城市池可达的最早预约日期（无日期返回 None）
    ///
    /// # 返回
    /// 处理顺序的车辆引用列表
    pub fn order<'v, F>(&self, vehicles: &'v [Vehicle], earliest_for_pool: F) -> Vec<&'v Vehicle>
    where
        F: Fn(&BTreeSet<String>) -> Option<NaiveDate>,
    {
        let counts = pool_counts(vehicles);
        if !counts.values().any(|&n| n >= 2) {
            debug!(vehicles = vehicles.len(), "无城市池争用，保持登记顺序");
            return vehicles.iter().collect();
        }

        // 城市池首次出现位置（平局时保持分组稳定）
        let mut first_seen: HashMap<&BTreeSet<String>, usize> = HashMap::new();
        for (idx, v) in vehicles.iter().enumerate() {
            first_seen.entry(&v.city_pool).or_insert(idx);
        }

        let mut pool_dates: HashMap<&BTreeSet<String>, Option<NaiveDate>> = HashMap::new();
        let slots: Vec<usize> = vehicles
            .iter()
            .enumerate()
            .filter(|(_, v)| counts[&v.city_pool] >= 2)
            .map(|(idx, _)| idx)
            .collect();
        for &slot in &slots {
            let pool = &vehicles[slot].city_pool;
            pool_dates
                .entry(pool)
                .or_insert_with(|| earliest_for_pool(pool));
        }

        let mut contenders = slots.clone();
        contenders.sort_by(|&a, &b| {
            let (va, vb) = (&vehicles[a], &vehicles[b]);
            va.city_pool
                .len()
                .cmp(&vb.city_pool.len())
                .then_with(|| va.capacity.cmp(&vb.capacity))
                .then_with(|| {
                    compare_oldest_first(pool_dates[&va.city_pool], pool_dates[&vb.city_pool])
                })
                .then_with(|| first_seen[&va.city_pool].cmp(&first_seen[&vb.city_pool]))
                .then_with(|| a.cmp(&b))
        });

        let mut ordered: Vec<&Vehicle> = vehicles.iter().collect();
        for (&slot, &source) in slots.iter().zip(contenders.iter()) {
            ordered[slot] = &vehicles[source];
        }

        debug!(
            contending = slots.len(),
            order = ?ordered.iter().map(|v| v.id).collect::<Vec<_>>(),
            "检测到城市池争用，已重排争用车辆"
        );
        ordered
    }
}

impl Default for VehicleSequencer {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn pool_counts(vehicles: &[Vehicle]) -> HashMap<&BTreeSet<String>, usize> {
    let mut counts: HashMap<&BTreeSet<String>, usize> = HashMap::new();
    for v in vehicles {
        *counts.entry(&v.city_pool).or_insert(0) += 1;
    }
    counts
}

/// 日期越早越靠前，无日期排在最后
fn compare_oldest_first(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
