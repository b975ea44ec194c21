// ==========================================
// 车队取货容量分配引擎 - 待取单元领域模型
// ==========================================
// 职责: 已校验的待取单元记录 + 单次导入的数据集快照
// 红线: 运行期间不可变
// ==========================================

use crate::domain::types::UnitId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// PendingUnit - 待取单元
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUnit {
    pub id: UnitId,                          // 数据集内稳定 ID
    pub city: String,                        // 归一化城市
    pub address: String,                     // 归一化地址
    pub product_code: String,                // 归一化产品编码
    pub reservation_date: Option<NaiveDate>, // 预约日期（可缺失）

    // 透传展示列（仅供导出，不参与计算）
    pub attributes: BTreeMap<String, String>,
}

impl PendingUnit {
    /// 读取透传列的值（缺失时返回空串）
    pub fn attribute(&self, column: &str) -> &str {
        self.attributes.get(column).map(String::as_str).unwrap_or("")
    }
}

// ==========================================
// Dataset - 数据集快照
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub batch_id: String,
    pub source_name: String,
    pub loaded_at: DateTime<Utc>,

    // 透传展示列（保持文件中的顺序）
    pub display_columns: Vec<String>,

    // 仅包含通过 "有效状态" 过滤的行
    pub units: Vec<PendingUnit>,

    // ===== 导入统计 =====
    pub total_rows: usize,
    pub inactive_rows: usize,
}

impl Dataset {
    /// 由已构造的单元列表创建数据集（导入管道与测试共用）
    pub fn from_units(
        source_name: impl Into<String>,
        display_columns: Vec<String>,
        units: Vec<PendingUnit>,
    ) -> Self {
        let total_rows = units.len();
        Self {
            batch_id: uuid::Uuid::new_v4().to_string(),
            source_name: source_name.into(),
            loaded_at: Utc::now(),
            display_columns,
            units,
            total_rows,
            inactive_rows: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 按 ID 查找单元
    ///
    /// ID 通常等于下标，先走快路径，再退回线性查找。
    pub fn unit(&self, id: UnitId) -> Option<&PendingUnit> {
        match self.units.get(id) {
            Some(unit) if unit.id == id => Some(unit),
            _ => self.units.iter().find(|u| u.id == id),
        }
    }
}
