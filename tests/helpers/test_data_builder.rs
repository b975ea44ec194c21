// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use fleet_pickup_alloc::config::{ConfigManager, PlannerConfig};
use fleet_pickup_alloc::domain::{AddressBlock, Dataset, PendingUnit, Vehicle, VehicleRegistration};
use fleet_pickup_alloc::engine::EquivalenceTable;
use fleet_pickup_alloc::PlannerApi;
use std::collections::BTreeMap;

/// "YYYY-MM-DD" → NaiveDate（测试数据固定合法）
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ==========================================
// PendingUnit 构建器
// ==========================================

pub struct UnitBuilder {
    id: usize,
    city: String,
    address: String,
    product_code: String,
    reservation_date: Option<NaiveDate>,
    attributes: BTreeMap<String, String>,
}

impl UnitBuilder {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            city: "CALI".to_string(),
            address: format!("CALLE {}", id),
            product_code: "A".to_string(),
            reservation_date: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn city(mut self, city: &str) -> Self {
        self.city = city.to_string();
        self
    }

    pub fn address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    pub fn code(mut self, code: &str) -> Self {
        self.product_code = code.to_string();
        self
    }

    pub fn date(mut self, d: &str) -> Self {
        self.reservation_date = Some(date(d));
        self
    }

    pub fn attribute(mut self, column: &str, value: &str) -> Self {
        self.attributes.insert(column.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> PendingUnit {
        PendingUnit {
            id: self.id,
            city: self.city,
            address: self.address,
            product_code: self.product_code,
            reservation_date: self.reservation_date,
            attributes: self.attributes,
        }
    }
}

// ==========================================
// 车辆登记构建器
// ==========================================

pub struct VehicleBuilder {
    plate: String,
    capacity: i64,
    cities: Vec<String>,
}

impl VehicleBuilder {
    pub fn new(plate: &str) -> Self {
        Self {
            plate: plate.to_string(),
            capacity: 10,
            cities: vec!["CALI".to_string()],
        }
    }

    pub fn capacity(mut self, capacity: i64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn cities(mut self, cities: &[&str]) -> Self {
        self.cities = cities.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn registration(self) -> VehicleRegistration {
        VehicleRegistration {
            carrier: "TRANSPORTES DEL VALLE".to_string(),
            driver: format!("CONDUCTOR {}", self.plate),
            plate: self.plate,
            capacity: self.capacity,
            cities: self.cities,
        }
    }

    /// 直接构造已校验车辆（登记簿之外的引擎测试）
    pub fn build(self, id: usize) -> Vehicle {
        Vehicle::from_registration(id, self.registration()).unwrap()
    }
}

// ==========================================
// 地址块 / 数据集 / API 快捷构造
// ==========================================

/// 地址块: (单元 ID, 权重, 日期)
pub fn block(address: &str, members: &[(usize, u32, Option<&str>)]) -> AddressBlock {
    let mut block = AddressBlock::new(address, "CALI");
    for &(id, weight, d) in members {
        block.push(id, weight, d.map(date)).unwrap();
    }
    block
}

pub fn dataset(units: Vec<PendingUnit>) -> Dataset {
    Dataset::from_units("test.csv", vec![], units)
}

/// 等价表 {A:1, B:4}，默认配置
pub fn planner_api() -> PlannerApi {
    planner_api_with(EquivalenceTable::from_entries([("A", 1), ("B", 4)]))
}

pub fn planner_api_with(table: EquivalenceTable) -> PlannerApi {
    PlannerApi::new(ConfigManager::from_config(PlannerConfig::default()), table)
}
