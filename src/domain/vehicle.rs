// ==========================================
// 车队取货容量分配引擎 - 车辆领域模型
// ==========================================
// 职责: 车辆登记输入、已登记车辆、车辆登记簿
// 红线: 登记后不可变；登记簿只追加
// ==========================================

use crate::domain::types::{normalize_key, ValidationIssue, VehicleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// VehicleRegistration - 车辆登记输入
// ==========================================
// 用途: 调用方提交的原始登记数据（容量可能非法，需校验）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRegistration {
    pub carrier: String,      // 承运商
    pub driver: String,       // 司机
    pub plate: String,        // 车牌
    pub capacity: i64,        // 容量（等价重量单位）
    pub cities: Vec<String>,  // 可服务城市
}

// ==========================================
// Vehicle - 已登记车辆
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub carrier: String,
    pub driver: String,
    pub plate: String,
    pub capacity: u32,

    // 归一化后的城市集合（集合相等与顺序无关）
    pub city_pool: BTreeSet<String>,
}

impl Vehicle {
    /// 校验登记数据并构造车辆
    ///
    /// # 返回
    /// - Ok(Vehicle): 容量为正、城市池非空
    /// - Err(ValidationIssue): 校验失败原因
    pub fn from_registration(
        id: VehicleId,
        registration: VehicleRegistration,
    ) -> Result<Self, ValidationIssue> {
        let plate = registration.plate.trim().to_string();

        if registration.capacity <= 0 || registration.capacity > i64::from(u32::MAX) {
            return Err(ValidationIssue::NonPositiveCapacity {
                plate,
                capacity: registration.capacity,
            });
        }

        let city_pool: BTreeSet<String> = registration
            .cities
            .iter()
            .map(|c| normalize_key(c))
            .filter(|c| !c.is_empty())
            .collect();
        if city_pool.is_empty() {
            return Err(ValidationIssue::EmptyCityPool { plate });
        }

        Ok(Self {
            id,
            carrier: registration.carrier.trim().to_string(),
            driver: registration.driver.trim().to_string(),
            plate,
            capacity: registration.capacity as u32,
            city_pool,
        })
    }

    pub fn serves(&self, city: &str) -> bool {
        self.city_pool.contains(city)
    }

    /// 城市池展示文本（"A, B, C"）
    pub fn cities_label(&self) -> String {
        self.city_pool.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

// ==========================================
// VehicleRegistry - 车辆登记簿
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct VehicleRegistry {
    vehicles: Vec<Vehicle>,
}

impl VehicleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记车辆（校验通过后追加，ID 顺序递增）
    pub fn register(&mut self, registration: VehicleRegistration) -> Result<VehicleId, ValidationIssue> {
        let id = self.vehicles.len() + 1;
        let vehicle = Vehicle::from_registration(id, registration)?;
        self.vehicles.push(vehicle);
        Ok(id)
    }

    /// 只读快照（登记顺序）
    pub fn snapshot(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn clear(&mut self) {
        self.vehicles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(plate: &str, capacity: i64, cities: &[&str]) -> VehicleRegistration {
        VehicleRegistration {
            carrier: "TRANSPORTES ANDINOS".to_string(),
            driver: "Operador".to_string(),
            plate: plate.to_string(),
            capacity,
            cities: cities.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut registry = VehicleRegistry::new();
        let a = registry.register(registration("ABC123", 10, &["cali"])).unwrap();
        let b = registry.register(registration("XYZ789", 5, &["bogota"])).unwrap();

        assert_eq!((a, b), (1, 2));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.snapshot()[1].plate, "XYZ789");
    }

    #[test]
    fn test_city_pool_normalized_and_deduplicated() {
        let vehicle =
            Vehicle::from_registration(1, registration("ABC123", 10, &[" cali ", "CALI", "Palmira", ""]))
                .unwrap();

        assert_eq!(vehicle.city_pool.len(), 2);
        assert!(vehicle.serves("CALI"));
        assert!(vehicle.serves("PALMIRA"));
        assert_eq!(vehicle.cities_label(), "CALI, PALMIRA");
    }

    #[test]
    fn test_non_positive_capacity_rejected() {
        let mut registry = VehicleRegistry::new();
        let err = registry.register(registration("ABC123", 0, &["cali"])).unwrap_err();

        assert_eq!(
            err,
            ValidationIssue::NonPositiveCapacity {
                plate: "ABC123".to_string(),
                capacity: 0
            }
        );
        assert!(registry.is_empty()); // 失败不追加
    }

    #[test]
    fn test_empty_pool_rejected() {
        let err = Vehicle::from_registration(1, registration("ABC123", 4, &["  "])).unwrap_err();
        assert_eq!(err, ValidationIssue::EmptyCityPool { plate: "ABC123".to_string() });
    }
}
