// ==========================================
// 车队取货容量分配引擎 - 规划API
// ==========================================
// 职责: 显式的规划上下文（数据集 / 勾选表 / 车辆登记簿 / 等价表 / 上次运行结果）
// 红线: 运行整体成功或整体作废；失败时上次运行结果保持不变
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{load_equivalence_table, ConfigManager};
use crate::domain::run::RunOutcome;
use crate::domain::types::VehicleId;
use crate::domain::unit::Dataset;
use crate::domain::vehicle::{Vehicle, VehicleRegistration, VehicleRegistry};
use crate::engine::{
    AllocationDriver, EquivalenceResolver, EquivalenceTable, RunContext, SelectionStore,
    SpecialReference,
};
use crate::export::ExportDocument;
use crate::importer::DatasetImporter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info, instrument, warn};

/// 规划运行响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    /// 运行结局（有分配 / 零分配诊断）
    pub outcome: RunOutcome,
    /// 导出文档（零分配时为 None）
    pub document: Option<ExportDocument>,
}

/// 规划API
pub struct PlannerApi {
    config: ConfigManager,
    resolver: EquivalenceResolver,
    driver: AllocationDriver,

    // 会话状态
    dataset: Option<Dataset>,
    selection: SelectionStore,
    registry: VehicleRegistry,
    last_run: Option<RunOutcome>,
}

impl PlannerApi {
    /// 使用给定配置与等价表创建
    pub fn new(config: ConfigManager, table: EquivalenceTable) -> Self {
        Self {
            config,
            resolver: EquivalenceResolver::new(table),
            driver: AllocationDriver::new(),
            dataset: None,
            selection: SelectionStore::new(),
            registry: VehicleRegistry::new(),
            last_run: None,
        }
    }

    /// 按配置加载等价表后创建（未配置等价表时所有编码权重为 1）
    pub fn from_config(config: ConfigManager) -> ApiResult<Self> {
        let table = match config.equivalence_path() {
            Some(path) => load_equivalence_table(&path)?,
            None => {
                warn!("未配置等价表，所有编码按权重 1 处理");
                EquivalenceTable::new()
            }
        };
        Ok(Self::new(config, table))
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    pub fn resolver(&self) -> &EquivalenceResolver {
        &self.resolver
    }

    // ==========================================
    // 数据集
    // ==========================================

    /// 从文件导入数据集
    ///
    /// # 返回
    /// - Ok(&Dataset): 导入成功，勾选表已重置
    /// - Err(ApiError::Validation): 必需列缺失
    /// - Err(ApiError::Import): 文件错误
    pub fn load_dataset<P: AsRef<Path>>(&mut self, file_path: P) -> ApiResult<&Dataset> {
        let dataset = DatasetImporter::new(self.config.config()).import_file(file_path)?;
        Ok(self.set_dataset(dataset))
    }

    /// 替换当前数据集并重置勾选表
    pub fn set_dataset(&mut self, dataset: Dataset) -> &Dataset {
        self.selection.reset_for(&dataset, &self.resolver);
        info!(
            batch_id = %dataset.batch_id,
            units = dataset.len(),
            special_references = self.selection.special_references().len(),
            "数据集已载入"
        );
        self.dataset.insert(dataset)
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    // ==========================================
    // 车辆
    // ==========================================

    /// 登记车辆
    pub fn register_vehicle(&mut self, registration: VehicleRegistration) -> ApiResult<VehicleId> {
        let id = self.registry.register(registration)?;
        info!(vehicle_id = id, "车辆已登记");
        Ok(id)
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        self.registry.snapshot()
    }

    pub fn clear_vehicles(&mut self) {
        self.registry.clear();
    }

    // ==========================================
    // 特殊编码勾选
    // ==========================================

    pub fn special_references(&self) -> Vec<SpecialReference> {
        self.selection.special_references()
    }

    /// 更新 (城市, 编码) 的勾选状态
    ///
    /// # 返回
    /// - true: 条目已存在于当前数据集
    pub fn update_selection(&mut self, city: &str, product_code: &str, include: bool) -> bool {
        let known = self.selection.update(city, product_code, include);
        if !known {
            warn!(city, product_code, "勾选的编码不在当前数据集中");
        }
        known
    }

    // ==========================================
    // 规划运行
    // ==========================================

    /// 执行一次规划运行并组装导出文档
    ///
    /// # 返回
    /// - Ok(PlanResponse): 运行完成（可能是零分配结局）
    /// - Err(ApiError::Validation): 运行前校验失败，未修改任何状态
    /// - Err(ApiError::Computation): 运行或导出组装失败，上次运行结果保持不变
    #[instrument(skip(self))]
    pub fn run_plan(&mut self) -> ApiResult<PlanResponse> {
        let response = {
            let ctx = RunContext::new(
                self.dataset.as_ref(),
                self.registry.snapshot(),
                &self.resolver,
                &self.selection,
            )?;

            let outcome = self.driver.run(&ctx).map_err(|e| {
                error!(error = %e, "规划运行失败");
                ApiError::from(e)
            })?;

            let document = match &outcome {
                RunOutcome::Assigned(report) => Some(
                    ExportDocument::assemble(report, ctx.dataset, &self.config.config().export)
                        .map_err(|e| {
                            error!(error = %e, "导出文档组装失败");
                            ApiError::Computation(format!("导出文档组装失败: {}", e))
                        })?,
                ),
                RunOutcome::NoAssignment(empty) => {
                    warn!("{}", empty.diagnosis());
                    None
                }
            };

            PlanResponse { outcome, document }
        };

        self.last_run = Some(response.outcome.clone());
        Ok(response)
    }

    pub fn last_run(&self) -> Option<&RunOutcome> {
        self.last_run.as_ref()
    }
}
