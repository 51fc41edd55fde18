//! # Modplan
//!
//! 兩階段隨機設施部署規劃系統。
//!
//! 完整流程：設施座標載入 → 空間分群 → 隨機需求場景生成 →
//! 兩階段隨機最佳化（L-shaped 分解或確定性等價）→ 結果彙整 →
//! 純文字報告。各階段由獨立 crate 提供，此處以 [`Pipeline`]
//! 串接並重新導出主要類型。

use std::path::Path;

pub use modplan_calc::{
    ClusterEngine, DemandBaseline, EpidemicBaseline, ObservedRateBaseline, ScenarioGenerator,
};
pub use modplan_core::{
    load_facilities, Facility, FleetPolicy, PlanConfig, PlanDims, PlanError, Result, Scenario,
    Zone,
};
pub use modplan_optimizer::{
    ExtensiveModel, LShapedPlanner, MasterSolution, PlanOutcome, PlanReport, ResultAggregator,
    ScenarioOutcome,
};

/// 求解模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveMode {
    /// L-shaped（Benders）分解：主問題 + 每場景子問題迭代
    #[default]
    Decomposition,

    /// 確定性等價：所有場景合併為單一 MIP
    Extensive,
}

/// 一次完整規劃執行的產出
#[derive(Debug)]
pub struct PlanRun {
    /// 分群結果
    pub zones: Vec<Zone>,

    /// 生成的需求場景
    pub scenarios: Vec<Scenario>,

    /// 最終報告
    pub report: PlanReport,
}

/// 端到端規劃管線
///
/// 串接載入、分群、場景生成與求解；基準需求策略由呼叫端注入。
pub struct Pipeline<B: DemandBaseline> {
    config: PlanConfig,
    baseline: B,
    mode: SolveMode,
}

impl<B: DemandBaseline> Pipeline<B> {
    /// 以配置與基準需求策略創建管線
    pub fn new(config: PlanConfig, baseline: B) -> Self {
        Self {
            config,
            baseline,
            mode: SolveMode::default(),
        }
    }

    /// 設置求解模式
    pub fn with_mode(mut self, mode: SolveMode) -> Self {
        self.mode = mode;
        self
    }

    /// 從設施 CSV 執行完整管線
    pub fn run(&self, facility_path: impl AsRef<Path>) -> Result<PlanRun> {
        let facilities = load_facilities(facility_path)?;
        tracing::info!("載入 {} 個設施", facilities.len());

        let zones = ClusterEngine::partition(&facilities, &self.config)?;

        // 需求與決策皆以配置的區域格數索引，與實際開啟的分群數無關
        let scenarios = ScenarioGenerator::new(&self.baseline)
            .generate(&self.config, self.config.zones)?;

        self.solve(&zones, &scenarios).map(|report| PlanRun {
            zones,
            scenarios,
            report,
        })
    }

    /// 在已就緒的分群與場景上求解並組裝報告
    pub fn solve(&self, zones: &[Zone], scenarios: &[Scenario]) -> Result<PlanReport> {
        let dims = self.config.dims();

        match self.mode {
            SolveMode::Decomposition => {
                let outcome = LShapedPlanner::new(&self.config, zones, scenarios)?.solve()?;
                tracing::info!(
                    "分解收斂：{} 次迭代，{} 條切割",
                    outcome.iterations,
                    outcome.cuts_added
                );

                let best = ResultAggregator::select(&outcome.outcomes)?;
                let scenario = &scenarios[best.scenario_id - 1];
                Ok(PlanReport::build(
                    dims,
                    scenario,
                    &outcome.master.deployment,
                    best,
                ))
            }
            SolveMode::Extensive => {
                let solution = ExtensiveModel::new(&self.config, scenarios)?.solve()?;
                tracing::info!("確定性等價求解完成：目標 {:.2}", solution.objective);

                let best = ResultAggregator::select(&solution.outcomes)?;
                let scenario = &scenarios[best.scenario_id - 1];
                let deployment = &solution.deployments[best.scenario_id - 1];
                Ok(PlanReport::build(dims, scenario, deployment, best))
            }
        }
    }
}
