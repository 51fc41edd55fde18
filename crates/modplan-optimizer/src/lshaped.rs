//! L-shaped 分解控制器
//!
//! 驅動主問題／子問題迭代的狀態機：
//! `BuildMaster → SolveMaster → SolveSubproblems → EvaluateCuts →
//! {Converged | AddCutsAndRepeat}`。
//!
//! 每輪子問題掃描後比較各場景的遞迴成本估計與真實遞迴成本，
//! 全部在容差內才收斂；否則為每個違反的場景合成一條最優性切割
//! 附加到主問題後重解。

use modplan_core::{PlanConfig, PlanError, Result, Scenario, Zone};
use rayon::prelude::*;

use crate::master::{MasterModel, MasterSolution, OptimalityCut};
use crate::report::ScenarioOutcome;
use crate::subproblem::{SubproblemModel, SubproblemSolution};

/// 控制器狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControllerState {
    BuildMaster,
    SolveMaster,
    SolveSubproblems,
    EvaluateCuts,
    AddCutsAndRepeat,
    Converged,
}

/// 分解求解結果
#[derive(Debug)]
pub struct PlanOutcome {
    /// 最終主問題解
    pub master: MasterSolution,

    /// 各場景在最終部署下的子問題結果
    pub outcomes: Vec<ScenarioOutcome>,

    /// 主問題求解次數
    pub iterations: usize,

    /// 附加的切割總數
    pub cuts_added: usize,
}

/// L-shaped 規劃器
#[derive(Debug)]
pub struct LShapedPlanner<'a> {
    config: &'a PlanConfig,
    scenarios: &'a [Scenario],
}

impl<'a> LShapedPlanner<'a> {
    /// 創建規劃器
    ///
    /// 場景數必須與配置一致，且每個場景覆蓋所有區域。
    pub fn new(
        config: &'a PlanConfig,
        zones: &'a [Zone],
        scenarios: &'a [Scenario],
    ) -> Result<Self> {
        config.validate()?;
        if zones.is_empty() || zones.len() > config.zones {
            return Err(PlanError::Configuration(format!(
                "區域數 {} 與配置上限 {} 不符",
                zones.len(),
                config.zones
            )));
        }
        if scenarios.len() != config.scenarios {
            return Err(PlanError::Configuration(format!(
                "場景數 {} 與配置 {} 不符",
                scenarios.len(),
                config.scenarios
            )));
        }
        for (position, scenario) in scenarios.iter().enumerate() {
            // 切割與 theta 皆以編號 − 1 索引，編號必須與位置一致
            if scenario.id != position + 1 {
                return Err(PlanError::Configuration(format!(
                    "場景編號 {} 與位置 {} 不符（編號必須依序為 1..=S）",
                    scenario.id,
                    position + 1
                )));
            }
            if scenario.demand.len() != config.zones {
                return Err(PlanError::Configuration(format!(
                    "場景 {} 的需求未覆蓋所有區域",
                    scenario.id
                )));
            }
        }

        Ok(Self { config, scenarios })
    }

    /// 執行分解迭代直到收斂
    pub fn solve(&self) -> Result<PlanOutcome> {
        let dims = self.config.dims();
        let cap = self.config.production_cap();
        let tolerance = self.config.tolerance;

        let mut master: Option<MasterModel> = None;
        let mut incumbent: Option<MasterSolution> = None;
        let mut sweep: Vec<SubproblemSolution> = Vec::new();
        let mut pending_cuts: Vec<OptimalityCut> = Vec::new();
        let mut iterations = 0usize;
        let mut cuts_added = 0usize;

        let mut state = ControllerState::BuildMaster;
        loop {
            tracing::debug!("控制器狀態: {state:?}");
            state = match state {
                ControllerState::BuildMaster => {
                    master = Some(MasterModel::new(self.config));
                    ControllerState::SolveMaster
                }

                ControllerState::SolveMaster => {
                    if iterations >= self.config.max_iterations {
                        return Err(PlanError::Solver(format!(
                            "L-shaped 在 {} 次迭代內未收斂",
                            self.config.max_iterations
                        )));
                    }
                    iterations += 1;

                    let model = master
                        .as_ref()
                        .ok_or_else(|| PlanError::Other("主問題尚未建立".to_string()))?;
                    let solution = solve_master_with_retry(model)?;
                    tracing::info!(
                        "迭代 {}: 主問題目標 {:.2}（{} 條切割）",
                        iterations,
                        solution.objective,
                        model.cut_count()
                    );
                    incumbent = Some(solution);
                    ControllerState::SolveSubproblems
                }

                ControllerState::SolveSubproblems => {
                    let solution = incumbent
                        .as_ref()
                        .ok_or_else(|| PlanError::Other("主問題尚未求解".to_string()))?;

                    // 子問題彼此獨立，僅共享唯讀的部署值；平行求解，
                    // 全部收齊後才決定是否附加切割
                    sweep = self
                        .scenarios
                        .par_iter()
                        .map(|scenario| {
                            let model = SubproblemModel::new(
                                dims,
                                scenario,
                                &solution.deployment,
                                cap,
                                self.config.unmet_penalty,
                            );
                            solve_subproblem_with_retry(&model)
                        })
                        .collect::<Result<Vec<_>>>()?;

                    ControllerState::EvaluateCuts
                }

                ControllerState::EvaluateCuts => {
                    let solution = incumbent
                        .as_ref()
                        .ok_or_else(|| PlanError::Other("主問題尚未求解".to_string()))?;

                    pending_cuts.clear();
                    let mut worst_gap = 0.0f64;
                    for sub in &sweep {
                        let estimate = solution.theta[sub.scenario_id - 1];
                        let gap = sub.cost - estimate;
                        worst_gap = worst_gap.max(gap);
                        if gap > tolerance {
                            let scenario = &self.scenarios[sub.scenario_id - 1];
                            pending_cuts.push(sub.optimality_cut(&dims, scenario, cap));
                        }
                    }

                    if pending_cuts.is_empty() {
                        tracing::info!(
                            "收斂：最大遞迴成本差距 {:.6} ≤ 容差 {:.6}",
                            worst_gap,
                            tolerance
                        );
                        ControllerState::Converged
                    } else {
                        tracing::info!(
                            "{} 個場景違反容差（最大差距 {:.2}），附加切割後重解",
                            pending_cuts.len(),
                            worst_gap
                        );
                        ControllerState::AddCutsAndRepeat
                    }
                }

                ControllerState::AddCutsAndRepeat => {
                    let model = master
                        .as_mut()
                        .ok_or_else(|| PlanError::Other("主問題尚未建立".to_string()))?;
                    cuts_added += pending_cuts.len();
                    for cut in pending_cuts.drain(..) {
                        model.add_cut(cut);
                    }
                    ControllerState::SolveMaster
                }

                ControllerState::Converged => break,
            };
        }

        let master_solution =
            incumbent.ok_or_else(|| PlanError::Other("主問題尚未求解".to_string()))?;
        let outcomes = sweep
            .iter()
            .map(|sub| ScenarioOutcome {
                scenario_id: sub.scenario_id,
                cost: sub.cost,
                production: sub.production.clone(),
                unmet: sub.unmet.clone(),
            })
            .collect();

        Ok(PlanOutcome {
            master: master_solution,
            outcomes,
            iterations,
            cuts_added,
        })
    }
}

/// 主問題求解，瞬時求解器錯誤以全新模型實例重試一次
fn solve_master_with_retry(model: &MasterModel) -> Result<MasterSolution> {
    match model.solve() {
        Err(PlanError::Solver(message)) => {
            tracing::warn!("主問題求解器錯誤，重試一次: {message}");
            model.solve()
        }
        other => other,
    }
}

/// 子問題求解，瞬時求解器錯誤重試一次；不可行不重試
fn solve_subproblem_with_retry(model: &SubproblemModel<'_>) -> Result<SubproblemSolution> {
    match model.solve() {
        Err(PlanError::Solver(message)) => {
            tracing::warn!("子問題求解器錯誤，重試一次: {message}");
            model.solve()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modplan_core::FleetPolicy;

    fn zones(count: usize) -> Vec<Zone> {
        (1..=count)
            .map(|id| {
                let mut zone = Zone::new(id);
                zone.members.push(id - 1);
                zone
            })
            .collect()
    }

    fn tiny_config() -> PlanConfig {
        PlanConfig::new()
            .with_zones(2)
            .with_units(1)
            .with_periods(1)
            .with_scenarios(1)
            .with_daily_capacity(10_000.0)
            .with_campaign_days(1)
    }

    #[test]
    fn test_converges_and_theta_matches_cost() {
        let config = tiny_config();
        let z = zones(2);
        let scenarios = vec![Scenario::new(1, vec![500.0, 500.0])];
        let outcome = LShapedPlanner::new(&config, &z, &scenarios)
            .unwrap()
            .solve()
            .unwrap();

        // 收斂時每個場景的估計與真實遞迴成本一致
        for sub in &outcome.outcomes {
            let estimate = outcome.master.theta[sub.scenario_id - 1];
            assert!(sub.cost - estimate <= config.tolerance + 1e-6);
        }
        assert!(outcome.iterations >= 1);
    }

    #[test]
    fn test_cuts_are_added_when_recourse_is_costly() {
        // AllowIdle 下首輪主問題不部署、theta 全零，而未滿足需求
        // 罰金高昂，必須經切割迭代而非單趟結束
        let config = tiny_config().with_fleet_policy(FleetPolicy::AllowIdle);
        let z = zones(2);
        let scenarios = vec![Scenario::new(1, vec![500.0, 500.0])];
        let outcome = LShapedPlanner::new(&config, &z, &scenarios)
            .unwrap()
            .solve()
            .unwrap();

        assert!(outcome.cuts_added >= 1);
        assert!(outcome.iterations >= 2);
    }

    #[test]
    fn test_deployment_beats_penalty_when_worthwhile() {
        // 部署成本 5000 < 罰金 100 × 需求 500 × 2 區 → 最優解應部署
        let config = tiny_config().with_fleet_policy(FleetPolicy::AllowIdle);
        let z = zones(2);
        let scenarios = vec![Scenario::new(1, vec![500.0, 500.0])];
        let outcome = LShapedPlanner::new(&config, &z, &scenarios)
            .unwrap()
            .solve()
            .unwrap();

        let deployed = outcome.master.deployment.iter().any(|&d| d > 0.5);
        assert!(deployed);
    }

    #[test]
    fn test_scenario_count_mismatch_rejected() {
        let config = tiny_config();
        let z = zones(2);
        let scenarios = vec![
            Scenario::new(1, vec![500.0, 500.0]),
            Scenario::new(2, vec![400.0, 400.0]),
        ];

        assert!(matches!(
            LShapedPlanner::new(&config, &z, &scenarios).unwrap_err(),
            PlanError::Configuration(_)
        ));
    }

    #[test]
    fn test_out_of_order_scenario_ids_rejected() {
        // 編號為 1..=S 的排列但未依序排列：theta 與切割的
        // 編號索引會對上錯誤場景的需求，必須在建構時拒絕
        let config = tiny_config().with_scenarios(2);
        let z = zones(2);
        let scenarios = vec![
            Scenario::new(2, vec![5_000.0, 5_000.0]),
            Scenario::new(1, vec![100.0, 100.0]),
        ];

        assert!(matches!(
            LShapedPlanner::new(&config, &z, &scenarios).unwrap_err(),
            PlanError::Configuration(_)
        ));
    }

    #[test]
    fn test_zero_scenario_id_rejected() {
        let config = tiny_config();
        let z = zones(2);
        let scenarios = vec![Scenario::new(0, vec![500.0, 500.0])];

        assert!(matches!(
            LShapedPlanner::new(&config, &z, &scenarios).unwrap_err(),
            PlanError::Configuration(_)
        ));
    }

    #[test]
    fn test_scenario_zone_coverage_rejected() {
        let config = tiny_config();
        let z = zones(2);
        let scenarios = vec![Scenario::new(1, vec![500.0])];

        assert!(matches!(
            LShapedPlanner::new(&config, &z, &scenarios).unwrap_err(),
            PlanError::Configuration(_)
        ));
    }
}
