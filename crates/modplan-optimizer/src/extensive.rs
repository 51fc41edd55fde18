//! 確定性等價模型（extensive form）
//!
//! 不做分解，直接以單一 MIP 涵蓋所有場景：部署／移動／生產／
//! 未滿足需求變數皆附場景索引，目標為場景成本的平均。
//! 適合在小型實例上驗證分解結果，或作為替代求解模式。

use modplan_core::{FleetPolicy, PlanConfig, PlanError, Result, Scenario};

use crate::report::ScenarioOutcome;
use crate::solver::{ModelBuilder, SolveOutcome};

/// 確定性等價求解結果
#[derive(Debug)]
pub struct ExtensiveSolution {
    /// 模型目標值（平均場景成本）
    pub objective: f64,

    /// 各場景結果；成本為該場景的部署 + 移動 + 罰金總成本
    pub outcomes: Vec<ScenarioOutcome>,

    /// 各場景的部署值，依展平索引排列
    pub deployments: Vec<Vec<f64>>,
}

/// 確定性等價模型
#[derive(Debug)]
pub struct ExtensiveModel<'a> {
    config: &'a PlanConfig,
    scenarios: &'a [Scenario],
}

impl<'a> ExtensiveModel<'a> {
    /// 創建模型
    pub fn new(config: &'a PlanConfig, scenarios: &'a [Scenario]) -> Result<Self> {
        config.validate()?;
        if scenarios.len() != config.scenarios {
            return Err(PlanError::Configuration(format!(
                "場景數 {} 與配置 {} 不符",
                scenarios.len(),
                config.scenarios
            )));
        }
        for (position, scenario) in scenarios.iter().enumerate() {
            // 結果以編號 − 1 索引，編號必須與位置一致
            if scenario.id != position + 1 {
                return Err(PlanError::Configuration(format!(
                    "場景編號 {} 與位置 {} 不符（編號必須依序為 1..=S）",
                    scenario.id,
                    position + 1
                )));
            }
        }
        Ok(Self { config, scenarios })
    }

    /// 組建並求解整體模型
    pub fn solve(&self) -> Result<ExtensiveSolution> {
        let dims = self.config.dims();
        let cap = self.config.production_cap();
        let weight = 1.0 / self.scenarios.len() as f64;

        let mut builder = ModelBuilder::new();

        // 每場景一組決策變數
        let mut deploy_vars: Vec<Vec<usize>> = Vec::with_capacity(self.scenarios.len());
        let mut movement_vars: Vec<Vec<usize>> = Vec::with_capacity(self.scenarios.len());
        let mut production_vars: Vec<Vec<usize>> = Vec::with_capacity(self.scenarios.len());
        let mut unmet_vars: Vec<Vec<usize>> = Vec::with_capacity(self.scenarios.len());

        for scenario in self.scenarios {
            let deploy: Vec<usize> = dims
                .deploy_keys()
                .map(|_| builder.add_binary(self.config.deployment_cost * weight))
                .collect();

            let mut move_vars: Vec<(usize, usize)> = Vec::new();
            for i in 0..dims.zones {
                for j in 0..dims.zones {
                    if i == j {
                        continue;
                    }
                    for m in 0..dims.units {
                        for t in 0..dims.periods {
                            let var = builder.add_binary(self.config.movement_cost * weight);
                            move_vars.push((var, dims.deploy_index(i, m, t)));
                        }
                    }
                }
            }

            let production: Vec<usize> = dims
                .deploy_keys()
                .map(|_| builder.add_continuous(0.0))
                .collect();
            let unmet: Vec<usize> = (0..dims.zone_period_len())
                .map(|_| builder.add_continuous(self.config.unmet_penalty * weight))
                .collect();

            // 部署數量約束
            for m in 0..dims.units {
                for t in 0..dims.periods {
                    let terms: Vec<(usize, f64)> = (0..dims.zones)
                        .map(|n| (deploy[dims.deploy_index(n, m, t)], 1.0))
                        .collect();
                    match self.config.fleet_policy {
                        FleetPolicy::AllowIdle => {
                            builder.add_row_le(1.0, &terms);
                        }
                        FleetPolicy::FullUtilization => {
                            builder.add_row_ge(1.0, &terms);
                        }
                    }
                }
            }

            // 移動連結約束
            for &(var, origin_idx) in &move_vars {
                builder.add_row_le(0.0, &[(var, 1.0), (deploy[origin_idx], -1.0)]);
            }

            // 產能：production ≤ cap · deploy
            for idx in 0..dims.deploy_len() {
                builder.add_row_le(0.0, &[(production[idx], 1.0), (deploy[idx], -cap)]);
            }

            // 需求滿足
            for n in 0..dims.zones {
                for t in 0..dims.periods {
                    let mut terms: Vec<(usize, f64)> = (0..dims.units)
                        .map(|m| (production[dims.deploy_index(n, m, t)], 1.0))
                        .collect();
                    terms.push((unmet[dims.zone_period_index(n, t)], 1.0));
                    builder.add_row_ge(scenario.demand_for(n), &terms);
                }
            }

            deploy_vars.push(deploy);
            movement_vars.push(move_vars.iter().map(|&(var, _)| var).collect());
            production_vars.push(production);
            unmet_vars.push(unmet);
        }

        tracing::debug!(
            "確定性等價模型：{} 個變數，{} 個約束",
            builder.num_vars(),
            builder.num_rows()
        );

        let assignment = match builder.minimise() {
            SolveOutcome::Optimal(assignment) => assignment,
            SolveOutcome::Infeasible => return Err(PlanError::MasterInfeasible),
            SolveOutcome::Failed(status) => {
                return Err(PlanError::Solver(format!(
                    "確定性等價模型求解失敗: {status}"
                )))
            }
        };

        let mut outcomes = Vec::with_capacity(self.scenarios.len());
        let mut deployments = Vec::with_capacity(self.scenarios.len());
        for (s, scenario) in self.scenarios.iter().enumerate() {
            let deployment: Vec<f64> = deploy_vars[s]
                .iter()
                .map(|&v| assignment.values[v])
                .collect();
            let production: Vec<f64> = production_vars[s]
                .iter()
                .map(|&v| assignment.values[v])
                .collect();
            let unmet: Vec<f64> = unmet_vars[s].iter().map(|&v| assignment.values[v]).collect();

            let deploy_count = deployment.iter().filter(|&&d| d > 0.5).count();
            let move_count = movement_vars[s]
                .iter()
                .filter(|&&v| assignment.values[v] > 0.5)
                .count();
            let unmet_total: f64 = unmet.iter().sum();
            let cost = self.config.deployment_cost * deploy_count as f64
                + self.config.movement_cost * move_count as f64
                + self.config.unmet_penalty * unmet_total;

            outcomes.push(ScenarioOutcome {
                scenario_id: scenario.id,
                cost,
                production,
                unmet,
            });
            deployments.push(deployment);
        }

        Ok(ExtensiveSolution {
            objective: assignment.objective,
            outcomes,
            deployments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_config(scenarios: usize) -> PlanConfig {
        PlanConfig::new()
            .with_zones(2)
            .with_units(1)
            .with_periods(1)
            .with_scenarios(scenarios)
            .with_daily_capacity(10_000.0)
            .with_campaign_days(1)
            .with_fleet_policy(FleetPolicy::AllowIdle)
    }

    #[test]
    fn test_solves_and_covers_demand() {
        let config = tiny_config(1);
        let scenarios = vec![Scenario::new(1, vec![500.0, 500.0])];
        let solution = ExtensiveModel::new(&config, &scenarios)
            .unwrap()
            .solve()
            .unwrap();

        let dims = config.dims();
        let outcome = &solution.outcomes[0];
        for n in 0..dims.zones {
            let produced: f64 = (0..dims.units)
                .map(|m| outcome.production[dims.deploy_index(n, m, 0)])
                .sum();
            let unmet = outcome.unmet[dims.zone_period_index(n, 0)];
            assert!(produced + unmet >= 500.0 - 1e-6);
        }
    }

    #[test]
    fn test_production_respects_deployment() {
        let config = tiny_config(2);
        let scenarios = vec![
            Scenario::new(1, vec![500.0, 500.0]),
            Scenario::new(2, vec![300.0, 700.0]),
        ];
        let solution = ExtensiveModel::new(&config, &scenarios)
            .unwrap()
            .solve()
            .unwrap();

        let dims = config.dims();
        for (s, outcome) in solution.outcomes.iter().enumerate() {
            for idx in 0..dims.deploy_len() {
                if outcome.production[idx] > 1e-6 {
                    assert!(solution.deployments[s][idx] > 0.5);
                }
            }
        }
    }

    #[test]
    fn test_scenario_count_mismatch_rejected() {
        let config = tiny_config(2);
        let scenarios = vec![Scenario::new(1, vec![500.0, 500.0])];

        assert!(ExtensiveModel::new(&config, &scenarios).is_err());
    }

    #[test]
    fn test_out_of_order_scenario_ids_rejected() {
        let config = tiny_config(2);
        let scenarios = vec![
            Scenario::new(2, vec![5_000.0, 5_000.0]),
            Scenario::new(1, vec![100.0, 100.0]),
        ];

        assert!(matches!(
            ExtensiveModel::new(&config, &scenarios).unwrap_err(),
            PlanError::Configuration(_)
        ));
    }

    #[test]
    fn test_outcome_costs_average_to_objective() {
        // 重建的場景成本（部署 + 移動 + 罰金）平均後必須等於模型目標值
        let config = tiny_config(2);
        let scenarios = vec![
            Scenario::new(1, vec![500.0, 500.0]),
            Scenario::new(2, vec![300.0, 700.0]),
        ];
        let solution = ExtensiveModel::new(&config, &scenarios)
            .unwrap()
            .solve()
            .unwrap();

        let average: f64 = solution.outcomes.iter().map(|o| o.cost).sum::<f64>()
            / solution.outcomes.len() as f64;
        assert!((average - solution.objective).abs() < 1e-3);
    }
}
