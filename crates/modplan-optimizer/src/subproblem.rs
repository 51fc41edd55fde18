//! 子問題模型（第二階段，單一場景）
//!
//! 在固定的部署決策下，為一個已實現的需求場景配置連續生產量
//! 與未滿足需求鬆弛變數。不同場景的子問題彼此獨立。

use modplan_core::{PlanDims, PlanError, Result, Scenario};

use crate::master::OptimalityCut;
use crate::solver::{ModelBuilder, SolveOutcome};

/// 子問題求解結果
///
/// 除了配置結果外，同時攜帶需求與產能兩族對偶值，供切割合成使用。
#[derive(Debug, Clone)]
pub struct SubproblemSolution {
    /// 場景編號
    pub scenario_id: usize,

    /// 場景遞迴成本（罰金 × 未滿足需求總量）
    pub cost: f64,

    /// 生產配置，依（區域, 單元, 期間）展平索引排列
    pub production: Vec<f64>,

    /// 未滿足需求，依（區域, 期間）展平索引排列
    pub unmet: Vec<f64>,

    /// 需求滿足約束的對偶值 π（≥ 0）
    pub demand_duals: Vec<f64>,

    /// 產能約束的對偶值 μ（≤ 0）
    pub capacity_duals: Vec<f64>,
}

impl SubproblemSolution {
    /// 由對偶值合成場景專屬的 Benders 最優性切割
    ///
    /// theta_s ≥ Σ π(n,t)·d_s(n) + Σ μ(n,m,t)·cap·deploy(n,m,t)
    ///
    /// 對偶可行域與部署值無關（部署只出現在右手邊），
    /// 因此切割對任何部署決策皆為有效下界。
    pub fn optimality_cut(
        &self,
        dims: &PlanDims,
        scenario: &Scenario,
        production_cap: f64,
    ) -> OptimalityCut {
        let mut rhs = 0.0;
        for n in 0..dims.zones {
            for t in 0..dims.periods {
                rhs += self.demand_duals[dims.zone_period_index(n, t)] * scenario.demand_for(n);
            }
        }

        let deploy_coeffs = self
            .capacity_duals
            .iter()
            .map(|mu| mu * production_cap)
            .collect();

        OptimalityCut {
            scenario: self.scenario_id,
            deploy_coeffs,
            rhs,
        }
    }
}

/// 子問題模型，由最後一次主問題求解的部署值參數化
pub struct SubproblemModel<'a> {
    dims: PlanDims,
    scenario: &'a Scenario,
    deployment: &'a [f64],
    production_cap: f64,
    unmet_penalty: f64,
}

impl<'a> SubproblemModel<'a> {
    /// 創建子問題
    pub fn new(
        dims: PlanDims,
        scenario: &'a Scenario,
        deployment: &'a [f64],
        production_cap: f64,
        unmet_penalty: f64,
    ) -> Self {
        Self {
            dims,
            scenario,
            deployment,
            production_cap,
            unmet_penalty,
        }
    }

    /// 求解子問題
    ///
    /// 有未滿足需求鬆弛變數的設計下子問題恆可行；若回報不可行，
    /// 視為模型配置不一致的致命錯誤而非可重試的瞬時失敗。
    pub fn solve(&self) -> Result<SubproblemSolution> {
        let dims = self.dims;
        let mut builder = ModelBuilder::new();

        // 生產變數（目標係數 0，產能以約束列表達以取得對偶值）
        let production: Vec<usize> = dims
            .deploy_keys()
            .map(|_| builder.add_continuous(0.0))
            .collect();

        // 未滿足需求鬆弛變數
        let unmet: Vec<usize> = (0..dims.zone_period_len())
            .map(|_| builder.add_continuous(self.unmet_penalty))
            .collect();

        // 需求滿足：Σ_m production(n,m,t) + unmet(n,t) ≥ d_s(n)
        let mut demand_rows = Vec::with_capacity(dims.zone_period_len());
        for n in 0..dims.zones {
            for t in 0..dims.periods {
                let mut terms: Vec<(usize, f64)> = (0..dims.units)
                    .map(|m| (production[dims.deploy_index(n, m, t)], 1.0))
                    .collect();
                terms.push((unmet[dims.zone_period_index(n, t)], 1.0));
                demand_rows.push(builder.add_row_ge(self.scenario.demand_for(n), &terms));
            }
        }

        // 產能：production(n,m,t) ≤ cap · deploy(n,m,t)，部署值已固定
        let mut capacity_rows = Vec::with_capacity(dims.deploy_len());
        for (idx, (n, m, t)) in dims.deploy_keys().enumerate() {
            let bound = self.production_cap * self.deployment[dims.deploy_index(n, m, t)];
            capacity_rows.push(builder.add_row_le(bound, &[(production[idx], 1.0)]));
        }

        match builder.minimise() {
            SolveOutcome::Optimal(assignment) => {
                let production_values =
                    production.iter().map(|&v| assignment.values[v]).collect();
                let unmet_values = unmet.iter().map(|&v| assignment.values[v]).collect();
                let demand_duals = demand_rows
                    .iter()
                    .map(|&r| assignment.row_duals[r])
                    .collect();
                let capacity_duals = capacity_rows
                    .iter()
                    .map(|&r| assignment.row_duals[r])
                    .collect();

                Ok(SubproblemSolution {
                    scenario_id: self.scenario.id,
                    cost: assignment.objective,
                    production: production_values,
                    unmet: unmet_values,
                    demand_duals,
                    capacity_duals,
                })
            }
            SolveOutcome::Infeasible => Err(PlanError::SubproblemInfeasible {
                scenario: self.scenario.id,
            }),
            SolveOutcome::Failed(status) => Err(PlanError::Solver(format!(
                "場景 {} 子問題求解失敗: {status}",
                self.scenario.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> PlanDims {
        PlanDims {
            zones: 2,
            units: 1,
            periods: 1,
        }
    }

    #[test]
    fn test_deployed_unit_covers_demand() {
        // 單元部署於區域 0，產能充足 → 區域 0 無未滿足需求
        let scenario = Scenario::new(1, vec![500.0, 500.0]);
        let deployment = vec![1.0, 0.0];
        let solution = SubproblemModel::new(dims(), &scenario, &deployment, 10_000.0, 100.0)
            .solve()
            .unwrap();

        assert!((solution.production[0] - 500.0).abs() < 1e-6);
        assert!(solution.unmet[0].abs() < 1e-6);
        // 區域 1 無部署 → 未滿足需求等於該區需求
        assert!(solution.production[1].abs() < 1e-6);
        assert!((solution.unmet[1] - 500.0).abs() < 1e-6);
        assert!((solution.cost - 50_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_production_zero_where_not_deployed() {
        let scenario = Scenario::new(1, vec![800.0, 800.0]);
        let deployment = vec![0.0, 1.0];
        let solution = SubproblemModel::new(dims(), &scenario, &deployment, 10_000.0, 100.0)
            .solve()
            .unwrap();

        // 連結不變量：未部署處生產必為零
        assert!(solution.production[0].abs() < 1e-6);
        assert!((solution.unmet[0] - 800.0).abs() < 1e-6);
    }

    #[test]
    fn test_capacity_bound_respected() {
        // 需求超過產能 → 生產到上限，剩餘進入未滿足需求
        let scenario = Scenario::new(1, vec![1_500.0, 100.0]);
        let deployment = vec![1.0, 0.0];
        let solution = SubproblemModel::new(dims(), &scenario, &deployment, 1_000.0, 100.0)
            .solve()
            .unwrap();

        assert!((solution.production[0] - 1_000.0).abs() < 1e-6);
        assert!((solution.unmet[0] - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_demand_coverage_invariant() {
        let scenario = Scenario::new(1, vec![700.0, 300.0]);
        let deployment = vec![1.0, 1.0];
        let d = dims();
        let solution = SubproblemModel::new(d, &scenario, &deployment, 10_000.0, 100.0)
            .solve()
            .unwrap();

        for n in 0..d.zones {
            for t in 0..d.periods {
                let produced: f64 = (0..d.units)
                    .map(|m| solution.production[d.deploy_index(n, m, t)])
                    .sum();
                let unmet = solution.unmet[d.zone_period_index(n, t)];
                assert!(produced + unmet >= scenario.demand_for(n) - 1e-6);
            }
        }
    }

    #[test]
    fn test_cut_reproduces_cost_at_incumbent() {
        // 切割在產生它的部署值上必須重現子問題成本
        let scenario = Scenario::new(1, vec![500.0, 500.0]);
        let deployment = vec![1.0, 0.0];
        let d = dims();
        let solution = SubproblemModel::new(d, &scenario, &deployment, 10_000.0, 100.0)
            .solve()
            .unwrap();

        let cut = solution.optimality_cut(&d, &scenario, 10_000.0);
        assert!((cut.height_at(&deployment) - solution.cost).abs() < 1e-3);
    }

    #[test]
    fn test_cut_is_lower_bound_at_other_deployments() {
        let scenario = Scenario::new(1, vec![500.0, 500.0]);
        let d = dims();
        let incumbent = vec![0.0, 0.0];
        let solution = SubproblemModel::new(d, &scenario, &incumbent, 10_000.0, 100.0)
            .solve()
            .unwrap();
        let cut = solution.optimality_cut(&d, &scenario, 10_000.0);

        // 在另一個部署值下，切割高度不得超過該部署的真實成本
        let other = vec![1.0, 0.0];
        let other_cost = SubproblemModel::new(d, &scenario, &other, 10_000.0, 100.0)
            .solve()
            .unwrap()
            .cost;
        assert!(cut.height_at(&other) <= other_cost + 1e-3);
    }
}
