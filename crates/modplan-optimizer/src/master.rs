//! 主問題模型（第一階段）
//!
//! 二元部署／移動決策加上每場景一個遞迴成本估計 theta。
//! theta 僅由累積的最優性切割向下逼近。

use modplan_core::{FleetPolicy, PlanConfig, PlanDims, PlanError, Result};

use crate::solver::{ModelBuilder, SolveOutcome};

/// 最優性切割：theta_s 對部署決策的線性下界
///
/// theta_s ≥ rhs + Σ coeffs(n,m,t) · deploy(n,m,t)
#[derive(Debug, Clone)]
pub struct OptimalityCut {
    /// 切割所屬場景編號
    pub scenario: usize,

    /// 部署變數係數，依展平索引排列
    pub deploy_coeffs: Vec<f64>,

    /// 常數項
    pub rhs: f64,
}

impl OptimalityCut {
    /// 在給定部署值下評估切割高度
    pub fn height_at(&self, deployment: &[f64]) -> f64 {
        let weighted: f64 = self
            .deploy_coeffs
            .iter()
            .zip(deployment)
            .map(|(c, d)| c * d)
            .sum();
        self.rhs + weighted
    }
}

/// 單元移動決策（值 > 0.5 的 move 變數）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDecision {
    pub from_zone: usize,
    pub to_zone: usize,
    pub unit: usize,
    pub period: usize,
}

/// 主問題求解結果（求解器輸出，應用程式不直接變更）
#[derive(Debug, Clone)]
pub struct MasterSolution {
    /// 決策維度
    pub dims: PlanDims,

    /// 部署變數值，依展平索引排列
    pub deployment: Vec<f64>,

    /// 各場景遞迴成本估計
    pub theta: Vec<f64>,

    /// 被選取的移動決策
    pub moves: Vec<MoveDecision>,

    /// 主問題目標值
    pub objective: f64,
}

impl MasterSolution {
    /// 二元判讀（0.5 捨入閾值）
    pub fn is_deployed(&self, zone: usize, unit: usize, period: usize) -> bool {
        self.deployment[self.dims.deploy_index(zone, unit, period)] > 0.5
    }
}

/// 主問題模型
pub struct MasterModel {
    dims: PlanDims,
    scenarios: usize,
    deployment_cost: f64,
    movement_cost: f64,
    fleet_policy: FleetPolicy,
    cuts: Vec<OptimalityCut>,
}

impl MasterModel {
    /// 依配置創建主問題（切割集合為空）
    pub fn new(config: &PlanConfig) -> Self {
        Self {
            dims: config.dims(),
            scenarios: config.scenarios,
            deployment_cost: config.deployment_cost,
            movement_cost: config.movement_cost,
            fleet_policy: config.fleet_policy,
            cuts: Vec::new(),
        }
    }

    /// 附加一條最優性切割
    pub fn add_cut(&mut self, cut: OptimalityCut) {
        self.cuts.push(cut);
    }

    /// 目前累積的切割數
    pub fn cut_count(&self) -> usize {
        self.cuts.len()
    }

    /// 求解主問題
    ///
    /// 回傳部署／移動／遞迴估計的指派；不可行即為致命錯誤
    /// （部署限制為結構性約束，無任何輸入可使其恢復）。
    pub fn solve(&self) -> Result<MasterSolution> {
        let mut builder = ModelBuilder::new();
        let dims = self.dims;

        // 部署變數
        let deploy: Vec<usize> = dims
            .deploy_keys()
            .map(|_| builder.add_binary(self.deployment_cost))
            .collect();

        // 移動變數（origin ≠ destination）
        let mut move_keys: Vec<(usize, usize, usize, usize)> = Vec::new();
        let mut move_vars: Vec<usize> = Vec::new();
        for i in 0..dims.zones {
            for j in 0..dims.zones {
                if i == j {
                    continue;
                }
                for m in 0..dims.units {
                    for t in 0..dims.periods {
                        move_keys.push((i, j, m, t));
                        move_vars.push(builder.add_binary(self.movement_cost));
                    }
                }
            }
        }

        // 每場景一個遞迴成本估計，目標取平均
        let theta: Vec<usize> = (0..self.scenarios)
            .map(|_| builder.add_continuous(1.0 / self.scenarios as f64))
            .collect();

        // 部署數量約束：每（單元, 期間）依艦隊政策
        for m in 0..dims.units {
            for t in 0..dims.periods {
                let terms: Vec<(usize, f64)> = (0..dims.zones)
                    .map(|n| (deploy[dims.deploy_index(n, m, t)], 1.0))
                    .collect();
                match self.fleet_policy {
                    FleetPolicy::AllowIdle => {
                        builder.add_row_le(1.0, &terms);
                    }
                    FleetPolicy::FullUtilization => {
                        builder.add_row_ge(1.0, &terms);
                    }
                }
            }
        }

        // 移動連結約束：move(i,j,m,t) ≤ deploy(i,m,t)
        for (key, &var) in move_keys.iter().zip(&move_vars) {
            let (i, _j, m, t) = *key;
            builder.add_row_le(
                0.0,
                &[(var, 1.0), (deploy[dims.deploy_index(i, m, t)], -1.0)],
            );
        }

        // 累積的最優性切割：theta_s - Σ coeffs·deploy ≥ rhs
        for cut in &self.cuts {
            let mut terms: Vec<(usize, f64)> = Vec::with_capacity(dims.deploy_len() + 1);
            terms.push((theta[cut.scenario - 1], 1.0));
            for (idx, &coeff) in cut.deploy_coeffs.iter().enumerate() {
                if coeff != 0.0 {
                    terms.push((deploy[idx], -coeff));
                }
            }
            builder.add_row_ge(cut.rhs, &terms);
        }

        tracing::debug!(
            "主問題：{} 個變數，{} 個約束（含 {} 條切割）",
            builder.num_vars(),
            builder.num_rows(),
            self.cuts.len()
        );

        match builder.minimise() {
            SolveOutcome::Optimal(assignment) => {
                let deployment: Vec<f64> =
                    deploy.iter().map(|&v| assignment.values[v]).collect();
                let theta_values: Vec<f64> =
                    theta.iter().map(|&v| assignment.values[v]).collect();
                let moves = move_keys
                    .iter()
                    .zip(&move_vars)
                    .filter(|(_, &v)| assignment.values[v] > 0.5)
                    .map(|(&(i, j, m, t), _)| MoveDecision {
                        from_zone: i,
                        to_zone: j,
                        unit: m,
                        period: t,
                    })
                    .collect();

                Ok(MasterSolution {
                    dims,
                    deployment,
                    theta: theta_values,
                    moves,
                    objective: assignment.objective,
                })
            }
            SolveOutcome::Infeasible => Err(PlanError::MasterInfeasible),
            SolveOutcome::Failed(status) => {
                Err(PlanError::Solver(format!("主問題求解失敗: {status}")))
            }
        }
    }
}
