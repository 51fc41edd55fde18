//! 結果彙整與純文字報告
//!
//! 在所有完成的場景結果中以顯式狀態選出實現成本最低者
//! （純比較函數，不經由全域變數），並組裝部署／生產報告。
//! 彙整為唯讀選擇操作，重複執行結果相同。

use modplan_core::{PlanDims, PlanError, Result, Scenario};
use std::fmt::Write as _;
use std::path::Path;

/// 單一場景在最終部署下的完成結果
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    /// 場景編號
    pub scenario_id: usize,

    /// 場景實現成本（子問題目標值）
    pub cost: f64,

    /// 生產配置，依（區域, 單元, 期間）展平索引排列
    pub production: Vec<f64>,

    /// 未滿足需求，依（區域, 期間）展平索引排列
    pub unmet: Vec<f64>,
}

/// 結果彙整器
pub struct ResultAggregator;

impl ResultAggregator {
    /// 選出實現成本最低的場景結果
    ///
    /// 比較僅以子問題成本為準（主問題固定成本對所有場景相同，
    /// 不影響排序）；同成本時取場景編號最小者。
    pub fn select(outcomes: &[ScenarioOutcome]) -> Result<&ScenarioOutcome> {
        outcomes
            .iter()
            .fold(None::<&ScenarioOutcome>, |best, candidate| match best {
                Some(current) if !Self::better(candidate, current) => Some(current),
                _ => Some(candidate),
            })
            .ok_or_else(|| PlanError::Other("沒有任何場景結果可供彙整".to_string()))
    }

    /// 純比較：a 是否嚴格優於 b
    fn better(a: &ScenarioOutcome, b: &ScenarioOutcome) -> bool {
        a.cost < b.cost || (a.cost == b.cost && a.scenario_id < b.scenario_id)
    }
}

/// 最終部署／生產報告
#[derive(Debug, Clone, PartialEq)]
pub struct PlanReport {
    dims: PlanDims,

    /// 選定的場景編號
    pub scenario_id: usize,

    /// 選定場景的總成本
    pub total_cost: f64,

    /// 選定場景的各區域需求
    pub demand: Vec<f64>,

    /// 值 > 0.5 的部署決策（區域, 單元, 期間），皆為 0 開始的索引
    pub deployments: Vec<(usize, usize, usize)>,

    /// 嚴格為正的生產配置（區域, 單元, 期間, 數量）
    pub productions: Vec<(usize, usize, usize, f64)>,
}

impl PlanReport {
    /// 由選定場景、部署值與場景結果組裝報告
    pub fn build(
        dims: PlanDims,
        scenario: &Scenario,
        deployment: &[f64],
        outcome: &ScenarioOutcome,
    ) -> Self {
        let deployments = dims
            .deploy_keys()
            .filter(|&(n, m, t)| deployment[dims.deploy_index(n, m, t)] > 0.5)
            .collect();

        let productions = dims
            .deploy_keys()
            .filter_map(|(n, m, t)| {
                let qty = outcome.production[dims.deploy_index(n, m, t)];
                (qty > 0.0).then_some((n, m, t, qty))
            })
            .collect();

        Self {
            dims,
            scenario_id: outcome.scenario_id,
            total_cost: outcome.cost,
            demand: scenario.demand.clone(),
            deployments,
            productions,
        }
    }

    /// 渲染純文字報告（輸出使用 1 開始的編號）
    pub fn render(&self) -> String {
        let mut out = String::new();

        writeln!(out, "Optimization Completed").ok();
        writeln!(out, "Best Scenario: {}", self.scenario_id).ok();
        writeln!(out, "Total Cost: {:.2} EUR", self.total_cost).ok();

        writeln!(out, "\nDemand Per Zone (Best Scenario):").ok();
        for n in 0..self.dims.zones {
            for t in 0..self.dims.periods {
                writeln!(
                    out,
                    "Zone {}, Period {}: {:.0} doses required",
                    n + 1,
                    t + 1,
                    self.demand[n]
                )
                .ok();
            }
        }

        writeln!(out, "\nDeployment Decisions:").ok();
        for &(n, m, t) in &self.deployments {
            writeln!(
                out,
                "Deploy unit {} at zone {} in period {}",
                m + 1,
                n + 1,
                t + 1
            )
            .ok();
        }

        writeln!(out, "\nProduction:").ok();
        for &(n, m, t, qty) in &self.productions {
            writeln!(
                out,
                "unit {} produced {:.0} doses at zone {} in period {}",
                m + 1,
                qty,
                n + 1,
                t + 1
            )
            .ok();
        }

        out
    }

    /// 將報告寫入檔案
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render())
            .map_err(|e| PlanError::Data(format!("無法寫入 {}: {e}", path.display())))
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

    fn outcome(id: usize, cost: f64) -> ScenarioOutcome {
        ScenarioOutcome {
            scenario_id: id,
            cost,
            production: vec![500.0, 0.0],
            unmet: vec![0.0, 500.0],
        }
    }

    #[test]
    fn test_select_minimum_cost() {
        let outcomes = vec![outcome(1, 900.0), outcome(2, 300.0), outcome(3, 600.0)];
        let best = ResultAggregator::select(&outcomes).unwrap();

        assert_eq!(best.scenario_id, 2);
    }

    #[test]
    fn test_select_tie_breaks_on_lowest_id() {
        let outcomes = vec![outcome(3, 300.0), outcome(1, 300.0), outcome(2, 300.0)];
        let best = ResultAggregator::select(&outcomes).unwrap();

        assert_eq!(best.scenario_id, 1);
    }

    #[test]
    fn test_select_is_idempotent() {
        let outcomes = vec![outcome(1, 900.0), outcome(2, 300.0)];
        let first = ResultAggregator::select(&outcomes).unwrap().clone();
        let second = ResultAggregator::select(&outcomes).unwrap().clone();

        assert_eq!(first, second);
    }

    #[test]
    fn test_select_empty_is_error() {
        assert!(ResultAggregator::select(&[]).is_err());
    }

    #[test]
    fn test_report_contents() {
        let scenario = Scenario::new(2, vec![500.0, 400.0]);
        let deployment = vec![1.0, 0.0];
        let report = PlanReport::build(dims(), &scenario, &deployment, &outcome(2, 50_000.0));

        assert_eq!(report.deployments, vec![(0, 0, 0)]);
        assert_eq!(report.productions, vec![(0, 0, 0, 500.0)]);

        let text = report.render();
        assert!(text.contains("Optimization Completed"));
        assert!(text.contains("Best Scenario: 2"));
        assert!(text.contains("Total Cost: 50000.00 EUR"));
        assert!(text.contains("Zone 1, Period 1: 500 doses required"));
        assert!(text.contains("Deploy unit 1 at zone 1 in period 1"));
        assert!(text.contains("unit 1 produced 500 doses at zone 1 in period 1"));
    }

    #[test]
    fn test_report_round_trips_to_file() {
        let scenario = Scenario::new(1, vec![500.0, 400.0]);
        let deployment = vec![1.0, 0.0];
        let report = PlanReport::build(dims(), &scenario, &deployment, &outcome(1, 50_000.0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.txt");
        report.write_to(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), report.render());
    }
}
