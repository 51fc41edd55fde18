//! HiGHS 求解器介面
//!
//! 對外部求解器的薄封裝：以列（row）為基礎組建線性模型，
//! 求解後回傳變數值、目標值與列對偶值，或不可行／失敗信號。
//! 主問題的增量重解以保留的模型結構加上累積切割重建實現。

use highs::{Col, HighsModelStatus, RowProblem, Sense};

/// 求解完成後的變數指派
#[derive(Debug, Clone)]
pub struct Assignment {
    /// 目標值
    pub objective: f64,

    /// 變數值，依加入順序排列
    pub values: Vec<f64>,

    /// 約束列對偶值，依加入順序排列（MIP 時無意義）
    pub row_duals: Vec<f64>,
}

/// 求解結果分類
#[derive(Debug)]
pub enum SolveOutcome {
    /// 找到最優指派
    Optimal(Assignment),

    /// 模型無可行解
    Infeasible,

    /// 求解器錯誤（數值問題、逾時等）
    Failed(String),
}

/// 線性模型建構器
///
/// 變數與約束以加入順序的整數索引識別。
pub struct ModelBuilder {
    problem: RowProblem,
    columns: Vec<Col>,
    rows: usize,
}

impl ModelBuilder {
    /// 創建空模型
    pub fn new() -> Self {
        Self {
            problem: RowProblem::default(),
            columns: Vec::new(),
            rows: 0,
        }
    }

    /// 加入非負連續變數，回傳變數索引
    pub fn add_continuous(&mut self, objective: f64) -> usize {
        let col = self.problem.add_column(objective, 0.0..);
        self.columns.push(col);
        self.columns.len() - 1
    }

    /// 加入 0/1 變數，回傳變數索引
    pub fn add_binary(&mut self, objective: f64) -> usize {
        let col = self
            .problem
            .add_column_with_integrality(objective, 0.0..=1.0, true);
        self.columns.push(col);
        self.columns.len() - 1
    }

    /// 加入 `Σ terms ≥ rhs` 約束，回傳列索引
    pub fn add_row_ge(&mut self, rhs: f64, terms: &[(usize, f64)]) -> usize {
        let factors: Vec<(Col, f64)> = terms
            .iter()
            .map(|&(var, coeff)| (self.columns[var], coeff))
            .collect();
        self.problem.add_row(rhs.., factors);
        self.rows += 1;
        self.rows - 1
    }

    /// 加入 `Σ terms ≤ rhs` 約束，回傳列索引
    pub fn add_row_le(&mut self, rhs: f64, terms: &[(usize, f64)]) -> usize {
        let factors: Vec<(Col, f64)> = terms
            .iter()
            .map(|&(var, coeff)| (self.columns[var], coeff))
            .collect();
        self.problem.add_row(..=rhs, factors);
        self.rows += 1;
        self.rows - 1
    }

    /// 變數數量
    pub fn num_vars(&self) -> usize {
        self.columns.len()
    }

    /// 約束數量
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    /// 以最小化方向求解
    pub fn minimise(self) -> SolveOutcome {
        let mut model = self.problem.optimise(Sense::Minimise);
        model.set_option("output_flag", false);

        let solved = model.solve();
        match solved.status() {
            HighsModelStatus::Optimal => {
                let solution = solved.get_solution();
                SolveOutcome::Optimal(Assignment {
                    objective: solved.objective_value(),
                    values: solution.columns().to_vec(),
                    row_duals: solution.dual_rows().to_vec(),
                })
            }
            HighsModelStatus::Infeasible => SolveOutcome::Infeasible,
            other => SolveOutcome::Failed(format!("{other:?}")),
        }
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_small_lp() {
        // min x + 2y  s.t. x + y ≥ 3, x ≤ 2
        let mut builder = ModelBuilder::new();
        let x = builder.add_continuous(1.0);
        let y = builder.add_continuous(2.0);
        builder.add_row_ge(3.0, &[(x, 1.0), (y, 1.0)]);
        builder.add_row_le(2.0, &[(x, 1.0)]);

        match builder.minimise() {
            SolveOutcome::Optimal(assignment) => {
                assert!((assignment.objective - 4.0).abs() < 1e-6);
                assert!((assignment.values[x] - 2.0).abs() < 1e-6);
                assert!((assignment.values[y] - 1.0).abs() < 1e-6);
            }
            other => panic!("期望最優解，得到 {other:?}"),
        }
    }

    #[test]
    fn test_duals_on_binding_row() {
        // min x  s.t. x ≥ 5 → 對偶值 1
        let mut builder = ModelBuilder::new();
        let x = builder.add_continuous(1.0);
        let row = builder.add_row_ge(5.0, &[(x, 1.0)]);

        match builder.minimise() {
            SolveOutcome::Optimal(assignment) => {
                assert!((assignment.row_duals[row] - 1.0).abs() < 1e-6);
            }
            other => panic!("期望最優解，得到 {other:?}"),
        }
    }

    #[test]
    fn test_infeasible_model() {
        // x ≥ 3 且 x ≤ 1
        let mut builder = ModelBuilder::new();
        let x = builder.add_continuous(1.0);
        builder.add_row_ge(3.0, &[(x, 1.0)]);
        builder.add_row_le(1.0, &[(x, 1.0)]);

        assert!(matches!(builder.minimise(), SolveOutcome::Infeasible));
    }

    #[test]
    fn test_binary_variable() {
        // max 方向以負係數最小化表達：min -x，x ∈ {0,1}
        let mut builder = ModelBuilder::new();
        let x = builder.add_binary(-1.0);

        match builder.minimise() {
            SolveOutcome::Optimal(assignment) => {
                assert!((assignment.values[x] - 1.0).abs() < 1e-6);
            }
            other => panic!("期望最優解，得到 {other:?}"),
        }
    }
}
