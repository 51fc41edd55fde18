//! # Modplan Optimizer
//!
//! 兩階段隨機部署規劃的求解核心。
//!
//! 以 L-shaped（Benders）分解為主要模式：主問題決定二元部署／
//! 移動決策與每場景遞迴成本估計，子問題在固定部署下為單一場景
//! 配置生產量，並由對偶值合成最優性切割回饋主問題。另提供不做
//! 分解的確定性等價模型作為替代模式，以及結果彙整與報告輸出。

pub mod extensive;
pub mod lshaped;
pub mod master;
pub mod report;
pub mod solver;
pub mod subproblem;

pub use extensive::{ExtensiveModel, ExtensiveSolution};
pub use lshaped::{LShapedPlanner, PlanOutcome};
pub use master::{MasterModel, MasterSolution, MoveDecision, OptimalityCut};
pub use report::{PlanReport, ResultAggregator, ScenarioOutcome};
pub use solver::{Assignment, ModelBuilder, SolveOutcome};
pub use subproblem::{SubproblemModel, SubproblemSolution};
