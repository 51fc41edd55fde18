//! # Modplan Core
//!
//! 核心資料模型與類型定義

pub mod config;
pub mod facility;
pub mod scenario;
pub mod zone;

// Re-export 主要類型
pub use config::{FleetPolicy, PlanConfig, PlanDims};
pub use facility::{load_facilities, Facility};
pub use scenario::Scenario;
pub use zone::Zone;

/// 規劃錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("無效的配置: {0}")]
    Configuration(String),

    #[error("輸入資料錯誤: {0}")]
    Data(String),

    #[error("主問題無可行解")]
    MasterInfeasible,

    #[error("場景 {scenario} 的子問題無可行解（模型配置不一致）")]
    SubproblemInfeasible { scenario: usize },

    #[error("求解器錯誤: {0}")]
    Solver(String),

    #[error("其他錯誤: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PlanError>;
