//! # Modplan Calculation Engine
//!
//! 空間聚類與隨機需求場景生成

pub mod clustering;
pub mod demand;

// Re-export 主要類型
pub use clustering::ClusterEngine;
pub use demand::{DemandBaseline, EpidemicBaseline, ObservedRateBaseline, ScenarioGenerator};
