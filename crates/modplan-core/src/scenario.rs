//! 需求場景模型

use serde::{Deserialize, Serialize};

/// 一個蒙地卡羅需求場景
///
/// 每個區域對應一個非負的整數需求量（整個活動期間）。
/// 生成後不再變更，由所有子問題共用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// 場景編號（1..=S）
    pub id: usize,

    /// 各區域需求，以區域索引（0 開始）排列
    pub demand: Vec<f64>,
}

impl Scenario {
    /// 創建新的場景
    pub fn new(id: usize, demand: Vec<f64>) -> Self {
        Self { id, demand }
    }

    /// 指定區域的需求
    pub fn demand_for(&self, zone_index: usize) -> f64 {
        self.demand[zone_index]
    }

    /// 全區域需求總和
    pub fn total_demand(&self) -> f64 {
        self.demand.iter().sum()
    }
}
