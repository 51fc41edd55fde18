//! 規劃參數配置

use serde::{Deserialize, Serialize};

use crate::{PlanError, Result};

/// 艦隊使用政策：每個（單元, 期間）的部署數量約束方向
///
/// 兩個來源模型變體在此約束上不一致，因此以具名配置選項呈現。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FleetPolicy {
    /// 允許單元閒置：每個（單元, 期間）最多部署一個區域（≤ 1）
    AllowIdle,

    /// 要求每期全員出動：每個（單元, 期間）至少部署一個區域（≥ 1）
    FullUtilization,
}

/// 規劃參數
///
/// 預設值取自柏林疫苗接種活動的原始案例。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    /// 目標區域數上限 K
    pub zones: usize,

    /// 聚類鄰近閾值（座標空間距離，0.05 約等於 5 公里）
    pub proximity_threshold: f64,

    /// 規劃期間數 T
    pub periods: usize,

    /// 行動生產單元數 M
    pub units: usize,

    /// 蒙地卡羅場景數 S
    pub scenarios: usize,

    /// 活動天數
    pub campaign_days: u32,

    /// 單元每日生產能力（劑）
    pub daily_capacity: f64,

    /// 每次部署的固定成本
    pub deployment_cost: f64,

    /// 每次移動的成本
    pub movement_cost: f64,

    /// 未滿足需求的單位罰金
    pub unmet_penalty: f64,

    /// 場景需求下限（避免退化的零需求場景）
    pub demand_floor: f64,

    /// 收斂容差：遞迴成本估計與真實遞迴成本的允許差距
    pub tolerance: f64,

    /// L-shaped 迭代次數上限
    pub max_iterations: usize,

    /// 隨機種子（固定種子可重現場景組合）
    pub seed: u64,

    /// 艦隊使用政策
    pub fleet_policy: FleetPolicy,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            zones: 14,
            proximity_threshold: 0.05,
            periods: 3,
            units: 4,
            scenarios: 100,
            campaign_days: 60,
            daily_capacity: 10_000.0,
            deployment_cost: 5_000.0,
            movement_cost: 1.0,
            unmet_penalty: 100.0,
            demand_floor: 100.0,
            tolerance: 1e-4,
            max_iterations: 50,
            seed: 0,
            fleet_policy: FleetPolicy::FullUtilization,
        }
    }
}

impl PlanConfig {
    /// 創建使用預設參數的配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置區域數上限
    pub fn with_zones(mut self, zones: usize) -> Self {
        self.zones = zones;
        self
    }

    /// 建構器模式：設置鄰近閾值
    pub fn with_proximity_threshold(mut self, threshold: f64) -> Self {
        self.proximity_threshold = threshold;
        self
    }

    /// 建構器模式：設置期間數
    pub fn with_periods(mut self, periods: usize) -> Self {
        self.periods = periods;
        self
    }

    /// 建構器模式：設置單元數
    pub fn with_units(mut self, units: usize) -> Self {
        self.units = units;
        self
    }

    /// 建構器模式：設置場景數
    pub fn with_scenarios(mut self, scenarios: usize) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// 建構器模式：設置單元每日產能
    pub fn with_daily_capacity(mut self, capacity: f64) -> Self {
        self.daily_capacity = capacity;
        self
    }

    /// 建構器模式：設置活動天數
    pub fn with_campaign_days(mut self, days: u32) -> Self {
        self.campaign_days = days;
        self
    }

    /// 建構器模式：設置隨機種子
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// 建構器模式：設置艦隊使用政策
    pub fn with_fleet_policy(mut self, policy: FleetPolicy) -> Self {
        self.fleet_policy = policy;
        self
    }

    /// 建構器模式：設置收斂容差
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// 單一部署在整個期間內的生產上限
    pub fn production_cap(&self) -> f64 {
        self.daily_capacity * f64::from(self.campaign_days)
    }

    /// 決策變數維度
    pub fn dims(&self) -> PlanDims {
        PlanDims {
            zones: self.zones,
            units: self.units,
            periods: self.periods,
        }
    }

    /// 驗證配置；退化的參數一律拒絕
    pub fn validate(&self) -> Result<()> {
        if self.zones == 0 {
            return Err(PlanError::Configuration("區域數必須為正".to_string()));
        }
        if self.units == 0 {
            return Err(PlanError::Configuration("單元數必須為正".to_string()));
        }
        if self.periods == 0 {
            return Err(PlanError::Configuration("期間數必須為正".to_string()));
        }
        if self.scenarios == 0 {
            return Err(PlanError::Configuration("場景數必須為正".to_string()));
        }
        if self.campaign_days == 0 {
            return Err(PlanError::Configuration("活動天數必須為正".to_string()));
        }
        if self.daily_capacity <= 0.0 {
            return Err(PlanError::Configuration("每日產能必須為正".to_string()));
        }
        if self.proximity_threshold <= 0.0 {
            return Err(PlanError::Configuration("鄰近閾值必須為正".to_string()));
        }
        if self.unmet_penalty < 0.0 || self.deployment_cost < 0.0 || self.movement_cost < 0.0 {
            return Err(PlanError::Configuration("成本參數不可為負".to_string()));
        }
        if self.tolerance <= 0.0 {
            return Err(PlanError::Configuration("收斂容差必須為正".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(PlanError::Configuration("迭代次數上限必須為正".to_string()));
        }
        Ok(())
    }
}

/// 決策變數維度與索引規則
///
/// 部署/生產變數以（區域, 單元, 期間）為鍵，索引皆從 0 開始，
/// 依 zone-major 順序展平。主問題、子問題與切割共用同一套索引。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDims {
    pub zones: usize,
    pub units: usize,
    pub periods: usize,
}

impl PlanDims {
    /// （區域, 單元, 期間）變數總數
    pub fn deploy_len(&self) -> usize {
        self.zones * self.units * self.periods
    }

    /// （區域, 期間）組合總數
    pub fn zone_period_len(&self) -> usize {
        self.zones * self.periods
    }

    /// 展平（區域, 單元, 期間）索引
    pub fn deploy_index(&self, zone: usize, unit: usize, period: usize) -> usize {
        (zone * self.units + unit) * self.periods + period
    }

    /// 展平（區域, 期間）索引
    pub fn zone_period_index(&self, zone: usize, period: usize) -> usize {
        zone * self.periods + period
    }

    /// 依展平順序迭代所有（區域, 單元, 期間）
    pub fn deploy_keys(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        let units = self.units;
        let periods = self.periods;
        (0..self.zones).flat_map(move |n| {
            (0..units).flat_map(move |m| (0..periods).map(move |t| (n, m, t)))
        })
    }
}
