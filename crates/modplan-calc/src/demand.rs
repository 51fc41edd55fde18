//! 隨機需求場景生成
//!
//! 每個場景為各區域抽取一個常態分布需求（標準差為基準的 20%），
//! 並以配置的下限截斷。基準需求的計算方式為可插拔策略。

use modplan_core::{PlanConfig, PlanError, Result, Scenario};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

/// 基準需求策略：給定區域數，回傳每區域的基準需求
pub trait DemandBaseline {
    fn baseline_per_zone(&self, zone_count: usize) -> Result<f64>;
}

impl<B: DemandBaseline + ?Sized> DemandBaseline for &B {
    fn baseline_per_zone(&self, zone_count: usize) -> Result<f64> {
        (**self).baseline_per_zone(zone_count)
    }
}

/// 以流行病學參數推導基準需求
///
/// 基準 = 人口 × (七日發生率 / 100 000) × 收治率，各區域相同。
#[derive(Debug, Clone)]
pub struct EpidemicBaseline {
    /// 轄區人口
    pub population: f64,

    /// 每十萬人七日發生率
    pub seven_day_incidence: f64,

    /// 每案例收治率
    pub hospitalization_rate: f64,
}

impl DemandBaseline for EpidemicBaseline {
    fn baseline_per_zone(&self, _zone_count: usize) -> Result<f64> {
        let baseline =
            self.population * (self.seven_day_incidence / 100_000.0) * self.hospitalization_rate;
        ensure_positive(baseline)
    }
}

/// 以觀測到的每日接種速率推導基準需求
///
/// 基準 = 每日速率 × 活動天數，平均分配到各區域。
#[derive(Debug, Clone)]
pub struct ObservedRateBaseline {
    /// 每日接種劑數
    pub daily_rate: f64,

    /// 活動天數
    pub campaign_days: u32,
}

impl DemandBaseline for ObservedRateBaseline {
    fn baseline_per_zone(&self, zone_count: usize) -> Result<f64> {
        if zone_count == 0 {
            return Err(PlanError::Configuration("區域數必須為正".to_string()));
        }
        let baseline = self.daily_rate * f64::from(self.campaign_days) / zone_count as f64;
        ensure_positive(baseline)
    }
}

fn ensure_positive(baseline: f64) -> Result<f64> {
    if baseline <= 0.0 || !baseline.is_finite() {
        return Err(PlanError::Configuration(format!(
            "基準需求必須為正的有限值，得到 {baseline}"
        )));
    }
    Ok(baseline)
}

/// 場景生成器
///
/// 種子為顯式注入：固定種子下兩次生成的場景組合完全相同。
pub struct ScenarioGenerator<B: DemandBaseline> {
    baseline: B,
}

impl<B: DemandBaseline> ScenarioGenerator<B> {
    /// 以基準需求策略創建生成器
    pub fn new(baseline: B) -> Self {
        Self { baseline }
    }

    /// 生成 S 個獨立的需求場景
    pub fn generate(&self, config: &PlanConfig, zone_count: usize) -> Result<Vec<Scenario>> {
        config.validate()?;
        if zone_count == 0 {
            return Err(PlanError::Configuration("區域數必須為正".to_string()));
        }

        let baseline = self.baseline.baseline_per_zone(zone_count)?;
        let distribution = Normal::new(baseline, baseline * 0.2)
            .map_err(|e| PlanError::Configuration(format!("無效的需求分布參數: {e}")))?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let scenarios = (1..=config.scenarios)
            .map(|id| {
                let demand = (0..zone_count)
                    .map(|_| {
                        // 取整數劑量並以下限截斷
                        let sample = rng.sample(distribution).trunc();
                        sample.max(config.demand_floor)
                    })
                    .collect();
                Scenario::new(id, demand)
            })
            .collect();

        tracing::info!(
            "場景生成完成：{} 個場景 × {} 個區域（基準 {:.0}）",
            config.scenarios,
            zone_count,
            baseline
        );

        Ok(scenarios)
    }
}
