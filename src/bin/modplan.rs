//! 部署規劃命令列工具
//!
//! 讀取設施座標 CSV，執行完整規劃管線並輸出純文字報告。

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use modplan::{
    EpidemicBaseline, FleetPolicy, ObservedRateBaseline, Pipeline, PlanConfig, PlanRun, SolveMode,
};

#[derive(Parser, Debug)]
#[command(name = "modplan", version, about = "兩階段隨機設施部署規劃")]
struct Cli {
    /// 設施座標 CSV（需含 Latitude / Longitude 欄位）
    facilities: PathBuf,

    /// 報告輸出路徑；未指定時印到標準輸出
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 區域格數上限
    #[arg(long, default_value_t = 14)]
    zones: usize,

    /// 行動單元數
    #[arg(long, default_value_t = 4)]
    units: usize,

    /// 規劃期間數
    #[arg(long, default_value_t = 3)]
    periods: usize,

    /// 需求場景數
    #[arg(long, default_value_t = 100)]
    scenarios: usize,

    /// 分群鄰近度閾值（座標距離）
    #[arg(long, default_value_t = 0.05)]
    threshold: f64,

    /// 單元每日產能（劑）
    #[arg(long, default_value_t = 10_000.0)]
    daily_capacity: f64,

    /// 活動天數
    #[arg(long, default_value_t = 60)]
    campaign_days: u32,

    /// 隨機種子
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// 艦隊政策
    #[arg(long, value_enum, default_value = "full")]
    policy: PolicyArg,

    /// 求解模式
    #[arg(long, value_enum, default_value = "decomposition")]
    mode: ModeArg,

    /// 基準需求策略
    #[arg(long, value_enum, default_value = "observed")]
    baseline: BaselineArg,

    /// 每日接種劑數（observed 基準）
    #[arg(long, default_value_t = 945.0)]
    daily_rate: f64,

    /// 轄區人口（epidemic 基準）
    #[arg(long, default_value_t = 3_700_000.0)]
    population: f64,

    /// 每十萬人七日發生率（epidemic 基準）
    #[arg(long, default_value_t = 21.6)]
    incidence: f64,

    /// 每案例收治率（epidemic 基準）
    #[arg(long, default_value_t = 0.297)]
    hospitalization_rate: f64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    /// 每（單元, 期間）最多一個部署
    Idle,
    /// 每（單元, 期間）至少一個部署
    Full,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// L-shaped（Benders）分解
    Decomposition,
    /// 確定性等價單一 MIP
    Extensive,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BaselineArg {
    /// 觀測到的每日接種速率
    Observed,
    /// 流行病學參數
    Epidemic,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = PlanConfig::new()
        .with_zones(cli.zones)
        .with_units(cli.units)
        .with_periods(cli.periods)
        .with_scenarios(cli.scenarios)
        .with_proximity_threshold(cli.threshold)
        .with_daily_capacity(cli.daily_capacity)
        .with_campaign_days(cli.campaign_days)
        .with_seed(cli.seed)
        .with_fleet_policy(match cli.policy {
            PolicyArg::Idle => FleetPolicy::AllowIdle,
            PolicyArg::Full => FleetPolicy::FullUtilization,
        });

    let mode = match cli.mode {
        ModeArg::Decomposition => SolveMode::Decomposition,
        ModeArg::Extensive => SolveMode::Extensive,
    };

    let run = match cli.baseline {
        BaselineArg::Observed => {
            let baseline = ObservedRateBaseline {
                daily_rate: cli.daily_rate,
                campaign_days: cli.campaign_days,
            };
            Pipeline::new(config, baseline)
                .with_mode(mode)
                .run(&cli.facilities)
        }
        BaselineArg::Epidemic => {
            let baseline = EpidemicBaseline {
                population: cli.population,
                seven_day_incidence: cli.incidence,
                hospitalization_rate: cli.hospitalization_rate,
            };
            Pipeline::new(config, baseline)
                .with_mode(mode)
                .run(&cli.facilities)
        }
    }
    .context("規劃執行失敗")?;

    emit(&cli, &run)?;
    Ok(())
}

fn emit(cli: &Cli, run: &PlanRun) -> anyhow::Result<()> {
    match &cli.output {
        Some(path) => {
            run.report
                .write_to(path)
                .with_context(|| format!("無法寫入報告 {}", path.display()))?;
            tracing::info!("報告已寫入 {}", path.display());
        }
        None => print!("{}", run.report.render()),
    }
    Ok(())
}
