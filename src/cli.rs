//! Command line definitions and the synchronous commands behind them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::config::Config;
use crate::domain::BatterySpec;
use crate::io::{self, InputSeries};
use crate::metrics::{
    pv_baseline, recommend_battery, BatteryRecommendation, PvBaseline, ValueBridge,
    DEFAULT_RECOMMENDATION_THRESHOLD,
};
use crate::optimizer::{self, OptimizationResult, SolverBackend};
use crate::sizing::{self, SizingAssessment, SizingMode, SizingRecommendation, SweepOutcome};

#[derive(Parser)]
#[command(name = "pv-bess-dispatch")]
#[command(author, version, about = "Optimal battery dispatch and investment metrics for PV + storage")]
pub struct Cli {
    /// Configuration file (TOML); missing files fall back to defaults
    #[arg(long, global = true, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Optimize dispatch for a CSV series and compare against PV only
    Solve(SolveArgs),

    /// Recommend or assess a battery size for a PV plant
    Sizing(SizingArgs),

    /// Run the HTTP API
    Serve(ServeArgs),
}

/// Battery overrides; unset fields come from the `[battery]` config section
#[derive(Args, Debug, Default, Clone)]
pub struct BatteryArgs {
    /// Charge/discharge power limit (MW)
    #[arg(long)]
    pub power_mw: Option<f64>,

    /// Energy capacity (MWh)
    #[arg(long)]
    pub capacity_mwh: Option<f64>,

    /// One-way efficiency (0-1]
    #[arg(long)]
    pub efficiency: Option<f64>,

    /// Minimum state of charge as a fraction of capacity
    #[arg(long)]
    pub min_soc: Option<f64>,

    /// Degradation cost per MWh cycled (EUR)
    #[arg(long)]
    pub throughput_cost: Option<f64>,
}

impl BatteryArgs {
    pub fn apply(&self, base: BatterySpec) -> Result<BatterySpec> {
        let spec = BatterySpec {
            power_limit_mw: self.power_mw.unwrap_or(base.power_limit_mw),
            capacity_mwh: self.capacity_mwh.unwrap_or(base.capacity_mwh),
            efficiency: self.efficiency.unwrap_or(base.efficiency),
            min_soc_fraction: self.min_soc.unwrap_or(base.min_soc_fraction),
            throughput_cost_eur_per_mwh: self.throughput_cost.unwrap_or(base.throughput_cost_eur_per_mwh),
        };
        spec.validate().context("invalid battery parameters")?;
        Ok(spec)
    }
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// CSV with `generation_mw` (or `generation_kw`) and `price_eur_per_mwh` columns
    #[arg(long, short)]
    pub input: PathBuf,

    #[command(flatten)]
    pub battery: BatteryArgs,

    /// Length of one CSV row in hours
    #[arg(long)]
    pub step_hours: Option<f64>,

    /// Backend to try first (highs, cbc, microlp)
    #[arg(long)]
    pub solver: Option<SolverBackend>,

    /// Write JSON here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Also write the schedule as one CSV row per step
    #[arg(long)]
    pub intervals: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SizingArgs {
    /// PV peak capacity (MW)
    #[arg(long)]
    pub pv_mw: f64,

    /// Only this sizing mode (conservative, moderate, aggressive)
    #[arg(long)]
    pub mode: Option<SizingMode>,

    /// Assess this power instead of recommending one (needs --capacity-mwh)
    #[arg(long, requires = "capacity_mwh")]
    pub power_mw: Option<f64>,

    #[arg(long, requires = "power_mw")]
    pub capacity_mwh: Option<f64>,

    /// Solve every recommended size against this CSV series
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Serialize)]
pub struct SolveReport {
    pub result: OptimizationResult,
    pub baseline: PvBaseline,
    pub recommendation: BatteryRecommendation,
    pub value_bridge: ValueBridge,
}

#[derive(Debug, Serialize)]
pub struct SizingReport {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<SizingRecommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<SizingAssessment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sweep: Vec<SweepOutcome>,
}

pub fn run_solve(args: &SolveArgs, config: &Config) -> Result<SolveReport> {
    let series = InputSeries::from_path(&args.input)?;
    let battery = args.battery.apply(config.battery)?;

    let mut options = config.solve_options();
    if let Some(step_hours) = args.step_hours {
        options.step_hours = step_hours;
    }
    if let Some(solver) = args.solver {
        options.solver_preference.insert(0, solver);
    }

    let result = optimizer::solve_with(&series.generation_mw, &series.price_eur_per_mwh, &battery, &options)
        .context("dispatch optimization failed")?;
    let baseline = pv_baseline(&series.generation_mw, &series.price_eur_per_mwh, options.step_hours)?;
    if let Some(path) = &args.intervals {
        io::write_intervals_to_path(&result.schedule, path)?;
    }

    Ok(SolveReport {
        recommendation: recommend_battery(&baseline, DEFAULT_RECOMMENDATION_THRESHOLD),
        value_bridge: ValueBridge::between(&baseline, &result),
        result,
        baseline,
    })
}

pub fn run_sizing(args: &SizingArgs, config: &Config) -> Result<SizingReport> {
    if let (Some(power), Some(capacity)) = (args.power_mw, args.capacity_mwh) {
        return Ok(SizingReport {
            recommendations: Vec::new(),
            assessment: Some(sizing::assess_sizing(power, capacity, args.pv_mw)),
            sweep: Vec::new(),
        });
    }

    let recommendations = match args.mode {
        Some(mode) => vec![sizing::smart_defaults(args.pv_mw, mode)],
        None => sizing::all_sizing_options(args.pv_mw),
    };

    let sweep = match &args.input {
        Some(path) => {
            let series = InputSeries::from_path(path)?;
            let batteries = recommendations
                .iter()
                .map(|rec| BatterySpec {
                    power_limit_mw: rec.power_mw,
                    capacity_mwh: rec.capacity_mwh,
                    ..config.battery
                })
                .collect::<Vec<_>>();
            sizing::sweep(
                &series.generation_mw,
                &series.price_eur_per_mwh,
                &batteries,
                &config.solve_options(),
            )
        }
        None => Vec::new(),
    };

    Ok(SizingReport {
        recommendations,
        assessment: None,
        sweep,
    })
}

/// Pretty JSON to `path`, or stdout
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, value)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}
