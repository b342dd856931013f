//! Rule-of-thumb battery sizing and multi-configuration sweeps.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::domain::BatterySpec;
use crate::error::DispatchError;
use crate::optimizer::{self, OptimizationResult, SolveOptions, SolveStatus, SolverBackend};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SizingMode {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl SizingMode {
    /// Battery power as a share of PV peak power
    pub fn power_ratio(self) -> f64 {
        match self {
            Self::Conservative => 0.20,
            Self::Moderate => 0.40,
            Self::Aggressive => 0.60,
        }
    }

    pub fn duration_hours(self) -> f64 {
        match self {
            Self::Conservative => 2.0,
            Self::Moderate => 4.0,
            Self::Aggressive => 6.0,
        }
    }

    fn rationale(self) -> &'static str {
        match self {
            Self::Conservative => "short duration for peak shaving at low capital cost",
            Self::Moderate => "daily arbitrage cycles with balanced capital cost",
            Self::Aggressive => "long duration to shift most midday output into evening peaks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingRecommendation {
    pub mode: SizingMode,
    pub pv_capacity_mw: f64,
    pub power_mw: f64,
    pub capacity_mwh: f64,
    pub duration_hours: f64,
    pub c_rate: f64,
    pub power_ratio: f64,
    pub rationale: String,
}

fn round_half_unit(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

/// Power and capacity for `pv_capacity_mw` under `mode`, rounded to 0.5 MW / 0.5 MWh.
pub fn smart_defaults(pv_capacity_mw: f64, mode: SizingMode) -> SizingRecommendation {
    let power_ratio = mode.power_ratio();
    let duration_hours = mode.duration_hours();
    let power = pv_capacity_mw * power_ratio;

    SizingRecommendation {
        mode,
        pv_capacity_mw,
        power_mw: round_half_unit(power),
        capacity_mwh: round_half_unit(power * duration_hours),
        duration_hours,
        c_rate: 1.0 / duration_hours,
        power_ratio,
        rationale: mode.rationale().to_string(),
    }
}

pub fn all_sizing_options(pv_capacity_mw: f64) -> Vec<SizingRecommendation> {
    SizingMode::iter()
        .map(|mode| smart_defaults(pv_capacity_mw, mode))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingAssessment {
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub power_ratio: f64,
    pub duration_hours: f64,
    pub c_rate: f64,
}

/// Flags user-chosen sizes outside the usual commercial range
pub fn assess_sizing(power_mw: f64, capacity_mwh: f64, pv_capacity_mw: f64) -> SizingAssessment {
    let power_ratio = if pv_capacity_mw > 0.0 { power_mw / pv_capacity_mw } else { 0.0 };
    let duration_hours = if power_mw > 0.0 { capacity_mwh / power_mw } else { 0.0 };
    let c_rate = if duration_hours > 0.0 { 1.0 / duration_hours } else { 0.0 };

    let mut warnings = Vec::new();
    if power_ratio > 1.0 {
        warnings.push(format!(
            "battery power exceeds PV capacity ({:.0}% of PV); most of it can only charge from the grid",
            power_ratio * 100.0
        ));
    } else if power_ratio < 0.15 {
        warnings.push(format!(
            "battery power is small ({:.0}% of PV capacity); limited revenue potential",
            power_ratio * 100.0
        ));
    }

    if duration_hours > 8.0 {
        warnings.push(format!(
            "duration of {duration_hours:.1} h is very long; 4-6 h usually balances capital cost and revenue"
        ));
    } else if duration_hours < 1.5 {
        warnings.push(format!(
            "duration of {duration_hours:.1} h is very short; at least 2 h gives more flexibility"
        ));
    }

    if capacity_mwh < 1.0 {
        warnings.push(format!("capacity of {capacity_mwh:.1} MWh is below the 1 MWh minimum"));
    }
    if power_mw < 0.5 {
        warnings.push(format!("power of {power_mw:.1} MW is below the 0.5 MW minimum"));
    }
    if c_rate > 1.0 {
        warnings.push(format!("C-rate of {c_rate:.2}C is above 1C and may stress the cells"));
    }

    SizingAssessment {
        is_valid: warnings.is_empty(),
        warnings,
        power_ratio,
        duration_hours,
        c_rate,
    }
}

/// Headline figures of one solved configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSummary {
    pub solver: SolverBackend,
    pub status: SolveStatus,
    pub objective_value: f64,
    pub total_revenue_eur: f64,
    pub degradation_cost_eur: f64,
    pub arbitrage_revenue_eur: f64,
    pub annual_cycles: f64,
    pub utilization_percent: f64,
    pub solve_time_seconds: f64,
}

impl From<&OptimizationResult> for SweepSummary {
    fn from(result: &OptimizationResult) -> Self {
        let m = &result.metrics;
        Self {
            solver: result.solver,
            status: result.status,
            objective_value: result.objective_value,
            total_revenue_eur: m.financial.total_revenue_eur,
            degradation_cost_eur: m.financial.degradation_cost_eur,
            arbitrage_revenue_eur: m.arbitrage.arbitrage_revenue_eur,
            annual_cycles: m.operation.annual_cycles,
            utilization_percent: m.operation.utilization_percent,
            solve_time_seconds: result.solve_duration.as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SweepResult {
    Solved(SweepSummary),
    Failed { error: DispatchError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepOutcome {
    pub battery: BatterySpec,
    pub result: SweepResult,
}

impl SweepOutcome {
    pub fn summary(&self) -> Option<&SweepSummary> {
        match &self.result {
            SweepResult::Solved(summary) => Some(summary),
            SweepResult::Failed { .. } => None,
        }
    }
}

/// Solves every configuration independently on the rayon pool.
///
/// Outcomes are returned in the order of `batteries`. A failing configuration
/// yields its error without affecting the others.
pub fn sweep(
    generation_mw: &[f64],
    price_eur_per_mwh: &[f64],
    batteries: &[BatterySpec],
    options: &SolveOptions,
) -> Vec<SweepOutcome> {
    tracing::info!(configurations = batteries.len(), "starting sizing sweep");

    batteries
        .par_iter()
        .map(|battery| {
            let result = match optimizer::solve_with(generation_mw, price_eur_per_mwh, battery, options) {
                Ok(result) => SweepResult::Solved(SweepSummary::from(&result)),
                Err(error) => SweepResult::Failed { error },
            };
            SweepOutcome {
                battery: *battery,
                result,
            }
        })
        .collect()
}
