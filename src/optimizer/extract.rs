//! Turns raw backend values into a verified [`DispatchSchedule`].
//!
//! Backends only promise feasibility within their own tolerances, so every
//! invariant of the model is re-checked on the values actually returned, and
//! the backend's objective is compared with the profit those values earn.

use super::objective::{ObjectiveBuilder, ObjectiveValue};
use super::solver::RawSolution;
use super::types::{SolveStatus, Tolerances};
use crate::domain::{AlignedSeries, BatterySpec, DispatchSchedule};
use crate::error::{DispatchError, DispatchResult};

/// Flows below this magnitude are solver noise
const SNAP_MW: f64 = 1e-9;

/// Binary indicators are read back against this threshold
const FLAG_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct Extracted {
    pub schedule: DispatchSchedule,
    pub status: SolveStatus,
    /// Profit recomputed from the extracted schedule
    pub value: ObjectiveValue,
    /// Objective reported by the backend
    pub solver_objective_eur: f64,
    pub max_violation: f64,
    pub objective_gap: f64,
}

pub struct ResultExtractor<'a> {
    series: &'a AlignedSeries,
    battery: &'a BatterySpec,
    objective: &'a ObjectiveBuilder,
    step_hours: f64,
    tolerances: Tolerances,
}

impl<'a> ResultExtractor<'a> {
    pub fn new(
        series: &'a AlignedSeries,
        battery: &'a BatterySpec,
        objective: &'a ObjectiveBuilder,
        step_hours: f64,
        tolerances: Tolerances,
    ) -> Self {
        Self {
            series,
            battery,
            objective,
            step_hours,
            tolerances,
        }
    }

    pub fn extract(&self, raw: RawSolution) -> DispatchResult<Extracted> {
        self.check_shape(&raw)?;
        if !raw.objective.is_finite() {
            return Err(DispatchError::Numeric(format!(
                "backend objective is undefined ({})",
                raw.objective
            )));
        }

        let snap = |v: f64| if v.abs() < SNAP_MW { 0.0 } else { v };
        let charge: Vec<f64> = raw.charge.iter().copied().map(snap).collect();
        let discharge: Vec<f64> = raw.discharge.iter().copied().map(snap).collect();
        let charging: Vec<bool> = raw.charging.iter().map(|v| *v > FLAG_THRESHOLD).collect();
        let discharging: Vec<bool> = raw.discharging.iter().map(|v| *v > FLAG_THRESHOLD).collect();

        let mut schedule = DispatchSchedule {
            step_hours: self.step_hours,
            generation_mw: self.series.generation_mw.clone(),
            price_eur_per_mwh: self.series.price_eur_per_mwh.clone(),
            charge_mw: charge,
            discharge_mw: discharge,
            charging,
            discharging,
            soc_mwh: raw.soc,
            grid_power_mw: raw.grid,
        };

        let max_violation = self.max_violation(&schedule);
        // The initial state is fixed by constraint; drop float noise around it
        schedule.soc_mwh[0] = self.battery.min_soc_mwh();

        let value = self.objective.evaluate(
            &schedule.grid_power_mw,
            &schedule.charge_mw,
            &schedule.discharge_mw,
        );
        let objective_gap = objective_gap(raw.objective, &value);

        let worst = max_violation.max(objective_gap);
        let status = if worst <= self.tolerances.strict {
            SolveStatus::Optimal
        } else if worst <= self.tolerances.accept {
            tracing::warn!(max_violation, objective_gap, "solution accepted with reduced precision");
            SolveStatus::OptimalInaccurate
        } else if objective_gap > max_violation {
            return Err(DispatchError::Numeric(format!(
                "backend objective {:.6} disagrees with recomputed profit {:.6} (relative gap {objective_gap:.3e}, limit {:.1e})",
                raw.objective, value.net_profit_eur, self.tolerances.accept
            )));
        } else {
            return Err(DispatchError::Numeric(format!(
                "solution violates model invariants by {max_violation:.3e} (limit {:.1e})",
                self.tolerances.accept
            )));
        };

        Ok(Extracted {
            schedule,
            status,
            value,
            solver_objective_eur: raw.objective,
            max_violation,
            objective_gap,
        })
    }

    fn check_shape(&self, raw: &RawSolution) -> DispatchResult<()> {
        let n = self.series.len();
        let vectors: [(&str, &[f64], usize); 6] = [
            ("charge", raw.charge.as_slice(), n),
            ("discharge", raw.discharge.as_slice(), n),
            ("charging", raw.charging.as_slice(), n),
            ("discharging", raw.discharging.as_slice(), n),
            ("soc", raw.soc.as_slice(), n + 1),
            ("grid", raw.grid.as_slice(), n),
        ];

        for (name, values, expected) in vectors {
            if values.len() != expected {
                return Err(DispatchError::Numeric(format!(
                    "{name}: expected {expected} values, backend returned {}",
                    values.len()
                )));
            }
            if let Some(t) = values.iter().position(|v| !v.is_finite()) {
                return Err(DispatchError::Numeric(format!(
                    "{name}[{t}] is undefined ({})",
                    values[t]
                )));
            }
        }
        Ok(())
    }

    /// Largest violation of the model invariants, relative to the battery scale
    fn max_violation(&self, s: &DispatchSchedule) -> f64 {
        let b = self.battery;
        let power = b.power_limit_mw;
        let min_soc = b.min_soc_mwh();
        let scale = 1f64.max(b.capacity_mwh).max(power);
        let dt = self.step_hours;

        let mut worst = (s.soc_mwh[0] - min_soc).abs();
        for (t, soc) in s.soc_mwh.iter().enumerate() {
            worst = worst.max(min_soc - soc).max(soc - b.capacity_mwh);
            if t + 1 < s.soc_mwh.len() {
                let expected = soc + dt * (b.efficiency * s.charge_mw[t] - s.discharge_mw[t] / b.efficiency);
                worst = worst.max((s.soc_mwh[t + 1] - expected).abs());
            }
        }

        for t in 0..s.len() {
            let (c, d) = (s.charge_mw[t], s.discharge_mw[t]);
            let charge_cap = if s.charging[t] { power } else { 0.0 };
            let discharge_cap = if s.discharging[t] { power } else { 0.0 };
            worst = worst
                .max(-c)
                .max(-d)
                .max(c - charge_cap)
                .max(d - discharge_cap)
                .max(c * d)
                .max((s.grid_power_mw[t] - (s.generation_mw[t] + d - c)).abs());
            if s.charging[t] && s.discharging[t] {
                worst = worst.max(1.0);
            }
        }

        worst.max(0.0) / scale
    }
}

/// Relative gap between the backend objective and the recomputed profit,
/// measured against the larger of its two terms
fn objective_gap(reported: f64, value: &ObjectiveValue) -> f64 {
    let scale = 1f64
        .max(value.market_revenue_eur.abs())
        .max(value.throughput_cost_eur.abs());
    (reported - value.net_profit_eur).abs() / scale
}
