use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use super::objective::ObjectiveValue;
use super::solver::SolverBackend;
use crate::domain::{BatterySpec, DispatchSchedule};
use crate::error::{DispatchError, DispatchResult};
use crate::metrics::DispatchMetrics;

/// Per-call knobs of a dispatch solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveOptions {
    /// Length of one series step in hours
    pub step_hours: f64,
    /// Backends to try first, in order
    pub solver_preference: Vec<SolverBackend>,
    /// Flows at or below this are treated as idle in metrics (MW)
    pub activity_epsilon_mw: f64,
    pub tolerances: Tolerances,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            step_hours: 1.0,
            solver_preference: SolverBackend::PRIORITY.to_vec(),
            activity_epsilon_mw: 1e-4, // 0.1 kW
            tolerances: Tolerances::default(),
        }
    }
}

impl SolveOptions {
    pub fn validate(&self) -> DispatchResult<()> {
        if !self.step_hours.is_finite() || self.step_hours <= 0.0 {
            return Err(DispatchError::validation(format!(
                "step_hours must be positive, got {}",
                self.step_hours
            )));
        }
        if !self.activity_epsilon_mw.is_finite() || self.activity_epsilon_mw < 0.0 {
            return Err(DispatchError::validation(format!(
                "activity_epsilon_mw must be non-negative, got {}",
                self.activity_epsilon_mw
            )));
        }
        self.tolerances.validate()
    }
}

/// Bounds on invariant violations of an extracted solution.
///
/// Violations are measured relative to `max(1, capacity, power)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// At or below: full-precision optimum. Also bounds the relative gap
    /// between the backend objective and the recomputed profit.
    pub strict: f64,
    /// At or below: accepted with reduced precision; above: rejected
    pub accept: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            strict: 1e-6,
            accept: 1e-3,
        }
    }
}

impl Tolerances {
    pub fn validate(&self) -> DispatchResult<()> {
        if !(self.strict > 0.0 && self.strict <= self.accept && self.accept.is_finite()) {
            return Err(DispatchError::validation(format!(
                "tolerances must satisfy 0 < strict <= accept, got strict={} accept={}",
                self.strict, self.accept
            )));
        }
        Ok(())
    }
}

/// Accepted termination of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    /// Usable, but invariant residuals exceeded the strict tolerance
    OptimalInaccurate,
}

impl SolveStatus {
    pub fn is_reduced_precision(&self) -> bool {
        matches!(self, Self::OptimalInaccurate)
    }
}

/// Lifecycle of a single solve: `Unsolved → Solving → {Accepted, Rejected}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SolvePhase {
    Unsolved,
    Solving,
    Accepted,
    Rejected,
}

impl SolvePhase {
    pub fn can_transition_to(self, next: SolvePhase) -> bool {
        matches!(
            (self, next),
            (Self::Unsolved, Self::Solving)
                | (Self::Unsolved, Self::Rejected)
                | (Self::Solving, Self::Accepted)
                | (Self::Solving, Self::Rejected)
        )
    }

    pub fn advance(self, next: SolvePhase) -> DispatchResult<SolvePhase> {
        if !self.can_transition_to(next) {
            return Err(DispatchError::Solver(format!(
                "invalid solve phase transition {self} -> {next}"
            )));
        }
        tracing::debug!(from = %self, to = %next, "solve phase");
        Ok(next)
    }

}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Accepted outcome of one dispatch optimization. Built once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub battery: BatterySpec,
    pub solver: SolverBackend,
    pub status: SolveStatus,
    /// Status text as reported, e.g. `optimal` or `optimal_inaccurate`
    pub raw_status: String,
    /// Net profit as reported by the backend (EUR)
    pub objective_value: f64,
    /// Net profit recomputed from the schedule, split into its terms
    pub objective: ObjectiveValue,
    /// Largest relative invariant violation found on the extracted values
    pub max_violation: f64,
    /// Relative gap between `objective_value` and `objective.net_profit_eur`
    pub objective_gap: f64,
    #[serde(rename = "solve_time_seconds", serialize_with = "serialize_secs")]
    pub solve_duration: Duration,
    pub schedule: DispatchSchedule,
    pub metrics: DispatchMetrics,
}

impl OptimizationResult {
    pub fn is_reduced_precision(&self) -> bool {
        self.status.is_reduced_precision()
    }
}
