//! End-to-end dispatch solve: align, build, solve, verify, measure.

use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use super::extract::ResultExtractor;
use super::model::DispatchModelBuilder;
use super::objective::ObjectiveBuilder;
use super::solver::{self, SolverBackend};
use super::types::{OptimizationResult, SolveOptions, SolvePhase};
use crate::domain::{BatterySpec, TimeSeriesAligner};
use crate::error::DispatchResult;
use crate::metrics::DispatchMetrics;

/// Optimizes battery dispatch for an hourly series with default options.
///
/// Series of different lengths are truncated to the shorter one. Returns an
/// error rather than a fallback schedule when no verified optimum exists.
pub fn solve(
    generation_mw: &[f64],
    price_eur_per_mwh: &[f64],
    battery: &BatterySpec,
) -> DispatchResult<OptimizationResult> {
    solve_with(generation_mw, price_eur_per_mwh, battery, &SolveOptions::default())
}

pub fn solve_with(
    generation_mw: &[f64],
    price_eur_per_mwh: &[f64],
    battery: &BatterySpec,
    options: &SolveOptions,
) -> DispatchResult<OptimizationResult> {
    let phase = SolvePhase::Unsolved;

    let prepared = options
        .validate()
        .and_then(|_| battery.validate())
        .and_then(|_| TimeSeriesAligner::align(generation_mw, price_eur_per_mwh))
        .and_then(|series| SolverBackend::select(&options.solver_preference).map(|b| (series, b)));
    let (series, backend) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            phase.advance(SolvePhase::Rejected)?;
            tracing::warn!(kind = e.kind(), error = %e, "dispatch input rejected");
            return Err(e);
        }
    };

    let phase = phase.advance(SolvePhase::Solving)?;
    let dt = options.step_hours;
    tracing::info!(
        solver = %backend,
        horizon = series.len(),
        power_mw = battery.power_limit_mw,
        capacity_mwh = battery.capacity_mwh,
        "solving battery dispatch"
    );

    let model = DispatchModelBuilder::new(&series, battery, dt).build();
    let objective = ObjectiveBuilder::new(&series.price_eur_per_mwh, battery, dt);
    let expression = objective.expression(&model.vars);

    let started = Instant::now();
    let outcome = solver::run(backend, model, expression).and_then(|raw| {
        ResultExtractor::new(&series, battery, &objective, dt, options.tolerances).extract(raw)
    });
    let solve_duration = started.elapsed();

    let extracted = match outcome {
        Ok(extracted) => extracted,
        Err(e) => {
            phase.advance(SolvePhase::Rejected)?;
            tracing::error!(
                solver = %backend,
                kind = e.kind(),
                error = %e,
                elapsed_ms = solve_duration.as_millis() as u64,
                "dispatch solve rejected"
            );
            return Err(e);
        }
    };

    let schedule = extracted.schedule;
    let metrics = DispatchMetrics::compute(&schedule, battery, options.activity_epsilon_mw);
    phase.advance(SolvePhase::Accepted)?;

    tracing::info!(
        solver = %backend,
        status = %extracted.status,
        objective_eur = extracted.solver_objective_eur,
        max_violation = extracted.max_violation,
        objective_gap = extracted.objective_gap,
        elapsed_ms = solve_duration.as_millis() as u64,
        "dispatch solved"
    );

    Ok(OptimizationResult {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        battery: *battery,
        solver: backend,
        status: extracted.status,
        raw_status: extracted.status.to_string(),
        objective_value: extracted.solver_objective_eur,
        objective: extracted.value,
        max_violation: extracted.max_violation,
        objective_gap: extracted.objective_gap,
        solve_duration,
        schedule,
        metrics,
    })
}
