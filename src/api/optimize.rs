use std::time::{Duration, Instant};

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{error::ApiError, response::ApiResponse, ApiState};
use crate::{
    domain::BatterySpec,
    error::DispatchResult,
    metrics::{
        pv_baseline, recommend_battery, BatteryRecommendation, PvBaseline, ValueBridge,
        DEFAULT_RECOMMENDATION_THRESHOLD,
    },
    optimizer::{self, OptimizationResult, SolveOptions},
    sizing::{self, SweepOutcome},
};

#[derive(Debug, Deserialize, Validate)]
pub struct OptimizeRequest {
    #[validate(length(min = 1))]
    pub generation_mw: Vec<f64>,
    #[validate(length(min = 1))]
    pub price_eur_per_mwh: Vec<f64>,
    /// Falls back to the configured battery
    #[serde(default)]
    pub battery: Option<BatterySpec>,
    #[serde(default)]
    pub step_hours: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub result: OptimizationResult,
    pub baseline: PvBaseline,
    pub value_bridge: ValueBridge,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BaselineRequest {
    #[validate(length(min = 1))]
    pub generation_mw: Vec<f64>,
    #[validate(length(min = 1))]
    pub price_eur_per_mwh: Vec<f64>,
    #[serde(default)]
    pub step_hours: Option<f64>,
    /// Capture rate below which storage is recommended
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct BaselineResponse {
    pub baseline: PvBaseline,
    pub recommendation: BatteryRecommendation,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SweepRequest {
    #[validate(length(min = 1))]
    pub generation_mw: Vec<f64>,
    #[validate(length(min = 1))]
    pub price_eur_per_mwh: Vec<f64>,
    #[validate(length(min = 1, max = 64))]
    pub batteries: Vec<BatterySpec>,
    #[serde(default)]
    pub step_hours: Option<f64>,
}

fn solve_options(state: &ApiState, step_hours: Option<f64>) -> SolveOptions {
    let mut options = state.config.solve_options();
    if let Some(step_hours) = step_hours {
        options.step_hours = step_hours;
    }
    options
}

/// Runs blocking solver work off the async runtime, bounded by `solver.solve_timeout_secs`.
///
/// On timeout the worker keeps running to completion and its result is dropped.
async fn run_blocking<T, F>(state: &ApiState, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> DispatchResult<T> + Send + 'static,
{
    let secs = state.config.solver.solve_timeout_secs;
    let handle = tokio::task::spawn_blocking(work);

    match tokio::time::timeout(Duration::from_secs(secs), handle).await {
        Err(_) => {
            tracing::warn!(timeout_secs = secs, "solve exceeded time limit, result discarded");
            Err(ApiError::Timeout(secs))
        }
        Ok(Err(join)) => Err(ApiError::InternalError(format!("solver task failed: {join}"))),
        Ok(Ok(result)) => result.map_err(ApiError::from),
    }
}

/// POST /api/v1/optimize - Optimize battery dispatch and compare against PV only
pub async fn optimize(
    State(state): State<ApiState>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<ApiResponse<OptimizeResponse>>, ApiError> {
    request.validate()?;
    let started = Instant::now();
    let options = solve_options(&state, request.step_hours);
    let battery = request.battery.unwrap_or(state.config.battery);
    tracing::info!(
        horizon = request.generation_mw.len().min(request.price_eur_per_mwh.len()),
        power_mw = battery.power_limit_mw,
        capacity_mwh = battery.capacity_mwh,
        "optimize request"
    );

    let response = run_blocking(&state, move || {
        let result = optimizer::solve_with(
            &request.generation_mw,
            &request.price_eur_per_mwh,
            &battery,
            &options,
        )?;
        let baseline = pv_baseline(&request.generation_mw, &request.price_eur_per_mwh, options.step_hours)?;
        let value_bridge = ValueBridge::between(&baseline, &result);
        Ok(OptimizeResponse {
            result,
            baseline,
            value_bridge,
        })
    })
    .await?;

    Ok(Json(
        ApiResponse::success(response).with_duration(started.elapsed().as_millis() as u64),
    ))
}

/// POST /api/v1/baseline - PV-only revenue and storage recommendation
pub async fn baseline(
    State(state): State<ApiState>,
    Json(request): Json<BaselineRequest>,
) -> Result<Json<ApiResponse<BaselineResponse>>, ApiError> {
    request.validate()?;
    let options = solve_options(&state, request.step_hours);
    options.validate()?;

    let baseline = pv_baseline(&request.generation_mw, &request.price_eur_per_mwh, options.step_hours)?;
    let recommendation = recommend_battery(
        &baseline,
        request.threshold.unwrap_or(DEFAULT_RECOMMENDATION_THRESHOLD),
    );

    Ok(Json(ApiResponse::success(BaselineResponse {
        baseline,
        recommendation,
    })))
}

/// POST /api/v1/sweep - Solve several battery configurations on the same series
pub async fn sweep(
    State(state): State<ApiState>,
    Json(request): Json<SweepRequest>,
) -> Result<Json<ApiResponse<Vec<SweepOutcome>>>, ApiError> {
    request.validate()?;
    let started = Instant::now();
    let options = solve_options(&state, request.step_hours);

    let outcomes = run_blocking(&state, move || {
        Ok(sizing::sweep(
            &request.generation_mw,
            &request.price_eur_per_mwh,
            &request.batteries,
            &options,
        ))
    })
    .await?;

    let count = outcomes.len();
    Ok(Json(
        ApiResponse::success(outcomes)
            .with_count(count)
            .with_duration(started.elapsed().as_millis() as u64),
    ))
}
