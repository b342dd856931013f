use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::optimizer::SolverBackend;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: DateTime<Utc>,
    /// MILP backends compiled into this build, in priority order
    solvers: Vec<SolverBackend>,
}

/// GET /healthz
pub async fn healthz() -> Json<HealthResponse> {
    let solvers = SolverBackend::available();
    Json(HealthResponse {
        status: if solvers.is_empty() { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        solvers,
    })
}
