use axum::{
    routing::{get, post},
    Router,
};

use super::{optimize, sizing, ApiState};

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/optimize", post(optimize::optimize))
        .route("/baseline", post(optimize::baseline))
        .route("/sweep", post(optimize::sweep))
        .route("/sizing", get(sizing::recommend))
        .route("/sizing/assess", post(sizing::assess))
        .with_state(state)
}
