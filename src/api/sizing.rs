use axum::{extract::Query, Json};
use serde::Deserialize;
use validator::Validate;

use super::{error::ApiError, response::ApiResponse};
use crate::sizing::{self, SizingAssessment, SizingMode, SizingRecommendation};

#[derive(Debug, Deserialize, Validate)]
pub struct SizingQuery {
    #[validate(range(min = 0.0, max = 10000.0))]
    pub pv_capacity_mw: f64,
    /// All modes when absent
    pub mode: Option<SizingMode>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssessRequest {
    #[validate(range(min = 0.0))]
    pub power_mw: f64,
    #[validate(range(min = 0.0))]
    pub capacity_mwh: f64,
    #[validate(range(min = 0.0))]
    pub pv_capacity_mw: f64,
}

/// GET /api/v1/sizing?pv_capacity_mw=10&mode=moderate
pub async fn recommend(
    Query(query): Query<SizingQuery>,
) -> Result<Json<ApiResponse<Vec<SizingRecommendation>>>, ApiError> {
    query.validate()?;

    let recommendations = match query.mode {
        Some(mode) => vec![sizing::smart_defaults(query.pv_capacity_mw, mode)],
        None => sizing::all_sizing_options(query.pv_capacity_mw),
    };
    let count = recommendations.len();
    Ok(Json(ApiResponse::success(recommendations).with_count(count)))
}

/// POST /api/v1/sizing/assess
pub async fn assess(
    Json(request): Json<AssessRequest>,
) -> Result<Json<ApiResponse<SizingAssessment>>, ApiError> {
    request.validate()?;
    let assessment = sizing::assess_sizing(request.power_mw, request.capacity_mwh, request.pv_capacity_mw);
    Ok(Json(ApiResponse::success(assessment)))
}
