//! Report submission and the dashboard listing

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use argos_common::{UldRecord, UldReport};

use crate::{ApiResult, AppState};

/// POST /api/report (alias /api/uld/report)
///
/// Manual submission path. Returns the stored record.
pub async fn submit_report(
    State(state): State<AppState>,
    Json(report): Json<UldReport>,
) -> ApiResult<Json<UldRecord>> {
    let record = state.reports.submit_report(report).await?;
    Ok(Json(record))
}

/// GET /api/ulds
///
/// Every ULD, most recently seen first.
pub async fn list_ulds(State(state): State<AppState>) -> ApiResult<Json<Vec<UldRecord>>> {
    let records = state.reports.list_ulds().await?;
    Ok(Json(records))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/report", post(submit_report))
        .route("/uld/report", post(submit_report))
        .route("/ulds", get(list_ulds))
}
