//! AI damage analysis

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tracing::{debug, info, warn};

use argos_common::detection::{findings_text, top_detection, Detection};
use argos_common::{UldRecord, UldReport};

use crate::classifier::ClassifierError;
use crate::{ApiError, ApiResult, AppState};

/// Findings for one ULD, as text or as raw detections
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub uld_id: String,
    #[serde(default, alias = "yolo_findings")]
    pub detection_findings: Option<String>,
    #[serde(default)]
    pub detections: Option<Vec<Detection>>,
}

impl AnalyzeRequest {
    /// Summary text handed to the classifier. Text wins over detections.
    pub fn findings(&self) -> Option<String> {
        if let Some(text) = self.detection_findings.as_deref() {
            if !text.trim().is_empty() {
                return Some(text.to_string());
            }
        }
        self.detections.as_deref().map(findings_text)
    }
}

/// POST /api/ai/analyze
///
/// Classify the findings, then store the verdict through the report service.
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<UldRecord>> {
    if request.uld_id.trim().is_empty() {
        return Err(ApiError::BadRequest("uld_id must not be blank".to_string()));
    }

    let findings = request.findings().ok_or_else(|| {
        ApiError::BadRequest("either detection_findings or detections is required".to_string())
    })?;

    if let Some(top) = request.detections.as_deref().and_then(top_detection) {
        debug!(
            "Top detection for {}: {} ({:.2})",
            request.uld_id, top.label, top.confidence
        );
    }

    let classifier = state
        .classifier
        .clone()
        .ok_or_else(|| ApiError::Internal("AI model is not configured".to_string()))?;

    let timeout = state.classifier_timeout;
    let classified = match tokio::time::timeout(
        timeout,
        classifier.classify(&request.uld_id, &findings),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(ClassifierError::Timeout(timeout.as_secs())),
    }
    .map_err(|e| {
        warn!("{} classifier failed for {}: {}", classifier.name(), request.uld_id, e);
        ApiError::from(e)
    })?;

    info!(
        "Classifier graded {} as {}",
        classified.uld_id, classified.status
    );

    let record = state.reports.submit_report(UldReport::from(classified)).await?;
    Ok(Json(record))
}

pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/ai/analyze", post(analyze))
}
