//! Detector output and findings summaries
//!
//! The object detector runs outside this service. Its result arrives as a list
//! of detections; the classifier only ever sees a short text summary of them.

use serde::{Deserialize, Serialize};

/// Summary sent when the detector found nothing
pub const NO_DAMAGE_FINDINGS: &str = "no damage";

/// One detector hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub class_id: Option<u32>,
    pub label: String,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in image pixels
    #[serde(default)]
    pub bbox: Vec<f32>,
}

impl Detection {
    /// Build a detection from a raw class id using the damage label map
    pub fn from_class(class_id: u32, confidence: f32, bbox: Vec<f32>) -> Self {
        Self {
            class_id: Some(class_id),
            label: label_for_class(class_id),
            confidence,
            bbox,
        }
    }
}

/// Full detector response: every hit plus the most confident one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    pub top_result: Option<Detection>,
}

impl DetectionResult {
    pub fn new(detections: Vec<Detection>) -> Self {
        let top_result = top_detection(&detections).cloned();
        Self {
            detections,
            top_result,
        }
    }
}

/// Damage class names of the inspection model
pub fn label_for_class(class_id: u32) -> String {
    match class_id {
        0 => "normal".to_string(),
        1 => "breach".to_string(),
        2 => "squeeze".to_string(),
        3 => "leakage".to_string(),
        other => format!("class_{}", other),
    }
}

/// Highest-confidence detection, `None` for an empty list
pub fn top_detection(detections: &[Detection]) -> Option<&Detection> {
    detections
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
}

/// `"Found N potential issues: breach (confidence: 0.91); ..."`
pub fn findings_text(detections: &[Detection]) -> String {
    if detections.is_empty() {
        return NO_DAMAGE_FINDINGS.to_string();
    }

    let mut text = format!("Found {} potential issues: ", detections.len());
    for detection in detections {
        text.push_str(&format!(
            "{} (confidence: {:.2}); ",
            detection.label, detection.confidence
        ));
    }
    text
}
