//! Damage classifier
//!
//! Turns a detector findings summary into a traffic-light report. The only
//! production backend is the Gemini `generateContent` API; tests plug in stubs
//! through [`DamageClassifier`].

mod gemini;
mod prompt;

pub use gemini::GeminiClassifier;
pub use prompt::{build_prompt, TRAFFIC_LIGHT_LOGIC, ULD_INSPECTION_RULES};

use argos_common::{TrafficLight, UldReport};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Classifier errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid status '{0}' (expected green, yellow or red)")]
    InvalidStatus(String),

    #[error("Classifier timed out after {0}s")]
    Timeout(u64),
}

/// Classifier verdict for one ULD
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedReport {
    pub uld_id: String,
    pub status: TrafficLight,
    pub damage_category: Option<String>,
    pub shipping_location: Option<String>,
}

impl From<ClassifiedReport> for UldReport {
    fn from(classified: ClassifiedReport) -> Self {
        UldReport {
            uld_id: classified.uld_id,
            status: classified.status,
            damage_category: classified.damage_category,
            location: None,
            shipping_location: classified.shipping_location,
        }
    }
}

/// Anything that can grade a findings summary
#[async_trait]
pub trait DamageClassifier: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Grade `findings` for `uld_id`
    async fn classify(&self, uld_id: &str, findings: &str) -> Result<ClassifiedReport, ClassifierError>;
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    #[serde(default)]
    uld_id: Option<String>,
    status: String,
    #[serde(default)]
    damage_category: Option<String>,
    #[serde(default)]
    shipping_location: Option<String>,
}

/// Strip surrounding whitespace and Markdown code fences from model output
pub fn clean_response(text: &str) -> String {
    text.trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse the model's JSON verdict.
///
/// A missing or blank `uld_id` falls back to `requested_uld_id`.
pub fn parse_response(text: &str, requested_uld_id: &str) -> Result<ClassifiedReport, ClassifierError> {
    let cleaned = clean_response(text);
    let raw: RawClassification =
        serde_json::from_str(&cleaned).map_err(|e| ClassifierError::Parse(e.to_string()))?;

    let status = raw
        .status
        .parse::<TrafficLight>()
        .map_err(|_| ClassifierError::InvalidStatus(raw.status.clone()))?;

    let uld_id = raw
        .uld_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| requested_uld_id.to_string());

    Ok(ClassifiedReport {
        uld_id,
        status,
        damage_category: raw.damage_category,
        shipping_location: raw.shipping_location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_response_strips_fences() {
        let fenced = "```json\n{\"status\": \"green\"}\n```\n";
        assert_eq!(clean_response(fenced), "{\"status\": \"green\"}");
        assert_eq!(clean_response("  {}  "), "{}");
    }

    #[test]
    fn test_parse_response_full() {
        let text = r#"```json
        {"uld_id": "AKE12345CX", "status": "RED", "damage_category": "Base puncture", "shipping_location": "HKG ➜ LAX"}
        ```"#;

        let report = parse_response(text, "AKE12345CX").unwrap();
        assert_eq!(report.uld_id, "AKE12345CX");
        assert_eq!(report.status, TrafficLight::Red);
        assert_eq!(report.damage_category.as_deref(), Some("Base puncture"));
        assert_eq!(report.shipping_location.as_deref(), Some("HKG ➜ LAX"));
    }

    #[test]
    fn test_parse_response_falls_back_to_requested_id() {
        let report = parse_response(r#"{"status": "yellow"}"#, "PMC-1").unwrap();
        assert_eq!(report.uld_id, "PMC-1");
        assert_eq!(report.status, TrafficLight::Yellow);
        assert!(report.damage_category.is_none());

        let report = parse_response(r#"{"uld_id": " ", "status": "green"}"#, "PMC-2").unwrap();
        assert_eq!(report.uld_id, "PMC-2");
    }

    #[test]
    fn test_parse_response_rejects_unknown_status() {
        let err = parse_response(r#"{"uld_id": "X", "status": "orange"}"#, "X").unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidStatus(ref s) if s == "orange"));
    }

    #[test]
    fn test_parse_response_rejects_non_json() {
        let err = parse_response("I think it looks fine.", "X").unwrap_err();
        assert!(matches!(err, ClassifierError::Parse(_)));
    }

    #[test]
    fn test_classified_report_into_uld_report() {
        let report: UldReport = ClassifiedReport {
            uld_id: "AKE1".into(),
            status: TrafficLight::Green,
            damage_category: Some("No damage found".into()),
            shipping_location: None,
        }
        .into();

        assert_eq!(report.uld_id, "AKE1");
        assert!(report.location.is_none());
        assert!(report.shipping_location.is_none());
    }
}
