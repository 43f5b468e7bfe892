//! Gemini `generateContent` client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use argos_common::config::LlmConfig;

use super::{build_prompt, parse_response, ClassifiedReport, ClassifierError, DamageClassifier};

const USER_AGENT: &str = concat!("argos-api/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Classifier backed by the Gemini REST API
pub struct GeminiClassifier {
    http_client: reqwest::Client,
    api_key: String,
    url: String,
}

impl GeminiClassifier {
    pub fn new(api_key: String, config: &LlmConfig) -> Result<Self, ClassifierError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        let url = format!(
            "{}/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model.trim_start_matches('/')
        );

        Ok(Self {
            http_client,
            api_key,
            url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DamageClassifier for GeminiClassifier {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn classify(&self, uld_id: &str, findings: &str) -> Result<ClassifiedReport, ClassifierError> {
        let prompt = build_prompt(uld_id, findings);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: &prompt }],
            }],
        };

        debug!("Querying classifier for {}", uld_id);

        let response = self
            .http_client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api(status.as_u16(), detail));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        let text = payload
            .text()
            .ok_or_else(|| ClassifierError::Parse("response contained no text".to_string()))?;

        parse_response(&text, uld_id)
    }
}
