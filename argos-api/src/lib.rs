//! argos-api library - HTTP surface of the Argos ULD inspection backend
//!
//! Report submission, AI damage analysis, the dashboard listing and the
//! dashboard login all live here. Storage and credential logic is in
//! `argos-common`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use argos_common::config::SessionConfig;
use argos_common::credentials::CredentialStore;
use argos_common::ReportService;

pub mod api;
pub mod classifier;
pub mod error;

pub use classifier::DamageClassifier;
pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub reports: ReportService,
    pub credentials: Arc<CredentialStore>,
    /// `None` when no API key is configured
    pub classifier: Option<Arc<dyn DamageClassifier>>,
    pub classifier_timeout: Duration,
    pub session: SessionConfig,
}

impl AppState {
    pub fn new(
        reports: ReportService,
        credentials: Arc<CredentialStore>,
        session: SessionConfig,
    ) -> Self {
        Self {
            reports,
            credentials,
            classifier: None,
            classifier_timeout: Duration::from_secs(30),
            session,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn DamageClassifier>, timeout: Duration) -> Self {
        self.classifier = Some(classifier);
        self.classifier_timeout = timeout;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let api_routes = api::report_routes()
        .merge(api::analyze_routes())
        .merge(api::auth_routes());

    Router::new()
        .nest("/api", api_routes)
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
