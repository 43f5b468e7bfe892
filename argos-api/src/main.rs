//! Argos API (argos-api) - Main entry point
//!
//! Serves the ULD report, AI analysis, listing and login endpoints over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use argos_api::classifier::GeminiClassifier;
use argos_api::{build_router, AppState};
use argos_common::config::{resolve_config_path, ArgosConfig, ConfigSource};
use argos_common::credentials::CredentialStore;
use argos_common::db::{init_database, seed_demo_data, UldRepository};
use argos_common::time::secs_to_duration;
use argos_common::{ReportNormalizer, ReportService};

/// Command-line arguments for argos-api
#[derive(Parser, Debug)]
#[command(name = "argos-api")]
#[command(about = "ULD damage inspection backend")]
#[command(version)]
struct Args {
    /// Configuration file (falls back to ARGOS_CONFIG, then ./argos.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8000
    #[arg(short, long, env = "ARGOS_BIND")]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "ARGOS_DATABASE")]
    database: Option<PathBuf>,

    /// Credential file for the dashboard login
    #[arg(long, env = "ARGOS_CREDENTIALS")]
    credentials: Option<PathBuf>,
}

impl Args {
    fn apply(self, mut config: ArgosConfig) -> ArgosConfig {
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(database) = self.database {
            config.database_path = database;
        }
        if let Some(credentials) = self.credentials {
            config.credentials_path = credentials;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let config = ArgosConfig::load(config_path.as_deref()).context("Failed to load configuration")?;
    let config = args.apply(config);

    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("argos_api={level},argos_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting argos-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    // Loading ran before the subscriber existed; report its outcome here
    match ConfigSource::of(config_path.as_deref()) {
        ConfigSource::File(path) => info!("Configuration: {}", path.display()),
        ConfigSource::Missing(path) => warn!(
            "Configuration file {} not found, using compiled defaults",
            path.display()
        ),
        ConfigSource::Defaults => info!("Configuration: compiled defaults"),
    }

    info!("Database: {}", config.database_path.display());
    let pool = init_database(&config.database_path, &config.reports)
        .await
        .context("Failed to initialize database")?;

    let service = ReportService::new(
        ReportNormalizer::new(config.reports.clone()),
        UldRepository::new(pool),
    );

    if config.seed_demo_data {
        seed_demo_data(&service)
            .await
            .context("Failed to seed demo data")?;
    }

    let credentials = Arc::new(CredentialStore::new(
        config.credentials_path.clone(),
        config.credentials.clone(),
    ));
    credentials
        .ensure_storage()
        .await
        .context("Failed to prepare credential storage")?;

    let mut state = AppState::new(service, credentials, config.session.clone());

    match config.llm.resolve_api_key() {
        Some(api_key) => {
            let classifier = GeminiClassifier::new(api_key, &config.llm)
                .context("Failed to build classifier client")?;
            info!("Classifier: {} via {}", config.llm.model, classifier.url());
            state = state.with_classifier(
                Arc::new(classifier),
                secs_to_duration(config.llm.timeout_secs),
            );
        }
        None => warn!("No LLM API key configured, /api/ai/analyze will be unavailable"),
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;

    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
