//! Configuration loading and resolution
//!
//! Resolution order for the configuration file:
//! 1. Command-line argument (highest priority)
//! 2. `ARGOS_CONFIG` environment variable
//! 3. `./argos.toml` in the working directory
//! 4. Compiled defaults (fallback)
//!
//! A missing file is not an error: the service starts with defaults and logs a
//! warning. A file that exists but does not parse is fatal.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "ARGOS_CONFIG";

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "argos.toml";

/// Environment variable consulted when `[llm] api_key` is not set
pub const LLM_API_KEY_ENV_VAR: &str = "GOOGLE_API_KEY";

/// Separator between origin and destination in a shipping label
pub const ROUTE_SEPARATOR: &str = " ➜ ";

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArgosConfig {
    pub bind_address: String,
    pub database_path: PathBuf,
    pub credentials_path: PathBuf,
    /// Insert the demo ULDs when the table is empty at startup
    pub seed_demo_data: bool,
    pub reports: ReportDefaults,
    pub credentials: CredentialSettings,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
}

impl Default for ArgosConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            database_path: PathBuf::from("./argos.db"),
            credentials_path: PathBuf::from("./user_credentials.json"),
            seed_demo_data: true,
            reports: ReportDefaults::default(),
            credentials: CredentialSettings::default(),
            llm: LlmConfig::default(),
            logging: LoggingConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// Report defaulting data: fixed origin and candidate destinations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportDefaults {
    pub origin: String,
    pub destinations: Vec<String>,
    /// Destination used when backfilling rows that predate `shipping_location`
    pub fallback_destination: String,
}

impl Default for ReportDefaults {
    fn default() -> Self {
        Self {
            origin: "HK".to_string(),
            destinations: [
                "JFK", "LAX", "SFO", "SIN", "LHR", "FRA", "SYD", "NRT", "DXB", "CDG", "YYZ", "BOM",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
            fallback_destination: "TBD".to_string(),
        }
    }
}

impl ReportDefaults {
    /// `"<origin> ➜ <destination>"`
    pub fn route_label(&self, destination: &str) -> String {
        format!("{}{}{}", self.origin, ROUTE_SEPARATOR, destination)
    }

    /// Label written into legacy rows with no shipping location
    pub fn fallback_route_label(&self) -> String {
        self.route_label(&self.fallback_destination)
    }
}

/// Dashboard credential settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CredentialSettings {
    /// Account provisioned when no credential file exists
    pub default_username: String,
    pub default_password: String,
    pub pbkdf2_iterations: u32,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            default_username: "test".to_string(),
            default_password: "test".to_string(),
            pbkdf2_iterations: 200_000,
        }
    }
}

/// Damage classifier (LLM) settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "models/gemini-flash-latest".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// API key from TOML, else from `GOOGLE_API_KEY`. Blank values count as unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| is_valid_key(k))
            .or_else(|| std::env::var(LLM_API_KEY_ENV_VAR).ok().filter(|k| is_valid_key(k)))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Login session cookie settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub remember_me_days: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "argos-token".to_string(),
            remember_me_days: 7,
        }
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Pick the configuration file following the documented priority order.
///
/// Returns `None` when no file was requested and `./argos.toml` does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Working directory
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    None
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// A file was requested but does not exist
    Missing(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn of(path: Option<&Path>) -> Self {
        match path {
            Some(p) if p.exists() => ConfigSource::File(p.to_path_buf()),
            Some(p) => ConfigSource::Missing(p.to_path_buf()),
            None => ConfigSource::Defaults,
        }
    }
}

impl ArgosConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ArgosConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional file path.
    ///
    /// `None` or a missing file yields defaults (with a warning for the latter).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("No configuration file found, using compiled defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!(
                "Configuration file {} not found, using compiled defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.reports.origin.trim().is_empty() {
            return Err(Error::Config("reports.origin must not be blank".to_string()));
        }
        if self.reports.destinations.iter().all(|d| d.trim().is_empty()) {
            return Err(Error::Config(
                "reports.destinations must contain at least one destination".to_string(),
            ));
        }
        if self.credentials.pbkdf2_iterations == 0 {
            return Err(Error::Config(
                "credentials.pbkdf2_iterations must be greater than zero".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::Config("llm.timeout_secs must be greater than zero".to_string()));
        }
        Ok(())
    }
}
