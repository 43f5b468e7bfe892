//! ULD report and record models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::{time, Error, Result};

/// Traffic-light damage severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLight {
    Green,
    Yellow,
    Red,
}

impl TrafficLight {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficLight::Green => "green",
            TrafficLight::Yellow => "yellow",
            TrafficLight::Red => "red",
        }
    }
}

impl fmt::Display for TrafficLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive: rows written by the previous dashboard stored `GREEN` etc.
impl FromStr for TrafficLight {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(TrafficLight::Green),
            "yellow" => Ok(TrafficLight::Yellow),
            "red" => Ok(TrafficLight::Red),
            other => Err(Error::InvalidInput(format!(
                "Unknown status '{}' (expected green, yellow or red)",
                other
            ))),
        }
    }
}

/// Inbound report, either submitted manually or derived from the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UldReport {
    pub uld_id: String,
    pub status: TrafficLight,
    #[serde(default)]
    pub damage_category: Option<String>,
    /// Always replaced by the configured origin during normalization
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub shipping_location: Option<String>,
}

impl UldReport {
    pub fn new(uld_id: impl Into<String>, status: TrafficLight) -> Self {
        Self {
            uld_id: uld_id.into(),
            status,
            damage_category: None,
            location: None,
            shipping_location: None,
        }
    }

    pub fn with_damage_category(mut self, category: impl Into<String>) -> Self {
        self.damage_category = Some(category.into());
        self
    }

    pub fn with_shipping_location(mut self, shipping_location: impl Into<String>) -> Self {
        self.shipping_location = Some(shipping_location.into());
        self
    }
}

/// Report after defaults have been applied; the only shape the repository accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedReport {
    pub uld_id: String,
    pub status: TrafficLight,
    pub damage_category: Option<String>,
    pub location: String,
    pub shipping_location: String,
}

/// Persisted ULD status row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UldRecord {
    /// Surrogate key assigned by the repository
    pub id: i64,
    pub uld_id: String,
    pub status: TrafficLight,
    pub damage_category: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub location: String,
    pub shipping_location: String,
}

impl TryFrom<&SqliteRow> for UldRecord {
    type Error = Error;

    fn try_from(row: &SqliteRow) -> Result<Self> {
        let status: String = row.try_get("status")?;
        let last_seen: String = row.try_get("last_seen")?;
        let location: Option<String> = row.try_get("location")?;
        let shipping_location: Option<String> = row.try_get("shipping_location")?;

        Ok(Self {
            id: row.try_get("id")?,
            uld_id: row.try_get("uld_id")?,
            status: status.parse()?,
            damage_category: row.try_get("damage_category")?,
            last_seen: time::parse_db_timestamp(&last_seen)?,
            location: location.unwrap_or_default(),
            shipping_location: shipping_location.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("red".parse::<TrafficLight>().unwrap(), TrafficLight::Red);
        assert_eq!("GREEN".parse::<TrafficLight>().unwrap(), TrafficLight::Green);
        assert_eq!(" Yellow ".parse::<TrafficLight>().unwrap(), TrafficLight::Yellow);
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        let err = "orange".parse::<TrafficLight>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TrafficLight::Yellow).unwrap(), "\"yellow\"");
    }

    #[test]
    fn test_report_deserializes_with_optional_fields_missing() {
        let report: UldReport =
            serde_json::from_str(r#"{"uld_id": "AKE-1", "status": "red"}"#).unwrap();

        assert_eq!(report, UldReport::new("AKE-1", TrafficLight::Red));
    }

    #[test]
    fn test_report_rejects_invalid_status() {
        let result = serde_json::from_str::<UldReport>(r#"{"uld_id": "AKE-1", "status": "purple"}"#);
        assert!(result.is_err());
    }
}
