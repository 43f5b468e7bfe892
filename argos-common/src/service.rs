//! Report service
//!
//! The single entry point for storing a report. Manual submissions and
//! classifier-derived reports both go through [`ReportService::submit_report`],
//! so normalization and persistence rules cannot diverge between callers.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::db::UldRepository;
use crate::models::{UldRecord, UldReport};
use crate::normalizer::ReportNormalizer;
use crate::{time, Error, Result};

#[derive(Debug, Clone)]
pub struct ReportService {
    normalizer: ReportNormalizer,
    repository: UldRepository,
}

impl ReportService {
    pub fn new(normalizer: ReportNormalizer, repository: UldRepository) -> Self {
        Self {
            normalizer,
            repository,
        }
    }

    pub fn normalizer(&self) -> &ReportNormalizer {
        &self.normalizer
    }

    pub fn repository(&self) -> &UldRepository {
        &self.repository
    }

    /// Normalize and upsert a report, stamping `last_seen` with the current time
    pub async fn submit_report(&self, report: UldReport) -> Result<UldRecord> {
        self.submit_report_at(report, time::now()).await
    }

    /// Same as [`submit_report`](Self::submit_report) with an explicit write time
    pub async fn submit_report_at(&self, report: UldReport, seen_at: DateTime<Utc>) -> Result<UldRecord> {
        if report.uld_id.trim().is_empty() {
            return Err(Error::InvalidInput("uld_id must not be blank".to_string()));
        }

        let normalized = self.normalizer.normalize(report);
        let record = self.repository.upsert(&normalized, seen_at).await?;

        info!(
            uld_id = %record.uld_id,
            status = %record.status,
            shipping_location = %record.shipping_location,
            "Stored ULD report"
        );

        Ok(record)
    }

    /// Every stored ULD, most recently seen first
    pub async fn list_ulds(&self) -> Result<Vec<UldRecord>> {
        self.repository.list_all().await
    }
}
