//! # Argos Common Library
//!
//! Shared code for the Argos ULD inspection backend:
//! - ULD report models and the traffic-light status
//! - Report normalization (origin / destination defaults)
//! - Database initialization, schema evolution and the ULD repository
//! - Report service (single entry point for every report submission)
//! - Credential storage for the dashboard login
//! - Configuration loading
//! - Detection summary helpers

pub mod config;
pub mod credentials;
pub mod db;
pub mod detection;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod service;
pub mod time;

pub use error::{Error, Result};
pub use models::{TrafficLight, UldRecord, UldReport};
pub use normalizer::ReportNormalizer;
pub use service::ReportService;
