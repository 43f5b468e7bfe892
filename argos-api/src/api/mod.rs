//! HTTP handlers

pub mod analyze;
pub mod auth;
pub mod health;
pub mod reports;

pub use analyze::analyze_routes;
pub use auth::auth_routes;
pub use health::health_routes;
pub use reports::report_routes;
