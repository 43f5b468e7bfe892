//! Demo data for an empty dashboard

use chrono::Duration;
use tracing::info;

use crate::models::{TrafficLight, UldReport};
use crate::service::ReportService;
use crate::{time, Result};

/// Insert three sample ULDs when the table is empty.
///
/// Returns the number of records inserted (0 when data already exists).
pub async fn seed_demo_data(service: &ReportService) -> Result<usize> {
    if service.repository().count().await? > 0 {
        info!("Database already has data, skipping demo seed");
        return Ok(0);
    }

    info!("Database is empty, seeding demo ULDs");

    let now = time::now();
    let demo = [
        (
            UldReport::new("AKE-CPA100", TrafficLight::Green)
                .with_damage_category("No Damage Found")
                .with_shipping_location("HK ➜ JFK"),
            now - Duration::hours(1),
        ),
        (
            UldReport::new("AMP-CPA302", TrafficLight::Red)
                .with_damage_category("Forklift puncture (Base)")
                .with_shipping_location("HK ➜ SFO"),
            now,
        ),
        (
            UldReport::new("AKE-CPA205", TrafficLight::Yellow)
                .with_damage_category("Panel dent detected")
                .with_shipping_location("HK ➜ FRA"),
            now - Duration::minutes(30),
        ),
    ];

    let count = demo.len();
    for (report, seen_at) in demo {
        service.submit_report_at(report, seen_at).await?;
    }

    info!("Seeded {} demo ULDs", count);
    Ok(count)
}
