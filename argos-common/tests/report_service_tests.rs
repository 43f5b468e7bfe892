//! Integration tests for the report submission path
//!
//! Normalizer + repository + service wired together over a real SQLite file.

use argos_common::config::{ReportDefaults, ROUTE_SEPARATOR};
use argos_common::db::{init_database, seed_demo_data, UldRepository};
use argos_common::{Error, ReportNormalizer, ReportService, TrafficLight, UldReport};
use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

async fn setup_service() -> (TempDir, ReportService) {
    let dir = tempfile::tempdir().unwrap();
    let defaults = ReportDefaults::default();
    let pool = init_database(&dir.path().join("argos.db"), &defaults).await.unwrap();
    let service = ReportService::new(ReportNormalizer::new(defaults), UldRepository::new(pool));
    (dir, service)
}

#[tokio::test]
async fn test_first_write_after_init_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let defaults = ReportDefaults::default();
    let pool = init_database(&dir.path().join("argos.db"), &defaults).await.unwrap();
    let service = ReportService::new(ReportNormalizer::new(defaults), UldRepository::new(pool));

    // No read before the upsert: the very first statement is the INSERT .. ON CONFLICT
    for status in [TrafficLight::Red, TrafficLight::Green, TrafficLight::Yellow] {
        let record = service.submit_report(UldReport::new("AKE-1", status)).await.unwrap();
        assert_eq!(record.status, status);
        assert_eq!(record.id, 1);
    }
}

#[tokio::test]
async fn test_submit_then_resubmit_updates_single_record() {
    let (_dir, service) = setup_service().await;

    let first = service
        .submit_report(UldReport::new("AKE-1", TrafficLight::Red).with_damage_category("dent"))
        .await
        .unwrap();

    assert_eq!(first.uld_id, "AKE-1");
    assert_eq!(first.status, TrafficLight::Red);
    assert_eq!(first.location, "HK");
    assert!(!first.shipping_location.trim().is_empty());
    assert!(first.shipping_location.starts_with(&format!("HK{}", ROUTE_SEPARATOR)));

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let second = service
        .submit_report(UldReport::new("AKE-1", TrafficLight::Green))
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.status, TrafficLight::Green);
    assert!(second.last_seen > first.last_seen, "last_seen must move forward");

    let all = service.list_ulds().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], second);
}

#[tokio::test]
async fn test_stored_fields_equal_last_submission() {
    let (_dir, service) = setup_service().await;

    service
        .submit_report(
            UldReport::new("PMC-7", TrafficLight::Yellow)
                .with_damage_category("Panel crack")
                .with_shipping_location("HK ➜ NRT"),
        )
        .await
        .unwrap();
    let last = service
        .submit_report(
            UldReport::new("PMC-7", TrafficLight::Red)
                .with_damage_category("Base puncture")
                .with_shipping_location("HK ➜ LAX"),
        )
        .await
        .unwrap();

    let stored = service.repository().find_by_uld_id("PMC-7").await.unwrap().unwrap();
    assert_eq!(stored, last);
    assert_eq!(stored.status, TrafficLight::Red);
    assert_eq!(stored.damage_category.as_deref(), Some("Base puncture"));
    assert_eq!(stored.shipping_location, "HK ➜ LAX");
}

#[tokio::test]
async fn test_caller_location_is_ignored() {
    let (_dir, service) = setup_service().await;
    let mut report = UldReport::new("AKE-2", TrafficLight::Green);
    report.location = Some("SFO".to_string());

    let record = service.submit_report(report).await.unwrap();

    assert_eq!(record.location, "HK");
}

#[tokio::test]
async fn test_blank_uld_id_is_rejected_without_write() {
    let (_dir, service) = setup_service().await;

    let err = service
        .submit_report(UldReport::new("   ", TrafficLight::Red))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(service.repository().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_list_orders_most_recent_first() {
    let (_dir, service) = setup_service().await;
    let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let t2 = t1 + Duration::minutes(5);
    let t3 = t2 + Duration::minutes(5);

    service.submit_report_at(UldReport::new("T2", TrafficLight::Green), t2).await.unwrap();
    service.submit_report_at(UldReport::new("T1", TrafficLight::Green), t1).await.unwrap();
    service.submit_report_at(UldReport::new("T3", TrafficLight::Green), t3).await.unwrap();

    let order: Vec<_> = service
        .list_ulds()
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.uld_id, r.last_seen))
        .collect();

    assert_eq!(
        order,
        vec![("T3".to_string(), t3), ("T2".to_string(), t2), ("T1".to_string(), t1)]
    );
}

#[tokio::test]
async fn test_concurrent_submissions_produce_one_record() {
    let (_dir, service) = setup_service().await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let service = service.clone();
        let status = if i % 2 == 0 { TrafficLight::Red } else { TrafficLight::Green };
        handles.push(tokio::spawn(async move {
            service.submit_report(UldReport::new("AKE-RACE", status)).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }

    assert_eq!(service.repository().count().await.unwrap(), 1);
    assert!(ids.windows(2).all(|w| w[0] == w[1]), "every upsert must hit the same row");
}

#[tokio::test]
async fn test_seed_demo_data_only_on_empty_table() {
    let (_dir, service) = setup_service().await;

    assert_eq!(seed_demo_data(&service).await.unwrap(), 3);
    assert_eq!(seed_demo_data(&service).await.unwrap(), 0);

    let ids: Vec<String> = service
        .list_ulds()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.uld_id)
        .collect();
    assert_eq!(ids, vec!["AMP-CPA302", "AKE-CPA205", "AKE-CPA100"]);
}
