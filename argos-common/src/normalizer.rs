//! Report normalization
//!
//! Pure defaulting step applied to every inbound report before it is stored:
//! - `location` is always the configured origin, whatever the caller sent
//! - a missing or blank `shipping_location` becomes `"<origin> ➜ <random destination>"`
//!
//! `uld_id`, `status`, `damage_category` and a non-blank `shipping_location`
//! pass through untouched.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ReportDefaults;
use crate::models::{NormalizedReport, UldReport};

/// Applies origin and destination defaults to inbound reports
#[derive(Debug, Clone)]
pub struct ReportNormalizer {
    defaults: ReportDefaults,
    /// Non-blank destination candidates
    destinations: Vec<String>,
}

impl ReportNormalizer {
    pub fn new(defaults: ReportDefaults) -> Self {
        let destinations = defaults
            .destinations
            .iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();

        Self {
            defaults,
            destinations,
        }
    }

    pub fn defaults(&self) -> &ReportDefaults {
        &self.defaults
    }

    pub fn origin(&self) -> &str {
        &self.defaults.origin
    }

    /// Normalize using the thread-local RNG for destination picks
    pub fn normalize(&self, report: UldReport) -> NormalizedReport {
        self.normalize_with_rng(report, &mut rand::thread_rng())
    }

    /// Normalize with a caller-supplied RNG (deterministic in tests)
    pub fn normalize_with_rng<R: Rng + ?Sized>(
        &self,
        report: UldReport,
        rng: &mut R,
    ) -> NormalizedReport {
        let shipping_location = match report.shipping_location {
            Some(label) if !label.trim().is_empty() => label,
            _ => self.random_route(rng),
        };

        NormalizedReport {
            uld_id: report.uld_id,
            status: report.status,
            damage_category: report.damage_category,
            location: self.defaults.origin.clone(),
            shipping_location,
        }
    }

    /// `"<origin> ➜ <destination>"` with a destination picked at random
    pub fn random_route<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        match self.destinations.choose(rng) {
            Some(destination) => self.defaults.route_label(destination),
            None => self.defaults.fallback_route_label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ROUTE_SEPARATOR;
    use crate::models::TrafficLight;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn normalizer() -> ReportNormalizer {
        ReportNormalizer::new(ReportDefaults::default())
    }

    fn assert_generated_route(label: &str, defaults: &ReportDefaults) {
        let (origin, destination) = label
            .split_once(ROUTE_SEPARATOR)
            .unwrap_or_else(|| panic!("label '{}' has no route separator", label));
        assert_eq!(origin, defaults.origin);
        assert!(
            defaults.destinations.iter().any(|d| d == destination),
            "'{}' is not a configured destination",
            destination
        );
    }

    #[test]
    fn test_location_always_forced_to_origin() {
        let n = normalizer();
        for input in [None, Some(""), Some("LAX"), Some("HK")] {
            let mut report = UldReport::new("AKE-1", TrafficLight::Green);
            report.location = input.map(str::to_string);
            assert_eq!(n.normalize(report).location, "HK");
        }
    }

    #[test]
    fn test_missing_shipping_location_is_generated() {
        let n = normalizer();
        let normalized = n.normalize(UldReport::new("AKE-1", TrafficLight::Red));
        assert_generated_route(&normalized.shipping_location, n.defaults());
    }

    #[test]
    fn test_blank_shipping_location_is_generated() {
        let n = normalizer();
        for blank in ["", "   ", "\t\n"] {
            let report = UldReport::new("AKE-1", TrafficLight::Red).with_shipping_location(blank);
            let normalized = n.normalize(report);
            assert_generated_route(&normalized.shipping_location, n.defaults());
        }
    }

    #[test]
    fn test_non_blank_shipping_location_passes_through() {
        let report = UldReport::new("AKE-1", TrafficLight::Yellow).with_shipping_location("HK ➜ LAX");
        assert_eq!(normalizer().normalize(report).shipping_location, "HK ➜ LAX");
    }

    #[test]
    fn test_other_fields_untouched() {
        let report = UldReport::new("AMP-CPA302", TrafficLight::Red)
            .with_damage_category("Forklift puncture (Base)")
            .with_shipping_location("Ready at SFO Warehouse");

        let normalized = normalizer().normalize(report);

        assert_eq!(normalized.uld_id, "AMP-CPA302");
        assert_eq!(normalized.status, TrafficLight::Red);
        assert_eq!(normalized.damage_category.as_deref(), Some("Forklift puncture (Base)"));
        assert_eq!(normalized.shipping_location, "Ready at SFO Warehouse");
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let n = normalizer();
        let a = n.normalize_with_rng(UldReport::new("X", TrafficLight::Green), &mut StdRng::seed_from_u64(7));
        let b = n.normalize_with_rng(UldReport::new("X", TrafficLight::Green), &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_defaults_are_honoured() {
        let defaults = ReportDefaults {
            origin: "TPE".to_string(),
            destinations: vec!["  ".to_string(), "ICN".to_string()],
            fallback_destination: "TBD".to_string(),
        };
        let normalized = ReportNormalizer::new(defaults).normalize(UldReport::new("X", TrafficLight::Green));

        assert_eq!(normalized.location, "TPE");
        assert_eq!(normalized.shipping_location, "TPE ➜ ICN");
    }

    #[test]
    fn test_no_destinations_uses_fallback() {
        let defaults = ReportDefaults {
            destinations: Vec::new(),
            ..ReportDefaults::default()
        };
        let normalized = ReportNormalizer::new(defaults).normalize(UldReport::new("X", TrafficLight::Green));
        assert_eq!(normalized.shipping_location, "HK ➜ TBD");
    }
}
