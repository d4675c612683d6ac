// Threshold classification across the shipped tier tables

use chrono::{TimeZone, Utc};
use market_sentinel::services::alerts::{Comparator, ThresholdClassifier, DEFAULT_REGISTRY};
use market_sentinel::types::{AlertType, MetricId, Severity, ThresholdSet};

fn classify(metric: MetricId, value: f64) -> Vec<market_sentinel::types::AlertCandidate> {
    let at = Utc.with_ymd_and_hms(2024, 8, 5, 13, 30, 0).unwrap();
    let thresholds = metric.default_thresholds();
    ThresholdClassifier::default().classify(metric, value, Some(&thresholds), at)
}

fn alert_type(metric: MetricId, value: f64) -> Option<AlertType> {
    classify(metric, value).first().map(|c| c.alert_type)
}

#[test]
fn test_boundary_value_counts_as_crossed() {
    assert_eq!(alert_type(MetricId::Vix, 30.0), Some(AlertType::CrashMode));
    assert_eq!(alert_type(MetricId::Vix, 40.0), Some(AlertType::PanicBuyingOpportunity));
    assert_eq!(alert_type(MetricId::SpyRsi, 20.0), Some(AlertType::ExtremeOversoldRsi));
    assert_eq!(alert_type(MetricId::CreditSpreads, 200.0), Some(AlertType::CreditStress));
    assert_eq!(alert_type(MetricId::Cape, 35.0), Some(AlertType::ExtremeBubble));
}

#[test]
fn test_most_severe_tier_wins() {
    let candidates = classify(MetricId::PutCallRatio, 2.3);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].alert_type, AlertType::MaximumPessimism);
    assert_eq!(candidates[0].severity, Severity::High);
    assert_eq!(candidates[0].threshold, 2.0);
}

#[test]
fn test_at_most_one_candidate_per_reading() {
    let samples = [-500.0, -150.0, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5, 2.0, 15.0, 20.0, 55.0, 95.0, 110.0, 300.0, 1000.0];
    for metric in MetricId::ALL {
        for value in samples {
            assert!(
                classify(metric, value).len() <= 1,
                "{} at {} produced more than one candidate",
                metric,
                value
            );
        }
    }
}

#[test]
fn test_values_between_tiers_stay_quiet() {
    assert!(classify(MetricId::Vix, 12.0).is_empty());
    assert!(classify(MetricId::SpyRsi, 45.0).is_empty());
    assert!(classify(MetricId::DollarIndex, 102.0).is_empty());
    assert!(classify(MetricId::FearGreedIndex, 50.0).is_empty());
}

#[test]
fn test_term_structure_needs_strict_backwardation() {
    assert!(classify(MetricId::VixTermStructure, 0.0).is_empty());
    assert_eq!(
        alert_type(MetricId::VixTermStructure, 0.4),
        Some(AlertType::VixBackwardation)
    );
}

#[test]
fn test_nvda_pe_never_alerts() {
    assert!(classify(MetricId::NvdaPe, -0.9).is_empty());
    assert!(ThresholdClassifier::default().tiers_for(MetricId::NvdaPe).is_empty());
}

#[test]
fn test_missing_tier_key_skips_that_tier_only() {
    let at = Utc.with_ymd_and_hms(2024, 8, 5, 13, 30, 0).unwrap();
    let thresholds = ThresholdSet::new().with("danger", 30.0);
    let candidates =
        ThresholdClassifier::default().classify(MetricId::Vix, 45.0, Some(&thresholds), at);

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].alert_type, AlertType::CrashMode);
}

#[test]
fn test_registry_tiers_are_ordered_most_severe_first() {
    for family in DEFAULT_REGISTRY {
        let one_sided: Vec<_> = family
            .tiers
            .iter()
            .filter(|tier| tier.comparator == family.tiers[0].comparator)
            .collect();
        for pair in one_sided.windows(2) {
            assert!(
                pair[0].severity >= pair[1].severity,
                "{} tiers out of order",
                family.metric
            );
        }
    }
}

#[test]
fn test_comparators() {
    assert!(Comparator::AtLeast.matches(30.0, 30.0));
    assert!(Comparator::AtMost.matches(-0.5, -0.5));
    assert!(!Comparator::Above.matches(0.0, 0.0));
}
