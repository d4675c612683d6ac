// Cooldown windows and store bounds

use chrono::{DateTime, Duration, TimeZone, Utc};
use market_sentinel::services::alerts::CooldownStore;
use market_sentinel::types::{AlertCandidate, AlertType, MetricId, Severity};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 5, 13, 30, 0).unwrap()
}

fn alert(metric: MetricId, alert_type: AlertType, severity: Severity) -> AlertCandidate {
    AlertCandidate {
        metric,
        alert_type,
        severity,
        message: format!("{} {}", metric, alert_type),
        recommendation: "Review".to_string(),
        emoji: severity.emoji().to_string(),
        value: 0.0,
        threshold: 0.0,
        generated_at: t0(),
    }
}

#[test]
fn test_windows_scale_with_severity() {
    let mut store = CooldownStore::default();
    let high = alert(MetricId::Vix, AlertType::CrashMode, Severity::High);
    let medium = alert(MetricId::SpyRsi, AlertType::OversoldRsi, Severity::Medium);
    let low = alert(MetricId::Cape, AlertType::BubbleTerritory, Severity::Low);
    for a in [&high, &medium, &low] {
        store.record_dispatch(a, t0());
    }

    let at = |minutes| t0() + Duration::minutes(minutes);
    assert!(!store.should_dispatch(&high, at(10)));
    assert!(store.should_dispatch(&high, at(20)));
    assert!(!store.should_dispatch(&medium, at(30)));
    assert!(store.should_dispatch(&medium, at(31)));
    assert!(!store.should_dispatch(&low, at(60)));
    assert!(store.should_dispatch(&low, at(61)));
}

#[test]
fn test_keys_are_independent() {
    let mut store = CooldownStore::default();
    store.record_dispatch(&alert(MetricId::Vix, AlertType::CrashMode, Severity::High), t0());

    assert!(store.should_dispatch(
        &alert(MetricId::Vix, AlertType::PanicBuyingOpportunity, Severity::High),
        t0()
    ));
    assert!(store.should_dispatch(
        &alert(MetricId::SpyRsi, AlertType::CrashMode, Severity::High),
        t0()
    ));
}

#[test]
fn test_store_never_exceeds_capacity() {
    let mut store = CooldownStore::default();
    let types = [
        AlertType::CrashMode,
        AlertType::EarlyCrash,
        AlertType::ElevatedVolatility,
        AlertType::BubbleTerritory,
        AlertType::OversoldRsi,
        AlertType::FearBuilding,
        AlertType::CreditStress,
    ];
    let keys: Vec<AlertCandidate> = types
        .iter()
        .flat_map(|t| MetricId::ALL.iter().map(move |m| alert(*m, *t, Severity::Medium)))
        .take(101)
        .collect();
    assert_eq!(keys.len(), 101);

    for (i, a) in keys.iter().enumerate() {
        store.record_dispatch(a, t0() + Duration::seconds(i as i64));
        assert!(store.len() <= 100);
    }

    assert_eq!(store.len(), 100);
    assert!(!store.contains(&keys[0].cooldown_key()));
    assert!(store.contains(&keys[1].cooldown_key()));
    assert!(store.contains(&keys[100].cooldown_key()));
}

#[test]
fn test_clear_forgets_everything() {
    let mut store = CooldownStore::new(Duration::minutes(5), 10);
    let high = alert(MetricId::Vix, AlertType::CrashMode, Severity::High);
    store.record_dispatch(&high, t0());
    store.clear();

    assert!(store.is_empty());
    assert!(store.should_dispatch(&high, t0()));
    assert_eq!(store.base_cooldown(), Duration::minutes(5));
}
