// Snapshot and candidate fixtures

use chrono::{DateTime, TimeZone, Utc};
use market_sentinel::types::{
    AlertCandidate, AlertType, MetricId, MetricReading, MetricSnapshot, Severity,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 5, 13, 30, 0).unwrap()
}

/// Snapshot with the given metrics read against their shipped thresholds.
pub fn snapshot_with(readings: &[(MetricId, f64)]) -> MetricSnapshot {
    snapshot_at(t0(), readings)
}

pub fn snapshot_at(taken_at: DateTime<Utc>, readings: &[(MetricId, f64)]) -> MetricSnapshot {
    readings
        .iter()
        .fold(MetricSnapshot::new(taken_at), |snapshot, (metric, value)| {
            snapshot.with_reading(*metric, MetricReading::with_default_thresholds(*metric, *value))
        })
}

pub fn candidate(metric: MetricId, alert_type: AlertType, severity: Severity) -> AlertCandidate {
    AlertCandidate {
        metric,
        alert_type,
        severity,
        message: format!("{} on {}", alert_type, metric),
        recommendation: "Review positions".to_string(),
        emoji: severity.emoji().to_string(),
        value: 1.0,
        threshold: 1.0,
        generated_at: t0(),
    }
}
