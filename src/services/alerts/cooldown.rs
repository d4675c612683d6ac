// src/services/alerts/cooldown.rs

use crate::types::{AlertCandidate, CooldownKey};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};

pub const DEFAULT_COOLDOWN_MINUTES: i64 = 30;
pub const DEFAULT_COOLDOWN_CAPACITY: usize = 100;

/// Last-dispatch timestamps per (metric, alert type).
///
/// Bounded: once `capacity` keys are tracked, inserting a new key evicts the
/// key that was inserted first. Re-recording an existing key refreshes its
/// timestamp without changing its eviction position.
#[derive(Debug, Clone)]
pub struct CooldownStore {
    base_cooldown: Duration,
    capacity: usize,
    last_dispatched: HashMap<CooldownKey, DateTime<Utc>>,
    insertion_order: VecDeque<CooldownKey>,
}

impl Default for CooldownStore {
    fn default() -> Self {
        Self::new(
            Duration::minutes(DEFAULT_COOLDOWN_MINUTES),
            DEFAULT_COOLDOWN_CAPACITY,
        )
    }
}

impl CooldownStore {
    pub fn new(base_cooldown: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            base_cooldown,
            capacity,
            last_dispatched: HashMap::with_capacity(capacity),
            insertion_order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn base_cooldown(&self) -> Duration {
        self.base_cooldown
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.last_dispatched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_dispatched.is_empty()
    }

    pub fn contains(&self, key: &CooldownKey) -> bool {
        self.last_dispatched.contains_key(key)
    }

    pub fn last_dispatched(&self, key: &CooldownKey) -> Option<DateTime<Utc>> {
        self.last_dispatched.get(key).copied()
    }

    /// Whether `candidate` may be notified at `now`.
    ///
    /// Keys never dispatched are always allowed. Otherwise the elapsed time
    /// must strictly exceed the severity-scaled window.
    pub fn should_dispatch(&self, candidate: &AlertCandidate, now: DateTime<Utc>) -> bool {
        match self.last_dispatched.get(&candidate.cooldown_key()) {
            None => true,
            Some(last) => {
                let elapsed = now.signed_duration_since(*last);
                elapsed > candidate.severity.cooldown_window(self.base_cooldown)
            }
        }
    }

    /// Record a successful delivery of `candidate` at `now`.
    pub fn record_dispatch(&mut self, candidate: &AlertCandidate, now: DateTime<Utc>) {
        let key = candidate.cooldown_key();

        if let Some(last) = self.last_dispatched.get_mut(&key) {
            *last = now;
            return;
        }

        while self.last_dispatched.len() >= self.capacity {
            match self.insertion_order.pop_front() {
                Some(oldest) => {
                    self.last_dispatched.remove(&oldest);
                }
                None => break,
            }
        }

        self.insertion_order.push_back(key);
        self.last_dispatched.insert(key, now);
    }

    /// Time left before `candidate` may be notified again, if any.
    pub fn remaining(&self, candidate: &AlertCandidate, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.last_dispatched.get(&candidate.cooldown_key())?;
        let window = candidate.severity.cooldown_window(self.base_cooldown);
        let elapsed = now.signed_duration_since(*last);
        (elapsed <= window).then(|| window.checked_sub(&elapsed).unwrap_or_else(Duration::max_value))
    }

    pub fn clear(&mut self) {
        self.last_dispatched.clear();
        self.insertion_order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertType, MetricId, Severity};
    use chrono::TimeZone;

    fn candidate(severity: Severity) -> AlertCandidate {
        AlertCandidate {
            metric: MetricId::Vix,
            alert_type: AlertType::CrashMode,
            severity,
            message: "VIX spike".to_string(),
            recommendation: "Deploy cash".to_string(),
            emoji: "🔴".to_string(),
            value: 33.0,
            threshold: 30.0,
            generated_at: t0(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 5, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_never_dispatched_is_allowed() {
        let store = CooldownStore::default();
        assert!(store.should_dispatch(&candidate(Severity::Low), t0()));
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let mut store = CooldownStore::default();
        let high = candidate(Severity::High);
        store.record_dispatch(&high, t0());

        assert!(!store.should_dispatch(&high, t0() + Duration::minutes(15)));
        assert!(store.should_dispatch(&high, t0() + Duration::minutes(15) + Duration::seconds(1)));
    }

    #[test]
    fn test_rerecord_keeps_eviction_position() {
        let mut store = CooldownStore::new(Duration::minutes(30), 2);
        let first = candidate(Severity::High);
        let mut second = candidate(Severity::High);
        second.metric = MetricId::SpyRsi;
        let mut third = candidate(Severity::High);
        third.metric = MetricId::PutCallRatio;

        store.record_dispatch(&first, t0());
        store.record_dispatch(&second, t0());
        store.record_dispatch(&first, t0() + Duration::minutes(20));
        store.record_dispatch(&third, t0() + Duration::minutes(21));

        assert_eq!(store.len(), 2);
        assert!(!store.contains(&first.cooldown_key()));
        assert!(store.contains(&second.cooldown_key()));
        assert!(store.contains(&third.cooldown_key()));
    }

    #[test]
    fn test_remaining_reports_time_left() {
        let mut store = CooldownStore::default();
        let medium = candidate(Severity::Medium);
        store.record_dispatch(&medium, t0());

        assert_eq!(
            store.remaining(&medium, t0() + Duration::minutes(10)),
            Some(Duration::minutes(20))
        );
        assert_eq!(store.remaining(&medium, t0() + Duration::minutes(31)), None);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut store = CooldownStore::new(Duration::minutes(30), 0);
        store.record_dispatch(&candidate(Severity::High), t0());
        assert_eq!(store.capacity(), 1);
        assert_eq!(store.len(), 1);
    }
}
