// src/services/alerts/engine.rs

use super::classifier::ThresholdClassifier;
use super::cooldown::{CooldownStore, DEFAULT_COOLDOWN_CAPACITY, DEFAULT_COOLDOWN_MINUTES};
use super::dispatcher::{DispatchOutcome, NotificationDispatcher};
use super::escalation::{high_severity_metrics, plan_notifications, Notification};
use crate::services::history::AlertHistoryStore;
use crate::services::market_data::MarketDataProvider;
use crate::services::market_status::{assess, MarketStatus};
use crate::services::telegram::{ChatTransport, SendOptions};
use crate::types::{AlertCandidate, AlertRecord, CooldownKey, MetricSnapshot};
use crate::utils::{AlertResult, Clock, Logger, SentinelError, SystemClock};
use chrono::Duration;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;

pub const DEFAULT_CHECK_INTERVAL_MINUTES: u64 = 30;
/// One week.
pub const MAX_COOLDOWN_MINUTES: i64 = 7 * 24 * 60;
/// One day.
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub cooldown_base_minutes: i64,
    pub cooldown_capacity: usize,
    pub check_interval_minutes: u64,
    pub chat_id: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cooldown_base_minutes: DEFAULT_COOLDOWN_MINUTES,
            cooldown_capacity: DEFAULT_COOLDOWN_CAPACITY,
            check_interval_minutes: DEFAULT_CHECK_INTERVAL_MINUTES,
            chat_id: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> AlertResult<Self> {
        let defaults = Self::default();
        let config = Self {
            cooldown_base_minutes: env_or("ALERT_COOLDOWN_MINUTES", defaults.cooldown_base_minutes)?,
            cooldown_capacity: env_or("ALERT_HISTORY_CAPACITY", defaults.cooldown_capacity)?,
            check_interval_minutes: env_or("CHECK_INTERVAL_MINUTES", defaults.check_interval_minutes)?,
            chat_id: std::env::var("TELEGRAM_CHAT_ID").ok(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AlertResult<()> {
        if self.cooldown_base_minutes <= 0 {
            return Err(SentinelError::config_error(
                "cooldown_base_minutes must be greater than 0",
            ));
        }
        if self.cooldown_base_minutes > MAX_COOLDOWN_MINUTES {
            return Err(SentinelError::config_error(format!(
                "cooldown_base_minutes must be at most {}",
                MAX_COOLDOWN_MINUTES
            )));
        }
        if self.cooldown_capacity == 0 {
            return Err(SentinelError::config_error(
                "cooldown_capacity must be greater than 0",
            ));
        }
        if self.check_interval_minutes == 0 {
            return Err(SentinelError::config_error(
                "check_interval_minutes must be greater than 0",
            ));
        }
        if self.check_interval_minutes > MAX_CHECK_INTERVAL_MINUTES {
            return Err(SentinelError::config_error(format!(
                "check_interval_minutes must be at most {}",
                MAX_CHECK_INTERVAL_MINUTES
            )));
        }
        Ok(())
    }

    pub fn base_cooldown(&self) -> Duration {
        Duration::minutes(self.cooldown_base_minutes)
    }

    pub fn check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.check_interval_minutes * 60)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> AlertResult<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SentinelError::config_error(format!("Invalid value for {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

/// What happened to one batch of candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub considered: usize,
    pub suppressed: Vec<CooldownKey>,
    pub outcomes: Vec<DispatchOutcome>,
    /// Set by `run_cycle`.
    pub status: Option<MarketStatus>,
}

impl DispatchReport {
    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }

    pub fn delivered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.delivered).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.delivered).count()
    }
}

/// Classifies snapshots, gates candidates through the cooldown store and
/// delivers what survives.
pub struct AlertEngine {
    config: EngineConfig,
    classifier: ThresholdClassifier,
    cooldowns: Mutex<CooldownStore>,
    dispatcher: NotificationDispatcher,
    history: Option<Arc<dyn AlertHistoryStore>>,
    clock: Arc<dyn Clock>,
    logger: Logger,
}

impl AlertEngine {
    pub fn new(config: EngineConfig, transport: Arc<dyn ChatTransport>) -> AlertResult<Self> {
        config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let mut logger = Logger::for_component("alert_engine");
        if let Some(chat_id) = &config.chat_id {
            logger.add_context("chat_id", json!(chat_id));
        }

        Ok(Self {
            classifier: ThresholdClassifier::default(),
            cooldowns: Mutex::new(CooldownStore::new(
                config.base_cooldown(),
                config.cooldown_capacity,
            )),
            dispatcher: NotificationDispatcher::new(transport, clock.clone()),
            history: None,
            clock,
            logger,
            config,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.dispatcher = self.dispatcher.with_clock(clock.clone());
        self.clock = clock;
        self
    }

    pub fn with_history(mut self, history: Arc<dyn AlertHistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_classifier(mut self, classifier: ThresholdClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_send_options(mut self, options: SendOptions) -> Self {
        self.dispatcher = self.dispatcher.with_options(options);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify every usable reading of `snapshot`.
    ///
    /// Depends only on the snapshot: candidates are stamped with
    /// `snapshot.taken_at` and metrics are visited in declaration order.
    pub fn evaluate(&self, snapshot: &MetricSnapshot) -> Vec<AlertCandidate> {
        let mut candidates = Vec::new();

        for (metric, reading) in &snapshot.metrics {
            if let Some(error) = &reading.error {
                log::debug!("{}: provider reported error, skipping: {}", metric, error);
                continue;
            }
            let value = match reading.usable_value() {
                Some(value) => value,
                None => {
                    log::debug!("{}: no usable value, skipping", metric);
                    continue;
                }
            };
            candidates.extend(self.classifier.classify(
                *metric,
                value,
                reading.thresholds.as_ref(),
                snapshot.taken_at,
            ));
        }

        candidates
    }

    /// Filter, plan, deliver and record one batch of candidates.
    ///
    /// The cooldown store stays locked from the gate check until every
    /// delivery of this batch has been recorded.
    pub async fn dispatch_all(&self, candidates: Vec<AlertCandidate>) -> DispatchReport {
        let mut cooldowns = self.cooldowns.lock().await;
        let now = self.clock.now();
        let considered = candidates.len();
        let cycle_high_metrics = high_severity_metrics(&candidates).len();

        let (allowed, suppressed): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|candidate| cooldowns.should_dispatch(candidate, now));

        for candidate in &suppressed {
            self.logger.debug_with_meta(
                "Alert suppressed by cooldown",
                Some(&json!({
                    "key": candidate.cooldown_key().to_string(),
                    "severity": candidate.severity,
                })),
            );
        }

        let plan = plan_notifications(allowed, cycle_high_metrics);
        let outcomes = join_all(plan.iter().map(|n| self.dispatcher.deliver(n))).await;

        for (notification, outcome) in plan.iter().zip(&outcomes) {
            NotificationDispatcher::record_delivery(outcome, notification, &mut cooldowns);
        }
        drop(cooldowns);

        self.write_history(&plan, &outcomes).await;

        DispatchReport {
            considered,
            suppressed: suppressed.iter().map(AlertCandidate::cooldown_key).collect(),
            outcomes,
            status: None,
        }
    }

    /// Fetch, evaluate and dispatch once. Only a provider failure is an error.
    pub async fn run_cycle(&self, provider: &dyn MarketDataProvider) -> AlertResult<DispatchReport> {
        let snapshot = provider.get_all_metrics().await?;
        let status = assess(&snapshot);
        let candidates = self.evaluate(&snapshot);

        let mut report = self.dispatch_all(candidates).await;

        self.logger.info_with_meta(
            "Alert cycle completed",
            Some(&json!({
                "market_level": status.level,
                "score": status.score,
                "considered": report.considered,
                "suppressed": report.suppressed_count(),
                "delivered": report.delivered_count(),
                "failed": report.failed_count(),
            })),
        );

        report.status = Some(status);
        Ok(report)
    }

    /// Run a cycle every `check_interval_minutes` until `shutdown` flips to
    /// true or its sender is dropped. Returns the number of cycles run.
    pub async fn run_periodic(
        &self,
        provider: &dyn MarketDataProvider,
        mut shutdown: watch::Receiver<bool>,
    ) -> usize {
        let mut ticker = tokio::time::interval(self.config.check_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycles = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle(provider).await {
                        self.logger.error(&format!("Alert cycle failed: {}", e));
                    }
                    cycles += 1;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.logger.info(&format!("Alert scheduler stopped after {} cycles", cycles));
        cycles
    }

    pub async fn cooldown_snapshot(&self) -> CooldownStore {
        self.cooldowns.lock().await.clone()
    }

    pub async fn tracked_alert_count(&self) -> usize {
        self.cooldowns.lock().await.len()
    }

    pub async fn reset_cooldowns(&self) {
        self.cooldowns.lock().await.clear();
    }

    async fn write_history(&self, plan: &[Notification], outcomes: &[DispatchOutcome]) {
        let history = match &self.history {
            Some(history) => history,
            None => return,
        };

        for (notification, outcome) in plan.iter().zip(outcomes) {
            for candidate in notification.candidates() {
                let record = AlertRecord::from_candidate(candidate, outcome.delivered, outcome.sent_at);
                if let Err(e) = history.record_alert(record).await {
                    self.logger.warn(&format!(
                        "Failed to record alert history for {}: {}",
                        candidate.cooldown_key(),
                        e
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_cooldown(), Duration::minutes(30));
        assert_eq!(config.check_interval(), std::time::Duration::from_secs(1800));
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let config = EngineConfig {
            cooldown_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            cooldown_base_minutes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_values_above_bounds_are_rejected() {
        let config = EngineConfig {
            cooldown_base_minutes: MAX_COOLDOWN_MINUTES,
            check_interval_minutes: MAX_CHECK_INTERVAL_MINUTES,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = EngineConfig {
            cooldown_base_minutes: MAX_COOLDOWN_MINUTES + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            cooldown_base_minutes: i64::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            check_interval_minutes: u64::MAX / 60 + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_report_counts() {
        let report = DispatchReport::default();
        assert_eq!(report.delivered_count(), 0);
        assert_eq!(report.failed_count(), 0);
        assert_eq!(report.suppressed_count(), 0);
    }
}
