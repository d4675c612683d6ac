// src/services/alerts/dispatcher.rs

use super::cooldown::CooldownStore;
use super::escalation::{Notification, NotificationKind};
use crate::services::telegram::{ChatTransport, SendOptions};
use crate::types::{AlertType, MetricId};
use crate::utils::{format_alert_message, format_escalation_message, Clock, Logger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Result of delivering one notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub kind: NotificationKind,
    pub metrics: Vec<MetricId>,
    pub alert_types: Vec<AlertType>,
    pub delivered: bool,
    pub error: Option<String>,
    pub sent_at: DateTime<Utc>,
}

/// Renders notifications and hands them to the chat transport.
pub struct NotificationDispatcher {
    transport: Arc<dyn ChatTransport>,
    options: SendOptions,
    clock: Arc<dyn Clock>,
    logger: Logger,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn ChatTransport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            options: SendOptions::default(),
            clock,
            logger: Logger::for_component("dispatcher"),
        }
    }

    pub fn with_options(mut self, options: SendOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn render(notification: &Notification, sent_at: DateTime<Utc>) -> String {
        match notification {
            Notification::Single(alert) => format_alert_message(alert, sent_at),
            Notification::Escalation(batch) => format_escalation_message(&batch.alerts, sent_at),
        }
    }

    /// Send one notification. Exactly one transport call per notification.
    pub async fn deliver(&self, notification: &Notification) -> DispatchOutcome {
        let sent_at = self.clock.now();
        let text = Self::render(notification, sent_at);
        let result = self.transport.send(&text, &self.options).await;

        let mut outcome = DispatchOutcome {
            kind: notification.kind(),
            metrics: notification.metrics(),
            alert_types: notification
                .candidates()
                .iter()
                .map(|alert| alert.alert_type)
                .collect(),
            delivered: result.is_ok(),
            error: None,
            sent_at,
        };

        let meta = json!({
            "kind": outcome.kind,
            "metrics": outcome.metrics,
            "alert_types": outcome.alert_types,
        });

        match result {
            Ok(()) => self.logger.info_with_meta("Alert notification sent", Some(&meta)),
            Err(e) => {
                self.logger.error_with_meta(
                    &format!("Failed to send alert notification: {}", e),
                    Some(&meta),
                );
                outcome.error = Some(e.to_string());
            }
        }

        outcome
    }

    /// Start the cooldown of every constituent alert, but only for delivered
    /// notifications.
    pub fn record_delivery(
        outcome: &DispatchOutcome,
        notification: &Notification,
        cooldowns: &mut CooldownStore,
    ) {
        if !outcome.delivered {
            return;
        }
        for alert in notification.candidates() {
            cooldowns.record_dispatch(alert, outcome.sent_at);
        }
    }

    pub async fn dispatch(
        &self,
        notification: &Notification,
        cooldowns: &mut CooldownStore,
    ) -> DispatchOutcome {
        let outcome = self.deliver(notification).await;
        Self::record_delivery(&outcome, notification, cooldowns);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::alerts::escalation::EscalationBatch;
    use crate::types::{AlertCandidate, Severity};
    use crate::utils::{AlertResult, ManualClock, SentinelError};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct Recorder {
        messages: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ChatTransport for Recorder {
        async fn send(&self, text: &str, _options: &SendOptions) -> AlertResult<()> {
            if self.fail {
                return Err(SentinelError::telegram_error("chat not found"));
            }
            self.messages.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 5, 9, 0, 0).unwrap()
    }

    fn alert(metric: MetricId, alert_type: AlertType) -> AlertCandidate {
        AlertCandidate {
            metric,
            alert_type,
            severity: Severity::High,
            message: format!("{} fired", alert_type),
            recommendation: "Act".to_string(),
            emoji: "🔴".to_string(),
            value: 1.0,
            threshold: 1.0,
            generated_at: t0(),
        }
    }

    fn dispatcher(fail: bool) -> (NotificationDispatcher, Arc<Recorder>) {
        let recorder = Arc::new(Recorder {
            messages: Mutex::new(Vec::new()),
            fail,
        });
        let clock = Arc::new(ManualClock::new(t0()));
        (NotificationDispatcher::new(recorder.clone(), clock), recorder)
    }

    #[tokio::test]
    async fn test_escalation_is_one_message_and_starts_every_cooldown() {
        let (dispatcher, recorder) = dispatcher(false);
        let mut cooldowns = CooldownStore::default();
        let batch = Notification::Escalation(EscalationBatch {
            alerts: vec![
                alert(MetricId::Vix, AlertType::CrashMode),
                alert(MetricId::SpyRsi, AlertType::ExtremeOversoldRsi),
            ],
        });

        let outcome = dispatcher.dispatch(&batch, &mut cooldowns).await;

        assert!(outcome.delivered);
        assert_eq!(recorder.messages.lock().unwrap().len(), 1);
        assert_eq!(cooldowns.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_leaves_cooldown_untouched() {
        let (dispatcher, _) = dispatcher(true);
        let mut cooldowns = CooldownStore::default();
        let single = Notification::Single(alert(MetricId::Vix, AlertType::CrashMode));

        let outcome = dispatcher.dispatch(&single, &mut cooldowns).await;

        assert!(!outcome.delivered);
        assert!(outcome.error.is_some());
        assert!(cooldowns.is_empty());
    }
}
