// Mock collaborators for engine tests

use async_trait::async_trait;
use market_sentinel::services::history::AlertHistoryStore;
use market_sentinel::services::market_data::MarketDataProvider;
use market_sentinel::services::telegram::{ChatTransport, SendOptions};
use market_sentinel::types::{AlertRecord, MetricSnapshot};
use market_sentinel::utils::{AlertResult, SentinelError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records every message it is asked to send. Can be switched to failing.
#[derive(Default)]
pub struct RecordingTransport {
    messages: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.set_failing(true);
        transport
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(&self, text: &str, _options: &SendOptions) -> AlertResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SentinelError::telegram_error("Telegram API error: Bad Gateway"));
        }
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Provider that always fails.
pub struct BrokenMarketData;

#[async_trait]
impl MarketDataProvider for BrokenMarketData {
    async fn get_all_metrics(&self) -> AlertResult<MetricSnapshot> {
        Err(SentinelError::data_unavailable("all upstream sources down"))
    }
}

/// History store that rejects every write.
pub struct BrokenHistory;

#[async_trait]
impl AlertHistoryStore for BrokenHistory {
    async fn record_alert(&self, _record: AlertRecord) -> AlertResult<()> {
        Err(SentinelError::storage_error("database is read-only"))
    }

    async fn pending_alerts(&self) -> AlertResult<Vec<AlertRecord>> {
        Ok(Vec::new())
    }

    async fn mark_sent(&self, _id: &str) -> AlertResult<()> {
        Ok(())
    }
}
