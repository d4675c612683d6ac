// src/services/history.rs

use crate::types::AlertRecord;
use crate::utils::{AlertResult, SentinelError};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Audit trail of delivery attempts.
#[async_trait]
pub trait AlertHistoryStore: Send + Sync {
    async fn record_alert(&self, record: AlertRecord) -> AlertResult<()>;

    /// Records whose delivery failed, oldest first.
    async fn pending_alerts(&self) -> AlertResult<Vec<AlertRecord>>;

    async fn mark_sent(&self, id: &str) -> AlertResult<()>;
}

/// Bounded in-process history. The oldest record is dropped once `limit` is reached.
#[derive(Debug)]
pub struct InMemoryAlertHistory {
    records: Mutex<VecDeque<AlertRecord>>,
    limit: usize,
}

impl Default for InMemoryAlertHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl InMemoryAlertHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            limit: limit.max(1),
        }
    }

    pub async fn all(&self) -> Vec<AlertRecord> {
        self.records.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl AlertHistoryStore for InMemoryAlertHistory {
    async fn record_alert(&self, record: AlertRecord) -> AlertResult<()> {
        let mut records = self.records.lock().await;
        if records.len() >= self.limit {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }

    async fn pending_alerts(&self) -> AlertResult<Vec<AlertRecord>> {
        let records = self.records.lock().await;
        let mut pending: Vec<AlertRecord> = records.iter().filter(|r| !r.sent).cloned().collect();
        pending.sort_by_key(|r| r.recorded_at);
        Ok(pending)
    }

    async fn mark_sent(&self, id: &str) -> AlertResult<()> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| SentinelError::not_found(format!("Alert record {} not found", id)))?;
        record.sent = true;
        Ok(())
    }
}
