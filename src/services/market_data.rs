// src/services/market_data.rs

use crate::types::{MetricId, MetricReading, MetricSnapshot, ThresholdSet};
use crate::utils::{AlertResult, SentinelError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

/// Source of metric snapshots, one per evaluation cycle.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn get_all_metrics(&self) -> AlertResult<MetricSnapshot>;
}

/// Serves whatever snapshot it was last given.
#[derive(Debug)]
pub struct StaticMarketData {
    snapshot: Mutex<MetricSnapshot>,
}

impl StaticMarketData {
    pub fn new(snapshot: MetricSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    /// Parse the provider payload: `{ "<metric key>": { value, error?, thresholds? | config.thresholds? } }`.
    ///
    /// Unknown metric keys are skipped. Thresholds that are not a map of
    /// numbers are dropped, which leaves the metric unclassifiable.
    pub fn from_json(payload: &str, taken_at: DateTime<Utc>) -> AlertResult<Self> {
        Ok(Self::new(parse_snapshot(payload, taken_at)?))
    }

    pub async fn replace(&self, snapshot: MetricSnapshot) {
        *self.snapshot.lock().await = snapshot;
    }
}

#[async_trait]
impl MarketDataProvider for StaticMarketData {
    async fn get_all_metrics(&self) -> AlertResult<MetricSnapshot> {
        Ok(self.snapshot.lock().await.clone())
    }
}

pub fn parse_snapshot(payload: &str, taken_at: DateTime<Utc>) -> AlertResult<MetricSnapshot> {
    let root: Value = serde_json::from_str(payload)?;
    let entries = root
        .as_object()
        .ok_or_else(|| SentinelError::parse_error("Metrics payload must be a JSON object"))?;

    let mut snapshot = MetricSnapshot::new(taken_at);
    for (key, entry) in entries {
        let metric: MetricId = match key.parse() {
            Ok(metric) => metric,
            Err(_) => {
                crate::log_warn!(&format!("Skipping unknown metric '{}'", key));
                continue;
            }
        };
        snapshot.insert(metric, parse_reading(metric, entry));
    }
    Ok(snapshot)
}

fn parse_reading(metric: MetricId, entry: &Value) -> MetricReading {
    let thresholds_value = entry
        .get("thresholds")
        .or_else(|| entry.get("config").and_then(|config| config.get("thresholds")));

    let thresholds = thresholds_value.and_then(|raw| {
        serde_json::from_value::<ThresholdSet>(raw.clone())
            .map_err(|e| {
                crate::log_warn!(
                    "Ignoring malformed thresholds",
                    serde_json::json!({ "metric": metric, "error": e.to_string() })
                )
            })
            .ok()
    });

    MetricReading {
        value: entry.get("value").and_then(Value::as_f64),
        error: entry.get("error").and_then(Value::as_str).map(str::to_string),
        thresholds,
    }
}
