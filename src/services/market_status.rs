// src/services/market_status.rs

//! Coarse traffic-light reading of the market, attached to cycle reports.
//! It never gates dispatch.

use crate::types::{MetricId, MetricSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Green,
    Yellow,
    Orange,
    Red,
}

impl AlertLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 6 => AlertLevel::Red,
            s if s >= 4 => AlertLevel::Orange,
            s if s >= 2 => AlertLevel::Yellow,
            _ => AlertLevel::Green,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Green => "GREEN",
            AlertLevel::Yellow => "YELLOW",
            AlertLevel::Orange => "ORANGE",
            AlertLevel::Red => "RED",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AlertLevel::Green => "🟢",
            AlertLevel::Yellow => "🟡",
            AlertLevel::Orange => "🟠",
            AlertLevel::Red => "🔴",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub level: AlertLevel,
    pub score: u32,
    pub triggers: Vec<String>,
}

/// Score VIX, S&P RSI, put/call and Fear & Greed into a level.
pub fn assess(snapshot: &MetricSnapshot) -> MarketStatus {
    let mut score = 0;
    let mut triggers = Vec::new();

    if let Some(vix) = snapshot.value_of(MetricId::Vix).filter(|v| *v > 20.0) {
        score += if vix > 30.0 { 3 } else { 1 };
        triggers.push(format!("VIX at {:.1}", vix));
    }

    if let Some(rsi) = snapshot.value_of(MetricId::SpyRsi).filter(|v| *v < 30.0) {
        score += if rsi < 20.0 { 3 } else { 1 };
        triggers.push(format!("SPY RSI at {:.1}", rsi));
    }

    if let Some(ratio) = snapshot.value_of(MetricId::PutCallRatio).filter(|v| *v > 1.2) {
        score += if ratio > 1.8 { 3 } else { 1 };
        triggers.push(format!("Put/Call ratio at {:.2}", ratio));
    }

    if let Some(fg) = snapshot.value_of(MetricId::FearGreedIndex).filter(|v| *v < 40.0) {
        score += if fg < 20.0 { 2 } else { 1 };
        triggers.push(format!("Fear & Greed at {}", fg));
    }

    MarketStatus {
        level: AlertLevel::from_score(score),
        score,
        triggers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricReading;
    use chrono::{TimeZone, Utc};

    fn snapshot(readings: &[(MetricId, MetricReading)]) -> MetricSnapshot {
        let mut snapshot = MetricSnapshot::new(Utc.with_ymd_and_hms(2024, 8, 5, 9, 0, 0).unwrap());
        for (metric, reading) in readings {
            snapshot.insert(*metric, reading.clone());
        }
        snapshot
    }

    fn reading(metric: MetricId, value: f64) -> (MetricId, MetricReading) {
        (metric, MetricReading::with_default_thresholds(metric, value))
    }

    #[test]
    fn test_calm_market_is_green() {
        let status = assess(&snapshot(&[
            reading(MetricId::Vix, 14.0),
            reading(MetricId::SpyRsi, 55.0),
        ]));
        assert_eq!(status.level, AlertLevel::Green);
        assert_eq!(status.score, 0);
        assert!(status.triggers.is_empty());
    }

    #[test]
    fn test_stressed_market_is_red() {
        let status = assess(&snapshot(&[
            reading(MetricId::Vix, 35.0),
            reading(MetricId::SpyRsi, 18.0),
            reading(MetricId::FearGreedIndex, 30.0),
        ]));
        assert_eq!(status.score, 7);
        assert_eq!(status.level, AlertLevel::Red);
        assert_eq!(status.triggers[0], "VIX at 35.0");
        assert_eq!(status.triggers.len(), 3);
    }

    #[test]
    fn test_errored_metrics_do_not_score() {
        let status = assess(&snapshot(&[
            (MetricId::Vix, MetricReading::unavailable("timeout")),
            reading(MetricId::PutCallRatio, 1.3),
            reading(MetricId::FearGreedIndex, 35.0),
        ]));
        assert_eq!(status.score, 2);
        assert_eq!(status.level, AlertLevel::Yellow);
    }
}
