// src/types.rs

use crate::utils::SentinelError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============= METRICS =============

/// Market indicators the engine knows how to judge.
///
/// Declaration order is the evaluation order of a cycle, so it also fixes the
/// order of alerts inside an escalation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricId {
    #[serde(rename = "vix")]
    Vix,
    #[serde(rename = "vixTermStructure")]
    VixTermStructure,
    #[serde(rename = "cape")]
    Cape,
    #[serde(rename = "marginDebt")]
    MarginDebt,
    #[serde(rename = "mcclellanOscillator")]
    McclellanOscillator,
    #[serde(rename = "putCallRatio")]
    PutCallRatio,
    #[serde(rename = "spyRsi")]
    SpyRsi,
    #[serde(rename = "highLowIndex")]
    HighLowIndex,
    #[serde(rename = "fearGreedIndex")]
    FearGreedIndex,
    #[serde(rename = "aaiiBulls")]
    AaiiBulls,
    #[serde(rename = "aaiiBears")]
    AaiiBears,
    #[serde(rename = "insiderRatio")]
    InsiderRatio,
    #[serde(rename = "yieldSpread")]
    YieldSpread,
    #[serde(rename = "creditSpreads")]
    CreditSpreads,
    #[serde(rename = "dollarIndex")]
    DollarIndex,
    #[serde(rename = "nvdaPE")]
    NvdaPe,
    #[serde(rename = "semiETF")]
    SemiEtf,
}

impl MetricId {
    pub const ALL: [MetricId; 17] = [
        MetricId::Vix,
        MetricId::VixTermStructure,
        MetricId::Cape,
        MetricId::MarginDebt,
        MetricId::McclellanOscillator,
        MetricId::PutCallRatio,
        MetricId::SpyRsi,
        MetricId::HighLowIndex,
        MetricId::FearGreedIndex,
        MetricId::AaiiBulls,
        MetricId::AaiiBears,
        MetricId::InsiderRatio,
        MetricId::YieldSpread,
        MetricId::CreditSpreads,
        MetricId::DollarIndex,
        MetricId::NvdaPe,
        MetricId::SemiEtf,
    ];

    /// Key used by the market-data provider.
    pub fn key(&self) -> &'static str {
        match self {
            MetricId::Vix => "vix",
            MetricId::VixTermStructure => "vixTermStructure",
            MetricId::Cape => "cape",
            MetricId::MarginDebt => "marginDebt",
            MetricId::McclellanOscillator => "mcclellanOscillator",
            MetricId::PutCallRatio => "putCallRatio",
            MetricId::SpyRsi => "spyRsi",
            MetricId::HighLowIndex => "highLowIndex",
            MetricId::FearGreedIndex => "fearGreedIndex",
            MetricId::AaiiBulls => "aaiiBulls",
            MetricId::AaiiBears => "aaiiBears",
            MetricId::InsiderRatio => "insiderRatio",
            MetricId::YieldSpread => "yieldSpread",
            MetricId::CreditSpreads => "creditSpreads",
            MetricId::DollarIndex => "dollarIndex",
            MetricId::NvdaPe => "nvdaPE",
            MetricId::SemiEtf => "semiETF",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MetricId::Vix => "VIX",
            MetricId::VixTermStructure => "VIX Term Structure",
            MetricId::Cape => "Shiller CAPE",
            MetricId::MarginDebt => "Margin Debt",
            MetricId::McclellanOscillator => "McClellan Oscillator",
            MetricId::PutCallRatio => "Put/Call Ratio",
            MetricId::SpyRsi => "S&P 500 RSI",
            MetricId::HighLowIndex => "High-Low Index",
            MetricId::FearGreedIndex => "CNN Fear & Greed",
            MetricId::AaiiBulls => "AAII Bulls %",
            MetricId::AaiiBears => "AAII Bears %",
            MetricId::InsiderRatio => "Insider Buy/Sell Ratio",
            MetricId::YieldSpread => "10Y-2Y Spread",
            MetricId::CreditSpreads => "Credit Spreads",
            MetricId::DollarIndex => "DXY",
            MetricId::NvdaPe => "NVIDIA P/E",
            MetricId::SemiEtf => "Semiconductor ETF",
        }
    }

    pub fn value_format(&self) -> ValueFormat {
        match self {
            MetricId::McclellanOscillator | MetricId::FearGreedIndex => ValueFormat::Decimals(0),
            MetricId::PutCallRatio | MetricId::HighLowIndex => ValueFormat::Decimals(2),
            MetricId::AaiiBulls | MetricId::AaiiBears => ValueFormat::Percent(1),
            MetricId::YieldSpread => ValueFormat::Percent(2),
            MetricId::CreditSpreads => ValueFormat::BasisPoints,
            MetricId::MarginDebt | MetricId::SemiEtf => ValueFormat::PercentChange,
            _ => ValueFormat::Decimals(1),
        }
    }

    /// Threshold configuration shipped with the market-data provider.
    pub fn default_thresholds(&self) -> ThresholdSet {
        let pairs: &[(&str, f64)] = match self {
            MetricId::Vix => &[("warning", 20.0), ("danger", 30.0), ("panic", 40.0)],
            MetricId::VixTermStructure => &[("backwardation", 0.0)],
            MetricId::Cape => &[("overvalued", 25.0), ("bubble", 35.0)],
            MetricId::MarginDebt => &[("decline", -0.15)],
            MetricId::McclellanOscillator => &[("oversold", -100.0), ("capitulation", -150.0)],
            MetricId::PutCallRatio => &[("fear", 1.0), ("panic", 1.5), ("extreme", 2.0)],
            MetricId::SpyRsi => &[("oversold", 30.0), ("extreme", 20.0)],
            MetricId::HighLowIndex => &[("weakness", -0.5), ("capitulation", -0.8)],
            MetricId::FearGreedIndex => &[("fear", 20.0), ("greed", 80.0)],
            MetricId::AaiiBulls => &[("danger", 55.0), ("opportunity", 20.0)],
            MetricId::AaiiBears => &[("opportunity", 50.0), ("major", 60.0)],
            MetricId::InsiderRatio => &[("bullish", 2.0), ("strong", 3.0)],
            MetricId::YieldSpread => &[("inversion", 0.0), ("recession", -0.5)],
            MetricId::CreditSpreads => &[("stress", 200.0), ("crisis", 300.0)],
            MetricId::DollarIndex => &[("strong", 110.0), ("weak", 95.0)],
            MetricId::NvdaPe => &[("decline", -0.5)],
            MetricId::SemiEtf => &[("correction", -0.2), ("opportunity", -0.4)],
        };
        pairs.iter().copied().collect()
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetricId {
    type Err = SentinelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricId::ALL
            .iter()
            .copied()
            .find(|metric| metric.key() == s)
            .ok_or_else(|| SentinelError::validation_error(format!("Unknown metric: {}", s)))
    }
}

/// How a metric's value is rendered in notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Decimals(u8),
    /// Value is already a percentage.
    Percent(u8),
    BasisPoints,
    /// Value is a fractional change, e.g. -0.2 for a 20% drop.
    PercentChange,
}

// ============= SEVERITY & ALERT TYPES =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟡",
            Severity::Medium => "🟠",
            Severity::High => "🔴",
        }
    }

    /// Minimum gap between two notifications of the same alert key.
    pub fn cooldown_window(&self, base: Duration) -> Duration {
        match self {
            Severity::High => base / 2,
            Severity::Medium => base,
            Severity::Low => base.checked_add(&base).unwrap_or_else(Duration::max_value),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    // VIX
    PanicBuyingOpportunity,
    CrashMode,
    EarlyCrash,
    ElevatedVolatility,
    VixBackwardation,
    // Valuation
    ExtremeBubble,
    BubbleTerritory,
    MarginDeleveraging,
    // Breadth & momentum
    Capitulation,
    OversoldBreadth,
    ExtremeOversoldRsi,
    OversoldRsi,
    HighLowCapitulation,
    BroadWeakness,
    // Sentiment
    MaximumPessimism,
    PanicSelling,
    FearBuilding,
    ExtremeFear,
    ExtremeGreed,
    ExcessiveBullishness,
    MajorBuyingOpportunity,
    BuyingOpportunity,
    StrongInsiderBuying,
    InsiderBuying,
    // Macro
    DeepInversion,
    YieldInversion,
    CreditCrisis,
    CreditStress,
    ExtremeDollarStrength,
    DollarWeakness,
    // Sector
    AiBubbleOpportunity,
    AiCorrection,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::PanicBuyingOpportunity => "PANIC_BUYING_OPPORTUNITY",
            AlertType::CrashMode => "CRASH_MODE",
            AlertType::EarlyCrash => "EARLY_CRASH",
            AlertType::ElevatedVolatility => "ELEVATED_VOLATILITY",
            AlertType::VixBackwardation => "VIX_BACKWARDATION",
            AlertType::ExtremeBubble => "EXTREME_BUBBLE",
            AlertType::BubbleTerritory => "BUBBLE_TERRITORY",
            AlertType::MarginDeleveraging => "MARGIN_DELEVERAGING",
            AlertType::Capitulation => "CAPITULATION",
            AlertType::OversoldBreadth => "OVERSOLD_BREADTH",
            AlertType::ExtremeOversoldRsi => "EXTREME_OVERSOLD_RSI",
            AlertType::OversoldRsi => "OVERSOLD_RSI",
            AlertType::HighLowCapitulation => "HIGH_LOW_CAPITULATION",
            AlertType::BroadWeakness => "BROAD_WEAKNESS",
            AlertType::MaximumPessimism => "MAXIMUM_PESSIMISM",
            AlertType::PanicSelling => "PANIC_SELLING",
            AlertType::FearBuilding => "FEAR_BUILDING",
            AlertType::ExtremeFear => "EXTREME_FEAR",
            AlertType::ExtremeGreed => "EXTREME_GREED",
            AlertType::ExcessiveBullishness => "EXCESSIVE_BULLISHNESS",
            AlertType::MajorBuyingOpportunity => "MAJOR_BUYING_OPPORTUNITY",
            AlertType::BuyingOpportunity => "BUYING_OPPORTUNITY",
            AlertType::StrongInsiderBuying => "STRONG_INSIDER_BUYING",
            AlertType::InsiderBuying => "INSIDER_BUYING",
            AlertType::DeepInversion => "DEEP_INVERSION",
            AlertType::YieldInversion => "YIELD_INVERSION",
            AlertType::CreditCrisis => "CREDIT_CRISIS",
            AlertType::CreditStress => "CREDIT_STRESS",
            AlertType::ExtremeDollarStrength => "EXTREME_DOLLAR_STRENGTH",
            AlertType::DollarWeakness => "DOLLAR_WEAKNESS",
            AlertType::AiBubbleOpportunity => "AI_BUBBLE_OPPORTUNITY",
            AlertType::AiCorrection => "AI_CORRECTION",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= READINGS & SNAPSHOTS =============

/// Named tier boundaries for one metric, e.g. {warning: 20, danger: 30, panic: 40}.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdSet(BTreeMap<String, f64>);

impl ThresholdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, boundary: f64) -> Self {
        self.0.insert(name.to_string(), boundary);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'a> FromIterator<(&'a str, f64)> for ThresholdSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, boundary)| (name.to_string(), boundary))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdSet>,
}

impl MetricReading {
    pub fn new(value: f64, thresholds: ThresholdSet) -> Self {
        Self {
            value: Some(value),
            error: None,
            thresholds: Some(thresholds),
        }
    }

    /// Reading carrying the provider's shipped thresholds for `metric`.
    pub fn with_default_thresholds(metric: MetricId, value: f64) -> Self {
        Self::new(value, metric.default_thresholds())
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            value: None,
            error: Some(error.into()),
            thresholds: None,
        }
    }

    /// The value, unless the reading is flagged or not a finite number.
    pub fn usable_value(&self) -> Option<f64> {
        if self.error.is_some() {
            return None;
        }
        self.value.filter(|v| v.is_finite())
    }
}

/// One evaluation cycle's worth of readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub taken_at: DateTime<Utc>,
    pub metrics: BTreeMap<MetricId, MetricReading>,
}

impl MetricSnapshot {
    pub fn new(taken_at: DateTime<Utc>) -> Self {
        Self {
            taken_at,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_reading(mut self, metric: MetricId, reading: MetricReading) -> Self {
        self.metrics.insert(metric, reading);
        self
    }

    pub fn insert(&mut self, metric: MetricId, reading: MetricReading) {
        self.metrics.insert(metric, reading);
    }

    pub fn get(&self, metric: MetricId) -> Option<&MetricReading> {
        self.metrics.get(&metric)
    }

    pub fn value_of(&self, metric: MetricId) -> Option<f64> {
        self.get(metric).and_then(MetricReading::usable_value)
    }
}

// ============= ALERTS =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CooldownKey {
    pub metric: MetricId,
    pub alert_type: AlertType,
}

impl fmt::Display for CooldownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.metric, self.alert_type)
    }
}

/// A classified threshold crossing, produced fresh every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCandidate {
    pub metric: MetricId,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
    pub emoji: String,
    pub value: f64,
    /// Tier boundary that was crossed.
    pub threshold: f64,
    pub generated_at: DateTime<Utc>,
}

impl AlertCandidate {
    pub fn cooldown_key(&self) -> CooldownKey {
        CooldownKey {
            metric: self.metric,
            alert_type: self.alert_type,
        }
    }

    pub fn is_high_severity(&self) -> bool {
        self.severity == Severity::High
    }
}

/// Audit row written to the history store after a delivery attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: String,
    pub metric: MetricId,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub threshold_value: f64,
    pub current_value: f64,
    pub message: String,
    pub sent: bool,
    pub recorded_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn from_candidate(candidate: &AlertCandidate, sent: bool, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: format!("alert_{}", uuid::Uuid::new_v4()),
            metric: candidate.metric,
            alert_type: candidate.alert_type,
            severity: candidate.severity,
            threshold_value: candidate.threshold,
            current_value: candidate.value,
            message: candidate.message.clone(),
            sent,
            recorded_at,
        }
    }
}
