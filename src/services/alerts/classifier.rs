// src/services/alerts/classifier.rs

//! Threshold classification.
//!
//! Every metric family is a row in a static registry: an ordered list of
//! tier rules, most severe first. Classification walks the list and stops at
//! the first rule whose boundary is crossed, so a metric yields at most one
//! candidate per cycle.

use crate::types::{AlertCandidate, AlertType, MetricId, Severity, ThresholdSet};
use crate::utils::format_metric_value;
use chrono::{DateTime, Utc};

/// How a value is compared against a tier boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// value >= boundary (higher is worse)
    AtLeast,
    /// value <= boundary (lower is worse)
    AtMost,
    /// value > boundary
    Above,
}

impl Comparator {
    pub fn matches(self, value: f64, boundary: f64) -> bool {
        match self {
            Comparator::AtLeast => value >= boundary,
            Comparator::AtMost => value <= boundary,
            Comparator::Above => value > boundary,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::AtLeast => ">=",
            Comparator::AtMost => "<=",
            Comparator::Above => ">",
        }
    }
}

/// One tier of a metric family. `headline` may contain `{value}`.
#[derive(Debug, Clone, Copy)]
pub struct TierRule {
    pub threshold_key: &'static str,
    /// Boundary used when the threshold set has no entry for `threshold_key`.
    pub default_boundary: Option<f64>,
    pub comparator: Comparator,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub emoji: &'static str,
    pub headline: &'static str,
    pub recommendation: &'static str,
}

impl TierRule {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        threshold_key: &'static str,
        comparator: Comparator,
        alert_type: AlertType,
        severity: Severity,
        emoji: &'static str,
        headline: &'static str,
        recommendation: &'static str,
    ) -> Self {
        Self {
            threshold_key,
            default_boundary: None,
            comparator,
            alert_type,
            severity,
            emoji,
            headline,
            recommendation,
        }
    }

    pub const fn or_default(mut self, boundary: f64) -> Self {
        self.default_boundary = Some(boundary);
        self
    }

    fn boundary(&self, thresholds: &ThresholdSet) -> Option<f64> {
        thresholds.get(self.threshold_key).or(self.default_boundary)
    }
}

/// Registry row: a metric family and its ordered tiers.
#[derive(Debug, Clone, Copy)]
pub struct FamilyTiers {
    pub metric: MetricId,
    pub tiers: &'static [TierRule],
}

use self::Comparator::{Above, AtLeast, AtMost};
use crate::types::AlertType as A;
use crate::types::Severity::{High, Low, Medium};

#[rustfmt::skip]
const VIX_TIERS: &[TierRule] = &[
    TierRule::new("panic", AtLeast, A::PanicBuyingOpportunity, High, "🔴⚫",
        "MAXIMUM CRASH BUYING OPPORTUNITY: VIX at {value}",
        "Deploy the remaining cash reserve into quality assets now"),
    TierRule::new("danger", AtLeast, A::CrashMode, High, "🔴",
        "RED ALERT: VIX at {value}, full crash mode",
        "Deploy remaining cash aggressively, 25% per week over 4 weeks"),
    TierRule::new("warning", AtLeast, A::EarlyCrash, Medium, "🟠",
        "ORANGE ALERT: VIX at {value}, early crash phase",
        "Deploy the first 25% of cash into broad quality ETFs"),
    TierRule::new("elevated", AtLeast, A::ElevatedVolatility, Low, "🟡",
        "YELLOW ALERT: VIX at {value}, volatility rising",
        "Prepare a buy list and check the market more often")
        .or_default(15.0),
];

#[rustfmt::skip]
const VIX_TERM_STRUCTURE_TIERS: &[TierRule] = &[TierRule::new(
    "backwardation", Above, A::VixBackwardation, High, "⚠️",
    "VIX BACKWARDATION: front month {value} points above 3-month VIX",
    "Backwardation tends to precede crashes by 1-4 weeks, get ready",
)];

#[rustfmt::skip]
const CAPE_TIERS: &[TierRule] = &[
    TierRule::new("bubble", AtLeast, A::ExtremeBubble, Medium, "💰",
        "EXTREME BUBBLE: CAPE at {value}",
        "Hold a maximum cash position and wait for the reset"),
    TierRule::new("overvalued", AtLeast, A::BubbleTerritory, Low, "📈",
        "BUBBLE TERRITORY: CAPE at {value}",
        "Trim risk positions and keep cash levels high"),
];

#[rustfmt::skip]
const MARGIN_DEBT_TIERS: &[TierRule] = &[TierRule::new(
    "decline", AtMost, A::MarginDeleveraging, Medium, "📉",
    "MARGIN DELEVERAGING: margin debt {value} month over month",
    "Forced selling is underway, watch for capitulation signals",
)];

#[rustfmt::skip]
const MCCLELLAN_TIERS: &[TierRule] = &[
    TierRule::new("capitulation", AtMost, A::Capitulation, High, "🔥",
        "CAPITULATION: McClellan Oscillator at {value}",
        "Deploy all remaining cash"),
    TierRule::new("oversold", AtMost, A::OversoldBreadth, Medium, "📉",
        "SEVERE OVERSOLD BREADTH: McClellan Oscillator at {value}",
        "Deploy the first 25% of cash reserves"),
];

#[rustfmt::skip]
const PUT_CALL_TIERS: &[TierRule] = &[
    TierRule::new("extreme", AtLeast, A::MaximumPessimism, High, "🎯",
        "MAXIMUM PESSIMISM: Put/Call at {value}",
        "Deploy all remaining reserves"),
    TierRule::new("panic", AtLeast, A::PanicSelling, High, "💥",
        "PANIC SELLING: Put/Call at {value}",
        "Deploy 50% of remaining cash reserves"),
    TierRule::new("fear", AtLeast, A::FearBuilding, Medium, "😰",
        "FEAR BUILDING: Put/Call at {value}",
        "Ready cash for deployment and monitor closely"),
];

#[rustfmt::skip]
const RSI_TIERS: &[TierRule] = &[
    TierRule::new("extreme", AtMost, A::ExtremeOversoldRsi, High, "⚡",
        "EXTREME OVERSOLD: S&P RSI at {value}",
        "Deploy 50% of cash reserves"),
    TierRule::new("oversold", AtMost, A::OversoldRsi, Medium, "📊",
        "OVERSOLD: S&P RSI at {value}",
        "Deploy 25% of cash reserves"),
];

#[rustfmt::skip]
const HIGH_LOW_TIERS: &[TierRule] = &[
    TierRule::new("capitulation", AtMost, A::HighLowCapitulation, High, "🏁",
        "CAPITULATION: High-Low Index at {value}",
        "Deploy all remaining cash"),
    TierRule::new("weakness", AtMost, A::BroadWeakness, Medium, "📉",
        "BROAD WEAKNESS: High-Low Index at {value}",
        "Ready cash for deployment"),
];

#[rustfmt::skip]
const FEAR_GREED_TIERS: &[TierRule] = &[
    TierRule::new("fear", AtMost, A::ExtremeFear, High, "😱",
        "EXTREME FEAR: Fear & Greed at {value}",
        "Deploy maximum cash while others sell in panic"),
    TierRule::new("greed", AtLeast, A::ExtremeGreed, Medium, "🤑",
        "EXTREME GREED: Fear & Greed at {value}",
        "Hold cash and avoid chasing"),
];

#[rustfmt::skip]
const AAII_BULLS_TIERS: &[TierRule] = &[TierRule::new(
    "danger", AtLeast, A::ExcessiveBullishness, Medium, "🐂",
    "EXCESSIVE BULLISHNESS: AAII Bulls at {value}",
    "Too much optimism, stay defensive",
)];

#[rustfmt::skip]
const AAII_BEARS_TIERS: &[TierRule] = &[
    TierRule::new("major", AtLeast, A::MajorBuyingOpportunity, High, "🐻",
        "MAJOR OPPORTUNITY: AAII Bears at {value}",
        "Deploy a significant share of cash"),
    TierRule::new("opportunity", AtLeast, A::BuyingOpportunity, Medium, "🎪",
        "BUYING OPPORTUNITY: AAII Bears at {value}",
        "Start building positions"),
];

#[rustfmt::skip]
const INSIDER_TIERS: &[TierRule] = &[
    TierRule::new("strong", AtLeast, A::StrongInsiderBuying, High, "👔",
        "STRONG INSIDER BUYING: Buy/Sell ratio at {value}",
        "Insiders are buying heavily, follow their lead"),
    TierRule::new("bullish", AtLeast, A::InsiderBuying, Medium, "💼",
        "INSIDER BUYING: Buy/Sell ratio at {value}",
        "Corporate insiders are net buyers"),
];

#[rustfmt::skip]
const YIELD_SPREAD_TIERS: &[TierRule] = &[
    TierRule::new("recession", AtMost, A::DeepInversion, High, "📉",
        "DEEP YIELD CURVE INVERSION: spread at {value}",
        "Prepare for recession and the buying window that follows"),
    TierRule::new("inversion", AtMost, A::YieldInversion, Medium, "⚠️",
        "YIELD CURVE INVERSION: spread at {value}",
        "Recessions typically follow within 6-18 months"),
];

#[rustfmt::skip]
const CREDIT_SPREAD_TIERS: &[TierRule] = &[
    TierRule::new("crisis", AtLeast, A::CreditCrisis, High, "🏦",
        "CREDIT CRISIS: spreads at {value}",
        "Credit crises create bargains, prepare to buy"),
    TierRule::new("stress", AtLeast, A::CreditStress, Medium, "💳",
        "CREDIT STRESS: spreads at {value}",
        "Watch credit markets closely"),
];

#[rustfmt::skip]
const DOLLAR_TIERS: &[TierRule] = &[
    TierRule::new("strong", AtLeast, A::ExtremeDollarStrength, Medium, "💵",
        "EXTREME DOLLAR STRENGTH: DXY at {value}",
        "Avoid emerging markets, favour US assets"),
    TierRule::new("weak", AtMost, A::DollarWeakness, Low, "🌍",
        "DOLLAR WEAKNESS: DXY at {value}",
        "Emerging markets look attractive"),
];

#[rustfmt::skip]
const SEMI_ETF_TIERS: &[TierRule] = &[
    TierRule::new("opportunity", AtMost, A::AiBubbleOpportunity, High, "🤖",
        "AI CRASH OPPORTUNITY: semiconductor ETF {value}",
        "Buy quality tech at a discount"),
    TierRule::new("correction", AtMost, A::AiCorrection, Medium, "🔧",
        "AI CORRECTION: semiconductor ETF {value}",
        "Sector is correcting, prepare a buy list"),
];

/// Default registry. `nvdaPE` is deliberately absent: it is tracked but never alerts.
#[rustfmt::skip]
pub static DEFAULT_REGISTRY: &[FamilyTiers] = &[
    FamilyTiers { metric: MetricId::Vix, tiers: VIX_TIERS },
    FamilyTiers { metric: MetricId::VixTermStructure, tiers: VIX_TERM_STRUCTURE_TIERS },
    FamilyTiers { metric: MetricId::Cape, tiers: CAPE_TIERS },
    FamilyTiers { metric: MetricId::MarginDebt, tiers: MARGIN_DEBT_TIERS },
    FamilyTiers { metric: MetricId::McclellanOscillator, tiers: MCCLELLAN_TIERS },
    FamilyTiers { metric: MetricId::PutCallRatio, tiers: PUT_CALL_TIERS },
    FamilyTiers { metric: MetricId::SpyRsi, tiers: RSI_TIERS },
    FamilyTiers { metric: MetricId::HighLowIndex, tiers: HIGH_LOW_TIERS },
    FamilyTiers { metric: MetricId::FearGreedIndex, tiers: FEAR_GREED_TIERS },
    FamilyTiers { metric: MetricId::AaiiBulls, tiers: AAII_BULLS_TIERS },
    FamilyTiers { metric: MetricId::AaiiBears, tiers: AAII_BEARS_TIERS },
    FamilyTiers { metric: MetricId::InsiderRatio, tiers: INSIDER_TIERS },
    FamilyTiers { metric: MetricId::YieldSpread, tiers: YIELD_SPREAD_TIERS },
    FamilyTiers { metric: MetricId::CreditSpreads, tiers: CREDIT_SPREAD_TIERS },
    FamilyTiers { metric: MetricId::DollarIndex, tiers: DOLLAR_TIERS },
    FamilyTiers { metric: MetricId::SemiEtf, tiers: SEMI_ETF_TIERS },
];

/// Pure classifier over a tier registry.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdClassifier {
    registry: &'static [FamilyTiers],
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY)
    }
}

impl ThresholdClassifier {
    /// Tables are borrowed for `'static`, so a custom registry is declared
    /// the same way as [`DEFAULT_REGISTRY`]: a `static` slice of
    /// [`FamilyTiers`] built from `const` [`TierRule`] rows.
    pub fn new(registry: &'static [FamilyTiers]) -> Self {
        Self { registry }
    }

    pub fn tiers_for(&self, metric: MetricId) -> &'static [TierRule] {
        self.registry
            .iter()
            .find(|family| family.metric == metric)
            .map(|family| family.tiers)
            .unwrap_or(&[])
    }

    /// Classify one reading. Returns zero or one candidate.
    ///
    /// Missing thresholds, non-finite values and unregistered families all
    /// produce an empty list rather than an error.
    pub fn classify(
        &self,
        metric: MetricId,
        value: f64,
        thresholds: Option<&ThresholdSet>,
        generated_at: DateTime<Utc>,
    ) -> Vec<AlertCandidate> {
        let thresholds = match thresholds {
            Some(set) if !set.is_empty() => set,
            _ => {
                log::debug!("{}: no thresholds configured, skipping", metric);
                return Vec::new();
            }
        };

        if !value.is_finite() {
            log::debug!("{}: non-finite value {}, skipping", metric, value);
            return Vec::new();
        }

        let matched = self.tiers_for(metric).iter().find_map(|tier| {
            let boundary = tier.boundary(thresholds)?;
            tier.comparator
                .matches(value, boundary)
                .then_some((tier, boundary))
        });

        match matched {
            Some((tier, boundary)) => {
                log::debug!(
                    "{}: {} {} {} -> {}",
                    metric,
                    value,
                    tier.comparator.symbol(),
                    boundary,
                    tier.alert_type
                );
                vec![build_candidate(metric, value, boundary, tier, generated_at)]
            }
            None => Vec::new(),
        }
    }
}

fn build_candidate(
    metric: MetricId,
    value: f64,
    boundary: f64,
    tier: &TierRule,
    generated_at: DateTime<Utc>,
) -> AlertCandidate {
    let rendered = format_metric_value(value, metric.value_format());
    AlertCandidate {
        metric,
        alert_type: tier.alert_type,
        severity: tier.severity,
        message: tier.headline.replace("{value}", &rendered),
        recommendation: tier.recommendation.to_string(),
        emoji: tier.emoji.to_string(),
        value,
        threshold: boundary,
        generated_at,
    }
}
