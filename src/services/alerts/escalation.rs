// src/services/alerts/escalation.rs

use crate::types::{AlertCandidate, MetricId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Co-occurring HIGH severity alerts from one cycle, delivered as one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationBatch {
    pub alerts: Vec<AlertCandidate>,
}

impl EscalationBatch {
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Single,
    Escalation,
}

/// A unit of delivery: one chat message.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Single(AlertCandidate),
    Escalation(EscalationBatch),
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::Single(_) => NotificationKind::Single,
            Notification::Escalation(_) => NotificationKind::Escalation,
        }
    }

    /// Constituent alerts, in classifier order.
    pub fn candidates(&self) -> &[AlertCandidate] {
        match self {
            Notification::Single(alert) => std::slice::from_ref(alert),
            Notification::Escalation(batch) => &batch.alerts,
        }
    }

    pub fn metrics(&self) -> Vec<MetricId> {
        self.candidates().iter().map(|alert| alert.metric).collect()
    }
}

/// Distinct metrics with a HIGH severity candidate.
pub fn high_severity_metrics(candidates: &[AlertCandidate]) -> BTreeSet<MetricId> {
    candidates
        .iter()
        .filter(|alert| alert.is_high_severity())
        .map(|alert| alert.metric)
        .collect()
}

/// Turn the alerts that passed the cooldown gate into notifications.
///
/// `cycle_high_metrics` counts distinct metrics that went HIGH this cycle
/// before cooldown filtering. When it is two or more, every passing HIGH
/// alert goes out in one escalation, placed first, even if only one of
/// them survived the gate. Everything else is delivered on its own.
/// Relative order of the input is preserved in both groups.
pub fn plan_notifications(
    candidates: Vec<AlertCandidate>,
    cycle_high_metrics: usize,
) -> Vec<Notification> {
    let passing_high = candidates.iter().any(AlertCandidate::is_high_severity);

    if cycle_high_metrics < 2 || !passing_high {
        return candidates.into_iter().map(Notification::Single).collect();
    }

    let (urgent, rest): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(AlertCandidate::is_high_severity);

    let mut plan = Vec::with_capacity(rest.len() + 1);
    plan.push(Notification::Escalation(EscalationBatch { alerts: urgent }));
    plan.extend(rest.into_iter().map(Notification::Single));
    plan
}
