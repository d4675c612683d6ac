// src/services/alerts/mod.rs

pub mod classifier;
pub mod cooldown;
pub mod dispatcher;
pub mod engine;
pub mod escalation;

pub use classifier::{Comparator, FamilyTiers, ThresholdClassifier, TierRule, DEFAULT_REGISTRY};
pub use cooldown::{CooldownStore, DEFAULT_COOLDOWN_CAPACITY, DEFAULT_COOLDOWN_MINUTES};
pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use engine::{AlertEngine, DispatchReport, EngineConfig};
pub use escalation::{high_severity_metrics, plan_notifications, EscalationBatch, Notification, NotificationKind};
