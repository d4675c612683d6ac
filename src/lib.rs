// src/lib.rs

//! Alert evaluation and notification engine for market indicators.
//!
//! A cycle fetches a [`types::MetricSnapshot`], classifies each reading
//! against its tier table, drops candidates still inside their cooldown
//! window, bundles co-occurring HIGH alerts into one escalation and sends
//! the rest over a [`services::ChatTransport`].

pub mod services;
pub mod types;
pub mod utils;

pub use services::alerts::{AlertEngine, DispatchReport, EngineConfig};
pub use types::{AlertCandidate, AlertType, MetricId, MetricReading, MetricSnapshot, Severity};
pub use utils::{AlertResult, SentinelError};
