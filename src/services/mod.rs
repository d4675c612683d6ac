// src/services/mod.rs

pub mod alerts;
pub mod history;
pub mod market_data;
pub mod market_status;
pub mod telegram;

// Re-export commonly used services
pub use alerts::{AlertEngine, DispatchReport, EngineConfig};
pub use history::{AlertHistoryStore, InMemoryAlertHistory};
pub use market_data::{MarketDataProvider, StaticMarketData};
pub use market_status::{AlertLevel, MarketStatus};
pub use telegram::{ChatTransport, RetryConfig, SendOptions, TelegramConfig, TelegramTransport};
