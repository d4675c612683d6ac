// src/utils/mod.rs

pub mod error;
pub mod formatter;
pub mod logger;
pub mod time;

// Re-export commonly used items
pub use error::{AlertResult, ErrorDetails, ErrorKind, SentinelError, TransportError};
pub use formatter::*;
pub use logger::*;
pub use time::{Clock, ManualClock, SystemClock};
