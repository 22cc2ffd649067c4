//! Periodic price-variation monitor with per-symbol alert cool-down.

pub mod api;
pub mod config;
pub mod error;
pub mod monitor;
pub mod ui;

pub use config::MonitorSettings;
pub use error::{ConfigError, DeliveryError, DetectError, FetchError, MonitorError};
pub use monitor::{MonitorEngine, TickResult, VariationEvent};
