pub mod detector;
pub mod engine;
pub mod message;
pub mod throttle;
pub mod types;

pub use engine::MonitorEngine;
pub use throttle::AlertThrottle;
pub use types::{PriceSample, PriceSeries, SamplingInterval, Symbol, TickResult, VariationEvent};
