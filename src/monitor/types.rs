use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Identifier of a tradable instrument, e.g. `BTC-USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Time-ascending samples of one symbol over one tick's window.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: Symbol,
    pub samples: Vec<PriceSample>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, samples: Vec<PriceSample>) -> Self {
        Self { symbol, samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&PriceSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&PriceSample> {
        self.samples.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingInterval {
    M1,
    M5,
    M15,
    M30,
    H1,
}

impl SamplingInterval {
    pub const ALL: [SamplingInterval; 5] = [
        SamplingInterval::M1,
        SamplingInterval::M5,
        SamplingInterval::M15,
        SamplingInterval::M30,
        SamplingInterval::H1,
    ];

    pub fn as_secs(&self) -> i64 {
        match self {
            SamplingInterval::M1 => 60,
            SamplingInterval::M5 => 300,
            SamplingInterval::M15 => 900,
            SamplingInterval::M30 => 1800,
            SamplingInterval::H1 => 3600,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingInterval::M1 => "1m",
            SamplingInterval::M5 => "5m",
            SamplingInterval::M15 => "15m",
            SamplingInterval::M30 => "30m",
            SamplingInterval::H1 => "1h",
        }
    }
}

impl fmt::Display for SamplingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingInterval {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|interval| interval.as_str() == wanted)
            .ok_or_else(|| ConfigError::InvalidInterval(s.to_string()))
    }
}

/// A threshold crossing observed in one symbol's window.
#[derive(Debug, Clone, PartialEq)]
pub struct VariationEvent {
    pub symbol: Symbol,
    pub initial_price: f64,
    pub current_price: f64,
    pub variation_pct: f64,
    pub window_start_time: DateTime<Utc>,
    pub window_end_time: DateTime<Utc>,
    pub detected_at: DateTime<Utc>,
}

/// Outcome of one tick, in the engine's symbol order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickResult {
    pub alerts: Vec<VariationEvent>,
    pub failed_symbols: Vec<Symbol>,
    /// Alerts accepted by the notification channel.
    pub delivered: Vec<Symbol>,
    /// Alerts whose delivery failed or timed out.
    pub undelivered: Vec<Symbol>,
}

impl TickResult {
    pub fn is_quiet(&self) -> bool {
        self.alerts.is_empty() && self.failed_symbols.is_empty()
    }

    pub fn delivered_events(&self) -> impl Iterator<Item = &VariationEvent> {
        self.alerts
            .iter()
            .filter(move |event| self.delivered.contains(&event.symbol))
    }
}
