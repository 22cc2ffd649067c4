use crate::error::ConfigError;
use crate::monitor::throttle::DEFAULT_COOLDOWN_SECS;
use crate::monitor::types::{SamplingInterval, Symbol};
use chrono::Duration as ChronoDuration;
use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_SYMBOLS: [&str; 20] = [
    "BTC-USD", "ETH-USD", "ADA-USD", "XRP-USD", "DOGE-USD", "SOL-USD", "DOT-USD", "MATIC-USD",
    "LINK-USD", "UNI-USD", "AVAX-USD", "ATOM-USD", "LTC-USD", "BCH-USD", "XLM-USD", "ALGO-USD",
    "BNB-USD", "SHIB-USD", "TRX-USD", "ETC-USD",
];

pub const ALERT_HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub symbols: Vec<Symbol>,
    /// Percent, in (0, 100].
    pub threshold_pct: f64,
    pub interval: SamplingInterval,
    pub cooldown: Duration,
    /// Delay between the end of one tick and the start of the next.
    pub tick_period: Duration,
    pub fetch_timeout: Duration,
    pub delivery_timeout: Duration,
    pub fetch_concurrency: usize,
    pub enable_notifications: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| Symbol::from(*s)).collect(),
            threshold_pct: 5.0,
            interval: SamplingInterval::M5,
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS as u64),
            tick_period: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(15),
            delivery_timeout: Duration::from_secs(10),
            fetch_concurrency: 4,
            enable_notifications: true,
        }
    }
}

impl MonitorSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_threshold(self.threshold_pct)?;

        if self.symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            let s = symbol.as_str();
            if s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '/') {
                return Err(ConfigError::InvalidSymbol(s.to_string()));
            }
            if !seen.insert(symbol) {
                return Err(ConfigError::DuplicateSymbol(s.to_string()));
            }
        }

        self.cooldown_duration()?;
        if self.tick_period.is_zero() {
            return Err(ConfigError::ZeroDuration("tick period"));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("fetch timeout"));
        }
        if self.delivery_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("delivery timeout"));
        }
        if self.fetch_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    /// The cool-down as a signed chrono duration.
    pub fn cooldown_duration(&self) -> Result<ChronoDuration, ConfigError> {
        if self.cooldown.is_zero() {
            return Err(ConfigError::ZeroDuration("cooldown"));
        }
        ChronoDuration::from_std(self.cooldown)
            .map_err(|_| ConfigError::DurationOutOfRange("cooldown"))
    }
}

pub fn validate_threshold(threshold_pct: f64) -> Result<(), ConfigError> {
    if threshold_pct > 0.0 && threshold_pct <= 100.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold(threshold_pct))
    }
}

/// Parses a comma separated symbol list, trimming and upper-casing entries.
pub fn parse_symbols(list: &str) -> Vec<Symbol> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Symbol::new(s.to_uppercase()))
        .collect()
}

/// Channel credentials. Injected from the environment, never compiled in.
#[derive(Clone)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramCredentials {
    pub fn from_parts(
        bot_token: Option<String>,
        chat_id: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bot_token = bot_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("TELEGRAM_BOT_TOKEN"))?;
        let chat_id = chat_id
            .filter(|c| !c.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("TELEGRAM_CHAT_ID"))?;
        Ok(Self { bot_token, chat_id })
    }
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}
