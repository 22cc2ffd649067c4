use super::types::Symbol;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;

pub const DEFAULT_COOLDOWN_SECS: i64 = 300;

/// Per-symbol cool-down between alert attempts.
///
/// The clock starts at the attempt, not at a successful delivery, so a
/// channel outage never turns into a burst of alerts once it recovers.
#[derive(Debug, Clone)]
pub struct AlertThrottle {
    cooldown: ChronoDuration,
    last_attempt: HashMap<Symbol, DateTime<Utc>>,
}

impl Default for AlertThrottle {
    fn default() -> Self {
        Self::new(ChronoDuration::seconds(DEFAULT_COOLDOWN_SECS))
    }
}

impl AlertThrottle {
    /// A negative cooldown is treated as zero.
    pub fn new(cooldown: ChronoDuration) -> Self {
        Self {
            cooldown: cooldown.max(ChronoDuration::zero()),
            last_attempt: HashMap::new(),
        }
    }

    /// Does not mutate state.
    pub fn may_alert(&self, symbol: &Symbol, now: DateTime<Utc>) -> bool {
        match self.last_attempt.get(symbol) {
            None => true,
            Some(last) => now.signed_duration_since(*last) >= self.cooldown,
        }
    }

    pub fn record_attempt(&mut self, symbol: &Symbol, now: DateTime<Utc>) {
        self.last_attempt.insert(symbol.clone(), now);
    }

    pub fn last_attempt(&self, symbol: &Symbol) -> Option<DateTime<Utc>> {
        self.last_attempt.get(symbol).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 4, 9, 0, 0).unwrap()
    }

    #[test]
    fn first_attempt_passes() {
        let throttle = AlertThrottle::default();
        assert!(throttle.may_alert(&Symbol::from("BTC-USD"), t0()));
    }

    #[test]
    fn inside_cooldown_blocked() {
        let mut throttle = AlertThrottle::default();
        let btc = Symbol::from("BTC-USD");
        throttle.record_attempt(&btc, t0());
        assert!(!throttle.may_alert(&btc, t0() + ChronoDuration::seconds(120)));
        assert!(!throttle.may_alert(&btc, t0() + ChronoDuration::seconds(299)));
        assert_eq!(throttle.last_attempt(&btc), Some(t0()));
    }

    #[test]
    fn cooldown_boundary_passes() {
        let mut throttle = AlertThrottle::default();
        let btc = Symbol::from("BTC-USD");
        throttle.record_attempt(&btc, t0());
        assert!(throttle.may_alert(&btc, t0() + ChronoDuration::seconds(300)));
    }

    #[test]
    fn cooldown_is_per_symbol() {
        let mut throttle = AlertThrottle::default();
        let btc = Symbol::from("BTC-USD");
        let eth = Symbol::from("ETH-USD");
        throttle.record_attempt(&btc, t0());
        assert!(throttle.may_alert(&eth, t0()));
        assert!(!throttle.may_alert(&btc, t0()));
    }

    #[test]
    fn negative_cooldown_is_zero() {
        let mut throttle = AlertThrottle::new(ChronoDuration::seconds(-10));
        let btc = Symbol::from("BTC-USD");
        throttle.record_attempt(&btc, t0());
        assert!(throttle.may_alert(&btc, t0()));
    }
}
