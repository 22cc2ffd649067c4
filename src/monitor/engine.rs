use super::detector;
use super::message::render_alert;
use super::throttle::AlertThrottle;
use super::types::{PriceSeries, SamplingInterval, Symbol, TickResult, VariationEvent};
use crate::api::{MessageFormat, NotificationSink, PriceSource};
use crate::config::{validate_threshold, MonitorSettings};
use crate::error::{ConfigError, DeliveryError, FetchError, MonitorError};
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Runs one evaluation cycle over the configured symbols per call.
///
/// The only state carried between ticks is the [`AlertThrottle`]; `run_tick`
/// takes `&mut self`, so two ticks can never overlap.
pub struct MonitorEngine {
    symbols: Vec<Symbol>,
    source: Arc<dyn PriceSource>,
    notifier: Option<Arc<dyn NotificationSink>>,
    throttle: AlertThrottle,
    fetch_timeout: Duration,
    delivery_timeout: Duration,
    fetch_concurrency: usize,
}

impl MonitorEngine {
    /// Builds an engine without contacting the notification channel.
    ///
    /// `notifier` is ignored when `settings.enable_notifications` is false.
    pub fn new(
        settings: &MonitorSettings,
        source: Arc<dyn PriceSource>,
        notifier: Option<Arc<dyn NotificationSink>>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        let cooldown = settings.cooldown_duration()?;

        Ok(Self {
            symbols: settings.symbols.clone(),
            source,
            notifier: notifier.filter(|_| settings.enable_notifications),
            throttle: AlertThrottle::new(cooldown),
            fetch_timeout: settings.fetch_timeout,
            delivery_timeout: settings.delivery_timeout,
            fetch_concurrency: settings.fetch_concurrency,
        })
    }

    /// Builds an engine and runs the notification channel self-test.
    ///
    /// A failing self-test is returned as [`MonitorError::SelfTest`]; callers
    /// that can live without notifications rebuild with `notifier = None`.
    pub async fn start(
        settings: &MonitorSettings,
        source: Arc<dyn PriceSource>,
        notifier: Option<Arc<dyn NotificationSink>>,
    ) -> Result<Self, MonitorError> {
        let engine = Self::new(settings, source, notifier)?;

        if let Some(notifier) = &engine.notifier {
            match timeout(engine.delivery_timeout, notifier.self_test()).await {
                Ok(Ok(())) => info!("Notification channel self-test passed"),
                Ok(Err(e)) => return Err(MonitorError::SelfTest(e)),
                Err(_) => {
                    return Err(MonitorError::SelfTest(DeliveryError::Timeout(
                        engine.delivery_timeout,
                    )))
                }
            }
        }

        Ok(engine)
    }

    pub fn throttle(&self) -> &AlertThrottle {
        &self.throttle
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// Runs one tick. An out-of-range threshold is rejected before anything
    /// is fetched or throttled.
    pub async fn run_tick(
        &mut self,
        threshold_pct: f64,
        interval: SamplingInterval,
    ) -> Result<TickResult, ConfigError> {
        self.run_tick_at(threshold_pct, interval, Utc::now()).await
    }

    /// Same as [`run_tick`](Self::run_tick) with an explicit clock reading.
    pub async fn run_tick_at(
        &mut self,
        threshold_pct: f64,
        interval: SamplingInterval,
        now: DateTime<Utc>,
    ) -> Result<TickResult, ConfigError> {
        validate_threshold(threshold_pct)?;
        let mut result = TickResult::default();

        // Symbols still cooling down are not fetched at all.
        let eligible: Vec<Symbol> = self
            .symbols
            .iter()
            .filter(|symbol| {
                let allowed = self.throttle.may_alert(symbol, now);
                if !allowed {
                    debug!("{} cooling down, skipped", symbol);
                }
                allowed
            })
            .cloned()
            .collect();

        let source = Arc::clone(&self.source);
        let fetch_timeout = self.fetch_timeout;
        let fetched: Vec<(Symbol, Result<PriceSeries, FetchError>)> = stream::iter(eligible)
            .map(|symbol| {
                let source = Arc::clone(&source);
                async move {
                    let series = fetch_series(source.as_ref(), &symbol, interval, fetch_timeout).await;
                    (symbol, series)
                }
            })
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        // Results come back in configuration order; throttle writes happen
        // here, one symbol at a time, before any dispatch.
        for (symbol, fetched) in fetched {
            let detected = fetched.and_then(|series| {
                detector::detect(&series, threshold_pct, now).map_err(FetchError::from)
            });

            match detected {
                Ok(Some(event)) => {
                    self.throttle.record_attempt(&symbol, now);
                    info!(
                        "{} moved {:.2}% ({} -> {}) in {} window",
                        symbol, event.variation_pct, event.initial_price, event.current_price, interval
                    );
                    result.alerts.push(event);
                }
                Ok(None) => debug!("{} within threshold", symbol),
                Err(e) => {
                    warn!("Failed to evaluate {}: {}", symbol, e);
                    result.failed_symbols.push(symbol);
                }
            }
        }

        if let Some(notifier) = &self.notifier {
            for event in &result.alerts {
                match self.dispatch(notifier.as_ref(), event, interval).await {
                    Ok(()) => result.delivered.push(event.symbol.clone()),
                    Err(e) => {
                        error!("Failed to deliver alert for {}: {}", event.symbol, e);
                        result.undelivered.push(event.symbol.clone());
                    }
                }
            }
        }

        Ok(result)
    }

    /// Single attempt, no retry. The throttle is never rolled back on failure.
    async fn dispatch(
        &self,
        notifier: &dyn NotificationSink,
        event: &VariationEvent,
        interval: SamplingInterval,
    ) -> Result<(), DeliveryError> {
        let text = render_alert(event, interval, MessageFormat::Rich);
        timeout(self.delivery_timeout, notifier.deliver(&text, MessageFormat::Rich))
            .await
            .map_err(|_| DeliveryError::Timeout(self.delivery_timeout))?
    }
}

async fn fetch_series(
    source: &dyn PriceSource,
    symbol: &Symbol,
    interval: SamplingInterval,
    limit: Duration,
) -> Result<PriceSeries, FetchError> {
    let series = timeout(limit, source.fetch(symbol, interval))
        .await
        .map_err(|_| FetchError::Timeout(limit))??;

    match series.len() {
        0 => Err(FetchError::Empty),
        n if n < 2 => Err(FetchError::TooShort(n)),
        _ => Ok(series),
    }
}
