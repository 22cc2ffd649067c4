use crate::config::MonitorSettings;
use crate::error::ConfigError;
use crate::monitor::message::{format_clock, format_usd};
use crate::monitor::{MonitorEngine, TickResult, VariationEvent};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Notify;

/// Fixed-delay tick loop that reports to the log. Ctrl-C stops the loop
/// between ticks; a tick in progress always runs to completion.
pub async fn run(
    engine: &mut MonitorEngine,
    settings: &MonitorSettings,
) -> Result<(), ConfigError> {
    let shutdown = Arc::new(Notify::new());
    tokio::spawn({
        let shutdown = Arc::clone(&shutdown);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Stop requested, finishing current tick");
                shutdown.notify_one();
            }
        }
    });

    loop {
        let result = engine
            .run_tick(settings.threshold_pct, settings.interval)
            .await?;
        report(&result, engine.notifications_enabled());

        tokio::select! {
            _ = shutdown.notified() => break,
            _ = tokio::time::sleep(settings.tick_period) => {}
        }
    }
    Ok(())
}

fn report(result: &TickResult, notifications: bool) {
    for event in &result.alerts {
        let delivery = if !notifications {
            "notifications off"
        } else if result.delivered.contains(&event.symbol) {
            "delivered"
        } else {
            "not delivered"
        };
        info!("{}", alert_line(event, delivery));
    }

    if !result.failed_symbols.is_empty() {
        warn!(
            "Unavailable symbols: {}",
            result
                .failed_symbols
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    info!(
        "Tick complete: {} alert(s), {} failed symbol(s)",
        result.alerts.len(),
        result.failed_symbols.len()
    );
}

fn alert_line(event: &VariationEvent, delivery: &str) -> String {
    format!(
        "ALERT {} {:+.2}% {} -> {} [{} - {}] ({})",
        event.symbol,
        event.variation_pct,
        format_usd(event.initial_price),
        format_usd(event.current_price),
        format_clock(event.window_start_time),
        format_clock(event.window_end_time),
        delivery
    )
}
