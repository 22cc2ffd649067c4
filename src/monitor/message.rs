use super::types::{SamplingInterval, VariationEvent};
use crate::api::MessageFormat;
use chrono::{DateTime, Local, Utc};
use num_format::{Locale, ToFormattedString};

pub const STARTUP_NOTICE: &str =
    "🤖 Price monitor started!\n\nWatching for price variations across the configured symbols...";

/// `$1,234.5678`; negative and non-finite values fall back to plain formatting.
pub fn format_usd(price: f64) -> String {
    if !price.is_finite() || price < 0.0 {
        return format!("${:.4}", price);
    }
    let scaled = (price * 10_000.0).round() as u64;
    format!(
        "${}.{:04}",
        (scaled / 10_000).to_formatted_string(&Locale::en),
        scaled % 10_000
    )
}

pub fn format_clock(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn render_alert(
    event: &VariationEvent,
    interval: SamplingInterval,
    format: MessageFormat,
) -> String {
    let (title, symbol) = match format {
        MessageFormat::Rich => (
            "<b>Price variation alert!</b>",
            escape_html(event.symbol.as_str()),
        ),
        MessageFormat::Plain => ("Price variation alert!", event.symbol.to_string()),
    };

    format!(
        "🚨 {}\n\n💰 Symbol: {}\n📈 Variation: {:.2}%\n💵 Initial price: {}\n💵 Current price: {}\n⏰ Window: {} - {}\n📊 Interval: {}",
        title,
        symbol,
        event.variation_pct,
        format_usd(event.initial_price),
        format_usd(event.current_price),
        format_clock(event.window_start_time),
        format_clock(event.window_end_time),
        interval,
    )
}
