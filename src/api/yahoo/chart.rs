use crate::api::PriceSource;
use crate::error::FetchError;
use crate::monitor::types::{PriceSample, PriceSeries, SamplingInterval, Symbol};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = concat!("cryptomonitor/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Intraday close prices from the Yahoo Finance chart endpoint.
pub struct YahooChartSource {
    client: Client,
    base_url: String,
    range: String,
}

impl YahooChartSource {
    pub fn new(request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: YAHOO_CHART_URL.to_string(),
            range: "1d".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn chart_url(&self, symbol: &Symbol) -> String {
        format!("{}/{}", self.base_url, symbol.as_str())
    }
}

#[async_trait]
impl PriceSource for YahooChartSource {
    async fn fetch(
        &self,
        symbol: &Symbol,
        interval: SamplingInterval,
    ) -> Result<PriceSeries, FetchError> {
        let url = self.chart_url(symbol);
        debug!("Fetching {} ({}) from {}", symbol, interval, url);

        let response = self
            .client
            .get(&url)
            .query(&[("range", self.range.as_str()), ("interval", interval.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Yahoo reports unknown symbols with a 404 and a JSON error body.
        match parse_chart(symbol, &body) {
            Err(FetchError::Malformed(_)) if !status.is_success() => Err(FetchError::Status {
                status: status.as_u16(),
                body,
            }),
            other => other,
        }
    }
}

fn parse_chart(symbol: &Symbol, body: &str) -> Result<PriceSeries, FetchError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if let Some(err) = envelope.chart.error {
        return Err(FetchError::Api {
            code: err.code,
            description: err.description,
        });
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or(FetchError::Empty)?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    if closes.len() != result.timestamp.len() {
        return Err(FetchError::Malformed(format!(
            "{} timestamps but {} close prices",
            result.timestamp.len(),
            closes.len()
        )));
    }

    let mut samples = Vec::with_capacity(closes.len());
    for (ts, close) in result.timestamp.into_iter().zip(closes) {
        // Yahoo leaves gaps as nulls
        let Some(price) = close else { continue };
        let timestamp = DateTime::<Utc>::from_timestamp(ts, 0)
            .ok_or_else(|| FetchError::Malformed(format!("timestamp out of range: {}", ts)))?;
        samples.push(PriceSample::new(timestamp, price));
    }
    samples.sort_by_key(|s| s.timestamp);

    match samples.len() {
        0 => Err(FetchError::Empty),
        1 => Err(FetchError::TooShort(1)),
        _ => Ok(PriceSeries::new(symbol.clone(), samples)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc() -> Symbol {
        Symbol::from("BTC-USD")
    }

    #[test]
    fn parses_closes_and_skips_nulls() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"BTC-USD"},
            "timestamp":[1730714400,1730714700,1730715000],
            "indicators":{"quote":[{"close":[100.0,null,106.0],"open":[1,2,3]}]}}],"error":null}}"#;
        let series = parse_chart(&btc(), body).unwrap();
        assert_eq!(series.symbol, btc());
        assert_eq!(series.len(), 2);
        assert_eq!(series.samples[0].price, 100.0);
        assert_eq!(series.samples[1].price, 106.0);
        assert_eq!(series.samples[1].timestamp.timestamp(), 1730715000);
    }

    #[test]
    fn api_error_is_reported() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        match parse_chart(&btc(), body) {
            Err(FetchError::Api { code, .. }) => assert_eq!(code, "Not Found"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn single_sample_is_too_short() {
        let body = r#"{"chart":{"result":[{"timestamp":[1730714400],
            "indicators":{"quote":[{"close":[100.0]}]}}],"error":null}}"#;
        assert!(matches!(parse_chart(&btc(), body), Err(FetchError::TooShort(1))));
    }

    #[test]
    fn missing_timestamps_is_empty() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(matches!(parse_chart(&btc(), body), Err(FetchError::Empty)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            parse_chart(&btc(), "<html>rate limited</html>"),
            Err(FetchError::Malformed(_))
        ));
    }
}
