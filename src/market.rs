//! # market — OHLC bars from the chart API
//!
//! Fetches a Yahoo-style v8 chart response and converts it into ordered
//! [`OhlcBar`]s. Two series are used:
//! - hourly, 7 days  → indicator path
//! - daily, 6 months → trend fallback
//!
//! Transport failures get one retry after a short backoff. Rows with missing
//! prices are dropped; the result is normalised (sorted, de-duplicated).

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::engine::decider::TrendFeed;
use crate::error::SignalError;
use crate::models::{normalize_bars, OhlcBar};

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Bar size + lookback for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesSpec {
    pub interval: &'static str,
    pub range:    &'static str,
}

pub const HOURLY: SeriesSpec = SeriesSpec { interval: "1h", range: "7d" };
pub const DAILY:  SeriesSpec = SeriesSpec { interval: "1d", range: "6mo" };

// ─── Wire format ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error:  Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code:        String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp:  Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open:  Vec<Option<f64>>,
    #[serde(default)]
    high:  Vec<Option<f64>>,
    #[serde(default)]
    low:   Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Convert a chart response body into bars.
fn parse_chart(body: &str) -> Result<Vec<OhlcBar>, SignalError> {
    let resp: ChartResponse =
        serde_json::from_str(body).map_err(|e| SignalError::retrieval("market", format!("bad chart JSON: {e}")))?;

    let data = match (resp.chart.result, resp.chart.error) {
        (_, Some(err)) => {
            return Err(SignalError::retrieval("market", format!("{}: {}", err.code, err.description)))
        }
        (Some(result), None) => result
            .into_iter()
            .next()
            .ok_or_else(|| SignalError::retrieval("market", "result array is empty"))?,
        (None, None) => return Err(SignalError::retrieval("market", "empty result with no error")),
    };

    let timestamps = data.timestamp.unwrap_or_default();
    let Some(quote) = data.indicators.quote.into_iter().next() else {
        return Err(SignalError::retrieval("market", "no quote data"));
    };

    let bars = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let at = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
            Some(OhlcBar {
                time:  DateTime::from_timestamp(ts, 0)?,
                open:  at(&quote.open)?,
                high:  at(&quote.high)?,
                low:   at(&quote.low)?,
                close: at(&quote.close)?,
            })
        })
        .collect();

    Ok(normalize_bars(bars))
}

// ─── Client ───────────────────────────────────────────────────────────────────

pub struct MarketClient {
    client:   reqwest::Client,
    base_url: String,
    symbol:   String,
    timeout:  Duration,
}

impl MarketClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.market_url.trim_end_matches('/').to_string(),
            symbol:   config.symbol.clone(),
            timeout:  config.data_timeout,
        }
    }

    fn chart_url(&self, spec: SeriesSpec) -> String {
        format!(
            "{}/{}?interval={}&range={}",
            self.base_url, self.symbol, spec.interval, spec.range
        )
    }

    /// Fetch one series. May return fewer bars than requested.
    pub async fn fetch_bars(&self, spec: SeriesSpec) -> Result<Vec<OhlcBar>, SignalError> {
        let url = self.chart_url(spec);

        let body = match self.get_text(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, url = %url, "Market request failed — retrying once");
                tokio::time::sleep(RETRY_BACKOFF).await;
                self.get_text(&url).await?
            }
        };

        let bars = parse_chart(&body)?;
        debug!(symbol = %self.symbol, interval = spec.interval, bars = bars.len(), "Market bars fetched");
        Ok(bars)
    }

    async fn get_text(&self, url: &str) -> Result<String, SignalError> {
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SignalError::retrieval("market", e))?;

        if !resp.status().is_success() {
            return Err(SignalError::retrieval("market", format!("HTTP {}", resp.status())));
        }

        resp.text().await.map_err(|e| SignalError::retrieval("market", e))
    }
}

#[async_trait]
impl TrendFeed for MarketClient {
    async fn daily_bars(&self) -> Result<Vec<OhlcBar>, SignalError> {
        self.fetch_bars(DAILY).await
    }
}
