//! # pipeline — one signal cycle
//!
//! ```text
//! calendar ─▶ filter ─▶ report ─────────────┐
//! hourly bars ─▶ indicators ─▶ levels ──────┼─▶ DecisionRequest ─▶ decider ─▶ Signal
//!                     └─ DataInsufficient / NonFiniteLevels / Retrieval ─▶ Degraded ─┘
//! ```
//!
//! Writing the artifact is left to the caller so a failed write is the only
//! error that leaves this module's caller.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::ai::DecisionOracle;
use crate::calendar::CalendarClient;
use crate::config::{Config, PipelineMode};
use crate::engine::decider::{DecisionInput, Resolution, SignalDecider};
use crate::engine::indicators::compute_snapshot;
use crate::engine::levels::compute_levels;
use crate::engine::trend::TrendRule;
use crate::error::SignalError;
use crate::market::{MarketClient, HOURLY};
use crate::models::OhlcBar;
use crate::prompt::DecisionRequest;

/// Turn retrieved bars + calendar line into decider input.
pub fn build_input(
    config: &Config,
    bars: Result<Vec<OhlcBar>, SignalError>,
    high_volatility_report: Option<String>,
) -> DecisionInput {
    let computed = bars.and_then(|bars| compute_snapshot(&bars)).and_then(|snapshot| {
        let levels = compute_levels(&snapshot);
        if levels.is_finite() {
            Ok((snapshot, levels))
        } else {
            Err(SignalError::NonFiniteLevels { bar: snapshot.time.to_string() })
        }
    });

    match computed {
        Ok((snapshot, levels)) => {
            info!(
                bar   = %snapshot.time,
                close = snapshot.close,
                atr14 = snapshot.atr14,
                s1    = snapshot.s1,
                r1    = snapshot.r1,
                "Indicators computed"
            );
            DecisionInput::Ready(DecisionRequest::new(
                config.pair.clone(),
                snapshot,
                levels,
                high_volatility_report,
                config.price_decimals,
            ))
        }
        Err(e) => {
            warn!(error = %e, "Indicator path unavailable — decision goes straight to fallback");
            DecisionInput::Degraded {
                reason: e.to_string(),
                high_volatility_report,
            }
        }
    }
}

/// Fetch, compute and decide. Never fails; degraded inputs resolve through
/// the fallback path.
pub async fn run_cycle(
    config: &Config,
    client: &reqwest::Client,
    oracle: &dyn DecisionOracle,
    today: NaiveDate,
) -> Resolution {
    // 1. Calendar
    let calendar = CalendarClient::new(client.clone(), config);
    let report = calendar.high_volatility_report(today).await;

    // 2. Market data + indicators
    let market = MarketClient::new(client.clone(), config);
    let bars = market.fetch_bars(HOURLY).await;
    let input = build_input(config, bars, report);

    // 3. Decide
    let decider = SignalDecider::new(oracle, config.price_decimals);
    let decider = match config.mode {
        PipelineMode::DirectionOnly => decider.with_trend(&market, TrendRule::default()),
        PipelineMode::Full => decider,
    };

    let resolution = decider.resolve(input).await;
    match &resolution {
        Resolution::Primary(signal) => {
            info!(path = resolution.path(), direction = %signal.direction, "Signal resolved");
        }
        Resolution::Fallback { signal, reason, .. } => {
            warn!(path = resolution.path(), direction = %signal.direction, reason = %reason, "Signal resolved via fallback");
        }
    }
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecisionServiceError;
    use crate::models::{Direction, LevelSet, Signal};
    use crate::prompt::DecisionRequest;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};

    fn make_config() -> Config {
        Config::from_lookup(|key| (key == "AI_API_KEY").then(|| "test".to_string())).unwrap()
    }

    /// Config whose calendar and market endpoints refuse every connection.
    fn make_offline_config(mode: &str) -> Config {
        let mode = mode.to_string();
        Config::from_lookup(move |key| {
            let value = match key {
                "AI_API_KEY" | "CALENDAR_API_KEY" => "test",
                "CALENDAR_URL" | "MARKET_URL" => "http://127.0.0.1:1",
                "DATA_TIMEOUT_SECS" => "2",
                "SIGNAL_MODE" => mode.as_str(),
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap()
    }

    struct TimeoutOracle;

    #[async_trait]
    impl DecisionOracle for TimeoutOracle {
        async fn decide(&self, _: &DecisionRequest) -> Result<Signal, DecisionServiceError> {
            Err(DecisionServiceError::Timeout)
        }
        fn name(&self) -> &str {
            "timeout"
        }
    }

    fn make_bars(n: usize) -> Vec<OhlcBar> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| OhlcBar {
                time:  start + Duration::hours(i as i64),
                open:  155.0,
                high:  155.5,
                low:   154.5,
                close: 155.0,
            })
            .collect()
    }

    #[test]
    fn test_enough_bars_is_ready() {
        let input = build_input(&make_config(), Ok(make_bars(30)), Some("CPI".into()));
        match input {
            DecisionInput::Ready(request) => {
                assert_eq!(request.snapshot.atr14, 1.0);
                assert_eq!(request.high_volatility_report.as_deref(), Some("CPI"));
                assert_eq!(request.decimals, 4);
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn test_short_series_is_degraded() {
        let input = build_input(&make_config(), Ok(make_bars(5)), None);
        assert!(matches!(input, DecisionInput::Degraded { ref reason, .. } if reason.contains("need 15")));
    }

    #[test]
    fn test_retrieval_error_is_degraded() {
        let input = build_input(
            &make_config(),
            Err(SignalError::retrieval("market", "timeout")),
            Some("CPI".into()),
        );
        match input {
            DecisionInput::Degraded { high_volatility_report, .. } => {
                assert_eq!(high_volatility_report.as_deref(), Some("CPI"));
            }
            other => panic!("expected Degraded, got {other:?}"),
        }
    }

    #[test]
    fn test_overflowing_levels_are_degraded() {
        let mut bars = make_bars(20);
        for bar in &mut bars {
            bar.open = 1.0e308;
            bar.high = 1.5e308;
            bar.low = 0.5e308;
            bar.close = 1.0e308;
        }
        let input = build_input(&make_config(), Ok(bars), None);
        match input {
            DecisionInput::Degraded { reason, .. } => {
                assert!(reason.starts_with("Non-finite levels"), "unexpected reason: {reason}");
            }
            other => panic!("expected Degraded, got {other:?}"),
        }
    }

    async fn assert_offline_cycle(mode: &str) {
        let config = make_offline_config(mode);
        let client = reqwest::Client::new();
        let today = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();

        let resolution = run_cycle(&config, &client, &TimeoutOracle, today).await;

        assert_eq!(resolution.path(), "fallback-numeric");
        let signal = resolution.signal();
        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.levels(), LevelSet::zero());
        assert!(signal.high_volatility_report.is_none());
        assert!(signal.is_schema_valid());
    }

    #[tokio::test]
    async fn test_offline_cycle_full_mode_falls_back() {
        assert_offline_cycle("full").await;
    }

    #[tokio::test]
    async fn test_offline_cycle_direction_only_falls_back() {
        assert_offline_cycle("direction-only").await;
    }
}
