//! # models::bar
//!
//! [`OhlcBar`] — one hourly (or daily) candle as returned by market data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single OHLC bar in pair-currency units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    /// Bar open time (UTC).
    pub time:  DateTime<Utc>,
    pub open:  f64,
    pub high:  f64,
    pub low:   f64,
    pub close: f64,
}

impl OhlcBar {
    /// All four prices are finite numbers.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// Clean a retrieved series: drop malformed bars, order by time and keep
/// only the latest occurrence of a re-fetched timestamp.
pub fn normalize_bars(bars: Vec<OhlcBar>) -> Vec<OhlcBar> {
    let mut indexed: Vec<(usize, OhlcBar)> = bars
        .into_iter()
        .filter(OhlcBar::is_well_formed)
        .enumerate()
        .collect();

    // Stable sort by time then fetch order, so the last of each run is the latest.
    indexed.sort_by_key(|(i, bar)| (bar.time, *i));

    let mut out: Vec<OhlcBar> = Vec::with_capacity(indexed.len());
    for (_, bar) in indexed {
        match out.last_mut() {
            Some(prev) if prev.time == bar.time => *prev = bar,
            _ => out.push(bar),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn make_bar(hour: i64, close: f64) -> OhlcBar {
        OhlcBar {
            time:  Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
            open:  close,
            high:  close + 0.5,
            low:   close - 0.5,
            close,
        }
    }

    #[test]
    fn test_normalize_sorts_and_dedups_latest() {
        let bars = vec![make_bar(2, 150.0), make_bar(1, 149.0), make_bar(2, 151.0)];
        let out = normalize_bars(bars);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].close, 149.0);
        assert_eq!(out[1].close, 151.0);
    }

    #[test]
    fn test_normalize_drops_malformed() {
        let mut bad = make_bar(3, 150.0);
        bad.high = f64::NAN;
        let out = normalize_bars(vec![make_bar(1, 149.0), bad]);
        assert_eq!(out.len(), 1);
    }
}
