//! # engine::indicators
//!
//! **Indicator Engine** — OHLC series → latest-bar [`IndicatorSnapshot`].
//!
//! ```text
//! TR[t]    = max(high−low, |high−close[t−1]|, |low−close[t−1]|)   (t ≥ 1)
//! ATR14[t] = mean(TR[t−13..=t])                                   (all 14 defined)
//! pivot    = (high + low + close) / 3                            (same bar)
//! S1       = 2·pivot − high
//! R1       = 2·pivot − low
//! ```
//!
//! The snapshot comes from the most recent bar whose ATR window is complete,
//! which is not necessarily the last bar retrieved.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::SignalError;
use crate::models::OhlcBar;

pub const ATR_PERIOD: usize = 14;

/// One extra bar is needed because the first bar has no prior close.
pub const MIN_BARS: usize = ATR_PERIOD + 1;

/// Indicator values for one bar. Computed fresh every run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub time:  DateTime<Utc>,
    pub open:  f64,
    pub high:  f64,
    pub low:   f64,
    pub close: f64,
    pub atr14: f64,
    pub pivot: f64,
    pub s1:    f64,
    pub r1:    f64,
}

/// Classic floor-trader levels from a single bar: `(pivot, s1, r1)`.
#[inline]
pub fn pivot_levels(high: f64, low: f64, close: f64) -> (f64, f64, f64) {
    let pivot = (high + low + close) / 3.0;
    (pivot, 2.0 * pivot - high, 2.0 * pivot - low)
}

/// True Range per bar. `None` for the first bar and wherever this bar or the
/// previous one is malformed.
pub fn true_range(bars: &[OhlcBar]) -> Vec<Option<f64>> {
    let mut tr = vec![None; bars.len()];

    for (i, pair) in bars.windows(2).enumerate() {
        let (prev, bar) = (&pair[0], &pair[1]);
        if !prev.is_well_formed() || !bar.is_well_formed() {
            continue;
        }
        let pc = prev.close;
        tr[i + 1] = Some((bar.high - bar.low).max((bar.high - pc).abs()).max((bar.low - pc).abs()));
    }

    tr
}

/// Simple moving average; `None` unless every value in the window is defined.
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    for (i, window) in values.windows(period).enumerate() {
        let sum: Option<f64> = window.iter().copied().sum();
        out[i + period - 1] = sum.map(|s| s / period as f64);
    }

    out
}

/// Compute the snapshot for the latest bar with a full ATR window.
pub fn compute_snapshot(bars: &[OhlcBar]) -> Result<IndicatorSnapshot, SignalError> {
    let usable = bars.iter().filter(|b| b.is_well_formed()).count();
    if usable < MIN_BARS {
        return Err(SignalError::DataInsufficient { needed: MIN_BARS, available: usable });
    }

    let atr = rolling_mean(&true_range(bars), ATR_PERIOD);

    // Gaps can leave no complete window even with enough bars overall.
    let (idx, atr14) = atr
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, v)| v.map(|a| (i, a)))
        .ok_or(SignalError::DataInsufficient { needed: MIN_BARS, available: usable })?;

    let bar = &bars[idx];
    let (pivot, s1, r1) = pivot_levels(bar.high, bar.low, bar.close);

    Ok(IndicatorSnapshot {
        time:  bar.time,
        open:  bar.open,
        high:  bar.high,
        low:   bar.low,
        close: bar.close,
        atr14,
        pivot,
        s1,
        r1,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
