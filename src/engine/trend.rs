//! # engine::trend
//!
//! Rule-based direction from a volatility-banded trend line (Supertrend),
//! used as the second fallback tier when the reasoning service is down.
//!
//! ```text
//! band  = Supertrend(ATR period, multiplier) on daily bars
//! close > band·(1 + buffer)  → Long
//! close < band·(1 − buffer)  → Short
//! otherwise                  → Neutral   (no flip-flop at the band edge)
//! ```

use crate::engine::indicators::true_range;
use crate::models::{Direction, OhlcBar};

#[derive(Debug, Clone, Copy)]
pub struct TrendRule {
    pub atr_period: usize,
    pub multiplier: f64,
    /// Neutral zone half-width as a fraction of price.
    pub buffer:     f64,
}

impl Default for TrendRule {
    fn default() -> Self {
        Self {
            atr_period: 10,
            multiplier: 3.0,
            buffer:     0.001,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendVerdict {
    pub direction: Direction,
    pub band:      f64,
    pub close:     f64,
}

/// Wilder smoothing seeded with the mean of the first `period` defined values.
/// Stops at the first gap after the seed.
pub fn wilder_smooth(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    let Some(seed_end) = values
        .windows(period)
        .position(|w| w.iter().all(Option::is_some))
        .map(|start| start + period)
    else {
        return out;
    };

    let seed: f64 = values[seed_end - period..seed_end].iter().flatten().sum::<f64>() / period as f64;
    out[seed_end - 1] = Some(seed);

    let alpha = 1.0 / period as f64;
    let mut prev = seed;
    for (i, v) in values.iter().enumerate().skip(seed_end) {
        let Some(v) = v else { break };
        prev = alpha * v + (1.0 - alpha) * prev;
        out[i] = Some(prev);
    }

    out
}

/// Active Supertrend band per bar: the lower band while trending up, the
/// upper band while trending down.
pub fn supertrend(bars: &[OhlcBar], period: usize, multiplier: f64) -> Vec<Option<f64>> {
    let mut result = vec![None; bars.len()];
    let atr = wilder_smooth(&true_range(bars), period);

    let Some(start) = atr.iter().position(Option::is_some) else {
        return result;
    };

    let band_at = |i: usize, atr: f64| {
        let hl2 = (bars[i].high + bars[i].low) / 2.0;
        (hl2 + multiplier * atr, hl2 - multiplier * atr)
    };

    let Some(atr0) = atr[start] else { return result };
    let (mut upper, mut lower) = band_at(start, atr0);
    let mut trending_up = true;
    result[start] = Some(lower);

    for i in (start + 1)..bars.len() {
        let Some(a) = atr[i] else { break };
        let (basic_upper, basic_lower) = band_at(i, a);
        let prev_close = bars[i - 1].close;

        // Upper band only tightens while price stays below it; lower mirrors.
        upper = if prev_close <= upper { basic_upper.min(upper) } else { basic_upper };
        lower = if prev_close >= lower { basic_lower.max(lower) } else { basic_lower };

        let close = bars[i].close;
        if trending_up && close < lower {
            trending_up = false;
        } else if !trending_up && close > upper {
            trending_up = true;
        }

        result[i] = Some(if trending_up { lower } else { upper });
    }

    result
}

impl TrendRule {
    /// `None` when the series is too short to form a band.
    pub fn evaluate(&self, bars: &[OhlcBar]) -> Option<TrendVerdict> {
        let bands = supertrend(bars, self.atr_period, self.multiplier);
        let (idx, band) = bands
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, b)| b.map(|b| (i, b)))?;

        let close = bars[idx].close;
        let margin = close.abs() * self.buffer;

        let direction = if close > band + margin {
            Direction::Long
        } else if close < band - margin {
            Direction::Short
        } else {
            Direction::Neutral
        };

        Some(TrendVerdict { direction, band, close })
    }
}
