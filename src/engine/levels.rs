//! # engine::levels
//!
//! Stop-loss / take-profit levels from an [`IndicatorSnapshot`]:
//!
//! ```text
//! stop_loss     = S1 − ATR14
//! take_profit_1 = R1 + 0.5·ATR14
//! take_profit_2 = R1 + 1.0·ATR14
//! ```
//!
//! Non-finite inputs propagate; the pipeline rejects such levels before they
//! reach a request.

use crate::engine::indicators::IndicatorSnapshot;
use crate::models::LevelSet;

pub fn compute_levels(snapshot: &IndicatorSnapshot) -> LevelSet {
    LevelSet {
        stop_loss:     snapshot.s1 - snapshot.atr14,
        take_profit_1: snapshot.r1 + 0.5 * snapshot.atr14,
        take_profit_2: snapshot.r1 + 1.0 * snapshot.atr14,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_snapshot(atr14: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            time: Utc::now(),
            open: 111.0,
            high: 112.0,
            low: 110.0,
            close: 111.0,
            atr14,
            pivot: 111.0,
            s1: 110.0,
            r1: 112.0,
        }
    }

    #[test]
    fn test_reference_levels() {
        let levels = compute_levels(&make_snapshot(1.0));
        assert_eq!(levels.stop_loss, 109.0);
        assert_eq!(levels.take_profit_1, 112.5);
        assert_eq!(levels.take_profit_2, 113.0);
    }

    #[test]
    fn test_nan_atr_propagates() {
        assert!(!compute_levels(&make_snapshot(f64::NAN)).is_finite());
    }
}
