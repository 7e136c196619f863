//! # models::signal
//!
//! The [`Signal`] artifact and the [`LevelSet`] it carries.
//!
//! Field order on [`Signal`] is the key order of the on-disk JSON document;
//! downstream consumers rely on it.

use serde::{Deserialize, Serialize};

/// Directional call for the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
    Neutral,
}

impl Direction {
    /// Trim + case-insensitive match on the three enum names. Anything else
    /// (including synonyms like "up" or "buy") is rejected.
    pub fn parse_strict(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "long" => Some(Direction::Long),
            "short" => Some(Direction::Short),
            "neutral" => Some(Direction::Neutral),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "Long"),
            Direction::Short => write!(f, "Short"),
            Direction::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Protective and target levels. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelSet {
    pub stop_loss:     f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
}

impl LevelSet {
    /// All-zero levels used when no indicator snapshot exists.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Round every level to `decimals` places.
    pub fn rounded(&self, decimals: usize) -> Self {
        Self {
            stop_loss:     round_to(self.stop_loss, decimals),
            take_profit_1: round_to(self.take_profit_1, decimals),
            take_profit_2: round_to(self.take_profit_2, decimals),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.stop_loss.is_finite() && self.take_profit_1.is_finite() && self.take_profit_2.is_finite()
    }
}

/// The externally visible artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction:              Direction,
    pub stop_loss:              f64,
    pub take_profit_1:          f64,
    pub take_profit_2:          f64,
    /// Same-day high-impact events, `null` when there are none.
    #[serde(default)]
    pub high_volatility_report: Option<String>,
    #[serde(default)]
    pub next_window:            String,
    #[serde(default)]
    pub summary:                String,
}

impl Signal {
    /// Neutral call with the given levels and empty commentary.
    pub fn neutral(levels: LevelSet, high_volatility_report: Option<String>) -> Self {
        Self {
            direction:     Direction::Neutral,
            stop_loss:     levels.stop_loss,
            take_profit_1: levels.take_profit_1,
            take_profit_2: levels.take_profit_2,
            high_volatility_report,
            next_window:   String::new(),
            summary:       String::new(),
        }
    }

    pub fn levels(&self) -> LevelSet {
        LevelSet {
            stop_loss:     self.stop_loss,
            take_profit_1: self.take_profit_1,
            take_profit_2: self.take_profit_2,
        }
    }

    /// Every numeric field is a finite number.
    pub fn is_schema_valid(&self) -> bool {
        self.levels().is_finite()
    }
}

fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals.min(12) as i32);
    (value * factor).round() / factor
}
