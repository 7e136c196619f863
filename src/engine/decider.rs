//! # engine::decider
//!
//! **Signal Decider** — primary/fallback protocol that always ends with a
//! schema-valid [`Signal`].
//!
//! ```text
//!   PRIMARY ──ok + valid──────────────────────────────▶ DONE(Primary)
//!      │
//!      └─ error / invalid / no request ─▶ FALLBACK
//!                                           │
//!                                           ├─ [a] neutral + computed levels
//!                                           └─ [b] trend-band direction (direction-only mode)
//!                                           ▼
//!                                         DONE(Fallback)
//! ```
//!
//! Nothing in here returns an error: every failure becomes a logged
//! transition to FALLBACK.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::ai::DecisionOracle;
use crate::engine::trend::{TrendRule, TrendVerdict};
use crate::error::SignalError;
use crate::models::{Direction, LevelSet, OhlcBar, Signal};
use crate::prompt::DecisionRequest;

// ─── Inputs / Outputs ─────────────────────────────────────────────────────────

/// What the upstream stages managed to produce.
#[derive(Debug, Clone)]
pub enum DecisionInput {
    /// Indicators available; the AI can be asked.
    Ready(DecisionRequest),
    /// No snapshot (insufficient or unavailable market data).
    Degraded {
        reason:                 String,
        high_volatility_report: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTier {
    /// Neutral call with the computed (or zero) levels.
    Numeric,
    /// Direction from the daily trend band.
    TrendRule,
}

/// Which path produced the signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Primary(Signal),
    Fallback {
        signal: Signal,
        tier:   FallbackTier,
        reason: String,
    },
}

impl Resolution {
    pub fn signal(&self) -> &Signal {
        match self {
            Resolution::Primary(signal) | Resolution::Fallback { signal, .. } => signal,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Resolution::Primary(_) => "primary",
            Resolution::Fallback { tier: FallbackTier::Numeric, .. } => "fallback-numeric",
            Resolution::Fallback { tier: FallbackTier::TrendRule, .. } => "fallback-trend",
        }
    }
}

/// Source of the longer daily series for the trend fallback.
#[async_trait]
pub trait TrendFeed: Send + Sync {
    async fn daily_bars(&self) -> Result<Vec<OhlcBar>, SignalError>;
}

// ─── Decider ──────────────────────────────────────────────────────────────────

enum State {
    Primary(DecisionRequest),
    Fallback {
        base:   Signal,
        reason: String,
    },
    Done(Resolution),
}

pub struct SignalDecider<'a> {
    oracle:   &'a dyn DecisionOracle,
    trend:    Option<(&'a dyn TrendFeed, TrendRule)>,
    decimals: usize,
}

impl<'a> SignalDecider<'a> {
    pub fn new(oracle: &'a dyn DecisionOracle, decimals: usize) -> Self {
        Self { oracle, trend: None, decimals }
    }

    /// Enable fallback tier [b].
    pub fn with_trend(mut self, feed: &'a dyn TrendFeed, rule: TrendRule) -> Self {
        self.trend = Some((feed, rule));
        self
    }

    /// Run the protocol to completion.
    pub async fn resolve(&self, input: DecisionInput) -> Resolution {
        let mut state = match input {
            DecisionInput::Ready(request) => State::Primary(request),
            DecisionInput::Degraded { reason, high_volatility_report } => State::Fallback {
                base: Signal::neutral(LevelSet::zero(), high_volatility_report),
                reason,
            },
        };

        loop {
            state = match state {
                State::Primary(request) => self.primary(request).await,
                State::Fallback { base, reason } => State::Done(self.fallback(base, reason).await),
                State::Done(resolution) => return resolution,
            };
        }
    }

    async fn primary(&self, request: DecisionRequest) -> State {
        match self.oracle.decide(&request).await {
            Ok(signal) if signal.is_schema_valid() => {
                info!(oracle = self.oracle.name(), direction = %signal.direction, "AI decision accepted");
                State::Done(Resolution::Primary(signal))
            }
            Ok(_) => {
                warn!(oracle = self.oracle.name(), "AI signal has non-finite levels — falling back");
                State::Fallback {
                    base:   request.fallback_signal(),
                    reason: "AI signal has non-finite levels".to_string(),
                }
            }
            Err(e) => {
                warn!(oracle = self.oracle.name(), error = %e, "Decision service failed — falling back");
                State::Fallback {
                    base:   request.fallback_signal(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn fallback(&self, base: Signal, reason: String) -> Resolution {
        // [a] always available
        let numeric = Signal {
            next_window: String::new(),
            summary:     String::new(),
            direction:   Direction::Neutral,
            ..base
        };

        // [b] only when configured and the daily series is usable
        if let Some(verdict) = self.trend_verdict().await {
            return Resolution::Fallback {
                signal: Signal {
                    direction: verdict.direction,
                    summary:   format!(
                        "Rule-based fallback: close {close:.d$} vs trend band {band:.d$} ({dir}).",
                        close = verdict.close,
                        band = verdict.band,
                        dir = verdict.direction,
                        d = self.decimals,
                    ),
                    ..numeric
                },
                tier: FallbackTier::TrendRule,
                reason,
            };
        }

        Resolution::Fallback {
            signal: numeric,
            tier: FallbackTier::Numeric,
            reason,
        }
    }

    async fn trend_verdict(&self) -> Option<TrendVerdict> {
        let (feed, rule) = self.trend?;

        let bars = match feed.daily_bars().await {
            Ok(bars) => bars,
            Err(e) => {
                warn!(error = %e, "Daily series unavailable — trend fallback skipped");
                return None;
            }
        };

        let verdict = rule.evaluate(&bars);
        if verdict.is_none() {
            warn!(bars = bars.len(), "Daily series too short for trend band");
        }
        verdict
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
