//! Pure computation: indicators, levels, calendar filtering, trend rule and
//! the primary/fallback decider.

pub mod calendar_filter;
pub mod decider;
pub mod indicators;
pub mod levels;
pub mod trend;
