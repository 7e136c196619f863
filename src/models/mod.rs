//! Domain models shared across the signal pipeline.

pub mod bar;
pub mod calendar;
pub mod signal;

pub use bar::{normalize_bars, OhlcBar};
pub use calendar::{decode_events, CalendarEvent, Impact};
pub use signal::{Direction, LevelSet, Signal};
