//! # engine::calendar_filter
//!
//! Reduce the day's macro calendar to the events that can move the pair:
//!
//! 1. **Same day**  — event date equals today's UTC date
//! 2. **Domestic**  — issued by the country (or in the currency) of either leg
//! 3. **High impact** — `impact == High`; when the provider gave no usable
//!    impact level, the event name must hit the policy-rate / employment /
//!    inflation keyword list instead
//!
//! Retained names are joined with `", "`. An empty set yields `None`, which
//! is written as `null` in the artifact.

use chrono::NaiveDate;

use crate::config::CurrencyPair;
use crate::models::{CalendarEvent, Impact};

/// Names that mark a release as market-moving when impact metadata is missing.
const HIGH_IMPACT_KEYWORDS: &[&str] = &[
    // policy rate
    "interest rate decision",
    "rate decision",
    "policy rate",
    "fomc",
    "fed funds",
    // employment
    "nonfarm payrolls",
    "non-farm payrolls",
    "non farm payrolls",
    "unemployment rate",
    "employment change",
    // inflation
    "cpi",
    "consumer price index",
    "pce price index",
    "inflation",
];

/// Country names/codes that calendar providers use for a currency's home market.
fn domestic_countries(currency: &str) -> &'static [&'static str] {
    match currency {
        "USD" => &["us", "usa", "united states"],
        "JPY" => &["jp", "japan"],
        "EUR" => &["eu", "emu", "euro area", "euro zone", "eurozone", "european union"],
        "GBP" => &["gb", "uk", "united kingdom"],
        "AUD" => &["au", "australia"],
        "NZD" => &["nz", "new zealand"],
        "CAD" => &["ca", "canada"],
        "CHF" => &["ch", "switzerland"],
        "CNY" => &["cn", "china"],
        _ => &[],
    }
}

fn is_domestic(event: &CalendarEvent, pair: &CurrencyPair) -> bool {
    let country = event.country.trim().to_lowercase();
    [&pair.base, &pair.quote].into_iter().any(|ccy| {
        event.currency.as_deref() == Some(ccy.as_str())
            || domestic_countries(ccy).contains(&country.as_str())
    })
}

fn is_high_impact(event: &CalendarEvent) -> bool {
    match event.impact {
        Some(impact) => impact == Impact::High,
        None => {
            let name = event.name.to_lowercase();
            HIGH_IMPACT_KEYWORDS.iter().any(|kw| name.contains(kw))
        }
    }
}

/// Keep same-day, domestic, high-impact events (input order preserved).
pub fn filter_events(events: &[CalendarEvent], pair: &CurrencyPair, today: NaiveDate) -> Vec<CalendarEvent> {
    events
        .iter()
        .filter(|e| e.date == today && is_domestic(e, pair) && is_high_impact(e))
        .cloned()
        .collect()
}

/// Join event names, or `None` when nothing survived the filter.
pub fn describe(events: &[CalendarEvent]) -> Option<String> {
    if events.is_empty() {
        return None;
    }
    Some(events.iter().map(|e| e.name.as_str()).collect::<Vec<_>>().join(", "))
}

/// Filter + describe in one step.
pub fn high_volatility_report(events: &[CalendarEvent], pair: &CurrencyPair, today: NaiveDate) -> Option<String> {
    describe(&filter_events(events, pair, today))
}
