//! # models::calendar
//!
//! Macro-calendar records. Raw JSON from the calendar provider is decoded
//! record by record so one garbled entry never sinks the whole day.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

/// Expected market impact of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Impact::Low),
            "medium" | "moderate" => Some(Impact::Medium),
            "high" => Some(Impact::High),
            _ => None,
        }
    }
}

/// A decoded calendar event.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub country:  String,
    /// Issuing currency, when the provider reports it.
    pub currency: Option<String>,
    /// `None` when the provider sent no (or an unknown) impact level.
    pub impact:   Option<Impact>,
    pub name:     String,
    pub date:     NaiveDate,
}

/// Wire shape of one provider record; every field is optional.
#[derive(Debug, Deserialize)]
struct RawCalendarRecord {
    country:  Option<String>,
    currency: Option<String>,
    impact:   Option<String>,
    #[serde(alias = "name")]
    event:    Option<String>,
    date:     Option<String>,
}

impl CalendarEvent {
    /// Decode one provider record. `None` means the record is unusable.
    pub fn from_record(value: &serde_json::Value) -> Option<Self> {
        let raw: RawCalendarRecord = serde_json::from_value(value.clone()).ok()?;

        let name = raw.event?.trim().to_string();
        let country = raw.country?.trim().to_string();
        if name.is_empty() || country.is_empty() {
            return None;
        }

        Some(Self {
            country,
            currency: raw.currency.map(|c| c.trim().to_uppercase()).filter(|c| !c.is_empty()),
            impact:   raw.impact.as_deref().and_then(Impact::parse),
            name,
            date:     parse_event_date(raw.date.as_deref()?)?,
        })
    }
}

/// Decode a provider payload, skipping records that cannot be used.
pub fn decode_events(values: &[serde_json::Value]) -> Vec<CalendarEvent> {
    values
        .iter()
        .filter_map(|v| {
            let decoded = CalendarEvent::from_record(v);
            if decoded.is_none() {
                debug!(record = %v, "Skipping malformed calendar record");
            }
            decoded
        })
        .collect()
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and RFC 3339.
fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc().date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_fmp_record() {
        let event = CalendarEvent::from_record(&json!({
            "date": "2024-05-03 12:30:00",
            "country": "US",
            "currency": "usd",
            "event": "Nonfarm Payrolls",
            "impact": "High",
            "actual": null
        }))
        .unwrap();
        assert_eq!(event.country, "US");
        assert_eq!(event.currency.as_deref(), Some("USD"));
        assert_eq!(event.impact, Some(Impact::High));
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
    }

    #[test]
    fn test_unknown_impact_is_none() {
        let event = CalendarEvent::from_record(&json!({
            "date": "2024-05-03",
            "country": "Japan",
            "event": "BoJ Interest Rate Decision",
            "impact": "None"
        }))
        .unwrap();
        assert_eq!(event.impact, None);
    }

    #[test]
    fn test_decode_skips_garbage() {
        let events = decode_events(&[
            json!({"country": "US", "event": "CPI", "date": "2024-05-03", "impact": "High"}),
            json!("not an object"),
            json!({"country": "US", "date": "2024-05-03"}),
            json!({"country": "US", "event": "PPI", "date": "yesterday"}),
            json!({"country": 5, "event": "GDP", "date": "2024-05-03"}),
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "CPI");
    }
}
