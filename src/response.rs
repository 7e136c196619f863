//! # response — parse the AI answer into a Signal
//!
//! The AI is asked for a bare JSON object. We strip stray code fences, parse
//! strictly, then validate:
//! - `direction` is one of Long / Short / Neutral (trim + case only, no synonyms)
//! - `stop_loss`, `take_profit_1`, `take_profit_2` are finite numbers
//!
//! Anything else is a [`DecisionServiceError::InvalidOutput`].

use serde::Deserialize;

use crate::error::DecisionServiceError;
use crate::models::{Direction, Signal};
use crate::prompt::{DecisionRequest, NEXT_WINDOW_MAX_CHARS, SUMMARY_MAX_CHARS};

/// Shape the prompt asks for. Every field stays a JSON value: a string or
/// null level is a validation failure, while a non-string text field is
/// treated as absent.
#[derive(Debug, Deserialize)]
struct AiSignalJson {
    direction:              Option<serde_json::Value>,
    stop_loss:              Option<serde_json::Value>,
    take_profit_1:          Option<serde_json::Value>,
    take_profit_2:          Option<serde_json::Value>,
    #[serde(default)]
    high_volatility_report: Option<serde_json::Value>,
    #[serde(default)]
    next_window:            Option<serde_json::Value>,
    #[serde(default)]
    summary:                Option<serde_json::Value>,
}

fn invalid(msg: impl Into<String>) -> DecisionServiceError {
    DecisionServiceError::InvalidOutput(msg.into())
}

fn finite_number(value: Option<serde_json::Value>, field: &str) -> Result<f64, DecisionServiceError> {
    value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(format!("'{field}' must be a finite number, got {value:?}")))
}

/// Parse and validate the AI text. The calendar line from `request` is used
/// when the AI omits `high_volatility_report`.
pub fn parse_signal(ai_text: &str, request: &DecisionRequest) -> Result<Signal, DecisionServiceError> {
    let cleaned = strip_markdown(ai_text);

    let parsed: AiSignalJson = serde_json::from_str(cleaned)
        .map_err(|e| invalid(format!("AI returned invalid JSON ({e}): {cleaned}")))?;

    let direction = match parsed.direction {
        Some(serde_json::Value::String(raw)) => {
            Direction::parse_strict(&raw).ok_or_else(|| invalid(format!("Unknown direction from AI: '{raw}'")))?
        }
        other => return Err(invalid(format!("'direction' must be a string, got {other:?}"))),
    };

    Ok(Signal {
        direction,
        stop_loss:              finite_number(parsed.stop_loss, "stop_loss")?,
        take_profit_1:          finite_number(parsed.take_profit_1, "take_profit_1")?,
        take_profit_2:          finite_number(parsed.take_profit_2, "take_profit_2")?,
        high_volatility_report: text_field(&parsed.high_volatility_report)
            .map(str::trim)
            .filter(|r| !r.is_empty() && !r.eq_ignore_ascii_case("none"))
            .map(str::to_string)
            .or_else(|| request.high_volatility_report.clone()),
        next_window:            bounded(text_field(&parsed.next_window), NEXT_WINDOW_MAX_CHARS),
        summary:                bounded(text_field(&parsed.summary), SUMMARY_MAX_CHARS),
    })
}

fn text_field(value: &Option<serde_json::Value>) -> Option<&str> {
    value.as_ref().and_then(serde_json::Value::as_str)
}

fn bounded(text: Option<&str>, max_chars: usize) -> String {
    let text = text.unwrap_or_default().trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Remove markdown code fences the AI may wrap around its JSON.
fn strip_markdown(text: &str) -> &str {
    let text = text.trim();
    let inner = if let Some(inner) = text.strip_prefix("```json") {
        inner
    } else if let Some(inner) = text.strip_prefix("```") {
        inner
    } else {
        return text;
    };
    inner.trim_end_matches("```").trim()
}
