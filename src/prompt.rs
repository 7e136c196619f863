//! # prompt — build the Decision Request for the AI
//!
//! The request is a fixed-shape prompt: latest bar, ATR, pivots, the
//! calendar line and the pre-computed levels, with an instruction to answer
//! with exactly one JSON object in the [`Signal`](crate::models::Signal) schema.
//!
//! A [`DecisionRequest`] is immutable once built and carries enough to
//! rebuild the neutral fallback signal without the AI.

use crate::config::CurrencyPair;
use crate::engine::indicators::IndicatorSnapshot;
use crate::models::{LevelSet, Signal};

pub const SYSTEM_PROMPT: &str = "You are a professional intraday FX strategist. \
Respond with a single valid JSON object only.";

/// Upper bound on the `summary` length requested from (and accepted from) the AI.
pub const SUMMARY_MAX_CHARS: usize = 280;
pub const NEXT_WINDOW_MAX_CHARS: usize = 120;

/// One message in a role-tagged conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub role:    &'static str,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRequest {
    pub pair:                   CurrencyPair,
    pub snapshot:               IndicatorSnapshot,
    pub levels:                 LevelSet,
    pub high_volatility_report: Option<String>,
    /// Decimal places used for every price in the prompt.
    pub decimals:               usize,
}

impl DecisionRequest {
    pub fn new(
        pair: CurrencyPair,
        snapshot: IndicatorSnapshot,
        levels: LevelSet,
        high_volatility_report: Option<String>,
        decimals: usize,
    ) -> Self {
        Self { pair, snapshot, levels, high_volatility_report, decimals }
    }

    /// Neutral signal carrying the already-computed levels and calendar line.
    pub fn fallback_signal(&self) -> Signal {
        Signal::neutral(self.levels.rounded(self.decimals), self.high_volatility_report.clone())
    }

    /// `system` + `user` messages for the reasoning service.
    pub fn messages(&self) -> Vec<PromptMessage> {
        vec![
            PromptMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
            PromptMessage { role: "user",   content: self.user_prompt() },
        ]
    }

    pub fn user_prompt(&self) -> String {
        let d = self.decimals;
        let s = &self.snapshot;
        let l = &self.levels;
        let pair = &self.pair;

        // JSON-encode so quotes in event names cannot break the template.
        let report_json = serde_json::to_string(&self.high_volatility_report)
            .unwrap_or_else(|_| "null".to_string());
        let report_text = self.high_volatility_report.as_deref().unwrap_or("None");

        format!(r#"Here are the latest 1-hour {pair} values (bar opened {time}):
  Open={open:.d$}, High={high:.d$}, Low={low:.d$}, Close={close:.d$}
  ATR(14)={atr:.d$}
  Pivot S1={s1:.d$}, Pivot R1={r1:.d$}
Today's high-volatility report: {report_text}

Suggested levels (confirm them; do not contradict them numerically):
  stop_loss={sl:.d$}, take_profit_1={tp1:.d$}, take_profit_2={tp2:.d$}

Using ONLY these data points (no outside knowledge), respond with exactly this JSON object:
{{
  "direction": "Long" | "Short" | "Neutral",
  "stop_loss": {sl:.d$},
  "take_profit_1": {tp1:.d$},
  "take_profit_2": {tp2:.d$},
  "high_volatility_report": {report_json},
  "next_window": "<bias for the next session, max {nw_max} chars>",
  "summary": "<rationale, max {sum_max} chars>"
}}

NO extra text. No markdown, no code fences."#,
            time    = s.time.format("%Y-%m-%d %H:%M UTC"),
            open    = s.open,
            high    = s.high,
            low     = s.low,
            close   = s.close,
            atr     = s.atr14,
            s1      = s.s1,
            r1      = s.r1,
            sl      = l.stop_loss,
            tp1     = l.take_profit_1,
            tp2     = l.take_profit_2,
            nw_max  = NEXT_WINDOW_MAX_CHARS,
            sum_max = SUMMARY_MAX_CHARS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::levels::compute_levels;
    use crate::models::Direction;
    use chrono::{TimeZone, Utc};

    fn make_request(report: Option<&str>) -> DecisionRequest {
        let snapshot = IndicatorSnapshot {
            time:  Utc.with_ymd_and_hms(2024, 5, 3, 13, 0, 0).unwrap(),
            open:  111.0,
            high:  112.0,
            low:   110.0,
            close: 111.0,
            atr14: 1.0,
            pivot: 111.0,
            s1:    110.0,
            r1:    112.0,
        };
        DecisionRequest::new(
            CurrencyPair { base: "USD".into(), quote: "JPY".into() },
            snapshot,
            compute_levels(&snapshot),
            report.map(str::to_string),
            4,
        )
    }

    #[test]
    fn test_prompt_embeds_values_at_precision() {
        let prompt = make_request(Some("Nonfarm Payrolls")).user_prompt();
        assert!(prompt.contains("USD/JPY"));
        assert!(prompt.contains("Open=111.0000, High=112.0000, Low=110.0000, Close=111.0000"));
        assert!(prompt.contains("ATR(14)=1.0000"));
        assert!(prompt.contains("Pivot S1=110.0000, Pivot R1=112.0000"));
        assert!(prompt.contains("stop_loss=109.0000, take_profit_1=112.5000, take_profit_2=113.0000"));
        assert!(prompt.contains(r#""high_volatility_report": "Nonfarm Payrolls""#));
    }

    #[test]
    fn test_prompt_without_events() {
        let prompt = make_request(None).user_prompt();
        assert!(prompt.contains("Today's high-volatility report: None"));
        assert!(prompt.contains(r#""high_volatility_report": null"#));
    }

    #[test]
    fn test_messages_roles() {
        let messages = make_request(None).messages();
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, ["system", "user"]);
    }

    #[test]
    fn test_fallback_signal_uses_levels() {
        let signal = make_request(Some("CPI")).fallback_signal();
        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.stop_loss, 109.0);
        assert_eq!(signal.take_profit_1, 112.5);
        assert_eq!(signal.take_profit_2, 113.0);
        assert_eq!(signal.high_volatility_report.as_deref(), Some("CPI"));
        assert_eq!(signal.next_window, "");
        assert_eq!(signal.summary, "");
    }
}
