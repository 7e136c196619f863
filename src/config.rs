//! # config — read Config from Environment Variables
//!
//! The whole run is parameterised by one [`Config`] value built here and
//! passed down explicitly. Nothing else reads the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::SignalError;

/// Reasoning-service provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,   // chat-completions API
    Claude,   // Anthropic messages API
}

impl AiProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4-turbo",
            AiProvider::Claude => "claude-3-5-sonnet-20241022",
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiProvider::OpenAi => write!(f, "OpenAI"),
            AiProvider::Claude => write!(f, "Claude"),
        }
    }
}

/// Which fallback tiers are available to the decider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// ATR/pivot levels + AI decision, neutral numeric fallback.
    Full,
    /// Same, plus the daily trend-band rule when the AI is unavailable.
    DirectionOnly,
}

/// A currency pair such as `USD/JPY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyPair {
    pub base:  String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn parse(raw: &str) -> Result<Self, SignalError> {
        let cleaned: String = raw.trim().to_uppercase();
        let (base, quote) = match cleaned.split_once('/') {
            Some((b, q)) => (b.trim().to_string(), q.trim().to_string()),
            None if cleaned.len() == 6 && cleaned.is_ascii() => (cleaned[..3].to_string(), cleaned[3..].to_string()),
            None => return Err(SignalError::Configuration(format!("SIGNAL_PAIR '{raw}' is not BASE/QUOTE"))),
        };

        let valid = |c: &str| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic());
        if !valid(&base) || !valid(&quote) {
            return Err(SignalError::Configuration(format!("SIGNAL_PAIR '{raw}' is not BASE/QUOTE")));
        }

        Ok(Self { base, quote })
    }
}

impl std::fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Everything one signal cycle needs
#[derive(Debug, Clone)]
pub struct Config {
    pub ai_provider:      AiProvider,
    /// Reasoning-service credential (required)
    pub ai_api_key:       String,
    pub ai_model:         String,
    pub ai_timeout:       Duration,
    /// Calendar credential; without it the calendar stage is skipped
    pub calendar_api_key: Option<String>,
    pub calendar_url:     String,
    pub market_url:       String,
    /// Market-data symbol, e.g. "JPY=X"
    pub symbol:           String,
    pub pair:             CurrencyPair,
    pub output_path:      PathBuf,
    pub mode:             PipelineMode,
    pub price_decimals:   usize,
    pub data_timeout:     Duration,
    /// Repeat the cycle on this period; `None` = run once
    pub interval:         Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, SignalError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SignalError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let ai_provider = match get("AI_PROVIDER").unwrap_or_else(|| "openai".to_string()).to_lowercase().as_str() {
            "openai" => AiProvider::OpenAi,
            "claude" => AiProvider::Claude,
            other => {
                return Err(SignalError::Configuration(format!(
                    "Unknown AI_PROVIDER: '{other}'. Use 'openai' or 'claude'"
                )))
            }
        };

        let ai_api_key = get("AI_API_KEY")
            .or_else(|| get("OPENAI_API_KEY"))
            .ok_or_else(|| SignalError::Configuration("AI_API_KEY environment variable is required".into()))?;

        let mode = match get("SIGNAL_MODE").unwrap_or_else(|| "full".to_string()).to_lowercase().as_str() {
            "full" => PipelineMode::Full,
            "direction-only" | "direction_only" => PipelineMode::DirectionOnly,
            other => {
                return Err(SignalError::Configuration(format!(
                    "Unknown SIGNAL_MODE: '{other}'. Use 'full' or 'direction-only'"
                )))
            }
        };

        let pair = CurrencyPair::parse(&get("SIGNAL_PAIR").unwrap_or_else(|| "USD/JPY".to_string()))?;

        let interval = match get("SIGNAL_INTERVAL_SECS") {
            Some(raw) => match parse_number::<u64>(&raw, "SIGNAL_INTERVAL_SECS")? {
                0 => {
                    return Err(SignalError::Configuration(
                        "SIGNAL_INTERVAL_SECS must be greater than 0 (unset it to run once)".to_string(),
                    ))
                }
                secs => Some(Duration::from_secs(secs)),
            },
            None => None,
        };

        Ok(Self {
            ai_provider,
            ai_api_key,
            ai_model:         get("AI_MODEL").unwrap_or_else(|| ai_provider.default_model().to_string()),
            ai_timeout:       Duration::from_secs(parse_or(get("AI_TIMEOUT_SECS"), "AI_TIMEOUT_SECS", 30)?),
            calendar_api_key: get("CALENDAR_API_KEY").or_else(|| get("FMP_API_KEY")),
            calendar_url:     get("CALENDAR_URL")
                .unwrap_or_else(|| "https://financialmodelingprep.com/stable/economic-calendar".to_string()),
            market_url:       get("MARKET_URL")
                .unwrap_or_else(|| "https://query1.finance.yahoo.com/v8/finance/chart".to_string()),
            symbol:           get("SIGNAL_SYMBOL").unwrap_or_else(|| "JPY=X".to_string()),
            pair,
            output_path:      PathBuf::from(get("SIGNAL_OUTPUT").unwrap_or_else(|| "usdjpy.json".to_string())),
            mode,
            price_decimals:   parse_or(get("SIGNAL_PRICE_DECIMALS"), "SIGNAL_PRICE_DECIMALS", 4)?,
            data_timeout:     Duration::from_secs(parse_or(get("DATA_TIMEOUT_SECS"), "DATA_TIMEOUT_SECS", 10)?),
            interval,
        })
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T, SignalError> {
    raw.parse()
        .map_err(|_| SignalError::Configuration(format!("{key} must be a number, got '{raw}'")))
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, SignalError> {
    match raw {
        Some(raw) => parse_number(&raw, key),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, SignalError::Configuration(_)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.ai_provider, AiProvider::OpenAi);
        assert_eq!(config.ai_model, "gpt-4-turbo");
        assert_eq!(config.symbol, "JPY=X");
        assert_eq!(config.pair.to_string(), "USD/JPY");
        assert_eq!(config.mode, PipelineMode::Full);
        assert_eq!(config.price_decimals, 4);
        assert_eq!(config.data_timeout, Duration::from_secs(10));
        assert!(config.calendar_api_key.is_none());
        assert!(config.interval.is_none());
    }

    #[test]
    fn test_claude_and_direction_only() {
        let config = Config::from_lookup(lookup(&[
            ("AI_API_KEY", "key"),
            ("AI_PROVIDER", "Claude"),
            ("SIGNAL_MODE", "direction-only"),
            ("SIGNAL_PAIR", "eurusd"),
            ("SIGNAL_INTERVAL_SECS", "3600"),
        ]))
        .unwrap();
        assert_eq!(config.ai_provider, AiProvider::Claude);
        assert_eq!(config.ai_model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.mode, PipelineMode::DirectionOnly);
        assert_eq!(config.pair, CurrencyPair { base: "EUR".into(), quote: "USD".into() });
        assert_eq!(config.interval, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_bad_number_rejected() {
        let err = Config::from_lookup(lookup(&[("AI_API_KEY", "key"), ("AI_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, SignalError::Configuration(_)));
    }

    #[test]
    fn test_bad_pair_rejected() {
        assert!(CurrencyPair::parse("USD-JPY!").is_err());
        assert!(CurrencyPair::parse("US/JPY").is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = Config::from_lookup(lookup(&[("AI_API_KEY", "key"), ("SIGNAL_INTERVAL_SECS", "0")])).unwrap_err();
        assert!(matches!(err, SignalError::Configuration(ref msg) if msg.contains("SIGNAL_INTERVAL_SECS")));
    }
}
