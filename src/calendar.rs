//! # calendar — today's macro events
//!
//! Fetches the economic calendar for the current UTC date and reduces it to
//! the high-volatility line. Failures never stop the run: no key, a network
//! error or a garbled payload all mean "no events".

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::calendar_filter::high_volatility_report;
use crate::error::SignalError;
use crate::models::{decode_events, CalendarEvent};

pub struct CalendarClient<'a> {
    client: reqwest::Client,
    config: &'a Config,
}

impl<'a> CalendarClient<'a> {
    pub fn new(client: reqwest::Client, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// Raw events for `day`.
    pub async fn fetch_events(&self, day: NaiveDate) -> Result<Vec<CalendarEvent>, SignalError> {
        let Some(api_key) = self.config.calendar_api_key.as_deref() else {
            return Err(SignalError::retrieval("calendar", "no calendar API key configured"));
        };

        let day = day.format("%Y-%m-%d").to_string();
        let resp = self
            .client
            .get(&self.config.calendar_url)
            .query(&[("from", day.as_str()), ("to", day.as_str()), ("apikey", api_key)])
            .timeout(self.config.data_timeout)
            .send()
            .await
            .map_err(|e| SignalError::retrieval("calendar", e))?;

        if !resp.status().is_success() {
            return Err(SignalError::retrieval("calendar", format!("HTTP {}", resp.status())));
        }

        let payload: serde_json::Value = resp.json().await.map_err(|e| SignalError::retrieval("calendar", e))?;
        let Some(records) = payload.as_array() else {
            return Err(SignalError::retrieval("calendar", "payload is not a JSON array"));
        };

        let events = decode_events(records);
        debug!(records = records.len(), decoded = events.len(), "Calendar fetched");
        Ok(events)
    }

    /// High-volatility line for `day`; `None` on any failure or when quiet.
    pub async fn high_volatility_report(&self, day: NaiveDate) -> Option<String> {
        let events = match self.fetch_events(day).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Calendar unavailable — continuing with no events");
                return None;
            }
        };

        let report = high_volatility_report(&events, &self.config.pair, day);
        info!(report = report.as_deref().unwrap_or("None"), "High-volatility events");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
    }

    fn make_config(vars: &[(&str, &str)]) -> Config {
        let vars: Vec<(String, String)> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(move |key| {
            vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    /// Answers a single request with `body` as a JSON 200.
    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_missing_key_means_no_events() {
        let config = make_config(&[("AI_API_KEY", "test")]);
        let calendar = CalendarClient::new(reqwest::Client::new(), &config);

        let err = calendar.fetch_events(today()).await.unwrap_err();
        assert!(matches!(err, SignalError::Retrieval { stage: "calendar", .. }));
        assert_eq!(calendar.high_volatility_report(today()).await, None);
    }

    #[tokio::test]
    async fn test_unreachable_calendar_means_no_events() {
        let config = make_config(&[
            ("AI_API_KEY", "test"),
            ("CALENDAR_API_KEY", "test"),
            ("CALENDAR_URL", "http://127.0.0.1:1"),
            ("DATA_TIMEOUT_SECS", "2"),
        ]);
        let calendar = CalendarClient::new(reqwest::Client::new(), &config);
        assert_eq!(calendar.high_volatility_report(today()).await, None);
    }

    #[tokio::test]
    async fn test_non_array_payload_means_no_events() {
        let url = serve_once(r#"{"Error Message":"Invalid API KEY"}"#).await;
        let config = make_config(&[("AI_API_KEY", "test"), ("CALENDAR_API_KEY", "test"), ("CALENDAR_URL", url.as_str())]);
        let calendar = CalendarClient::new(reqwest::Client::new(), &config);
        assert_eq!(calendar.high_volatility_report(today()).await, None);
    }

    #[tokio::test]
    async fn test_served_events_are_filtered() {
        let url = serve_once(
            r#"[
                {"date":"2024-05-03 12:30:00","country":"US","event":"Nonfarm Payrolls","impact":"High"},
                {"date":"2024-05-03 09:00:00","country":"DE","event":"Ifo Business Climate","impact":"High"},
                {"date":"2024-05-03 14:00:00","country":"US","event":"Baker Hughes Rig Count","impact":"Low"},
                {"garbage":true}
            ]"#,
        )
        .await;
        let config = make_config(&[("AI_API_KEY", "test"), ("CALENDAR_API_KEY", "test"), ("CALENDAR_URL", url.as_str())]);
        let calendar = CalendarClient::new(reqwest::Client::new(), &config);

        assert_eq!(calendar.high_volatility_report(today()).await.as_deref(), Some("Nonfarm Payrolls"));
    }
}
