//! # fxsignal — Intraday FX Signal Generator
//!
//! Produces one JSON trading-signal artifact per run for a currency pair.
//!
//! ## Flow
//! ```text
//! each run:
//!   1. Fetch today's calendar → high-impact domestic events
//!   2. Fetch 1h bars (7d) → ATR14 / pivot / S1 / R1 → SL / TP levels
//!   3. Build prompt → call OpenAI / Claude (temperature 0)
//!   4. Validate JSON → Signal   (any failure → neutral / trend-rule fallback)
//!   5. Write artifact (tmp + rename)
//! ```
//!
//! Only a missing/invalid configuration or a failed artifact write exits
//! non-zero. With `SIGNAL_INTERVAL_SECS` set the run repeats on that period,
//! and a failed write is logged and retried on the next run instead.

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tracing::{error, info, Instrument};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod ai;
mod artifact;
mod calendar;
mod config;
mod engine;
mod error;
mod market;
mod models;
mod pipeline;
mod prompt;
mod response;

use ai::LlmOracle;
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("fxsignal=debug".parse()?)
            .add_directive("reqwest=warn".parse()?))
        .init();

    let config = Config::from_env().context("Failed to load config")?;
    let client = reqwest::Client::new();
    let oracle = LlmOracle::new(client.clone(), &config);

    info!(
        symbol   = %config.symbol,
        pair     = %config.pair,
        provider = %config.ai_provider,
        model    = %config.ai_model,
        mode     = ?config.mode,
        output   = %config.output_path.display(),
        "fxsignal started"
    );

    loop {
        let run_id = uuid::Uuid::new_v4();
        let outcome = run_once(&config, &client, &oracle)
            .instrument(tracing::info_span!("run", %run_id))
            .await;

        let Some(interval) = next_run(outcome, config.interval)? else {
            return Ok(());
        };

        info!(interval = ?interval, "💤 Sleeping until next run...");
        tokio::time::sleep(interval).await;
    }
}

/// Decide what follows a run: `Ok(None)` to exit, `Ok(Some(interval))` to
/// sleep. A failure only ends the process in run-once mode.
fn next_run(outcome: anyhow::Result<()>, interval: Option<Duration>) -> anyhow::Result<Option<Duration>> {
    match (outcome, interval) {
        (Err(e), None) => Err(e),
        (Err(e), Some(interval)) => {
            error!(error = %format!("{e:#}"), "❌ Signal run failed — will retry next interval");
            Ok(Some(interval))
        }
        (Ok(()), interval) => Ok(interval),
    }
}

/// One cycle: resolve a signal, then write it. Only the write can fail.
async fn run_once(config: &Config, client: &reqwest::Client, oracle: &LlmOracle) -> anyhow::Result<()> {
    info!("Signal run starting...");

    let today = Utc::now().date_naive();
    let resolution = pipeline::run_cycle(config, client, oracle, today).await;

    artifact::write_signal(&config.output_path, resolution.signal())
        .map_err(|e| {
            error!(error = %e, "❌ Artifact write failed");
            e
        })
        .context("Failed to write signal artifact")?;

    Ok(())
}
