use anyhow::{Context, Result};
use futures_util::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite;

use super::types::BinanceTradeEvent;
use crate::model::tick::Tick;
use crate::storage::TickAppender;

/// Exponential backoff for reconnection.
#[derive(Debug)]
struct ExponentialBackoff {
    current: Duration,
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            current: initial,
            initial,
            max,
            factor,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::from_secs_f64(
            (self.current.as_secs_f64() * self.factor).min(self.max.as_secs_f64()),
        );
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Streams live trades for one symbol and appends them to a CSV file.
pub struct TradeRecorder {
    url: String,
    output_path: PathBuf,
}

impl TradeRecorder {
    pub fn new(ws_base_url: &str, symbol: &str, output_path: impl Into<PathBuf>) -> Self {
        Self {
            url: format!(
                "{}/{}@trade",
                ws_base_url.trim_end_matches('/'),
                symbol.to_ascii_lowercase()
            ),
            output_path: output_path.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Record until `shutdown` flips, reconnecting with backoff on errors.
    /// Returns the number of ticks written.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<u64> {
        let mut appender = TickAppender::open(&self.output_path)
            .with_context(|| format!("failed to open {}", self.output_path.display()))?;
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 2.0);
        let mut attempt: u32 = 0;
        let mut written: u64 = 0;

        loop {
            attempt += 1;
            match self
                .connect_once(&mut appender, &mut written, &mut backoff, &mut shutdown)
                .await
            {
                Ok(()) => break,
                Err(e) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Trade stream dropped, reconnecting"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = shutdown.changed() => {
                            tracing::info!("Shutdown during reconnect");
                            break;
                        }
                    }
                }
            }
        }

        appender.flush()?;
        tracing::info!(written, path = %self.output_path.display(), "Trade recorder stopped");
        Ok(written)
    }

    async fn connect_once(
        &self,
        appender: &mut TickAppender,
        written: &mut u64,
        backoff: &mut ExponentialBackoff,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        tracing::info!(url = %self.url, "Connecting trade stream");
        let (ws_stream, _resp) = tokio_tungstenite::connect_async(&self.url)
            .await
            .context("WebSocket connect failed")?;
        backoff.reset();
        tracing::info!("Trade stream connected");

        let (_write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            if record_message(appender, &text)? {
                                *written += 1;
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(anyhow::anyhow!("WebSocket read error: {}", e));
                        }
                        None => {
                            return Err(anyhow::anyhow!("WebSocket stream ended"));
                        }
                    }
                }
                _ = shutdown.changed() => {
                    return Ok(());
                }
            }
        }
    }
}

/// Append the trade in `text`, if any, and flush it to disk right away.
fn record_message(appender: &mut TickAppender, text: &str) -> Result<bool> {
    let Some(tick) = decode_trade(text) else {
        return Ok(false);
    };
    appender.append(&tick)?;
    appender.flush()?;
    Ok(true)
}

fn decode_trade(text: &str) -> Option<Tick> {
    match serde_json::from_str::<BinanceTradeEvent>(text) {
        Ok(event) => Some(Tick::from(&event)),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse WS message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_max_and_resets() {
        let mut b = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(5), 2.0);
        assert_eq!(b.next_delay(), Duration::from_secs(1));
        assert_eq!(b.next_delay(), Duration::from_secs(2));
        assert_eq!(b.next_delay(), Duration::from_secs(4));
        assert_eq!(b.next_delay(), Duration::from_secs(5));
        assert_eq!(b.next_delay(), Duration::from_secs(5));
        b.reset();
        assert_eq!(b.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn stream_url_uses_lowercase_symbol() {
        let rec = TradeRecorder::new("wss://stream.binance.com:9443/ws/", "BTCUSDT", "x.csv");
        assert_eq!(rec.url(), "wss://stream.binance.com:9443/ws/btcusdt@trade");
    }

    #[test]
    fn recorded_trades_reach_disk_before_shutdown() {
        let path = std::env::temp_dir().join(format!(
            "ts-recorder-flush-{}.csv",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock should be monotonic")
                .as_nanos()
        ));
        let mut appender = TickAppender::open(&path).unwrap();
        let trade = r#"{"e":"trade","E":9,"s":"BTCUSDT","t":3,"p":"101.25","q":"0.5","T":7,"m":true}"#;
        assert!(record_message(&mut appender, trade).unwrap());
        assert!(!record_message(&mut appender, r#"{"result":null,"id":1}"#).unwrap());

        // appender still open: the row must already be readable
        let ticks = crate::storage::read_ticks(&path).unwrap();
        assert_eq!(ticks, vec![Tick::new(7, 101.25, 0.5)]);
        drop(appender);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn decode_skips_non_trade_payloads() {
        assert!(decode_trade(r#"{"result":null,"id":1}"#).is_none());
        let tick = decode_trade(
            r#"{"e":"trade","E":2,"s":"BTCUSDT","t":1,"p":"50000.5","q":"0.01","T":1,"m":false}"#,
        )
        .unwrap();
        assert_eq!(tick.timestamp_ms, 1);
        assert!((tick.price - 50000.5).abs() < f64::EPSILON);
    }
}
