// WebSocket client connector with bounded exponential backoff.
//
// Attempt delays double from `base_delay` up to `max_delay`. Exhausting
// the retry budget is a persistent connectivity error, distinct from the
// transient per-attempt failures that precede it.

use crate::config::SocketConfig;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::warn;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Reconnect budget for a socket client
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl BackoffPolicy {
    pub fn from_config(config: &SocketConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Delay before retry number `retry` (0-based): base × 2^retry,
    /// capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&SocketConfig::default())
    }
}

/// Socket connect errors
#[derive(Debug)]
pub enum ConnectError {
    /// Retry budget exhausted; the caller should surface a persistent
    /// connectivity error rather than keep spinning
    Exhausted { attempts: u32, last_error: String },
}

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectError::Exhausted {
                attempts,
                last_error,
            } => write!(
                f,
                "socket connection failed after {} attempts: {}",
                attempts, last_error
            ),
        }
    }
}

impl std::error::Error for ConnectError {}

/// Connect to `url`, retrying per `policy`.
pub async fn connect_with_backoff(
    url: &str,
    policy: &BackoffPolicy,
) -> Result<WsStream, ConnectError> {
    let attempts = policy.max_retries + 1;
    let mut last_error = String::new();

    for attempt in 0..attempts {
        if attempt > 0 {
            tokio::time::sleep(policy.delay_for(attempt - 1)).await;
        }

        match connect_async(url).await {
            Ok((stream, _)) => return Ok(stream),
            Err(e) => {
                warn!(url = %url, attempt = attempt + 1, error = %e, "Socket connection failed");
                last_error = e.to_string();
            }
        }
    }

    Err(ConnectError::Exhausted {
        attempts,
        last_error,
    })
}
