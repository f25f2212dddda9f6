use anyhow::{Context, Result};
use courier::config::{load_config, CourierConfig};
use courier::net::BackoffPolicy;
use courier::publisher::{LocationPublisher, LocationThrottle};
use courier_agent::feed::parse_sample_line;
use courier_agent::sink::HubSink;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_agent=info,courier=info".into()),
        )
        .init();

    info!("Courier agent starting...");

    // Read configuration from environment
    let agent_id = std::env::var("COURIER_AGENT_ID").context("COURIER_AGENT_ID is required")?;

    let ws_url = std::env::var("COURIER_HUB_WS_URL")
        .unwrap_or_else(|_| "ws://localhost:5000/api/ws".to_string());

    let http_url = std::env::var("COURIER_HUB_HTTP_URL")
        .unwrap_or_else(|_| "http://localhost:5000".to_string());

    let config = match std::env::var("COURIER_CONFIG") {
        Ok(path) => load_config(&path)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to load config from {}", path))?,
        Err(_) => CourierConfig::default(),
    };

    info!(
        agent_id = %agent_id,
        ws_url = %ws_url,
        http_url = %http_url,
        "Configuration loaded"
    );

    let sink = Arc::new(HubSink::new(
        agent_id.as_str(),
        ws_url.as_str(),
        http_url.as_str(),
        BackoffPolicy::from_config(&config.socket),
    )?);

    let publisher = LocationPublisher::new(
        agent_id.clone(),
        LocationThrottle::from_config(&config.throttle),
        sink,
    );

    // Feed geolocation samples from stdin; EOF ends the session and
    // releases the publisher loop
    let (sample_tx, sample_rx) = mpsc::channel(32);
    let feed_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            match parse_sample_line(&line) {
                Ok(sample) => {
                    if sample_tx.send(sample).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, line = %line, "Skipping malformed sample"),
            }
        }
        // sample_tx drops here; the publisher sees the stream close
    });

    tokio::select! {
        sent = publisher.run(sample_rx) => {
            info!(sent = sent, "Sample feed ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    feed_task.abort();
    info!("Courier agent stopped");

    Ok(())
}
