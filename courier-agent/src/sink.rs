//! Hub-facing sink: socket push plus HTTP companion write.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use courier::geo::Coordinates;
use courier::net::{connect_with_backoff, BackoffPolicy, WsStream};
use courier::publisher::LocationSink;
use courier::subscription::ClientMessage;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Pushes accepted samples to the hub.
///
/// The socket frame is the low-latency fan-out path; the HTTP write
/// persists the sample. Either succeeding counts as a delivered update —
/// only both failing bubbles up to the publisher's failure-streak log.
pub struct HubSink {
    agent_id: String,
    ws_url: String,
    http_url: String,
    policy: BackoffPolicy,
    client: reqwest::Client,
    /// Write half of the live hub connection; None until (re)connected
    ws: Mutex<Option<SplitSink<WsStream, Message>>>,
}

impl HubSink {
    pub fn new(
        agent_id: impl Into<String>,
        ws_url: impl Into<String>,
        http_url: impl Into<String>,
        policy: BackoffPolicy,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build hub HTTP client")?;

        Ok(Self {
            agent_id: agent_id.into(),
            ws_url: ws_url.into(),
            http_url: http_url.into(),
            policy,
            client,
            ws: Mutex::new(None),
        })
    }

    /// Connect with backoff, identify, and park the read half in a
    /// drain task.
    async fn connect(&self) -> Result<SplitSink<WsStream, Message>> {
        let stream = connect_with_backoff(&self.ws_url, &self.policy).await?;
        let (mut sink, read) = stream.split();

        let frame = ClientMessage::identity(&self.agent_id).to_string();
        sink.send(Message::Text(frame))
            .await
            .context("Identity frame send failed")?;

        tokio::spawn(drain(read));
        debug!(agent_id = %self.agent_id, "Connected and identified to hub");
        Ok(sink)
    }

    async fn push_socket(&self, frame: String) -> Result<()> {
        let mut guard = self.ws.lock().await;

        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }

        let sink = guard.as_mut().unwrap();
        if let Err(e) = sink.send(Message::Text(frame)).await {
            // Dead connection: reconnect on the next send
            *guard = None;
            return Err(e).context("Socket push failed");
        }

        Ok(())
    }

    async fn push_http(&self, agent_id: &str, position: Coordinates) -> Result<()> {
        let url = format!("{}/api/location", self.http_url.trim_end_matches('/'));

        self.client
            .post(&url)
            .json(&serde_json::json!({
                "agentId": agent_id,
                "lat": position.latitude,
                "lon": position.longitude,
            }))
            .send()
            .await
            .context("Location write request failed")?
            .error_for_status()
            .context("Location write rejected")?;

        Ok(())
    }
}

/// Incoming broadcast frames are irrelevant to the agent daemon; reading
/// them keeps the connection's ping/pong machinery serviced.
async fn drain(mut read: SplitStream<WsStream>) {
    while let Some(msg) = read.next().await {
        if msg.is_err() {
            break;
        }
    }
    debug!("Hub read stream closed");
}

#[async_trait]
impl LocationSink for HubSink {
    async fn send(&self, agent_id: &str, position: Coordinates) -> Result<()> {
        let frame =
            ClientMessage::update_location(agent_id, position.latitude, position.longitude)
                .to_string();

        let socket_result = self.push_socket(frame).await;
        if let Err(e) = &socket_result {
            warn!(error = %e, "Socket push failed, relying on HTTP write");
        }

        let http_result = self.push_http(agent_id, position).await;

        match (socket_result, http_result) {
            (Err(socket_err), Err(http_err)) => {
                bail!("both paths failed: {}; {}", socket_err, http_err)
            }
            _ => Ok(()),
        }
    }
}
