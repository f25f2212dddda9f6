use crate::auth::IdentityPolicy;
use crate::geo::Coordinates;
use crate::location::{LocationRegistry, LocationUpdate};
use crate::subscription::protocol::{ClientMessage, DeliveryLocationMessage, ErrorMessage};
use axum::extract::ws::{Message, WebSocket};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Manages a single WebSocket connection on the hub.
///
/// Lifecycle: connected → identified (after an `identity` frame) →
/// disconnected. Broadcast delivery is global from the moment the socket
/// connects; identification only tags the agent record.
pub struct ConnectionManager {
    /// Hub-assigned id for this connection (tags agent records)
    connection_id: Uuid,
    registry: Arc<LocationRegistry>,
    policy: Arc<dyn IdentityPolicy>,
}

impl ConnectionManager {
    pub fn new(registry: Arc<LocationRegistry>, policy: Arc<dyn IdentityPolicy>) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            registry,
            policy,
        }
    }

    /// Handle WebSocket connection lifecycle
    pub async fn handle(self, mut socket: WebSocket) {
        info!(connection_id = %self.connection_id, "WebSocket connection established");
        self.registry.connection_opened();

        let mut update_rx = self.registry.subscribe();

        loop {
            tokio::select! {
                // Handle incoming client frames
                Some(msg) = socket.recv() => {
                    match msg {
                        Ok(Message::Text(text)) => {
                            if let Err(e) = self.handle_client_message(&mut socket, &text).await {
                                error!(
                                    connection_id = %self.connection_id,
                                    error = %e,
                                    "Error handling client message"
                                );
                            }
                        }
                        Ok(Message::Close(_)) => {
                            info!(connection_id = %self.connection_id, "WebSocket client disconnected");
                            break;
                        }
                        Ok(Message::Ping(data)) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                error!(error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Ok(_) => {
                            // Ignore binary, pong messages
                        }
                        Err(e) => {
                            warn!(connection_id = %self.connection_id, error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                // Fan out location updates from the broadcast channel.
                // Every connection receives every update; filtering by
                // agent is the consumer's responsibility.
                result = update_rx.recv() => {
                    match result {
                        Ok(update) => {
                            if let Err(e) = self.send_location_update(&mut socket, update).await {
                                error!(error = %e, "Failed to send location update");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // At-most-once contract: skipping is allowed
                            warn!(
                                connection_id = %self.connection_id,
                                skipped = skipped,
                                "WebSocket lagged, skipped updates"
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            error!("Location broadcast channel closed");
                            break;
                        }
                    }
                }

                else => {
                    break;
                }
            }
        }

        // Explicit close or network drop: either way the agent(s) tagged
        // with this connection go offline
        self.registry.clear_connection(self.connection_id);
        self.registry.connection_closed();
        info!(connection_id = %self.connection_id, "WebSocket connection closed");
    }

    /// Handle client frame (identity / updateLocation)
    async fn handle_client_message(
        &self,
        socket: &mut WebSocket,
        text: &str,
    ) -> anyhow::Result<()> {
        let msg: ClientMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                // Malformed frames are dropped; the connection stays up
                warn!(connection_id = %self.connection_id, error = %e, "Dropping malformed frame");
                let err = serde_json::to_string(&ErrorMessage::new(format!(
                    "malformed frame: {}",
                    e
                )))?;
                let _ = socket.send(Message::Text(err)).await;
                return Ok(());
            }
        };

        match msg {
            ClientMessage::Identity { agent_id } => {
                if !self.policy.authorize(&agent_id, self.connection_id) {
                    warn!(
                        connection_id = %self.connection_id,
                        agent_id = %agent_id,
                        "Identity claim rejected by policy"
                    );
                    return Ok(());
                }
                self.registry.mark_online(&agent_id, self.connection_id);
            }
            ClientMessage::UpdateLocation {
                user_id,
                latitude,
                longitude,
            } => {
                self.registry.apply_update(
                    &user_id,
                    Coordinates::new(latitude, longitude),
                    self.connection_id,
                );
            }
        }

        Ok(())
    }

    /// Send location update to client
    async fn send_location_update(
        &self,
        socket: &mut WebSocket,
        update: LocationUpdate,
    ) -> anyhow::Result<()> {
        let msg = DeliveryLocationMessage::from(update);
        let json = serde_json::to_string(&msg)?;
        socket.send(Message::Text(json)).await?;
        Ok(())
    }
}
