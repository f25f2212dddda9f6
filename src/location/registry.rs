use crate::geo::Coordinates;
use crate::location::record::{AgentRecord, LocationUpdate};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

/// Registry maintains the in-memory last-known location per agent.
///
/// Writes go through the DashMap entry API, so two updates for the same
/// agent serialize on the shard lock: last write wins even off a
/// single-threaded event loop.
pub struct LocationRegistry {
    /// Lock-free concurrent map for fast reads
    pub(crate) agents: Arc<DashMap<String, AgentRecord>>,

    /// Broadcast channel fanning location updates out to every connection
    update_tx: broadcast::Sender<LocationUpdate>,

    /// Currently open socket connections
    open_connections: AtomicU64,

    /// Location frames relayed since startup
    frames_relayed: AtomicU64,
}

/// Point-in-time registry counters (served by the health endpoint).
#[derive(Clone, Copy, Debug, serde::Serialize)]
pub struct RegistryStats {
    pub agents: usize,
    pub open_connections: u64,
    pub frames_relayed: u64,
    pub subscribers: usize,
}

impl LocationRegistry {
    /// Create new registry with broadcast channel
    pub fn new() -> Self {
        let (update_tx, _) = broadcast::channel(1024);

        Self {
            agents: Arc::new(DashMap::new()),
            update_tx,
            open_connections: AtomicU64::new(0),
            frames_relayed: AtomicU64::new(0),
        }
    }

    /// Register `connection_id` as the live connection for `agent_id`.
    ///
    /// Idempotent; a fresh registration overwrites a stale one, so at most
    /// one connection id is tagged per agent.
    pub fn mark_online(&self, agent_id: &str, connection_id: Uuid) {
        let now = Utc::now();

        let mut record = self
            .agents
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentRecord {
                agent_id: agent_id.to_string(),
                position: None,
                is_online: false,
                connection_id: None,
                last_updated: now,
            });

        record.is_online = true;
        record.connection_id = Some(connection_id);
        record.last_updated = now;

        info!(agent_id = %agent_id, connection_id = %connection_id, "Agent marked online");
    }

    /// Overwrite the agent's last-known location and broadcast it.
    ///
    /// Replaces any previous value (no averaging), re-tags the record
    /// online with `connection_id`, then fans the update out to every
    /// subscriber. At-most-once: send errors (no subscribers) are ignored.
    pub fn apply_update(
        &self,
        agent_id: &str,
        position: Coordinates,
        connection_id: Uuid,
    ) -> LocationUpdate {
        let now = Utc::now();

        let mut record = self
            .agents
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentRecord {
                agent_id: agent_id.to_string(),
                position: None,
                is_online: false,
                connection_id: None,
                last_updated: now,
            });

        record.position = Some(position);
        record.is_online = true;
        record.connection_id = Some(connection_id);
        record.last_updated = now;
        drop(record);

        let update = LocationUpdate {
            agent_id: agent_id.to_string(),
            position,
            timestamp: now,
        };

        self.frames_relayed.fetch_add(1, Ordering::Relaxed);
        let _ = self.update_tx.send(update.clone());

        update
    }

    /// Store a location sample without broadcasting.
    ///
    /// The HTTP companion write path: persists the latest sample but
    /// leaves fan-out to the socket path. Online flag and connection tag
    /// are untouched.
    pub fn store_position(&self, agent_id: &str, position: Coordinates) {
        let now = Utc::now();

        let mut record = self
            .agents
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentRecord {
                agent_id: agent_id.to_string(),
                position: None,
                is_online: false,
                connection_id: None,
                last_updated: now,
            });

        record.position = Some(position);
        record.last_updated = now;
    }

    /// Clear online flag and connection tag for every agent tagged with
    /// `connection_id`. Returns the number of agents cleared.
    ///
    /// At most one agent should carry a given connection id, but if
    /// several do, all are cleared.
    pub fn clear_connection(&self, connection_id: Uuid) -> usize {
        let mut cleared = 0;

        for mut record in self.agents.iter_mut() {
            if record.connection_id == Some(connection_id) {
                record.is_online = false;
                record.connection_id = None;
                record.last_updated = Utc::now();
                cleared += 1;
            }
        }

        if cleared > 0 {
            info!(connection_id = %connection_id, agents = cleared, "Connection cleared");
        }

        cleared
    }

    /// Get agent record by ID
    pub fn get(&self, agent_id: &str) -> Option<AgentRecord> {
        self.agents.get(agent_id).map(|r| r.clone())
    }

    /// Subscribe to location update broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<LocationUpdate> {
        self.update_tx.subscribe()
    }

    pub fn connection_opened(&self) {
        self.open_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.open_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            agents: self.agents.len(),
            open_connections: self.open_connections.load(Ordering::Relaxed),
            frames_relayed: self.frames_relayed.load(Ordering::Relaxed),
            subscribers: self.update_tx.receiver_count(),
        }
    }
}

impl Default for LocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
