use crate::geo::Coordinates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Last-known state for a single delivery agent.
///
/// Ephemeral: overwritten on every accepted sample, never averaged.
/// The connection tag is cleared when the owning socket closes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Agent identifier (the delivery participant being tracked)
    pub agent_id: String,

    /// Latest reported position, if any sample has arrived
    pub position: Option<Coordinates>,

    /// True while a live connection is tagged to this agent
    pub is_online: bool,

    /// Connection currently claiming this agent
    pub connection_id: Option<Uuid>,

    /// Last update timestamp
    pub last_updated: DateTime<Utc>,
}

/// Location update broadcast to every connected client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub agent_id: String,
    pub position: Coordinates,
    pub timestamp: DateTime<Utc>,
}
