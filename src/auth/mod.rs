use std::collections::HashSet;
use uuid::Uuid;


/// Authorization hook for identity claims.
///
/// The hub does not verify that a connection claiming an agent id is
/// entitled to it — that trust boundary is inherited from the source
/// system. Deployments that need verification inject their own policy;
/// the hub logs and ignores rejected claims without closing the
/// connection.
pub trait IdentityPolicy: Send + Sync {
    /// Returns true if `connection_id` may register as `agent_id`.
    fn authorize(&self, agent_id: &str, connection_id: Uuid) -> bool;
}

/// Accepts every identity claim (the default).
pub struct AllowAny;

impl IdentityPolicy for AllowAny {
    fn authorize(&self, _agent_id: &str, _connection_id: Uuid) -> bool {
        true
    }
}

/// Accepts claims only for a fixed set of agent ids.
pub struct AgentAllowList {
    agents: HashSet<String>,
}

impl AgentAllowList {
    pub fn new<I, S>(agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            agents: agents.into_iter().map(Into::into).collect(),
        }
    }
}

impl IdentityPolicy for AgentAllowList {
    fn authorize(&self, agent_id: &str, _connection_id: Uuid) -> bool {
        self.agents.contains(agent_id)
    }
}
