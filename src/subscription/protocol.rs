use crate::location::LocationUpdate;
use serde::{Deserialize, Serialize};

/// Client → Server message types.
///
/// Frames are JSON text tagged by `type`. Some producers emit the
/// location event as `locationUpdate` instead of `updateLocation`; the
/// two are synonyms.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "identity")]
    Identity {
        #[serde(rename = "agentId")]
        agent_id: String,
    },
    #[serde(rename = "updateLocation", alias = "locationUpdate")]
    UpdateLocation {
        #[serde(rename = "userId")]
        user_id: String,
        latitude: f64,
        longitude: f64,
    },
}

impl ClientMessage {
    /// Identity frame for `agent_id` (sent by clients right after connect)
    pub fn identity(agent_id: &str) -> serde_json::Value {
        serde_json::json!({ "type": "identity", "agentId": agent_id })
    }

    /// Location frame for `agent_id` at (`latitude`, `longitude`)
    pub fn update_location(agent_id: &str, latitude: f64, longitude: f64) -> serde_json::Value {
        serde_json::json!({
            "type": "updateLocation",
            "userId": agent_id,
            "latitude": latitude,
            "longitude": longitude,
        })
    }
}

pub const DELIVERY_LOCATION_TYPE: &str = "updateDeliveryLocation";

/// Server → Client: latest location sample, fanned out to every connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLocationMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(rename = "deliveryBoyId")]
    pub delivery_boy_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LocationUpdate> for DeliveryLocationMessage {
    fn from(update: LocationUpdate) -> Self {
        Self {
            msg_type: DELIVERY_LOCATION_TYPE.to_string(),
            delivery_boy_id: update.agent_id,
            latitude: update.position.latitude,
            longitude: update.position.longitude,
        }
    }
}

/// Server → Client: Error message
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: String) -> Self {
        Self {
            msg_type: "error".to_string(),
            error,
        }
    }
}
