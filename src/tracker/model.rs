use crate::geo::Coordinates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shop-leg delivery status.
///
/// Unrecognized strings map to `Other` and are treated as non-terminal;
/// only `delivered` ends live tracking for a leg.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    OutForDelivery,
    Delivered,
    Other,
}

impl OrderStatus {
    pub fn is_delivered(self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out-for-delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Other => "unknown",
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        match s {
            "pending" => OrderStatus::Pending,
            "preparing" => OrderStatus::Preparing,
            "out-for-delivery" => OrderStatus::OutForDelivery,
            "delivered" => OrderStatus::Delivered,
            _ => OrderStatus::Other,
        }
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(OrderStatus::from(s.as_str()))
    }
}

/// GeoJSON-style point. Coordinates are `[longitude, latitude]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    /// Position in (lat, lon) terms; `None` when the array is partial.
    pub fn position(&self) -> Option<Coordinates> {
        let lon = self.coordinates.first().copied()?;
        let lat = self.coordinates.get(1).copied()?;
        Some(Coordinates::new(lat, lon))
    }
}

/// The delivery agent assigned to a shop leg
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryAgent {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    /// Last location the order subsystem knows about (the fallback when
    /// no live broadcast has arrived yet)
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShopInfo {
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShopOrderItem {
    #[serde(default)]
    pub name: String,
}

/// One shop's portion of an order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShopOrder {
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub shop: Option<ShopInfo>,
    #[serde(rename = "shopOrderItems", default)]
    pub items: Vec<ShopOrderItem>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(rename = "assignedDeliveryBoy", default)]
    pub assigned_agent: Option<DeliveryAgent>,
}

/// Where the order is headed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryAddress {
    #[serde(default)]
    pub text: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl DeliveryAddress {
    pub fn position(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Point-in-time read of order state, fetched over request/response.
///
/// Owned by the external order subsystem; the tracking flow treats it as
/// read-only input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderSnapshot {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "shopOrders", default)]
    pub shop_orders: Vec<ShopOrder>,
    #[serde(rename = "deliveryAddress", default)]
    pub delivery_address: Option<DeliveryAddress>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_snapshot() {
        let json = r#"{
            "_id": "ord-1",
            "shopOrders": [{
                "status": "out-for-delivery",
                "shop": { "name": "Pizza Corner" },
                "shopOrderItems": [{ "name": "Margherita" }],
                "subtotal": 250.0,
                "assignedDeliveryBoy": {
                    "_id": "agent-7",
                    "fullName": "R. Das",
                    "mobile": "9999999999",
                    "location": { "type": "Point", "coordinates": [88.30, 22.50] }
                }
            }],
            "deliveryAddress": { "text": "12 Park St", "latitude": 22.55, "longitude": 88.35 },
            "createdAt": "2024-05-01T10:00:00Z"
        }"#;

        let snapshot: OrderSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.id, "ord-1");
        assert_eq!(snapshot.shop_orders.len(), 1);

        let leg = &snapshot.shop_orders[0];
        assert_eq!(leg.status, OrderStatus::OutForDelivery);
        assert!(!leg.status.is_delivered());

        let agent = leg.assigned_agent.as_ref().unwrap();
        assert_eq!(agent.id, "agent-7");
        // GeoJSON order: [lon, lat]
        let pos = agent.location.as_ref().unwrap().position().unwrap();
        assert_eq!(pos.latitude, 22.50);
        assert_eq!(pos.longitude, 88.30);
    }

    #[test]
    fn test_unknown_status_is_non_terminal() {
        let json = r#"{ "_id": "ord-1", "shopOrders": [{ "status": "on-the-way" }] }"#;
        let snapshot: OrderSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.shop_orders[0].status, OrderStatus::Other);
        assert!(!snapshot.shop_orders[0].status.is_delivered());
    }

    #[test]
    fn test_missing_agent_tolerated() {
        let json = r#"{ "_id": "ord-1", "shopOrders": [{ "status": "pending" }] }"#;
        let snapshot: OrderSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.shop_orders[0].assigned_agent.is_none());
    }

    #[test]
    fn test_partial_geopoint_yields_no_position() {
        let point = GeoPoint {
            coordinates: vec![88.30],
        };
        assert!(point.position().is_none());
    }
}
