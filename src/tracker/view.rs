use crate::geo::{haversine_km, Coordinates};
use crate::subscription::protocol::{DeliveryLocationMessage, DELIVERY_LOCATION_TYPE};
use crate::tracker::model::OrderSnapshot;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Derived display values for one shop leg
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteStats {
    pub distance_km: f64,
    pub eta_minutes: u32,
}

impl RouteStats {
    /// Distance and ETA from `agent` to `destination` at the assumed
    /// courier speed. ETA is clamped to at least one minute.
    pub fn compute(agent: Coordinates, destination: Coordinates, speed_kmph: f64) -> Self {
        let distance_km = haversine_km(agent, destination);
        let eta_minutes = ((distance_km / speed_kmph) * 60.0).round().max(1.0) as u32;

        Self {
            distance_km,
            eta_minutes,
        }
    }

    /// Distance rendered to two decimals, in km
    pub fn distance_label(&self) -> String {
        format!("{:.2}", self.distance_km)
    }
}

/// Client-side tracking state for one order.
///
/// Two independent, eventually-reconciled inputs: the polled order
/// snapshot and the live broadcast feed. Broadcasts may describe agents
/// the snapshot has not named yet; they are retained and simply inert
/// until a poll catches up.
pub struct TrackingView {
    order_id: String,
    assumed_speed_kmph: f64,
    order: Option<OrderSnapshot>,
    /// agent id → last broadcast position, independent of the snapshot
    live: HashMap<String, Coordinates>,
    last_updated: Option<DateTime<Utc>>,
    fetch_failures: u64,
    fetch_error: Option<String>,
}

impl TrackingView {
    pub fn new(order_id: impl Into<String>, assumed_speed_kmph: f64) -> Self {
        Self {
            order_id: order_id.into(),
            assumed_speed_kmph,
            order: None,
            live: HashMap::new(),
            last_updated: None,
            fetch_failures: 0,
            fetch_error: None,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Replace the polled snapshot and clear the error indicator
    pub fn apply_snapshot(&mut self, snapshot: OrderSnapshot) {
        self.order = Some(snapshot);
        self.last_updated = Some(Utc::now());
        self.fetch_error = None;
    }

    /// Record a failed poll. Non-fatal: polling continues and the stale
    /// snapshot keeps rendering.
    pub fn record_poll_failure(&mut self, message: impl Into<String>) {
        self.fetch_failures += 1;
        self.fetch_error = Some(message.into());
    }

    /// Store a broadcast location for `agent_id`
    pub fn apply_broadcast(&mut self, agent_id: impl Into<String>, position: Coordinates) {
        self.live.insert(agent_id.into(), position);
    }

    /// Feed a raw socket frame into the view.
    ///
    /// Malformed or partial frames are dropped without touching state;
    /// returns true when a location was applied.
    pub fn handle_frame(&mut self, text: &str) -> bool {
        let msg: DeliveryLocationMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, "Ignoring unparseable frame");
                return false;
            }
        };

        if msg.msg_type != DELIVERY_LOCATION_TYPE {
            return false;
        }

        self.apply_broadcast(
            msg.delivery_boy_id,
            Coordinates::new(msg.latitude, msg.longitude),
        );
        true
    }

    /// Agent marker position for shop leg `leg`.
    ///
    /// Live broadcast location wins over the snapshot's embedded agent
    /// location. Delivered legs render nothing.
    pub fn marker(&self, leg: usize) -> Option<Coordinates> {
        let shop_order = self.order.as_ref()?.shop_orders.get(leg)?;

        if shop_order.status.is_delivered() {
            return None;
        }

        let agent = shop_order.assigned_agent.as_ref()?;

        self.live
            .get(&agent.id)
            .copied()
            .or_else(|| agent.location.as_ref()?.position())
    }

    /// Distance/ETA for shop leg `leg`, against the order's fixed
    /// delivery destination. `None` until both endpoints are known.
    pub fn stats(&self, leg: usize) -> Option<RouteStats> {
        let agent = self.marker(leg)?;
        let destination = self.order.as_ref()?.delivery_address.as_ref()?.position();

        Some(RouteStats::compute(
            agent,
            destination,
            self.assumed_speed_kmph,
        ))
    }

    /// Shop legs still in flight
    pub fn active_leg_count(&self) -> usize {
        self.order
            .as_ref()
            .map(|o| {
                o.shop_orders
                    .iter()
                    .filter(|leg| !leg.status.is_delivered())
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn fetch_failures(&self) -> u64 {
        self.fetch_failures
    }

    pub fn fetch_error(&self) -> Option<&str> {
        self.fetch_error.as_deref()
    }
}
