use crate::config::TrackingConfig;
use crate::tracker::model::OrderSnapshot;
use crate::tracker::view::TrackingView;
use anyhow::{Context, Result};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Polls the order subsystem for a snapshot of one order.
///
/// Fixed cadence, no backoff: a failed poll marks the view's non-fatal
/// error indicator and the next tick tries again. The loop runs until
/// the owning task is aborted (view unmount).
pub struct OrderPoller {
    client: reqwest::Client,
    base_url: String,
    order_id: String,
    poll_interval: Duration,
}

impl OrderPoller {
    pub fn new(base_url: impl Into<String>, order_id: impl Into<String>, config: &TrackingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build order poll client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            order_id: order_id.into(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        })
    }

    /// Fetch the snapshot once
    pub async fn fetch_once(&self) -> Result<OrderSnapshot> {
        let url = format!(
            "{}/order/{}",
            self.base_url.trim_end_matches('/'),
            self.order_id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Order snapshot request failed")?
            .error_for_status()
            .context("Order snapshot request rejected")?;

        response
            .json::<OrderSnapshot>()
            .await
            .context("Order snapshot body unreadable")
    }

    /// One immediate fetch, then the fixed interval, forever.
    ///
    /// Timeouts and transport errors are treated identically: the view's
    /// error indicator is set and polling continues.
    pub async fn run(self, view: Arc<RwLock<TrackingView>>) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // First tick fires immediately
            ticker.tick().await;

            match self.fetch_once().await {
                Ok(snapshot) => {
                    debug!(order_id = %self.order_id, "Order snapshot refreshed");
                    view.write().unwrap().apply_snapshot(snapshot);
                }
                Err(e) => {
                    warn!(order_id = %self.order_id, error = %e, "Order snapshot poll failed");
                    view.write()
                        .unwrap()
                        .record_poll_failure("Unable to refresh live order details. Retrying...");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_BODY: &str = r#"{
        "_id": "ord-1",
        "shopOrders": [{
            "status": "out-for-delivery",
            "assignedDeliveryBoy": {
                "_id": "agent-7",
                "location": { "coordinates": [88.30, 22.50] }
            }
        }],
        "deliveryAddress": { "latitude": 22.55, "longitude": 88.35 }
    }"#;

    fn test_config() -> TrackingConfig {
        TrackingConfig {
            poll_interval_secs: 30,
            request_timeout_secs: 5,
            assumed_speed_kmph: 25.0,
        }
    }

    #[tokio::test]
    async fn test_fetch_once_parses_snapshot() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/order/ord-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ORDER_BODY)
            .create_async()
            .await;

        let poller = OrderPoller::new(server.url(), "ord-1", &test_config()).unwrap();
        let snapshot = poller.fetch_once().await.unwrap();

        assert_eq!(snapshot.id, "ord-1");
        assert_eq!(snapshot.shop_orders.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_once_rejects_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/order/ord-1")
            .with_status(500)
            .create_async()
            .await;

        let poller = OrderPoller::new(server.url(), "ord-1", &test_config()).unwrap();
        assert!(poller.fetch_once().await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_once_rejects_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/order/ord-1")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let poller = OrderPoller::new(server.url(), "ord-1", &test_config()).unwrap();
        assert!(poller.fetch_once().await.is_err());
    }

    #[tokio::test]
    async fn test_run_applies_immediate_fetch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/order/ord-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ORDER_BODY)
            .create_async()
            .await;

        let poller = OrderPoller::new(server.url(), "ord-1", &test_config()).unwrap();
        let view = Arc::new(RwLock::new(TrackingView::new("ord-1", 25.0)));

        let handle = tokio::spawn(poller.run(Arc::clone(&view)));

        // The first tick is immediate; wait for the snapshot to land
        for _ in 0..50 {
            if view.read().unwrap().last_updated().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert!(view.read().unwrap().last_updated().is_some());
        assert_eq!(view.read().unwrap().active_leg_count(), 1);

        // Unmount: abort tears the interval down with the task
        handle.abort();
    }

    #[tokio::test]
    async fn test_run_records_poll_failure_and_continues() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/order/ord-1")
            .with_status(503)
            .create_async()
            .await;

        let poller = OrderPoller::new(server.url(), "ord-1", &test_config()).unwrap();
        let view = Arc::new(RwLock::new(TrackingView::new("ord-1", 25.0)));

        let handle = tokio::spawn(poller.run(Arc::clone(&view)));

        for _ in 0..50 {
            if view.read().unwrap().fetch_failures() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let failures = view.read().unwrap().fetch_failures();
        assert!(failures >= 1);
        assert!(view.read().unwrap().fetch_error().is_some());
        assert!(!handle.is_finished());

        handle.abort();
    }
}
