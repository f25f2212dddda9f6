use crate::geo::Coordinates;
use crate::publisher::throttle::LocationThrottle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One geolocation sample from the platform's location watch.
#[derive(Clone, Copy, Debug)]
pub struct GeoSample {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl GeoSample {
    pub fn position(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Destination for accepted samples.
///
/// The production sink pushes an `updateLocation` socket frame and
/// mirrors it with the HTTP companion write; tests substitute their own.
#[async_trait]
pub trait LocationSink: Send + Sync {
    async fn send(&self, agent_id: &str, position: Coordinates) -> anyhow::Result<()>;
}

/// Forwards throttled geolocation samples to a sink.
///
/// Consumes samples until the channel closes; dropping the sender is the
/// session-teardown signal and releases the loop (nothing else holds the
/// watch alive).
pub struct LocationPublisher {
    agent_id: String,
    throttle: LocationThrottle,
    sink: Arc<dyn LocationSink>,
}

impl LocationPublisher {
    pub fn new(agent_id: String, throttle: LocationThrottle, sink: Arc<dyn LocationSink>) -> Self {
        Self {
            agent_id,
            throttle,
            sink,
        }
    }

    /// Run until the sample stream closes. Returns the number of samples
    /// actually sent.
    pub async fn run(mut self, mut samples: mpsc::Receiver<GeoSample>) -> u64 {
        let mut sent = 0u64;
        let mut failing = false;

        while let Some(sample) = samples.recv().await {
            let position = sample.position();

            if !self.throttle.accept(position, Instant::now()) {
                debug!(agent_id = %self.agent_id, "Sample suppressed by throttle");
                continue;
            }

            match self.sink.send(&self.agent_id, position).await {
                Ok(()) => {
                    if failing {
                        info!(agent_id = %self.agent_id, "Location updates recovered");
                    }
                    failing = false;
                    sent += 1;
                }
                Err(e) => {
                    // Log once per failure streak; the sample itself is
                    // not retried — the next natural sample supersedes it
                    if !failing {
                        warn!(
                            agent_id = %self.agent_id,
                            error = %e,
                            "Location update failed; hub may be unavailable"
                        );
                        failing = true;
                    }
                }
            }
        }

        info!(agent_id = %self.agent_id, sent = sent, "Sample stream closed, publisher stopped");
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    struct RecordingSink {
        sent: AtomicU64,
        fail_remaining: AtomicU64,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                sent: AtomicU64::new(0),
                fail_remaining: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl LocationSink for RecordingSink {
        async fn send(&self, _agent_id: &str, _position: Coordinates) -> anyhow::Result<()> {
            if self
                .fail_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                anyhow::bail!("hub unavailable");
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn sample(latitude: f64, longitude: f64) -> GeoSample {
        GeoSample {
            latitude,
            longitude,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_first_sample_is_sent() {
        let sink = Arc::new(RecordingSink::new());
        let publisher = LocationPublisher::new(
            "agent-7".to_string(),
            LocationThrottle::new(Duration::from_secs(15), 20.0),
            Arc::clone(&sink) as Arc<dyn LocationSink>,
        );

        let (tx, rx) = mpsc::channel(8);
        tx.send(sample(22.50, 88.30)).await.unwrap();
        drop(tx);

        let sent = publisher.run(rx).await;
        assert_eq!(sent, 1);
        assert_eq!(sink.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rapid_samples_are_throttled() {
        let sink = Arc::new(RecordingSink::new());
        let publisher = LocationPublisher::new(
            "agent-7".to_string(),
            LocationThrottle::new(Duration::from_secs(15), 20.0),
            Arc::clone(&sink) as Arc<dyn LocationSink>,
        );

        let (tx, rx) = mpsc::channel(8);
        // Burst of samples with no elapsed time: only the first passes
        tx.send(sample(22.50, 88.30)).await.unwrap();
        tx.send(sample(22.51, 88.31)).await.unwrap();
        tx.send(sample(22.52, 88.32)).await.unwrap();
        drop(tx);

        let sent = publisher.run(rx).await;
        assert_eq!(sent, 1);
    }

    #[tokio::test]
    async fn test_send_failure_does_not_stop_the_loop() {
        let sink = Arc::new(RecordingSink::new());
        // First two sends fail, then the hub "recovers"
        sink.fail_remaining.store(2, Ordering::SeqCst);

        // Zero-threshold throttle so every sample reaches the sink
        let publisher = LocationPublisher::new(
            "agent-7".to_string(),
            LocationThrottle::new(Duration::ZERO, 0.0),
            Arc::clone(&sink) as Arc<dyn LocationSink>,
        );

        let (tx, rx) = mpsc::channel(8);
        tx.send(sample(22.50, 88.30)).await.unwrap();
        tx.send(sample(22.51, 88.31)).await.unwrap();
        tx.send(sample(22.52, 88.32)).await.unwrap();
        drop(tx);

        let sent = publisher.run(rx).await;
        assert_eq!(sent, 1);
        assert_eq!(sink.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closing_the_stream_terminates_the_publisher() {
        let sink = Arc::new(RecordingSink::new());
        let publisher = LocationPublisher::new(
            "agent-7".to_string(),
            LocationThrottle::new(Duration::from_secs(15), 20.0),
            sink as Arc<dyn LocationSink>,
        );

        let (tx, rx) = mpsc::channel::<GeoSample>(1);
        let run = tokio::spawn(publisher.run(rx));
        drop(tx);

        // Loop ends promptly once the owning session drops the feed
        tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .expect("publisher did not terminate")
            .unwrap();
    }
}
