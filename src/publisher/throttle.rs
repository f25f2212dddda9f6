use crate::config::ThrottleConfig;
use crate::geo::{haversine_m, Coordinates};
use std::time::{Duration, Instant};

/// Gate on the publisher's geolocation samples.
///
/// A sample is accepted iff it is the first ever, or at least
/// `min_interval` has elapsed since the last accepted sample AND the
/// great-circle distance from the last accepted position is at least
/// `min_distance_m`. Accepted samples become the new reference point
/// whether or not the subsequent send succeeds — a failed send is never
/// retried, the next natural sample supersedes it.
pub struct LocationThrottle {
    min_interval: Duration,
    min_distance_m: f64,
    last_accepted: Option<(Coordinates, Instant)>,
}

impl LocationThrottle {
    pub fn new(min_interval: Duration, min_distance_m: f64) -> Self {
        Self {
            min_interval,
            min_distance_m,
            last_accepted: None,
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(
            Duration::from_secs(config.min_interval_secs),
            config.min_distance_m,
        )
    }

    /// Decide whether the sample at `position` observed at `now` passes
    /// the gate. `now` is injected so the rule is testable without
    /// sleeping.
    pub fn accept(&mut self, position: Coordinates, now: Instant) -> bool {
        match self.last_accepted {
            None => {
                self.last_accepted = Some((position, now));
                true
            }
            Some((last_position, last_at)) => {
                let elapsed = now.duration_since(last_at);
                let moved = haversine_m(last_position, position);

                if elapsed >= self.min_interval && moved >= self.min_distance_m {
                    self.last_accepted = Some((position, now));
                    true
                } else {
                    false
                }
            }
        }
    }
}
