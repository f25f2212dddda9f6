//! Courier Agent - delivery-agent daemon feeding the hub.
//!
//! Reads geolocation samples from a line-based feed (the daemon's
//! stand-in for a platform geolocation watch), throttles them through
//! the shared publisher gate, and pushes accepted samples to the hub:
//! an `updateLocation` socket frame for low-latency fan-out, mirrored
//! by the HTTP companion write that persists the sample.
//!
//! ```text
//! sample feed (stdin)
//!        ↓
//! LocationThrottle (15 s / 20 m)
//!        ↓
//! ┌──────────────────────────────┐
//! │          HubSink             │
//! │  - identity on connect       │
//! │  - updateLocation frame      │
//! │  - POST /api/location mirror │
//! └──────────────────────────────┘
//!        ↓
//!    Courier hub
//! ```

pub mod feed;
pub mod sink;

pub use feed::parse_sample_line;
pub use sink::HubSink;
