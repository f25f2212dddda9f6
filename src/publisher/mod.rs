// Location publisher: throttled forwarding of geolocation samples

mod pipeline;
mod throttle;

pub use pipeline::{GeoSample, LocationPublisher, LocationSink};
pub use throttle::LocationThrottle;
