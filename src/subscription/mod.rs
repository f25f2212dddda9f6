// WebSocket connection management and wire protocol

pub mod manager;
pub mod protocol;

pub use manager::ConnectionManager;
pub use protocol::{ClientMessage, DeliveryLocationMessage, ErrorMessage, DELIVERY_LOCATION_TYPE};
