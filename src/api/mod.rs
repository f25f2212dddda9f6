// HTTP and WebSocket APIs

pub mod location;
pub mod websocket;

pub use location::{create_location_router, LocationAppState};
pub use websocket::{create_ws_router, ws_handler, WsAppState};
