// Great-circle geometry
pub mod geo;

// Agent location records and in-memory registry
pub mod location;

// HTTP and WebSocket APIs
pub mod api;

// Connection management and wire protocol
pub mod subscription;

// Identity authorization hook
pub mod auth;

// Configuration
pub mod config;

// Location publisher (agent side)
pub mod publisher;

// Tracking consumer (customer side)
pub mod tracker;

// Socket client with bounded backoff
pub mod net;
