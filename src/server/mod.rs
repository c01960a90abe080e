//! HTTP and WebSocket surface.

pub mod protocol;
pub mod routes;

pub use protocol::{ErrorBody, HealthResponse, OutboundMessage, TextRequest, TextResponse};
pub use routes::{AppState, build_router};
