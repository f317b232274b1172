//! WebSocket push channel for dashboard clients.
//!
//! Provides connection management, the heartbeat, the HTTP upgrade handler,
//! and the relay that forwards quality events from the event bus.

mod handler;
mod heartbeat;
pub mod manager;
pub mod relay;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
pub use relay::QualityRelay;
