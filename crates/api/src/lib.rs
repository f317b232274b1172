//! Gridwatch API server library.
//!
//! Exposes the quality engine, the background monitor, the HTTP routes and
//! the WebSocket push channel so the binary and tests share one wiring.

pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;

#[cfg(test)]
mod test_support;
