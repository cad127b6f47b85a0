//! Kite Gateway Library
//!
//! Session-authenticated HTTP front door for kites: resolves a kite by name,
//! proxies the caller's parameters to it, and handles login/logout, kite
//! registration and presence webhooks.

pub mod auth;
pub mod config;
pub mod events;
pub mod fetch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::GatewayConfig;
pub use http::{AppState, GatewayServer};
pub use lifecycle::Shutdown;
