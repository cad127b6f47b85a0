//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route table)
//!     → request.rs (request ID, parameters, session context)
//!     → kite.rs / event.rs / session.rs (route handlers)
//!     → response.rs (error mapping, relayed bodies)
//!     → Send to client
//! ```

pub mod event;
pub mod kite;
pub mod request;
pub mod response;
pub mod server;
pub mod session;

pub use request::{RequestParams, SessionContext, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, GatewayServer};
