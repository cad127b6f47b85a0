//! Session authentication.
//!
//! # Data Flow
//! ```text
//! /kite/{name}:  Cookie header → session.rs → Store::find_session_by_token
//! /login:        Session → token.rs (TokenIssuer) → cookie.rs (Set-Cookie)
//! /logout:       cookie.rs (expired Set-Cookie)
//! /kite/disconnect: signature.rs (sha1(uri + secret))
//! ```
//!
//! # Design Decisions
//! - Cookie values are opaque and looked up verbatim
//! - The disconnect secret is configuration, never a literal

pub mod cookie;
pub mod session;
pub mod signature;
pub mod token;

pub use session::{require_valid_session, session_token, AuthError, CLIENT_ID_COOKIE};
pub use token::{IssuedToken, SessionTokenIssuer, TokenError, TokenIssuer};
