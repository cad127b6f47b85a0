//! Shared-secret signatures for `/kite/disconnect`.
//!
//! A kite proves it may deregister `uri` by sending `sha1(uri + secret)` as
//! lowercase hex. This is a stopgap until kites carry real API keys.

use hex::ToHex;
use sha1::{Digest, Sha1};

/// Compute the disconnect token for `uri`.
pub fn disconnect_token(uri: &str, secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(uri.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.finalize().encode_hex::<String>()
}

/// Check a presented disconnect token.
pub fn verify_disconnect_token(token: &str, uri: &str, secret: &str) -> bool {
    token == disconnect_token(uri, secret)
}
