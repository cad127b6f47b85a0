//! `Set-Cookie` values for the session cookie.

use chrono::{DateTime, Duration, Utc};

use crate::auth::session::CLIENT_ID_COOKIE;
use crate::auth::token::IssuedToken;

/// HTTP-date as used by the `Expires` attribute.
fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Cookie that installs `token` until its expiry.
pub fn session_cookie(token: &IssuedToken, now: DateTime<Utc>) -> String {
    let max_age = (token.expires - now).num_seconds().max(0);
    format!(
        "{CLIENT_ID_COOKIE}={}; Expires={}; Max-Age={max_age}",
        token.token,
        http_date(token.expires)
    )
}

/// Cookie that makes the browser drop the session token.
pub fn cleared_session_cookie(now: DateTime<Utc>) -> String {
    format!(
        "{CLIENT_ID_COOKIE}=; Expires={}; Max-Age=0",
        http_date(now - Duration::hours(1))
    )
}
