//! Token issuance for logged-in sessions.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::store::{Session, StoreError};

/// A cookie token and the moment it stops being honored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("session for '{0}' has no client id")]
    MissingClientId(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Issues the `clientId` token for a session that just logged in.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, session: &Session) -> Result<IssuedToken, TokenError>;
}

/// Hands out the session's own client id with a fixed lifetime.
#[derive(Debug, Clone)]
pub struct SessionTokenIssuer {
    ttl: Duration,
}

impl SessionTokenIssuer {
    pub fn new(ttl_secs: u64) -> Self {
        let ttl_secs = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Self {
            ttl: Duration::try_seconds(ttl_secs).unwrap_or(Duration::MAX),
        }
    }
}

#[async_trait]
impl TokenIssuer for SessionTokenIssuer {
    async fn issue(&self, session: &Session) -> Result<IssuedToken, TokenError> {
        if session.client_id.is_empty() {
            return Err(TokenError::MissingClientId(session.username.clone()));
        }
        let now = Utc::now();
        Ok(IssuedToken {
            token: session.client_id.clone(),
            expires: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        })
    }
}
