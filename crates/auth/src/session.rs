use core::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::User;

/// Opaque bearer token identifying a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0.simple(), f)
    }
}

impl FromStr for SessionToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: SessionToken,
    pub user: User,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session has expired")]
    Expired,

    #[error("session not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid session time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

impl Session {
    pub fn issue(user: User, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token: SessionToken::new(),
            user,
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    /// Deterministically check the session's time window against `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.expires_at <= self.issued_at {
            return Err(SessionError::InvalidTimeWindow);
        }
        if now < self.issued_at {
            return Err(SessionError::NotYetValid);
        }
        if now >= self.expires_at {
            return Err(SessionError::Expired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::from_email("ana@engmat.com.br").unwrap()
    }

    #[test]
    fn token_parses_from_its_display_form() {
        let token = SessionToken::new();
        let parsed: SessionToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
        assert!("not-a-token".parse::<SessionToken>().is_err());
    }

    #[test]
    fn session_window() {
        let now = Utc::now();
        let session = Session::issue(user(), now, Duration::hours(1));

        assert_eq!(session.validate(now), Ok(()));
        assert_eq!(session.validate(now - Duration::seconds(1)), Err(SessionError::NotYetValid));
        assert_eq!(session.validate(now + Duration::hours(1)), Err(SessionError::Expired));

        let broken = Session::issue(user(), now, Duration::zero());
        assert_eq!(broken.validate(now), Err(SessionError::InvalidTimeWindow));
    }
}
