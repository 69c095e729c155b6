//! Authenticator contract and the local demo implementation.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::session::{Session, SessionError, SessionToken};
use crate::user::User;

/// Session lifetime of the local authenticator.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("no user is logged in")]
    NotLoggedIn,

    #[error("unknown session token")]
    InvalidToken,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("authenticator state poisoned")]
    Poisoned,
}

/// The authentication collaborator.
///
/// Exposes the current user and login/logout. Nothing is loaded for a caller
/// until [`Authenticator::verify`] accepts its token.
pub trait Authenticator: Send + Sync {
    fn current_user(&self) -> Option<User>;

    /// Start a session, replacing any previous one.
    fn login(&self, email: &str, password: Option<&str>, now: DateTime<Utc>) -> Result<Session, AuthError>;

    fn logout(&self);

    /// Resolve a bearer token to the live session it belongs to.
    fn verify(&self, token: &SessionToken, now: DateTime<Utc>) -> Result<Session, AuthError>;
}

impl<A> Authenticator for Arc<A>
where
    A: Authenticator + ?Sized,
{
    fn current_user(&self) -> Option<User> {
        (**self).current_user()
    }

    fn login(&self, email: &str, password: Option<&str>, now: DateTime<Utc>) -> Result<Session, AuthError> {
        (**self).login(email, password, now)
    }

    fn logout(&self) {
        (**self).logout()
    }

    fn verify(&self, token: &SessionToken, now: DateTime<Utc>) -> Result<Session, AuthError> {
        (**self).verify(token, now)
    }
}

/// Demo-mode authenticator: any well-formed email logs in, the password is
/// ignored, and the single session lives in memory.
#[derive(Debug)]
pub struct LocalAuthenticator {
    session: RwLock<Option<Session>>,
    ttl: Duration,
}

impl Default for LocalAuthenticator {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_SESSION_TTL_HOURS))
    }
}

impl LocalAuthenticator {
    pub fn new(ttl: Duration) -> Self {
        Self {
            session: RwLock::new(None),
            ttl,
        }
    }
}

impl Authenticator for LocalAuthenticator {
    fn current_user(&self) -> Option<User> {
        self.session
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|session| session.user.clone()))
    }

    fn login(&self, email: &str, _password: Option<&str>, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let user = User::from_email(email)?;
        let session = Session::issue(user, now, self.ttl);
        let mut guard = self.session.write().map_err(|_| AuthError::Poisoned)?;
        *guard = Some(session.clone());
        tracing::info!(user = %session.user.email, "user logged in");
        Ok(session)
    }

    fn logout(&self) {
        let previous = match self.session.write() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(previous) = previous {
            tracing::info!(user = %previous.user.email, "user logged out");
        }
    }

    fn verify(&self, token: &SessionToken, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let guard = self.session.read().map_err(|_| AuthError::Poisoned)?;
        let session = guard.as_ref().ok_or(AuthError::NotLoggedIn)?;
        if session.token != *token {
            return Err(AuthError::InvalidToken);
        }
        session.validate(now)?;
        Ok(session.clone())
    }
}
