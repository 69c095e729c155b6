use serde::{Deserialize, Serialize};

use crate::authenticator::AuthError;

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
}

impl User {
    /// Build a user from an email address; the display name is its local part.
    pub fn from_email(email: &str) -> Result<Self, AuthError> {
        let email = email.trim();
        let Some((local, domain)) = email.split_once('@') else {
            return Err(AuthError::InvalidEmail(email.to_string()));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
            return Err(AuthError::InvalidEmail(email.to_string()));
        }
        Ok(Self {
            email: email.to_string(),
            name: local.to_string(),
        })
    }
}
