//! `repdesk-auth`: authentication collaborator.
//!
//! This crate is intentionally decoupled from HTTP and storage. The only thing
//! the rest of the system needs from it is whether a user is logged in, which
//! gates loading the dataset.

pub mod authenticator;
pub mod session;
pub mod user;

pub use authenticator::{AuthError, Authenticator, LocalAuthenticator};
pub use session::{Session, SessionError, SessionToken};
pub use user::User;
