//! Change notification fan-out.
//!
//! A [`ChangeFeed`] delivers every published message to the callbacks
//! registered on it. Each registration returns a [`Subscription`] handle;
//! dropping or unsubscribing the handle stops delivery.

pub mod feed;
pub mod subscription;

pub use feed::{ChangeFeed, FeedError};
pub use subscription::Subscription;
