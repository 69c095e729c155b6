//! `repdesk-core`: foundation building blocks shared by every repdesk crate.
//!
//! This crate contains **pure** primitives (no infrastructure concerns): the
//! calendar utility, typed identifiers, the record/entity traits and the
//! domain error model.

pub mod calendar;
pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, Record, RecordKind};
pub use error::{DomainError, DomainResult};
pub use id::{FollowUpId, OrderId, QuoteId};
