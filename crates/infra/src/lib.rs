//! Infrastructure: persistence backends, their selection from the
//! environment, and the data service built on top of them.

pub mod config;
pub mod service;
pub mod store;

pub use config::StoreConfig;
pub use service::{DataService, ServiceError, Snapshot};
pub use store::{DataStore, DataStoreExt, LocalStore, MemoryStore, RemoteStore, StoreError};
