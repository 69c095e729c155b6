use std::sync::Arc;

use repdesk_auth::{Authenticator, LocalAuthenticator};
use repdesk_infra::{DataService, DataStore, MemoryStore, StoreConfig};

/// Everything the handlers share.
#[derive(Clone)]
pub struct AppServices {
    pub data: Arc<DataService>,
    pub auth: Arc<dyn Authenticator>,
}

impl AppServices {
    pub fn new(store: Arc<dyn DataStore>, auth: Arc<dyn Authenticator>) -> Self {
        Self {
            data: Arc::new(DataService::new(store)),
            auth,
        }
    }

    /// In-process store and demo authenticator (dev/test).
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LocalAuthenticator::default()),
        )
    }
}

/// Open the configured store and wire the local authenticator.
pub async fn build_services(config: &StoreConfig) -> anyhow::Result<AppServices> {
    let store = config.open().await?;
    tracing::info!(backend = store.backend(), "services ready");
    Ok(AppServices::new(store, Arc::new(LocalAuthenticator::default())))
}
