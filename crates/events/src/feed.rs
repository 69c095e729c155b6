//! In-process change feed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use thiserror::Error;

use crate::subscription::Subscription;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Publish failed due to internal lock poisoning.
    #[error("change feed lock poisoned")]
    Poisoned,
}

type Callback<M> = Arc<dyn Fn(&M) + Send + Sync>;

struct Registry<M> {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(u64, Callback<M>)>>,
}

/// Callback fan-out for one kind of message.
///
/// - No IO / no async
/// - Callbacks run on the publishing thread, in registration order
/// - Cloning shares the same registry
pub struct ChangeFeed<M> {
    registry: Arc<Registry<M>>,
}

impl<M> Clone for ChangeFeed<M> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<M> Default for ChangeFeed<M> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(0),
                callbacks: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl<M: 'static> ChangeFeed<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn(&M) + Send + Sync + 'static) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);

        // If the lock is poisoned we still hand out a handle; it just never fires.
        if let Ok(mut callbacks) = self.registry.callbacks.lock() {
            callbacks.push((id, Arc::new(callback)));
        }

        let registry: Weak<Registry<M>> = Arc::downgrade(&self.registry);
        Subscription::from_fn(move || {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            // The removed callback is dropped after the lock is released.
            let _removed = match registry.callbacks.lock() {
                Ok(mut callbacks) => callbacks
                    .iter()
                    .position(|(cid, _)| *cid == id)
                    .map(|idx| callbacks.remove(idx)),
                Err(_) => None,
            };
        })
    }

    /// Deliver `message` to every registered callback; returns how many ran.
    ///
    /// Callbacks are invoked outside the registry lock, so a callback may
    /// subscribe or unsubscribe without deadlocking.
    pub fn publish(&self, message: &M) -> Result<usize, FeedError> {
        let callbacks: Vec<Callback<M>> = {
            let guard = self.registry.callbacks.lock().map_err(|_| FeedError::Poisoned)?;
            guard.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for callback in &callbacks {
            callback(message);
        }
        tracing::trace!(subscribers = callbacks.len(), "change feed published");
        Ok(callbacks.len())
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.callbacks.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl<M> core::fmt::Debug for ChangeFeed<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChangeFeed").finish_non_exhaustive()
    }
}
