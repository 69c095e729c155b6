//! Subscription handle returned by every subscribe operation.

/// Registration handle for a change callback.
///
/// The callback stays registered while the handle is alive. Calling
/// [`Subscription::unsubscribe`] or dropping the handle removes it; after that
/// the callback is never invoked again.
///
/// ```ignore
/// let sub = feed.subscribe(|orders: &Vec<Order>| println!("{}", orders.len()));
/// feed.publish(&orders)?;
/// sub.unsubscribe();
/// ```
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Handle that runs `cancel` exactly once when released.
    pub fn from_fn(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle with nothing to release.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Chain another release action after this one.
    pub fn and_then(mut self, other: Subscription) -> Self {
        let first = self.cancel.take();
        Self::from_fn(move || {
            if let Some(cancel) = first {
                cancel();
            }
            drop(other);
        })
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
