use std::fmt;

type Teardown = Box<dyn FnOnce() + Send>;

/// Live binding created by [`PushSource::subscribe`](super::PushSource::subscribe)
///
/// Disposing runs the source's teardown exactly once. A subscription that is
/// dropped without being disposed is disposed on drop.
#[must_use = "dropping a subscription disposes it"]
pub struct Subscription {
    teardown: Option<Teardown>,
    disposed: bool,
}

impl Subscription {
    /// Subscription whose disposal runs `teardown`
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            teardown: Some(Box::new(teardown)),
            disposed: false,
        }
    }

    /// Subscription with nothing to release (synchronous sources)
    pub fn empty() -> Self {
        Self {
            teardown: None,
            disposed: false,
        }
    }

    /// Release the source's resources. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("has_teardown", &self.teardown.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}
