use std::sync::{Arc, Mutex};

use futures::channel::oneshot;
use thiserror::Error;

/// Failures of the pull-to-push converter itself
///
/// The pipeline's error type belongs to the caller, so these are logged
/// through `tracing` and the original panic is resumed on the subscriber.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Stream panicked while being converted: {0}")]
    Panicked(String),
}

/// Shared failure channel for one pipeline execution
///
/// Every stage's error observer holds a clone. The first `raise` wins; later
/// ones are discarded, as are raises after the receiving side is gone. The
/// channel never completes on its own: it only ends once every observer has
/// been dropped.
pub(crate) struct ErrorChannel<E> {
    slot: Arc<Mutex<Option<oneshot::Sender<E>>>>,
}

impl<E> ErrorChannel<E> {
    pub(crate) fn new() -> (Self, oneshot::Receiver<E>) {
        let (tx, rx) = oneshot::channel();
        let channel = Self {
            slot: Arc::new(Mutex::new(Some(tx))),
        };
        (channel, rx)
    }

    /// Deliver `error` if no error has been delivered yet
    ///
    /// Returns true if this call delivered it.
    pub(crate) fn raise(&self, error: E) -> bool {
        let sender = match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        match sender {
            Some(tx) => tx.send(error).is_ok(),
            None => false,
        }
    }
}

impl<E> Clone for ErrorChannel<E> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}
