use std::any::Any;
use std::fmt;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use futures::channel::{mpsc, oneshot};
use futures::{FutureExt, StreamExt, ready};
use tracing::{debug, warn};

use crate::adapter::BufferPolicy;

enum Terminal<E> {
    Completed,
    Failed(E),
    /// The producer panicked; the payload is resumed on the consumer
    Panicked(Box<dyn Any + Send>),
}

enum ValueSender<T> {
    Unbounded(mpsc::UnboundedSender<T>),
    Bounded(mpsc::Sender<T>),
}

enum ValueReceiver<T> {
    Unbounded(mpsc::UnboundedReceiver<T>),
    Bounded(mpsc::Receiver<T>),
}

/// Handle a [`PushSource`](super::PushSource) pushes its events into
///
/// Enforces the terminal-event contract: once `error` or `complete` has been
/// called every later call is discarded. Values are buffered according to the
/// subscriber's [`BufferPolicy`].
pub struct Emitter<T, E> {
    values: Option<ValueSender<T>>,
    terminal: Option<oneshot::Sender<Terminal<E>>>,
    dropped: Arc<AtomicUsize>,
}

/// Receiving half of an [`Emitter`], owned by the adapter
pub(crate) struct Inbox<T, E> {
    values: ValueReceiver<T>,
    values_done: bool,
    terminal: oneshot::Receiver<Terminal<E>>,
}

/// Create a connected emitter/inbox pair
///
/// `policy` must already be validated; a bounded capacity of zero is treated
/// as one.
pub(crate) fn channel<T, E>(
    policy: BufferPolicy,
    dropped: Arc<AtomicUsize>,
) -> (Emitter<T, E>, Inbox<T, E>) {
    let (values_tx, values_rx) = match policy {
        BufferPolicy::Unbounded => {
            let (tx, rx) = mpsc::unbounded();
            (ValueSender::Unbounded(tx), ValueReceiver::Unbounded(rx))
        }
        BufferPolicy::DropNewest { capacity } => {
            // mpsc reserves one extra slot per sender
            let (tx, rx) = mpsc::channel(capacity.saturating_sub(1));
            (ValueSender::Bounded(tx), ValueReceiver::Bounded(rx))
        }
    };
    let (terminal_tx, terminal_rx) = oneshot::channel();

    let emitter = Emitter {
        values: Some(values_tx),
        terminal: Some(terminal_tx),
        dropped,
    };
    let inbox = Inbox {
        values: values_rx,
        values_done: false,
        terminal: terminal_rx,
    };

    (emitter, inbox)
}

impl<T, E> Emitter<T, E> {
    /// Push a value to the subscriber
    pub fn next(&mut self, value: T) {
        let Some(values) = self.values.as_mut() else {
            debug!("discarding value emitted after a terminal event");
            return;
        };

        let disconnected = match values {
            ValueSender::Unbounded(tx) => tx.unbounded_send(value).is_err(),
            ValueSender::Bounded(tx) => match tx.try_send(value) {
                Ok(()) => false,
                Err(err) if err.is_full() => {
                    let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(dropped, "buffer full, discarding newest value");
                    false
                }
                Err(_) => true,
            },
        };

        if disconnected {
            debug!("subscriber gone, closing emitter");
            self.close();
        }
    }

    /// Signal a failure. Ends the subscription.
    pub fn error(&mut self, error: E) {
        self.finish(Terminal::Failed(error));
    }

    /// Signal completion. Ends the subscription.
    pub fn complete(&mut self) {
        self.finish(Terminal::Completed);
    }

    /// End the subscription with a panic that unwinds on the consumer's poll
    pub(crate) fn panic(&mut self, payload: Box<dyn Any + Send>) {
        self.finish(Terminal::Panicked(payload));
    }

    /// True once a terminal event was sent or the subscriber went away
    ///
    /// Long-running sources should poll this and stop producing.
    pub fn is_closed(&self) -> bool {
        match (&self.values, &self.terminal) {
            (Some(values), Some(terminal)) => {
                let values_closed = match values {
                    ValueSender::Unbounded(tx) => tx.is_closed(),
                    ValueSender::Bounded(tx) => tx.is_closed(),
                };
                values_closed || terminal.is_canceled()
            }
            _ => true,
        }
    }

    fn finish(&mut self, terminal: Terminal<E>) {
        let Some(tx) = self.terminal.take() else {
            debug!("discarding terminal event emitted after a terminal event");
            return;
        };

        if tx.send(terminal).is_err() {
            debug!("subscriber gone before terminal event");
        }
        // The terminal is queued before the value channel closes, so the
        // inbox always finds it once the buffered values are drained.
        self.values = None;
    }

    fn close(&mut self) {
        self.values = None;
        self.terminal = None;
    }
}

impl<T, E> fmt::Debug for Emitter<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("closed", &self.is_closed())
            .field("dropped", &self.dropped.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T, E> Inbox<T, E> {
    /// Next event in emission order
    ///
    /// Yields buffered values first, then the terminal event: `Some(Err(_))`
    /// for a failure and `None` for completion. An emitter dropped without a
    /// terminal event reads as completion.
    ///
    /// # Panics
    /// Resumes the producer's panic if it ended with [`Emitter::panic`].
    pub(crate) fn poll_event(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<T, E>>> {
        if !self.values_done {
            let next = match &mut self.values {
                ValueReceiver::Unbounded(rx) => ready!(rx.poll_next_unpin(cx)),
                ValueReceiver::Bounded(rx) => ready!(rx.poll_next_unpin(cx)),
            };
            match next {
                Some(value) => return Poll::Ready(Some(Ok(value))),
                None => self.values_done = true,
            }
        }

        match ready!(self.terminal.poll_unpin(cx)) {
            Ok(Terminal::Completed) => Poll::Ready(None),
            Ok(Terminal::Failed(error)) => Poll::Ready(Some(Err(error))),
            Ok(Terminal::Panicked(payload)) => panic::resume_unwind(payload),
            Err(oneshot::Canceled) => {
                debug!("emitter dropped without a terminal event, treating as completion");
                Poll::Ready(None)
            }
        }
    }
}
