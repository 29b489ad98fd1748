use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use futures::stream::FusedStream;
use futures::{Stream, ready};
use tracing::debug;

use super::config::{AdapterConfig, BufferPolicy};
use super::error::ConfigError;
use crate::source::emitter::{Inbox, channel};
use crate::source::{PushSource, Subscription};

/// Demand-driven view of a [`PushSource`]
///
/// Nothing happens until the first poll. That first demand subscribes to the
/// source; later demand only drains what the source has pushed. Yields the
/// source's values in arrival order, then either ends or yields its error
/// once and ends.
///
/// Dropping the stream (or calling [`cancel`](PullStream::cancel)) disposes
/// the underlying subscription.
#[must_use = "streams do nothing unless polled"]
pub struct PullStream<S>
where
    S: PushSource,
{
    // Taken on first demand; `None` afterwards
    source: Option<S>,
    policy: BufferPolicy,
    inbox: Option<Inbox<S::Item, S::Error>>,
    subscription: Option<Subscription>,
    dropped: Arc<AtomicUsize>,
    subscribed: bool,
    terminated: bool,
}

// `S` is moved out on first poll and never pinned
impl<S: PushSource> Unpin for PullStream<S> {}

/// Adapt a push source into a demand-driven stream with unbounded buffering
///
/// # Example
/// ```rust,ignore
/// let values: Vec<_> = adapt(of::<_, Infallible>([1, 2, 3])).collect().await;
/// assert_eq!(values, vec![Ok(1), Ok(2), Ok(3)]);
/// ```
pub fn adapt<S: PushSource>(source: S) -> PullStream<S> {
    PullStream::new(source, BufferPolicy::Unbounded)
}

/// Adapt a push source with an explicit configuration
pub fn adapt_with<S: PushSource>(
    source: S,
    config: &AdapterConfig,
) -> Result<PullStream<S>, ConfigError> {
    config.validate()?;
    Ok(PullStream::new(source, config.buffer))
}

impl<S: PushSource> PullStream<S> {
    pub(crate) fn new(source: S, policy: BufferPolicy) -> Self {
        Self {
            source: Some(source),
            policy,
            inbox: None,
            subscription: None,
            dropped: Arc::new(AtomicUsize::new(0)),
            subscribed: false,
            terminated: false,
        }
    }

    /// Whether the first demand has already subscribed to the source
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Number of values discarded by the buffer policy so far
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop consuming: dispose the subscription and end the stream
    ///
    /// A stream cancelled before its first demand never subscribes.
    pub fn cancel(&mut self) {
        if self.terminated {
            return;
        }
        debug!(subscribed = self.subscribed, "cancelling pull stream");
        self.source = None;
        self.finish();
    }

    fn subscribe(&mut self, source: S) {
        debug!(policy = ?self.policy, "first demand, subscribing to push source");

        let (emitter, inbox) = channel(self.policy, self.dropped.clone());
        // Inbox goes in first so a synchronous source finds a live receiver
        self.inbox = Some(inbox);
        self.subscribed = true;
        self.subscription = Some(source.subscribe(emitter));
    }

    fn finish(&mut self) {
        self.terminated = true;
        // Dropping the inbox closes the emitter; anything pushed later is discarded
        self.inbox = None;
        if let Some(mut subscription) = self.subscription.take() {
            subscription.dispose();
        }
    }
}

impl<S: PushSource> Stream for PullStream<S> {
    type Item = Result<S::Item, S::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.terminated {
            return Poll::Ready(None);
        }

        if let Some(source) = this.source.take() {
            this.subscribe(source);
        }

        let Some(inbox) = this.inbox.as_mut() else {
            this.terminated = true;
            return Poll::Ready(None);
        };

        match ready!(inbox.poll_event(cx)) {
            Some(Ok(value)) => Poll::Ready(Some(Ok(value))),
            Some(Err(error)) => {
                debug!("push source failed, forwarding error");
                this.finish();
                Poll::Ready(Some(Err(error)))
            }
            None => {
                debug!("push source completed");
                this.finish();
                Poll::Ready(None)
            }
        }
    }
}

impl<S: PushSource> FusedStream for PullStream<S> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<S: PushSource> fmt::Debug for PullStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PullStream")
            .field("policy", &self.policy)
            .field("subscribed", &self.is_subscribed())
            .field("dropped", &self.dropped())
            .field("terminated", &self.terminated)
            .finish()
    }
}
