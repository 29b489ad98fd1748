use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::pin;

use futures::{FutureExt, Stream, StreamExt};
use tracing::{debug, error};

use super::error::ConvertError;
use crate::source::{Emitter, PushSource, Subscription};

/// Push view of a pull stream
///
/// On subscription a tokio task drains the stream into the emitter: values
/// in order, then the stream's own error or completion. A panic while
/// draining is carried to the subscriber and resumed when it polls.
/// Disposing the subscription aborts the task.
///
/// # Panics
/// Subscribing outside a tokio runtime panics.
#[derive(Debug)]
pub struct StreamSource<St> {
    stream: St,
}

/// Convert a stream of results into a [`PushSource`]
pub fn from_stream<St, T, E>(stream: St) -> StreamSource<St>
where
    St: Stream<Item = Result<T, E>> + Send + 'static,
{
    StreamSource { stream }
}

impl<St, T, E> PushSource for StreamSource<St>
where
    St: Stream<Item = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = T;
    type Error = E;

    fn subscribe(self, emitter: Emitter<T, E>) -> Subscription {
        let task = tokio::spawn(forward(self.stream, emitter));
        let abort = task.abort_handle();

        Subscription::new(move || {
            debug!("subscription disposed, aborting conversion task");
            abort.abort();
        })
    }
}

async fn forward<St, T, E>(stream: St, mut emitter: Emitter<T, E>)
where
    St: Stream<Item = Result<T, E>>,
{
    let outcome = AssertUnwindSafe(drain(stream, &mut emitter))
        .catch_unwind()
        .await;

    if let Err(panic) = outcome {
        let error = ConvertError::Panicked(panic_message(panic.as_ref()));
        error!(%error, "conversion task panicked, resuming on subscriber");
        emitter.panic(panic);
    }
}

async fn drain<St, T, E>(stream: St, emitter: &mut Emitter<T, E>)
where
    St: Stream<Item = Result<T, E>>,
{
    let mut stream = pin!(stream);

    loop {
        if emitter.is_closed() {
            debug!("subscriber gone, stopping conversion");
            return;
        }

        match stream.next().await {
            Some(Ok(value)) => emitter.next(value),
            Some(Err(error)) => {
                emitter.error(error);
                return;
            }
            None => {
                emitter.complete();
                return;
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
