use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::FusedStream;
use futures::{Stream, ready};
use pin_project_lite::pin_project;
use tracing::debug;

use super::error::ErrorChannel;

pin_project! {
    /// Error observer attached in front of a stage
    ///
    /// Passes values through and diverts the first upstream failure into the
    /// pipeline's [`ErrorChannel`], ending the stage's input instead of
    /// handing it the error.
    #[must_use = "streams do nothing unless polled"]
    pub(crate) struct ErrorTap<St, E> {
        #[pin]
        upstream: St,
        errors: ErrorChannel<E>,
        stage: usize,
        done: bool,
    }
}

impl<St, E> ErrorTap<St, E> {
    /// Observe `upstream`, the input of stage number `stage`
    pub(crate) fn new(upstream: St, errors: ErrorChannel<E>, stage: usize) -> Self {
        Self {
            upstream,
            errors,
            stage,
            done: false,
        }
    }
}

impl<St, T, E> Stream for ErrorTap<St, E>
where
    St: Stream<Item = Result<T, E>>,
{
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        match ready!(this.upstream.poll_next(cx)) {
            Some(Ok(value)) => Poll::Ready(Some(value)),
            Some(Err(error)) => {
                *this.done = true;
                if this.errors.raise(error) {
                    debug!(stage = *this.stage, "upstream failure diverted to pipeline error channel");
                } else {
                    debug!(stage = *this.stage, "discarding failure, pipeline already terminated");
                }
                Poll::Ready(None)
            }
            None => {
                *this.done = true;
                Poll::Ready(None)
            }
        }
    }
}

impl<St, T, E> FusedStream for ErrorTap<St, E>
where
    St: Stream<Item = Result<T, E>>,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}
