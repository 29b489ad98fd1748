use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::stream::FusedStream;
use futures::{FutureExt, Stream, ready};
use pin_project_lite::pin_project;
use tracing::debug;

/// Lifecycle of one pipeline execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Assembled, nothing demanded yet
    Built,
    /// First demand issued; the head adapter subscribes on it
    Subscribed,
    /// At least one value delivered
    Flowing,
    Completed,
    Errored,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Errored)
    }
}

pin_project! {
    /// Race between a pipeline's final stage and its error channel
    ///
    /// Yields the final stage's values in order. The first failure from
    /// either side ends the stream with that failure. Completion only comes
    /// from the final stage, and only if the error channel is empty at that
    /// moment.
    #[must_use = "streams do nothing unless polled"]
    pub struct Merged<St, E> {
        #[pin]
        output: St,
        // `None` once terminal or once every error observer is gone
        errors: Option<oneshot::Receiver<E>>,
        state: PipelineState,
    }
}

impl<St, E> Merged<St, E> {
    pub(crate) fn new(output: St, errors: oneshot::Receiver<E>) -> Self {
        Self {
            output,
            errors: Some(errors),
            state: PipelineState::Built,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }
}

fn transition(state: &mut PipelineState, next: PipelineState) {
    if *state != next {
        debug!(from = ?*state, to = ?next, "pipeline state transition");
        *state = next;
    }
}

/// Wait-free check of the error channel, registering `cx` when given
fn check_errors<E>(
    errors: &mut Option<oneshot::Receiver<E>>,
    cx: Option<&mut Context<'_>>,
) -> Option<E> {
    let rx = errors.as_mut()?;

    let outcome = match cx {
        Some(cx) => match rx.poll_unpin(cx) {
            Poll::Ready(Ok(error)) => Ok(Some(error)),
            Poll::Ready(Err(canceled)) => Err(canceled),
            Poll::Pending => Ok(None),
        },
        None => rx.try_recv(),
    };

    match outcome {
        Ok(error) => error,
        Err(oneshot::Canceled) => {
            // Every observer is gone; no upstream failure can arrive anymore
            *errors = None;
            None
        }
    }
}

impl<St, T, E> Stream for Merged<St, E>
where
    St: Stream<Item = Result<T, E>>,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if this.state.is_terminal() {
            return Poll::Ready(None);
        }
        if *this.state == PipelineState::Built {
            transition(this.state, PipelineState::Subscribed);
        }

        let upstream_error = check_errors(this.errors, Some(&mut *cx));
        if let Some(error) = upstream_error {
            transition(this.state, PipelineState::Errored);
            *this.errors = None;
            return Poll::Ready(Some(Err(error)));
        }

        let item = ready!(this.output.poll_next(cx));

        // A failure raised while this poll ran upstream beats whatever the
        // final stage produced in the same poll.
        if let Some(error) = check_errors(this.errors, None) {
            transition(this.state, PipelineState::Errored);
            *this.errors = None;
            return Poll::Ready(Some(Err(error)));
        }

        match item {
            Some(Ok(value)) => {
                transition(this.state, PipelineState::Flowing);
                Poll::Ready(Some(Ok(value)))
            }
            Some(Err(error)) => {
                transition(this.state, PipelineState::Errored);
                *this.errors = None;
                Poll::Ready(Some(Err(error)))
            }
            None => {
                transition(this.state, PipelineState::Completed);
                *this.errors = None;
                Poll::Ready(None)
            }
        }
    }
}

impl<St, T, E> FusedStream for Merged<St, E>
where
    St: Stream<Item = Result<T, E>>,
{
    fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }
}
