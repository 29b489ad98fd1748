use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

/// Values flowing into a stage. Upstream failures never appear here.
pub type Values<T> = BoxStream<'static, T>;

/// A stage's output: values, or a failure on the stage's own error channel
pub type StageStream<T, E> = BoxStream<'static, Result<T, E>>;

pub type BoxStage<T, E> = Box<dyn Stage<T, E>>;

/// A processing stage piped after a push source
///
/// A stage consumes its input itemwise and produces a new sequence. It may
/// fail at any point by yielding an `Err`, regardless of upstream state.
///
/// Any `FnOnce(Values<T>) -> impl Stream<Item = Result<T, E>>` is a stage.
pub trait Stage<T, E>: Send + 'static {
    fn pipe(self: Box<Self>, input: Values<T>) -> StageStream<T, E>;
}

impl<T, E, F, St> Stage<T, E> for F
where
    F: FnOnce(Values<T>) -> St + Send + 'static,
    St: Stream<Item = Result<T, E>> + Send + 'static,
{
    fn pipe(self: Box<Self>, input: Values<T>) -> StageStream<T, E> {
        (*self)(input).boxed()
    }
}

/// Stage applying an infallible function to each value
#[derive(Debug, Clone)]
pub struct Map<F> {
    f: F,
}

pub fn map<F>(f: F) -> Map<F> {
    Map { f }
}

impl<T, E, F> Stage<T, E> for Map<F>
where
    T: Send + 'static,
    E: Send + 'static,
    F: FnMut(T) -> T + Send + 'static,
{
    fn pipe(self: Box<Self>, input: Values<T>) -> StageStream<T, E> {
        let mut f = self.f;
        input.map(move |value| Ok(f(value))).boxed()
    }
}

/// Stage applying a fallible function to each value
#[derive(Debug, Clone)]
pub struct TryMap<F> {
    f: F,
}

pub fn try_map<F>(f: F) -> TryMap<F> {
    TryMap { f }
}

impl<T, E, F> Stage<T, E> for TryMap<F>
where
    T: Send + 'static,
    E: Send + 'static,
    F: FnMut(T) -> Result<T, E> + Send + 'static,
{
    fn pipe(self: Box<Self>, input: Values<T>) -> StageStream<T, E> {
        input.map(self.f).boxed()
    }
}

/// Stage forwarding its input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

pub fn identity() -> Identity {
    Identity
}

impl<T, E> Stage<T, E> for Identity
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn pipe(self: Box<Self>, input: Values<T>) -> StageStream<T, E> {
        input.map(Ok).boxed()
    }
}
