use std::marker::PhantomData;

use super::emitter::Emitter;
use super::subscription::Subscription;
use super::traits::PushSource;

/// Source that synchronously emits a fixed set of values, then completes
#[derive(Debug, Clone)]
pub struct Of<T, E> {
    values: Vec<T>,
    _phantom: PhantomData<fn() -> E>,
}

/// Emit every value of `values` on subscription, then complete
pub fn of<T, E>(values: impl IntoIterator<Item = T>) -> Of<T, E> {
    Of {
        values: values.into_iter().collect(),
        _phantom: PhantomData,
    }
}

impl<T, E> PushSource for Of<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = T;
    type Error = E;

    fn subscribe(self, mut emitter: Emitter<T, E>) -> Subscription {
        for value in self.values {
            emitter.next(value);
        }
        emitter.complete();
        Subscription::empty()
    }
}

/// Source that fails immediately without emitting any value
#[derive(Debug, Clone)]
pub struct Fail<T, E> {
    error: E,
    _phantom: PhantomData<fn() -> T>,
}

/// Fail with `error` on subscription
pub fn fail<T, E>(error: E) -> Fail<T, E> {
    Fail {
        error,
        _phantom: PhantomData,
    }
}

impl<T, E> PushSource for Fail<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = T;
    type Error = E;

    fn subscribe(self, mut emitter: Emitter<T, E>) -> Subscription {
        emitter.error(self.error);
        Subscription::empty()
    }
}

/// Source backed by a subscribe function
pub struct FromFn<F, T, E> {
    subscribe: F,
    _phantom: PhantomData<fn() -> (T, E)>,
}

/// Build a source from a closure run once on subscription
///
/// # Example
/// ```rust,ignore
/// let ticks = from_fn(|mut emitter: Emitter<u64, Infallible>| {
///     let handle = tokio::spawn(async move {
///         let mut interval = tokio::time::interval(Duration::from_millis(10));
///         for tick in 0.. {
///             interval.tick().await;
///             if emitter.is_closed() {
///                 break;
///             }
///             emitter.next(tick);
///         }
///     });
///     Subscription::new(move || handle.abort())
/// });
/// ```
pub fn from_fn<F, T, E>(subscribe: F) -> FromFn<F, T, E>
where
    F: FnOnce(Emitter<T, E>) -> Subscription + Send + 'static,
{
    FromFn {
        subscribe,
        _phantom: PhantomData,
    }
}

impl<F, T, E> PushSource for FromFn<F, T, E>
where
    F: FnOnce(Emitter<T, E>) -> Subscription + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = T;
    type Error = E;

    fn subscribe(self, emitter: Emitter<T, E>) -> Subscription {
        (self.subscribe)(emitter)
    }
}
