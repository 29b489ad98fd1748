use super::emitter::Emitter;
use super::subscription::Subscription;

/// A producer that pushes events to a subscriber on its own schedule
///
/// Contract: zero or more values, then at most one terminal event (an error
/// or a completion). Nothing may follow a terminal event; the [`Emitter`]
/// discards anything that does.
///
/// `subscribe` consumes the source, so a single source value can only ever be
/// bound to one subscriber.
pub trait PushSource: Send + 'static {
    type Item: Send + 'static;
    type Error: Send + 'static;

    /// Start delivering events to `emitter`
    ///
    /// The returned [`Subscription`] is held by the subscriber for as long as
    /// it is interested; disposing it is the source's cue to stop producing.
    fn subscribe(self, emitter: Emitter<Self::Item, Self::Error>) -> Subscription;
}
