pub mod emitter;
pub mod sources;
pub mod subscription;
pub mod traits;

// Re-export commonly used types
pub use emitter::Emitter;
pub use sources::{Fail, FromFn, Of, fail, from_fn, of};
pub use subscription::Subscription;
pub use traits::PushSource;
