//! Bridge between push-based sources and demand-driven streams
//!
//! Two operations make up the core:
//! - [`adapt`] turns a [`PushSource`] into a [`futures::Stream`] that subscribes
//!   on first demand, exactly once.
//! - [`through`] (or [`Pipeline`]) pipes a push source through processing
//!   stages and merges every failure, from the source or any stage, into one
//!   push-based result.

pub mod adapter;
pub mod ext;
pub mod prelude;
pub mod source;
pub mod streaming;

pub use adapter::{adapt, adapt_with};
pub use source::PushSource;
pub use streaming::{Pipeline, through};
