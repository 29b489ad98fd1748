//! Prelude module for convenient imports
//!
//! Import everything you need with: `use observable_stream::prelude::*;`

// Source types
pub use crate::source::{Emitter, PushSource, Subscription, fail, from_fn, of};

// Adapter types
pub use crate::adapter::{AdapterConfig, BufferPolicy, ConfigError, PullStream, adapt, adapt_with};

// Streaming types
pub use crate::streaming::{
    BoxStage, ConvertError, Pipeline, PipelineState, ResultStream, Stage, StageStream, Through,
    Values, from_stream, identity, map, through, try_map,
};

// Extension traits
pub use crate::ext::PushSourceExt;
