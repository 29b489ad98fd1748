pub mod convert;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod stage;
mod tap;

// Re-export commonly used types
pub use convert::{StreamSource, from_stream};
pub use error::ConvertError;
pub use merge::{Merged, PipelineState};
pub use pipeline::{Pipeline, ResultStream, Through, through};
pub use stage::{BoxStage, Identity, Map, Stage, StageStream, TryMap, Values, identity, map, try_map};
