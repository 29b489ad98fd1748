use crate::adapter::{AdapterConfig, ConfigError, PullStream, adapt, adapt_with};
use crate::source::PushSource;
use crate::streaming::{Pipeline, Through};

/// Method-call style for the two core operations
pub trait PushSourceExt: PushSource + Sized {
    /// Demand-driven view of this source, see [`adapt`]
    fn into_pull(self) -> PullStream<Self> {
        adapt(self)
    }

    /// Demand-driven view with explicit buffering, see [`adapt_with`]
    fn into_pull_with(self, config: &AdapterConfig) -> Result<PullStream<Self>, ConfigError> {
        adapt_with(self, config)
    }

    /// Pipe this source through `pipeline`
    ///
    /// # Example
    /// ```rust,ignore
    /// let result = of::<_, MyError>(["Test Value".to_string()])
    ///     .through(Pipeline::new().stage(map(|v: String| format!("{v}.A"))));
    /// ```
    fn through(
        self,
        pipeline: Pipeline<Self::Item, Self::Error>,
    ) -> Through<Self::Item, Self::Error> {
        pipeline.apply(self)
    }
}

impl<S: PushSource> PushSourceExt for S {}
