use std::fmt;

use futures::StreamExt;
use tracing::debug;

use super::convert::from_stream;
use super::error::ErrorChannel;
use super::merge::{Merged, PipelineState};
use super::stage::{BoxStage, Stage, StageStream};
use super::tap::ErrorTap;
use crate::adapter::{AdapterConfig, ConfigError, PullStream};
use crate::source::{Emitter, PushSource, Subscription};

/// Merged result of a pipeline, as a pull stream
pub type ResultStream<T, E> = Merged<StageStream<T, E>, E>;

/// Chain of processing stages placed after a push source
///
/// Applying the pipeline to a source builds, per call, one adapter at the
/// head, one error observer in front of every stage and one shared error
/// channel. Nothing runs until the result is subscribed to or polled.
pub struct Pipeline<T, E> {
    stages: Vec<BoxStage<T, E>>,
    config: AdapterConfig,
}

impl<T, E> Pipeline<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create an empty pipeline (the identity transform)
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            config: AdapterConfig::default(),
        }
    }

    /// Create a pipeline from stages, applied in order
    pub fn from_stages(stages: Vec<BoxStage<T, E>>) -> Self {
        Self {
            stages,
            config: AdapterConfig::default(),
        }
    }

    /// Set the head adapter's configuration (defaults to unbounded buffering)
    pub fn with_config(mut self, config: AdapterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Append a stage (fluent interface)
    ///
    /// # Example
    /// ```rust,ignore
    /// let result = Pipeline::new()
    ///     .stage(map(|v: String| format!("{v}.A")))
    ///     .stage(map(|v: String| format!("{v}.B")))
    ///     .apply(of::<_, MyError>(["Test Value".to_string()]));
    /// ```
    pub fn stage<S>(mut self, stage: S) -> Self
    where
        S: Stage<T, E>,
    {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Pipe `source` through every stage, producing a push-based result
    pub fn apply<S>(self, source: S) -> Through<T, E>
    where
        S: PushSource<Item = T, Error = E>,
    {
        Through {
            result: self.into_stream(source),
        }
    }

    /// Pipe `source` through every stage, producing the merged pull stream
    pub fn into_stream<S>(self, source: S) -> ResultStream<T, E>
    where
        S: PushSource<Item = T, Error = E>,
    {
        let Pipeline { stages, config } = self;
        debug!(stages = stages.len(), policy = ?config.buffer, "building pipeline");

        let (errors, receiver) = ErrorChannel::new();
        let head: StageStream<T, E> = PullStream::new(source, config.buffer).boxed();

        // Each observer is in place before its stage sees any data
        let output = stages
            .into_iter()
            .enumerate()
            .fold(head, |current, (index, stage)| {
                let observed = ErrorTap::new(current, errors.clone(), index).boxed();
                stage.pipe(observed)
            });

        Merged::new(output, receiver)
    }
}

impl<T, E> Default for Pipeline<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Pipeline<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Compose `stages` into a push-to-push transform
///
/// # Example
/// ```rust,ignore
/// let stages: Vec<BoxStage<String, MyError>> = vec![
///     Box::new(map(|v: String| format!("{v}.A"))),
///     Box::new(map(|v: String| format!("{v}.B"))),
/// ];
/// let transform = through(stages);
/// let result = transform(of::<_, MyError>(["Test Value".to_string()]));
/// ```
pub fn through<T, E, S>(stages: Vec<BoxStage<T, E>>) -> impl FnOnce(S) -> Through<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    S: PushSource<Item = T, Error = E>,
{
    move |source| Pipeline::from_stages(stages).apply(source)
}

/// Push-based result of a pipeline
///
/// Emits the final stage's values in order, then completes; or emits the
/// first failure from the source or any stage, then nothing. Itself a
/// [`PushSource`], so results can feed further pipelines.
#[must_use = "a pipeline result does nothing until subscribed or polled"]
pub struct Through<T, E> {
    result: ResultStream<T, E>,
}

impl<T, E> Through<T, E> {
    pub fn state(&self) -> PipelineState {
        self.result.state()
    }

    /// Consume the result as a pull stream instead of subscribing to it
    pub fn into_stream(self) -> ResultStream<T, E> {
        self.result
    }
}

impl<T, E> PushSource for Through<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = T;
    type Error = E;

    fn subscribe(self, emitter: Emitter<T, E>) -> Subscription {
        from_stream(self.result).subscribe(emitter)
    }
}

impl<T, E> fmt::Debug for Through<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Through")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{BufferPolicy, adapt};
    use crate::source::{Emitter, fail, from_fn, of};
    use crate::streaming::stage::{Map, Values, identity, map, try_map};
    use futures::stream;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn append(tag: &'static str) -> Map<impl FnMut(String) -> String + Send + 'static> {
        map(move |value: String| format!("{value}.{tag}"))
    }

    fn suffix(tag: &'static str) -> BoxStage<String, &'static str> {
        Box::new(append(tag))
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn pipes_through_stages_in_order() {
        let result = Pipeline::from_stages(vec![suffix("A"), suffix("B"), suffix("C")])
            .into_stream(of(strings(&["Test Value"])));

        let events: Vec<_> = result.collect().await;
        assert_eq!(events, vec![Ok("Test Value.A.B.C".to_string())]);
    }

    #[tokio::test]
    async fn empty_pipeline_is_identity() {
        let pipeline = Pipeline::<u32, &str>::new();
        assert!(pipeline.is_empty());

        let events: Vec<_> = pipeline.into_stream(of([1, 2, 3])).collect().await;
        assert_eq!(events, vec![Ok(1), Ok(2), Ok(3)]);
    }

    #[tokio::test]
    async fn empty_pipeline_forwards_source_error() {
        let events: Vec<_> = Pipeline::<u32, _>::new()
            .into_stream(fail("Test Error"))
            .collect()
            .await;
        assert_eq!(events, vec![Err("Test Error")]);
    }

    #[tokio::test]
    async fn source_error_reaches_result_through_stages() {
        let stages_run = Arc::new(AtomicUsize::new(0));
        let counter = stages_run.clone();

        let result = Pipeline::new()
            .stage(map(move |v: String| {
                counter.fetch_add(1, Ordering::SeqCst);
                v
            }))
            .stage(append("B"))
            .into_stream(fail::<String, _>("Test Error"));

        let events: Vec<_> = result.collect().await;
        assert_eq!(events, vec![Err("Test Error")]);
        assert_eq!(stages_run.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn middle_stage_failure_terminates_result() {
        let failing = try_map(|value: String| {
            if value.starts_with("Test Value 2") {
                Err("Stage Error")
            } else {
                Ok(format!("{value}.B"))
            }
        });

        let mut result = Pipeline::new()
            .stage(append("A"))
            .stage(failing)
            .stage(append("C"))
            .into_stream(of(strings(&["Test Value 1", "Test Value 2", "Test Value 3"])));

        assert_eq!(result.next().await, Some(Ok("Test Value 1.A.B.C".to_string())));
        assert_eq!(result.next().await, Some(Err("Stage Error")));
        assert_eq!(result.state(), PipelineState::Errored);
        assert_eq!(result.next().await, None);
    }

    #[tokio::test]
    async fn final_stage_failure_terminates_result() {
        let result = Pipeline::new()
            .stage(append("A"))
            .stage(try_map(|_: String| Err::<String, _>("Last Stage Error")))
            .into_stream(of(strings(&["x", "y"])));

        let events: Vec<_> = result.collect().await;
        assert_eq!(events, vec![Err("Last Stage Error")]);
    }

    #[tokio::test]
    async fn buffered_stage_output_after_upstream_failure_is_suppressed() {
        // Collects its whole input before emitting anything
        let batching = |input: Values<u32>| {
            stream::once(input.collect::<Vec<_>>())
                .flat_map(|batch| stream::iter(batch.into_iter().map(Ok::<u32, &'static str>)))
        };
        let source = from_fn(|mut emitter: Emitter<u32, &'static str>| {
            emitter.next(1);
            emitter.next(2);
            emitter.error("Source Error");
            Subscription::empty()
        });

        let events: Vec<_> = Pipeline::new()
            .stage(batching)
            .into_stream(source)
            .collect()
            .await;

        assert_eq!(events, vec![Err("Source Error")]);
    }

    #[tokio::test]
    async fn round_trips_through_identity_stage() {
        let input: Vec<u32> = (0..100).collect();

        let events: Vec<_> = Pipeline::<u32, &str>::new()
            .stage(identity())
            .into_stream(of(input.clone()))
            .collect()
            .await;

        let output: Vec<u32> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn through_result_is_a_push_source() {
        let transform = through(vec![suffix("A"), suffix("B"), suffix("C")]);
        let result = transform(of(strings(&["Test Value 1", "Test Value 2", "Test Value 3"])));
        assert_eq!(result.state(), PipelineState::Built);

        let events: Vec<_> = adapt(result).collect().await;
        assert_eq!(
            events,
            vec![
                Ok("Test Value 1.A.B.C".to_string()),
                Ok("Test Value 2.A.B.C".to_string()),
                Ok("Test Value 3.A.B.C".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn through_result_delivers_errors_once() {
        let transform = through(vec![suffix("A"), suffix("B")]);
        let result = transform(fail("Test Error"));

        let events: Vec<_> = adapt(result).collect().await;
        assert_eq!(events, vec![Err("Test Error")]);
    }

    #[tokio::test]
    async fn pipelines_compose() {
        let inner = Pipeline::new()
            .stage(append("A"))
            .apply(of::<_, &str>(strings(&["v"])));
        let outer = Pipeline::new().stage(append("B")).into_stream(inner);

        let events: Vec<_> = outer.collect().await;
        assert_eq!(events, vec![Ok("v.A.B".to_string())]);
    }

    #[tokio::test]
    async fn bounded_head_drops_newest_and_still_fails() {
        let config =
            AdapterConfig::new().with_buffer_policy(BufferPolicy::DropNewest { capacity: 2 });
        let source = from_fn(|mut emitter: Emitter<u32, &'static str>| {
            for value in 1..=5 {
                emitter.next(value);
            }
            emitter.error("Source Error");
            Subscription::empty()
        });

        let events: Vec<_> = Pipeline::new()
            .stage(map(|v: u32| v * 10))
            .with_config(config)
            .unwrap()
            .into_stream(source)
            .collect()
            .await;

        let delivered = events.iter().filter(|event| event.is_ok()).count();
        assert_eq!(5 - delivered, 3);
        assert_eq!(events, vec![Ok(10), Ok(20), Err("Source Error")]);
    }

    #[test]
    fn with_config_validates() {
        let invalid =
            AdapterConfig::new().with_buffer_policy(BufferPolicy::DropNewest { capacity: 0 });
        let result = Pipeline::<u8, ()>::new().with_config(invalid);
        assert!(matches!(result, Err(ConfigError::ZeroCapacity)));

        let valid =
            AdapterConfig::new().with_buffer_policy(BufferPolicy::DropNewest { capacity: 4 });
        let pipeline = Pipeline::<u8, ()>::new()
            .stage(identity())
            .with_config(valid)
            .unwrap();
        assert_eq!(pipeline.len(), 1);
    }
}
