use serde::Deserialize;

use super::error::ConfigError;

/// How values are held between a push source and a slower consumer
///
/// A push source is never slowed down, so every policy trades memory for
/// completeness differently. Terminal events are never dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BufferPolicy {
    /// Queue every value until it is demanded (DEFAULT)
    #[default]
    Unbounded,

    /// Hold at most `capacity` undemanded values; newer values are discarded
    DropNewest { capacity: usize },
}

impl BufferPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            BufferPolicy::Unbounded => Ok(()),
            BufferPolicy::DropNewest { capacity: 0 } => Err(ConfigError::ZeroCapacity),
            BufferPolicy::DropNewest { .. } => Ok(()),
        }
    }
}

/// Settings for one push-to-pull adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub buffer: BufferPolicy,
}

impl AdapterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffering policy (defaults to Unbounded)
    ///
    /// # Example
    /// ```rust,ignore
    /// // Keep at most 1024 values waiting for demand
    /// AdapterConfig::new().with_buffer_policy(BufferPolicy::DropNewest { capacity: 1024 })
    /// ```
    pub fn with_buffer_policy(mut self, buffer: BufferPolicy) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.buffer.validate()
    }
}
