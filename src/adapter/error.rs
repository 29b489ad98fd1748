use thiserror::Error;

/// Invalid adapter configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Buffer capacity must be at least 1")]
    ZeroCapacity,
}
