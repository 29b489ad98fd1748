pub mod config;
pub mod error;
pub mod pull;

// Re-export commonly used types
pub use config::{AdapterConfig, BufferPolicy};
pub use error::ConfigError;
pub use pull::{PullStream, adapt, adapt_with};
