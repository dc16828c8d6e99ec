//! Error types for the envseal core library.

use thiserror::Error;

/// Result type alias using the envseal core `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for envseal configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
