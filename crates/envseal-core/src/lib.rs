//! envseal Core Library
//!
//! Shared functionality for envseal components:
//! - Configuration resolution (defaults, settings file, environment)
//! - Common error types
//! - Tracing initialisation

pub mod config;
pub mod error;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
