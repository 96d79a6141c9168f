//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The configuration file does not exist.
    #[error("config not found at {path}. Create it or pass --config")]
    ConfigNotFound { path: PathBuf },

    /// A `--user` or `--assign` value is not valid JSON.
    #[error("invalid JSON for {name}: {source}")]
    InvalidJson {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// An `--assign` argument is not of the form `name=JSON`.
    #[error("expected name=JSON, got '{0}'")]
    InvalidAssign(String),

    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the controller layer.
    #[error(transparent)]
    Controller(#[from] controller::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
