//! Error types for configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is invalid.
    #[error("invalid configuration in '{path}': {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ghia_core::CoreError,
    },

    /// File is neither an auth file nor a rule file.
    #[error("Invalid format of configuration file {0}")]
    UnrecognizedFile(PathBuf),

    /// `GITHUB_USER` unset or empty.
    #[error("No GitHub user specified")]
    MissingUser,

    /// `GHIA_CONFIG` unset or empty.
    #[error("No configuration files found")]
    NoConfigFiles,

    /// None of the configuration files provided a token.
    #[error("no [github] section with a token in any configuration file")]
    MissingAuth,
}
