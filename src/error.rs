// error.rs - Error types for configuration loading

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while building a resolved configuration.
///
/// None of these are transient: they are all startup faults caused by a broken
/// invocation or a broken configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A `--dataset` occurrence carried 0 or more than 7 values
    #[error("--dataset takes between 1 and {max} values, got {got}: {values:?}")]
    InvalidArity {
        got: usize,
        max: usize,
        values: Vec<String>,
    },

    /// Rejected by the argument parser (unknown flag, bad type, invalid choice)
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// `data`, `methods` or one of their `list` keys is missing
    #[error("configuration is missing required section '{0}'")]
    MissingSchemaSection(String),

    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The resolved tree does not fit the typed schema
    #[error("resolved configuration does not match the schema: {0}")]
    Schema(#[source] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
