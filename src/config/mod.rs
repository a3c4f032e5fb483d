//! Hierarchical YAML configuration
//!
//! A configuration is composed from a primary file, the config groups
//! selected by its `defaults` list and command-line overrides. The result is
//! a plain YAML tree ([`Config`]) that can be printed, queried by dotted
//! path, interpolated and handed to the instantiator.

pub mod interpolation;
pub mod loader;
pub mod overrides;
pub mod run;
pub mod tree;

pub use loader::ConfigLoader;
pub use overrides::{expand_sweeps, parse_overrides, Override, OverrideOp};
pub use run::RunDir;
pub use tree::Config;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, composing or resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("could not find '{option}' in config group '{group}' (available: {available})")]
    MissingGroupOption {
        group: String,
        option: String,
        available: String,
    },

    #[error("invalid defaults list in {path}: {message}")]
    InvalidDefaults { path: String, message: String },

    #[error("invalid override '{text}': {reason}")]
    InvalidOverride { text: String, reason: String },

    #[error("could not override '{0}': key not found (use '+{0}=...' to add it)")]
    KeyNotFound(String),

    #[error("could not append '{0}': key already exists (use '++{0}=...' to force it)")]
    KeyExists(String),

    #[error("could not delete '{0}': key not found")]
    DeleteMissing(String),

    #[error("'{0}' is not a mapping")]
    NotAMapping(String),

    #[error("interpolation '${{{0}}}' references a missing key")]
    InterpolationNotFound(String),

    #[error("interpolation cycle detected through '{0}'")]
    InterpolationCycle(String),

    #[error("interpolation '${{{0}}}' resolves to a mapping or sequence and cannot be embedded in a string")]
    NonScalarInterpolation(String),

    #[error("environment variable '{0}' is not set")]
    EnvVarMissing(String),
}
