//! Error types for the generator pipeline.
//!
//! Diagnostics about the input are never errors; these variants cover the
//! cases where a run cannot produce output at all.

use thiserror::Error;

use crate::format::FormatError;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The host cancelled the run between two units of work.
    #[error("pipeline run cancelled")]
    Cancelled,

    /// A fragment could not be formatted as Rust source.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// A stage input could not be encoded for fingerprinting.
    #[error("fingerprint error: {0}")]
    Fingerprint(#[from] serde_json::Error),

    /// A descriptor broke an invariant that extraction guarantees.
    #[error("internal invariant violated at {location}: {message}")]
    Invariant { location: String, message: String },
}

/// Convenience alias for results with [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised while loading a [`GeneratorConfig`](crate::config::GeneratorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// `emit.runtime_path` is not a Rust path.
    #[error("invalid runtime path: {0:?}")]
    InvalidRuntimePath(String),
}
