//! Core error types for blockbar-core
//!
//! This module provides the error type shared by the block registry,
//! the render backends, the click dispatcher and the configuration loader.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while driving the status line.
///
/// Per-item problems (an unparsable click line, an unknown protocol key)
/// never surface here: they are traced at debug level and skipped.
#[derive(Debug, Error)]
pub enum BarError {
    /// Underlying IO error from the output stream or an input reader.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A configuration line could not be understood.
    #[error("invalid configuration at {path:?} line {line}: {reason}")]
    Config {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// None of the configuration candidates exist.
    #[error("no configuration file found")]
    ConfigNotFound,

    /// A block command could not be executed.
    ///
    /// Raised by the block runner when `sh` itself cannot be spawned,
    /// not when the command exits with a failure status.
    #[error("failed to run block {block}: {source}")]
    Spawn {
        block: String,
        #[source]
        source: io::Error,
    },

    /// JSON decoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using [`BarError`].
pub type BarResult<T> = Result<T, BarError>;
