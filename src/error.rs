//! Error taxonomy for the log router.
//!
//! Registry and destination problems are surfaced to the caller. Problems that
//! happen while a record is being written are never returned from a log call;
//! they are reported through the crate's own `tracing` diagnostics instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the level registry, format templates and destination management.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// Two severity levels were configured with the same rank.
    #[error("rank {rank} is already owned by level '{existing}', cannot register '{attempted}'")]
    DuplicateRank {
        rank: u8,
        existing: String,
        attempted: String,
    },

    /// A severity name that is not in the registry.
    #[error("unknown log level '{0}'")]
    UnknownLevel(String),

    /// The parent directories of a log file could not be created.
    #[error("failed to create directories for {}: {source}", .path.display())]
    PathCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A log file could not be opened for appending.
    #[error("failed to open log file {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record format template could not be parsed.
    #[error("invalid format template '{template}': {reason}")]
    InvalidFormat { template: String, reason: String },

    /// An empty path was given for a file destination.
    #[error("log file path must not be empty")]
    EmptyPath,
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, LoggerError>;
