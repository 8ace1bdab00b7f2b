//! Error types for ferry coordination.

use thiserror::Error;

use crate::core::side::Side;

/// Fatal errors raised while setting up a run. None of these occur once vehicles
/// have started: boarding rejections are values, not errors.
#[derive(Debug, Error)]
pub enum FerryError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A side was given no toll booths.
    #[error("no toll booths on side {0}")]
    NoTollBooths(Side),
    /// A worker thread could not be started.
    #[error("failed to spawn {name}: {source}")]
    Spawn {
        /// Name of the thread that failed to start.
        name: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// Reading a configuration or trace file failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// Path involved.
        path: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

/// Marker returned from any wait point once the global stop flag has been raised.
///
/// Agents propagate it with `?` and abandon their trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stop requested")]
pub struct StopRequested;

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
