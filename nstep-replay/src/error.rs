//! Errors in the library.
use thiserror::Error;

/// Errors returned by the replay buffer and its queue.
#[derive(Error, Debug, PartialEq)]
pub enum ReplayBufferError {
    /// More transitions were requested than the buffer currently holds.
    ///
    /// This is not fatal; the caller should wait for more data.
    #[error("Insufficient data: requested {requested} items, but only {available} are stored")]
    InsufficientData {
        /// Number of items requested.
        requested: usize,
        /// Number of items available.
        available: usize,
    },

    /// Invalid buffer configuration, e.g. `num_steps == 0`.
    #[error("Capacity configuration error: {0}")]
    CapacityConfiguration(String),

    /// Invalid updater configuration, e.g. `update_interval == 0`.
    #[error("Updater configuration error: {0}")]
    UpdaterConfiguration(String),

    /// Persisted data is neither the current nor the legacy layout.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),
}
