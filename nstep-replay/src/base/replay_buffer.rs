//! Replay buffer interface for reinforcement learning.
//!
//! This module defines the two sides of an experience replay buffer as seen
//! from a training loop: pushing experiences collected from environments, and
//! drawing batches for optimization steps.

use anyhow::Result;

/// Interface for buffers that store experiences from environments.
///
/// # Examples
///
/// ```ignore
/// struct SimpleBuffer<T> {
///     items: Vec<T>,
/// }
///
/// impl<T> ExperienceBufferBase for SimpleBuffer<T> {
///     type Item = T;
///
///     fn push(&mut self, tr: T) -> Result<()> {
///         self.items.push(tr);
///         Ok(())
///     }
///
///     fn len(&self) -> usize {
///         self.items.len()
///     }
/// }
/// ```
pub trait ExperienceBufferBase {
    /// The type of items pushed into the buffer.
    type Item;

    /// Pushes a new experience into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the current number of experiences in the buffer.
    ///
    /// For buffers assembling multi-step transitions, this counts stored
    /// units, not pushed items.
    fn len(&self) -> usize;
}

/// Interface for replay buffers that generate batches for training.
///
/// # Associated Types
///
/// * `Config` - Configuration parameters for the buffer
/// * `Batch` - The type of batch generated for training
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// Builds a new replay buffer from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Samples `size` experiences and returns them as a batch for training.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
