#![warn(missing_docs)]
//! Capacity-bounded n-step experience replay for DQN-family agents.
//!
//! A training loop appends one [`RawTransition`] per environment step with
//! [`ReplayBuffer::append`]. Steps are grouped per [`EnvId`] into windows of
//! `num_steps` consecutive transitions by an [`NStepAccumulator`], and every
//! completed window is kept as a [`StoredTransition`] in a
//! [`RandomAccessQueue`] that evicts the oldest entries once full.
//! Minibatches are drawn uniformly with [`ReplayBuffer::sample`], or as
//! n-step learning targets with [`ReplayBufferBase::batch`].
pub mod error;
pub mod random_access_queue;
pub mod replay_buffer;

mod accumulator;
mod base;
mod transition;
pub use accumulator::NStepAccumulator;
pub use base::{ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
pub use random_access_queue::RandomAccessQueue;
pub use replay_buffer::{
    NStepBatch, ReplayBuffer, ReplayBufferConfig, ReplayUpdater, ReplayUpdaterConfig,
};
pub use transition::{EnvId, RawTransition, StoredTransition};
