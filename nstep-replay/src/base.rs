//! Interfaces between the replay buffer and the training loop.
mod batch;
mod replay_buffer;
pub use batch::TransitionBatch;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
