//! N-step experience replay.
//!
//! # Key Components
//!
//! - [`ReplayBuffer`]: stores n-step transitions assembled per environment
//! - [`ReplayBufferConfig`]: capacity, number of steps, seed and discount factor
//! - [`NStepBatch`]: sampled windows collapsed into n-step learning targets
//! - [`ReplayUpdater`]: decides when the training loop draws minibatches
//!
//! # Examples
//!
//! ```rust
//! use nstep_replay::{
//!     EnvId, RawTransition, ReplayBuffer, ReplayBufferBase, ReplayBufferConfig,
//!     ReplayUpdater, ReplayUpdaterConfig, TransitionBatch,
//! };
//!
//! let config = ReplayBufferConfig::default().num_steps(3).gamma(0.9);
//! let mut buffer = ReplayBuffer::<Vec<f32>, i64>::build(&config)?;
//! let updater = ReplayUpdater::new(
//!     ReplayUpdaterConfig::default().replay_start_size(4).batch_size(2),
//! )?;
//!
//! for t in 0..10 {
//!     let tr = RawTransition::new(vec![t as f32], 0, 1.0).next_state(vec![t as f32 + 1.0]);
//!     buffer.append(tr, EnvId::DEFAULT);
//!     updater.update_if_necessary(t, &mut buffer, |batch| {
//!         assert_eq!(batch.len(), 2);
//!         Ok(())
//!     })?;
//! }
//! buffer.stop_current_episode(EnvId::DEFAULT);
//! # Ok::<(), anyhow::Error>(())
//! ```
mod base;
mod batch;
mod config;
pub mod persist;
mod updater;
pub use base::ReplayBuffer;
pub use batch::NStepBatch;
pub use config::ReplayBufferConfig;
pub use updater::{ReplayUpdater, ReplayUpdaterConfig};
