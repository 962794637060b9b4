//! Configuration of [`ReplayBuffer`](super::ReplayBuffer).
use crate::error::ReplayBufferError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ReplayBuffer`](super::ReplayBuffer).
///
/// # Examples
///
/// ```rust
/// use nstep_replay::ReplayBufferConfig;
///
/// let config = ReplayBufferConfig::default()
///     .capacity(Some(100_000))
///     .num_steps(3)
///     .gamma(0.99)
///     .seed(42);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayBufferConfig {
    /// Maximum number of stored transitions. `None` for an unbounded buffer.
    /// When the buffer is full, new transitions replace the oldest ones.
    pub capacity: Option<usize>,

    /// Number of environment steps per stored transition (n of n-step returns).
    pub num_steps: usize,

    /// Random seed used for sampling.
    pub seed: u64,

    /// Discount factor applied when collapsing windows into n-step rewards.
    pub gamma: f32,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: Some(1_000_000),
            num_steps: 1,
            seed: 42,
            gamma: 0.99,
        }
    }
}

impl ReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of stored transitions, `None` for no bound
    pub fn capacity(mut self, capacity: Option<usize>) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the number of steps per stored transition.
    ///
    /// # Arguments
    ///
    /// * `num_steps` - Maximum length of a stored window. Must be positive;
    ///   this is checked by [`validate`](Self::validate).
    pub fn num_steps(mut self, num_steps: usize) -> Self {
        self.num_steps = num_steps;
        self
    }

    /// Sets the random seed for sampling.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed of the generator used by `sample`
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the discount factor.
    ///
    /// # Arguments
    ///
    /// * `gamma` - Discount factor applied to the rewards of a window
    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayBufferError::CapacityConfiguration`] if `num_steps == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.num_steps == 0 {
            return Err(ReplayBufferError::CapacityConfiguration(
                "num_steps must be positive".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_replay_buffer_config() -> Result<()> {
        let config = ReplayBufferConfig::default()
            .capacity(Some(500))
            .num_steps(3)
            .seed(7)
            .gamma(0.9);

        let dir = TempDir::new("replay_buffer_config")?;
        let path = dir.path().join("replay_buffer_config.yaml");
        config.save(&path)?;
        let config_ = ReplayBufferConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_zero_num_steps_is_rejected() {
        let err = ReplayBufferConfig::default()
            .num_steps(0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReplayBufferError>(),
            Some(ReplayBufferError::CapacityConfiguration(_))
        ));
    }
}
