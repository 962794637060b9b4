//! Scheduling optimization steps from a replay buffer.
use crate::{error::ReplayBufferError, ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use log::trace;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ReplayUpdater`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayUpdaterConfig {
    /// Number of stored transitions required before the first update.
    pub replay_start_size: usize,

    /// Minibatch size.
    pub batch_size: usize,

    /// Interval of updates in environment steps.
    pub update_interval: usize,

    /// Number of minibatches drawn at each update.
    pub n_times_update: usize,
}

impl Default for ReplayUpdaterConfig {
    fn default() -> Self {
        Self {
            replay_start_size: 50_000,
            batch_size: 32,
            update_interval: 1,
            n_times_update: 1,
        }
    }
}

impl ReplayUpdaterConfig {
    /// Sets the number of stored transitions required before the first update.
    pub fn replay_start_size(mut self, v: usize) -> Self {
        self.replay_start_size = v;
        self
    }

    /// Sets the minibatch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the interval of updates in environment steps.
    pub fn update_interval(mut self, v: usize) -> Self {
        self.update_interval = v;
        self
    }

    /// Sets the number of minibatches drawn at each update.
    pub fn n_times_update(mut self, v: usize) -> Self {
        self.n_times_update = v;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayBufferError::UpdaterConfiguration`] if `update_interval == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.update_interval == 0 {
            return Err(ReplayBufferError::UpdaterConfiguration(
                "update_interval must be positive".to_string(),
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

/// Decides when the training loop draws minibatches from a replay buffer.
///
/// Nothing happens until the buffer holds `replay_start_size` stored
/// transitions. After that, every `update_interval` environment steps,
/// `n_times_update` minibatches are drawn and handed to the update function.
pub struct ReplayUpdater {
    config: ReplayUpdaterConfig,
}

impl ReplayUpdater {
    /// Creates an updater.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayBufferError::UpdaterConfiguration`] if
    /// `config.update_interval == 0`.
    pub fn new(config: ReplayUpdaterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReplayUpdaterConfig {
        &self.config
    }

    /// Runs the update function if an update is due at `iteration`.
    ///
    /// # Arguments
    ///
    /// * `iteration` - Number of environment steps taken so far
    /// * `buffer` - Replay buffer the minibatches are drawn from
    /// * `update_fn` - Called with each minibatch, `n_times_update` times per update
    ///
    /// # Returns
    ///
    /// `true` if updates were performed.
    ///
    /// # Errors
    ///
    /// Errors from sampling or from `update_fn` are returned as is.
    pub fn update_if_necessary<R, F>(
        &self,
        iteration: usize,
        buffer: &mut R,
        mut update_fn: F,
    ) -> Result<bool>
    where
        R: ReplayBufferBase + ExperienceBufferBase,
        F: FnMut(R::Batch) -> Result<()>,
    {
        if buffer.len() < self.config.replay_start_size {
            return Ok(false);
        }
        if iteration % self.config.update_interval != 0 {
            return Ok(false);
        }

        trace!("Update at iteration {}", iteration);
        for _ in 0..self.config.n_times_update {
            let batch = buffer.batch(self.config.batch_size)?;
            update_fn(batch)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnvId, RawTransition, ReplayBuffer, ReplayBufferConfig};
    use tempdir::TempDir;

    #[test]
    fn test_serde_replay_updater_config() -> Result<()> {
        let config = ReplayUpdaterConfig::default()
            .replay_start_size(100)
            .batch_size(16)
            .update_interval(4)
            .n_times_update(2);

        let dir = TempDir::new("replay_updater_config")?;
        let path = dir.path().join("replay_updater_config.yaml");
        config.save(&path)?;
        let config_ = ReplayUpdaterConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_zero_update_interval_is_rejected() {
        let config = ReplayUpdaterConfig::default().update_interval(0);
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReplayBufferError>(),
            Some(ReplayBufferError::UpdaterConfiguration(_))
        ));

        let err = ReplayUpdater::new(config).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ReplayBufferError>(),
            Some(ReplayBufferError::UpdaterConfiguration(_))
        ));
    }

    #[test]
    fn test_no_update_before_replay_start_size() -> Result<()> {
        let config = ReplayBufferConfig::default().capacity(None);
        let mut buffer = ReplayBuffer::<u32, u32>::new(&config)?;
        let updater = ReplayUpdater::new(
            ReplayUpdaterConfig::default()
                .replay_start_size(3)
                .batch_size(1),
        )?;

        let mut n_updates = 0;
        for t in 0..3 {
            assert!(!updater.update_if_necessary(t, &mut buffer, |_| {
                n_updates += 1;
                Ok(())
            })?);
            buffer.append(RawTransition::new(t as u32, 0, 0.0), EnvId::DEFAULT);
        }
        assert!(updater.update_if_necessary(3, &mut buffer, |_| {
            n_updates += 1;
            Ok(())
        })?);
        assert_eq!(n_updates, 1);
        Ok(())
    }
}
