//! N-step replay buffer.
use super::{persist, NStepBatch, ReplayBufferConfig};
use crate::{
    EnvId, ExperienceBufferBase, NStepAccumulator, RandomAccessQueue, RawTransition,
    ReplayBufferBase, StoredTransition,
};
use anyhow::Result;
use log::{debug, info, trace, warn};
use rand::{rngs::StdRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

/// Experience replay buffer storing n-step transitions.
///
/// Steps appended for each [`EnvId`] go through their own
/// [`NStepAccumulator`]; every window it emits is stored in a
/// [`RandomAccessQueue`] bounded by the configured capacity, so the oldest
/// stored transitions are evicted first. With `num_steps == 1` this is plain
/// one-step experience replay.
///
/// The buffer is meant to be driven by a single training loop: all methods
/// run to completion and mutating ones take `&mut self`.
///
/// # Examples
///
/// ```rust
/// use nstep_replay::{EnvId, RawTransition, ReplayBuffer, ReplayBufferConfig};
///
/// let config = ReplayBufferConfig::default().capacity(Some(3)).num_steps(2);
/// let mut buffer = ReplayBuffer::<u32, u32>::new(&config)?;
///
/// buffer.append(RawTransition::new(1, 0, 0.0), EnvId::DEFAULT);
/// buffer.append(RawTransition::new(2, 0, 0.0), EnvId::DEFAULT);
/// buffer.append(RawTransition::new(3, 0, 1.0).is_terminal(true), EnvId::DEFAULT);
/// assert_eq!(buffer.len(), 3);
///
/// let windows = buffer.sample(2)?;
/// assert_eq!(windows.len(), 2);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct ReplayBuffer<S, A> {
    /// Number of steps per stored transition.
    num_steps: usize,

    /// Discount factor used by [`ReplayBufferBase::batch`].
    gamma: f32,

    /// Stored transitions, oldest first.
    memory: RandomAccessQueue<StoredTransition<S, A>>,

    /// Windows of the environments whose episode is running.
    accumulators: HashMap<EnvId, NStepAccumulator<S, A>>,

    /// Empty window cloned when an episode starts.
    empty_window: NStepAccumulator<S, A>,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl<S, A> ReplayBuffer<S, A>
where
    S: Clone,
    A: Clone,
{
    /// Creates an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayBufferError::CapacityConfiguration`](crate::error::ReplayBufferError::CapacityConfiguration)
    /// if `config.num_steps == 0`.
    pub fn new(config: &ReplayBufferConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Construct replay buffer with capacity = {:?}, num_steps = {}",
            config.capacity, config.num_steps
        );

        Ok(Self {
            num_steps: config.num_steps,
            gamma: config.gamma,
            memory: RandomAccessQueue::new(config.capacity),
            accumulators: HashMap::new(),
            empty_window: NStepAccumulator::new(config.num_steps)?,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Appends a step of the environment `env_id`.
    ///
    /// The transitions are not validated. Windows completed by this step are
    /// stored, possibly evicting the oldest stored transitions.
    ///
    /// # Arguments
    ///
    /// * `tr` - Step of the environment
    /// * `env_id` - Environment the step comes from. The first step of an id
    ///   with no running episode starts a new one.
    pub fn append(&mut self, tr: RawTransition<S, A>, env_id: EnvId) {
        trace!("ReplayBuffer::append(env_id = {})", env_id);
        let is_terminal = tr.is_terminal;
        let empty_window = &self.empty_window;
        let windows = self
            .accumulators
            .entry(env_id)
            .or_insert_with(|| empty_window.clone())
            .push(tr);

        // The window has been flushed
        if is_terminal {
            self.accumulators.remove(&env_id);
        }
        self.store(windows);
    }

    /// Ends the running episode of `env_id` without a terminal step.
    ///
    /// The remaining windows are stored and the next append for `env_id`
    /// starts a new episode. Does nothing if no episode is running.
    pub fn stop_current_episode(&mut self, env_id: EnvId) {
        if let Some(mut acc) = self.accumulators.remove(&env_id) {
            let windows = acc.force_stop();
            debug!(
                "Stop episode of env_id = {}, {} windows flushed",
                env_id,
                windows.len()
            );
            self.store(windows);
        }
    }

    fn store(&mut self, windows: Vec<StoredTransition<S, A>>) {
        for w in windows {
            self.memory.append(w);
        }
    }

    /// Samples `k` distinct stored transitions uniformly at random.
    ///
    /// # Arguments
    ///
    /// * `k` - Number of transitions to sample
    ///
    /// # Returns
    ///
    /// Clones of the sampled windows, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayBufferError::InsufficientData`](crate::error::ReplayBufferError::InsufficientData)
    /// if fewer than `k` transitions are stored.
    pub fn sample(&mut self, k: usize) -> Result<Vec<StoredTransition<S, A>>> {
        Ok(self
            .memory
            .sample(k, &mut self.rng)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Returns an iterator over the stored transitions, oldest first.
    pub fn iter(&self) -> crate::random_access_queue::Iter<'_, StoredTransition<S, A>> {
        self.memory.iter()
    }

    /// Returns the stored transitions.
    pub fn memory(&self) -> &RandomAccessQueue<StoredTransition<S, A>> {
        &self.memory
    }

    /// Removes all stored transitions and running episodes.
    pub fn clear(&mut self) {
        self.memory.clear();
        self.accumulators.clear();
    }

    /// Returns the number of stored transitions.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns `true` if no transition is stored.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Returns the maximum number of stored transitions.
    pub fn capacity(&self) -> Option<usize> {
        self.memory.maxlen()
    }

    /// Returns the number of steps per stored transition.
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Returns the number of environments with a running episode.
    pub fn num_active_episodes(&self) -> usize {
        self.accumulators
            .values()
            .filter(|acc| !acc.is_empty())
            .count()
    }
}

impl<S, A> ReplayBuffer<S, A>
where
    S: Clone + Serialize + DeserializeOwned,
    A: Clone + Serialize + DeserializeOwned,
{
    /// Writes the stored transitions to `writer`.
    ///
    /// Running episodes are not persisted.
    pub fn save_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        persist::write_queue(writer, &self.memory)
    }

    /// Replaces the stored transitions with those read from `reader`.
    ///
    /// Data persisted by older releases is converted on load. The capacity of
    /// the buffer becomes the one of the persisted memory.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayBufferError::UnknownFormat`](crate::error::ReplayBufferError::UnknownFormat)
    /// if the data is not a persisted memory. I/O errors are returned as
    /// [`std::io::Error`]. The buffer is left unchanged on error.
    pub fn load_from_reader<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        let memory = persist::read_queue(reader)?;
        if memory.maxlen() != self.memory.maxlen() {
            warn!(
                "Capacity of the loaded memory ({:?}) differs from the current one ({:?})",
                memory.maxlen(),
                self.memory.maxlen()
            );
        }
        self.memory = memory;
        Ok(())
    }

    /// Saves the stored transitions to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.save_to_writer(&mut writer)?;
        info!("Save replay buffer of {} transitions to {:?}", self.len(), path);
        Ok(())
    }

    /// Loads the stored transitions from a file written by [`ReplayBuffer::save`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        self.load_from_reader(&mut reader)?;
        info!("Load replay buffer of {} transitions from {:?}", self.len(), path);
        Ok(())
    }
}

impl<S, A> ExperienceBufferBase for ReplayBuffer<S, A>
where
    S: Clone,
    A: Clone,
{
    type Item = (EnvId, RawTransition<S, A>);

    fn push(&mut self, (env_id, tr): Self::Item) -> Result<()> {
        self.append(tr, env_id);
        Ok(())
    }

    fn len(&self) -> usize {
        self.memory.len()
    }
}

impl<S, A> ReplayBufferBase for ReplayBuffer<S, A>
where
    S: Clone,
    A: Clone,
{
    type Config = ReplayBufferConfig;
    type Batch = NStepBatch<S, A>;

    fn build(config: &Self::Config) -> Result<Self> {
        Self::new(config)
    }

    /// Samples `size` stored transitions and collapses them into n-step targets.
    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        let windows = self.sample(size)?;
        Ok(NStepBatch::from_windows(&windows, self.gamma))
    }
}
