//! Assembling n-step transitions from single environment steps.
use crate::{error::ReplayBufferError, RawTransition, StoredTransition};
use anyhow::Result;
use std::collections::VecDeque;

/// Sliding window over the last `num_steps` transitions of one environment.
///
/// Each call to [`push`](NStepAccumulator::push) returns the n-step windows
/// that became complete with that step:
///
/// * while the episode runs, the full window is emitted once per step as soon
///   as it holds `num_steps` transitions; the oldest transition slides out on
///   the next push;
/// * when the step is terminal, the window is flushed as a sequence of
///   shrinking windows, from the whole window down to the last transition,
///   and left empty.
///
/// [`force_stop`](NStepAccumulator::force_stop) flushes the window the same
/// way when an episode is cut short, e.g. by a time limit.
///
/// # Examples
///
/// ```rust
/// use nstep_replay::{NStepAccumulator, RawTransition};
///
/// let mut acc = NStepAccumulator::new(2)?;
/// assert!(acc.push(RawTransition::new(0, 0, 1.0)).is_empty());
/// assert_eq!(acc.push(RawTransition::new(1, 0, 1.0)).len(), 1);
/// let flushed = acc.push(RawTransition::new(2, 0, 1.0).is_terminal(true));
/// assert_eq!(flushed.iter().map(|w| w.len()).collect::<Vec<_>>(), vec![2, 1]);
/// assert!(acc.is_empty());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct NStepAccumulator<S, A> {
    num_steps: usize,
    window: VecDeque<RawTransition<S, A>>,

    /// Set when the last push emitted the full window.
    emitted_full: bool,
}

impl<S, A> NStepAccumulator<S, A>
where
    S: Clone,
    A: Clone,
{
    /// Creates an empty accumulator.
    ///
    /// # Arguments
    ///
    /// * `num_steps` - Maximum length of the window
    ///
    /// # Errors
    ///
    /// Returns [`ReplayBufferError::CapacityConfiguration`] if `num_steps == 0`.
    pub fn new(num_steps: usize) -> Result<Self> {
        if num_steps == 0 {
            return Err(ReplayBufferError::CapacityConfiguration(
                "num_steps must be positive".to_string(),
            )
            .into());
        }
        Ok(Self {
            num_steps,
            window: VecDeque::with_capacity(num_steps),
            emitted_full: false,
        })
    }

    /// Adds a transition and returns the windows completed by it.
    pub fn push(&mut self, tr: RawTransition<S, A>) -> Vec<StoredTransition<S, A>> {
        if self.window.len() == self.num_steps {
            self.window.pop_front();
        }
        let is_terminal = tr.is_terminal;
        self.window.push_back(tr);

        if is_terminal {
            self.emitted_full = false;
            self.drain()
        } else if self.window.len() == self.num_steps {
            self.emitted_full = true;
            vec![self.snapshot()]
        } else {
            self.emitted_full = false;
            vec![]
        }
    }

    /// Flushes the window of an episode that ended without a terminal step.
    ///
    /// A window shorter than `num_steps` has never been emitted and is emitted
    /// whole first. A full window emitted by the last push is not emitted
    /// again. The remaining suffixes follow, down to length 1.
    /// Does nothing on an empty window.
    pub fn force_stop(&mut self) -> Vec<StoredTransition<S, A>> {
        if self.window.is_empty() {
            return vec![];
        }
        if self.emitted_full {
            self.window.pop_front();
            self.emitted_full = false;
        }
        self.drain()
    }

    /// Emits the window and its strictly shorter suffixes, leaving it empty.
    fn drain(&mut self) -> Vec<StoredTransition<S, A>> {
        let mut windows = Vec::with_capacity(self.window.len());
        while !self.window.is_empty() {
            windows.push(self.snapshot());
            self.window.pop_front();
        }
        windows
    }

    fn snapshot(&self) -> StoredTransition<S, A> {
        StoredTransition::new(self.window.iter().cloned().collect())
    }

    /// Number of transitions currently in the window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Returns `true` if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Maximum length of the window.
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Tr = RawTransition<usize, usize>;

    fn tr(t: usize) -> Tr {
        RawTransition::new(t, 0, t as f32).next_state(t + 1)
    }

    fn terminal(t: usize) -> Tr {
        tr(t).is_terminal(true)
    }

    fn states(windows: &[StoredTransition<usize, usize>]) -> Vec<Vec<usize>> {
        windows
            .iter()
            .map(|w| w.iter().map(|tr| tr.state).collect())
            .collect()
    }

    #[test]
    fn test_no_emission_before_window_is_full() {
        let mut acc = NStepAccumulator::new(3).unwrap();
        assert!(acc.push(tr(0)).is_empty());
        assert!(acc.push(tr(1)).is_empty());
        assert_eq!(states(&acc.push(tr(2))), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_full_window_emitted_on_every_push() {
        let mut acc = NStepAccumulator::new(3).unwrap();
        acc.push(tr(0));
        acc.push(tr(1));
        for t in 2..10 {
            let emitted = acc.push(tr(t));
            assert_eq!(states(&emitted), vec![vec![t - 2, t - 1, t]]);
            assert_eq!(acc.len(), 3);
        }
    }

    #[test]
    fn test_terminal_flush() {
        let mut acc = NStepAccumulator::new(3).unwrap();
        acc.push(tr(0));
        acc.push(tr(1));
        acc.push(tr(2));
        let emitted = acc.push(terminal(3));
        assert_eq!(
            states(&emitted),
            vec![vec![1, 2, 3], vec![2, 3], vec![3]]
        );
        assert!(acc.is_empty());
    }

    #[test]
    fn test_terminal_flush_of_short_window() {
        let mut acc = NStepAccumulator::new(5).unwrap();
        acc.push(tr(0));
        let emitted = acc.push(terminal(1));
        assert_eq!(states(&emitted), vec![vec![0, 1], vec![1]]);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_single_step_episode() {
        let mut acc = NStepAccumulator::new(3).unwrap();
        let emitted = acc.push(terminal(0));
        assert_eq!(states(&emitted), vec![vec![0]]);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_force_stop_on_empty_window() {
        let mut acc = NStepAccumulator::<usize, usize>::new(3).unwrap();
        assert!(acc.force_stop().is_empty());
        assert!(acc.is_empty());
    }

    #[test]
    fn test_force_stop_after_terminal_is_noop() {
        let mut acc = NStepAccumulator::new(2).unwrap();
        acc.push(tr(0));
        acc.push(terminal(1));
        assert!(acc.force_stop().is_empty());
    }

    #[test]
    fn test_force_stop_partial_window() {
        let mut acc = NStepAccumulator::new(3).unwrap();
        acc.push(tr(0));
        acc.push(tr(1));
        let emitted = acc.force_stop();
        assert_eq!(states(&emitted), vec![vec![0, 1], vec![1]]);
        assert!(acc.is_empty());
    }

    // The full window [1, 2, 3] was emitted by the last push; force_stop must
    // not emit it a second time.
    #[test]
    fn test_force_stop_skips_already_emitted_full_window() {
        let mut acc = NStepAccumulator::new(3).unwrap();
        for t in 0..4 {
            acc.push(tr(t));
        }
        let emitted = acc.force_stop();
        assert_eq!(states(&emitted), vec![vec![2, 3], vec![3]]);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_force_stop_one_step() {
        let mut acc = NStepAccumulator::new(1).unwrap();
        assert_eq!(states(&acc.push(tr(0))), vec![vec![0]]);
        assert!(acc.force_stop().is_empty());
        assert!(acc.is_empty());
    }

    #[test]
    fn test_zero_num_steps() {
        let err = NStepAccumulator::<usize, usize>::new(0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReplayBufferError>(),
            Some(ReplayBufferError::CapacityConfiguration(_))
        ));
    }
}
