//! Batches of n-step learning targets.
use crate::{StoredTransition, TransitionBatch};

/// A minibatch of n-step transitions collapsed into learning targets.
///
/// For a sampled window `[tr_0, ..., tr_{k-1}]` the batch holds
///
/// * `obs`, `act`: the state and action of `tr_0`,
/// * `reward`: `sum_i gamma^i r_i` over the window,
/// * `next_obs`, `is_terminal`: those of `tr_{k-1}`,
/// * `discount`: `gamma^k`, the factor applied to the bootstrapped value.
///
/// Windows shorter than `num_steps` only occur at the end of episodes, so
/// `discount` must be taken from the batch rather than assumed to be `gamma^n`.
#[derive(Clone, Debug, PartialEq)]
pub struct NStepBatch<S, A> {
    /// Observations `o_t`.
    pub obs: Vec<S>,

    /// Actions `a_t`.
    pub act: Vec<A>,

    /// Observations `o_t+k` after the last step of each window.
    pub next_obs: Vec<Option<S>>,

    /// Actions `a_t+k` at `o_t+k`, if every sampled window has one.
    pub next_act: Option<Vec<A>>,

    /// Discounted reward sums.
    pub reward: Vec<f32>,

    /// Terminal flags of the last step of each window.
    pub is_terminal: Vec<bool>,

    /// Discount factors `gamma^k`.
    pub discount: Vec<f32>,

    /// Per-sample weights, if every sampled window has a `weight` field in its
    /// first step.
    pub weight: Option<Vec<f32>>,
}

impl<S, A> NStepBatch<S, A>
where
    S: Clone,
    A: Clone,
{
    /// Key of the auxiliary field read into [`NStepBatch::weight`].
    pub const WEIGHT_KEY: &'static str = "weight";

    /// Collapses sampled windows into a batch.
    ///
    /// Empty windows are skipped; the buffer never stores any.
    pub fn from_windows(windows: &[StoredTransition<S, A>], gamma: f32) -> Self {
        let windows = windows
            .iter()
            .filter_map(|w| Some((w, w.first()?, w.last()?)))
            .collect::<Vec<_>>();

        let next_act = windows
            .iter()
            .map(|(_, _, last)| last.next_action.clone())
            .collect::<Option<Vec<_>>>();
        let weight = windows
            .iter()
            .map(|(_, first, _)| first.extra.get(Self::WEIGHT_KEY).copied())
            .collect::<Option<Vec<_>>>();

        Self {
            obs: windows.iter().map(|(_, first, _)| first.state.clone()).collect(),
            act: windows.iter().map(|(_, first, _)| first.action.clone()).collect(),
            next_obs: windows.iter().map(|(_, _, last)| last.next_state.clone()).collect(),
            next_act,
            reward: windows.iter().map(|(w, _, _)| w.discounted_reward(gamma)).collect(),
            is_terminal: windows.iter().map(|(_, _, last)| last.is_terminal).collect(),
            discount: windows
                .iter()
                .map(|(w, _, _)| gamma.powi(w.len() as i32))
                .collect(),
            weight,
        }
    }
}

impl<S, A> TransitionBatch for NStepBatch<S, A> {
    type ObsBatch = Vec<S>;
    type ActBatch = Vec<A>;

    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &Self::ObsBatch {
        &self.obs
    }

    fn act(&self) -> &Self::ActBatch {
        &self.act
    }

    fn reward(&self) -> &[f32] {
        &self.reward
    }

    fn is_terminal(&self) -> &[bool] {
        &self.is_terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawTransition;

    fn window(ts: std::ops::Range<usize>, terminal: bool) -> StoredTransition<usize, usize> {
        let end = ts.end;
        StoredTransition::new(
            ts.map(|t| {
                RawTransition::new(t, t * 10, 1.0)
                    .next_state(t + 1)
                    .is_terminal(terminal && t + 1 == end)
            })
            .collect(),
        )
    }

    #[test]
    fn test_from_windows() {
        let windows = vec![window(0..3, false), window(5..7, true)];
        let batch = NStepBatch::from_windows(&windows, 0.5);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.obs, vec![0, 5]);
        assert_eq!(batch.act, vec![0, 50]);
        assert_eq!(batch.next_obs, vec![Some(3), Some(7)]);
        assert_eq!(batch.is_terminal, vec![false, true]);
        assert_eq!(batch.reward, vec![1.75, 1.5]);
        assert_eq!(batch.discount, vec![0.125, 0.25]);
        assert_eq!(batch.next_act, None);
        assert_eq!(batch.weight, None);
    }

    #[test]
    fn test_optional_columns() {
        let windows = vec![
            StoredTransition::new(vec![RawTransition::new(0usize, 0usize, 0.0)
                .next_action(1)
                .extra("weight", 0.5)]),
            StoredTransition::new(vec![RawTransition::new(1, 1, 0.0)
                .next_action(2)
                .extra("weight", 2.0)]),
        ];
        let batch = NStepBatch::from_windows(&windows, 0.99);
        assert_eq!(batch.next_act, Some(vec![1, 2]));
        assert_eq!(batch.weight, Some(vec![0.5, 2.0]));
    }
}
