//! Transitions stored in the replay buffer.
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, ops::Deref};

/// Identifier of an environment feeding the buffer.
///
/// Vectorized training loops drive several environments at once and append
/// their steps to a single buffer; each environment gets its own n-step window.
/// Single-environment loops pass [`EnvId::DEFAULT`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct EnvId(pub usize);

impl EnvId {
    /// The identifier used when only one environment is running.
    pub const DEFAULT: EnvId = EnvId(0);
}

impl From<usize> for EnvId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single environment step `(s_t, a_t, r_t, s_t+1, a_t+1)`.
///
/// Observations and actions are opaque to the buffer. Auxiliary scalar
/// fields, such as per-step weights, are passed through verbatim in `extra`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RawTransition<S, A> {
    /// Observation before the action.
    pub state: S,

    /// Action taken.
    pub action: A,

    /// Reward.
    pub reward: f32,

    /// Observation after the action.
    pub next_state: Option<S>,

    /// Action taken at the next state, used for on-policy bootstrap targets.
    pub next_action: Option<A>,

    /// `true` iff the episode ended on this step.
    pub is_terminal: bool,

    /// Auxiliary scalar fields.
    pub extra: BTreeMap<String, f32>,
}

impl<S, A> RawTransition<S, A> {
    /// Creates a non-terminal transition without next observation or extra fields.
    pub fn new(state: S, action: A, reward: f32) -> Self {
        Self {
            state,
            action,
            reward,
            next_state: None,
            next_action: None,
            is_terminal: false,
            extra: BTreeMap::new(),
        }
    }

    /// Sets the next observation.
    pub fn next_state(mut self, next_state: S) -> Self {
        self.next_state = Some(next_state);
        self
    }

    /// Sets the next action.
    pub fn next_action(mut self, next_action: A) -> Self {
        self.next_action = Some(next_action);
        self
    }

    /// Sets the terminal flag.
    pub fn is_terminal(mut self, is_terminal: bool) -> Self {
        self.is_terminal = is_terminal;
        self
    }

    /// Adds an auxiliary scalar field.
    pub fn extra(mut self, key: impl Into<String>, value: f32) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// An n-step window of consecutive transitions, oldest first.
///
/// Its length is `num_steps` of the buffer, except at episode boundaries where
/// the windows flushed at the end of an episode get shorter.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StoredTransition<S, A>(Vec<RawTransition<S, A>>);

impl<S, A> StoredTransition<S, A> {
    /// Wraps a window of transitions.
    pub fn new(transitions: Vec<RawTransition<S, A>>) -> Self {
        Self(transitions)
    }

    /// The oldest transition of the window.
    pub fn first(&self) -> Option<&RawTransition<S, A>> {
        self.0.first()
    }

    /// The newest transition of the window.
    pub fn last(&self) -> Option<&RawTransition<S, A>> {
        self.0.last()
    }

    /// Discounted sum of the rewards in the window, `sum_i gamma^i r_i`.
    pub fn discounted_reward(&self, gamma: f32) -> f32 {
        self.0
            .iter()
            .fold((0.0, 1.0), |(sum, discount), tr| {
                (sum + discount * tr.reward, discount * gamma)
            })
            .0
    }

    /// Unwraps the window.
    pub fn into_inner(self) -> Vec<RawTransition<S, A>> {
        self.0
    }
}

impl<S, A> Deref for StoredTransition<S, A> {
    type Target = [RawTransition<S, A>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, A> From<Vec<RawTransition<S, A>>> for StoredTransition<S, A> {
    fn from(transitions: Vec<RawTransition<S, A>>) -> Self {
        Self(transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let tr = RawTransition::new(1, 0, 0.5)
            .next_state(2)
            .next_action(1)
            .is_terminal(true)
            .extra("weight", 0.3);
        assert_eq!(tr.next_state, Some(2));
        assert_eq!(tr.next_action, Some(1));
        assert!(tr.is_terminal);
        assert_eq!(tr.extra.get("weight"), Some(&0.3));
    }

    #[test]
    fn test_discounted_reward() {
        let window = StoredTransition::new(vec![
            RawTransition::new(0, 0, 1.0),
            RawTransition::new(1, 0, 2.0),
            RawTransition::new(2, 0, 4.0),
        ]);
        assert_eq!(window.len(), 3);
        assert!((window.discounted_reward(0.5) - 3.0).abs() < 1e-6);
        assert!((window.discounted_reward(1.0) - 7.0).abs() < 1e-6);
        assert_eq!(window.first().map(|tr| tr.state), Some(0));
        assert_eq!(window.last().map(|tr| tr.state), Some(2));
    }
}
