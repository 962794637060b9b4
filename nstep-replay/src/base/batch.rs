//! Batch.

/// A minibatch of transitions consumed by an optimization step.
pub trait TransitionBatch {
    /// A set of observations in a batch.
    type ObsBatch;

    /// A set of actions in a batch.
    type ActBatch;

    /// Returns the number of samples in the batch.
    fn len(&self) -> usize;

    /// Returns `o_t`.
    fn obs(&self) -> &Self::ObsBatch;

    /// Returns `a_t`.
    fn act(&self) -> &Self::ActBatch;

    /// Returns the (possibly multi-step) rewards.
    fn reward(&self) -> &[f32];

    /// Returns the flags denoting if the last step of each sample is terminal.
    fn is_terminal(&self) -> &[bool];
}
