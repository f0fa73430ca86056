//! A generic implementation of [`TransitionBatch`].
use super::SubBatch;
use crate::TransitionBatch;

/// A generic implementation of [`TransitionBatch`].
///
/// The same type carries transitions pushed into a replay buffer and batches
/// sampled from it; the fields are parallel arrays.
pub struct StdBatch<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    /// Observations.
    pub obs: O,

    /// Actions.
    pub act: A,

    /// Next observations.
    pub next_obs: O,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Terminal flags.
    pub is_terminal: Vec<i8>,

    /// Sample indices, set when the batch is taken from a replay buffer.
    pub ix_sample: Option<Vec<usize>>,
}

impl<O, A> StdBatch<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    /// Creates a batch of transitions.
    pub fn new(obs: O, act: A, next_obs: O, reward: Vec<f32>, is_terminal: Vec<i8>) -> Self {
        debug_assert_eq!(reward.len(), is_terminal.len());
        Self {
            obs,
            act,
            next_obs,
            reward,
            is_terminal,
            ix_sample: None,
        }
    }
}

impl<O, A> TransitionBatch for StdBatch<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    type ObsBatch = O;
    type ActBatch = A;

    fn unpack(self) -> (O, A, O, Vec<f32>, Vec<i8>) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminal,
        )
    }

    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &O {
        &self.obs
    }

    fn act(&self) -> &A {
        &self.act
    }

    fn next_obs(&self) -> &O {
        &self.next_obs
    }

    fn reward(&self) -> &Vec<f32> {
        &self.reward
    }

    fn is_terminal(&self) -> &Vec<i8> {
        &self.is_terminal
    }
}
