//! Agent.
use super::Policy;
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy.
///
/// The agent owns its experience: transitions are pushed with
/// [`Agent::observe`] and consumed by [`Agent::opt`].
pub trait Agent: Policy {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Starts an episode with the given observation.
    fn reset(&mut self, obs: Self::Obs);

    /// Stores the transition from the current observation with the last action.
    fn observe(&mut self, reward: f32, next_obs: Self::Obs, is_terminal: bool) -> Result<()>;

    /// Performs an optimization step and returns some information.
    fn opt(&mut self) -> Result<Record>;

    /// Save the parameters of the agent in the given directory.
    ///
    /// `num` distinguishes checkpoints written into the same directory.
    fn save_params(&self, path: &Path, num: usize) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path, num: usize) -> Result<()>;
}
