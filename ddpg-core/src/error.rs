//! Errors in the library.
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum DdpgError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// A batch was requested from a replay buffer holding no transitions.
    #[error("Cannot sample a batch from an empty replay buffer")]
    EmptyReplayBuffer,

    /// A transition was observed before an observation and an action were recorded.
    #[error("No observation or action recorded before observe(); call reset() and take an action first")]
    NoObservation,

    /// A checkpoint file does not exist.
    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(PathBuf),

    /// A parameter expected by a model is absent from a checkpoint.
    #[error("Parameter {0} is not found")]
    MissingParameter(String),

    /// A parameter in a checkpoint has a different shape from the model's.
    #[error("Parameter {name} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Name of the parameter.
        name: String,
        /// Shape in the model.
        expected: Vec<i64>,
        /// Shape in the checkpoint.
        found: Vec<i64>,
    },

    /// A configuration value cannot be used to build an agent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
