//! Replay buffer interface.
//!
//! Pushing experiences and taking batches are separate interfaces so that the
//! two sides can be implemented and tested independently.
use anyhow::Result;

/// Interface for buffers that store experiences.
pub trait ExperienceBufferBase {
    /// Items pushed into the buffer.
    type Item;

    /// Pushes an item into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the number of experiences in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no experience.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface for replay buffers that generate batches for training.
pub trait ReplayBufferBase {
    /// Configuration of the replay buffer.
    type Config: Clone;

    /// Batch generated by the buffer.
    type Batch;

    /// Builds a replay buffer from the configuration.
    fn build(config: &Self::Config) -> Self;

    /// Constructs a batch of `size` experiences.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
