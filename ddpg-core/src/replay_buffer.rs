//! A generic circular replay buffer.
mod base;
mod batch;
mod config;
mod subbatch;
pub use base::SimpleReplayBuffer;
pub use batch::StdBatch;
pub use config::SimpleReplayBufferConfig;
pub use subbatch::SubBatch;
