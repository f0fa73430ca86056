#![warn(missing_docs)]
//! Backend-independent building blocks of the DDPG agent.
//!
//! This crate holds the interfaces shared by agents and replay buffers,
//! a generic circular replay buffer, and [`record::Record`], the value type
//! agents use to report losses to the caller.
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Agent, Configurable, ExperienceBufferBase, Policy, ReplayBufferBase, TransitionBatch,
};
