//! DDPG agent.
//!
//! The agent keeps an actor, a critic and their target copies, a replay
//! memory and an exploration process. [`Ddpg::update_policy`] performs one
//! optimization step:
//!
//! 1. sample a batch from the replay memory,
//! 2. compute bootstrapped targets `r + γ (1 - terminal) Q'(s', μ'(s'))`
//!    with the target networks in a no-gradient region,
//! 3. regress the critic onto the targets,
//! 4. ascend the critic's value of the actor's actions,
//! 5. soft-update both target networks.
mod actor;
mod base;
mod config;
mod critic;
mod encoder;
mod explorer;
pub use actor::Actor;
pub use base::{bootstrapped_target, Ddpg, DdpgAct};
pub use config::{ActingNetwork, ActorConfig, CriticConfig, DdpgConfig, EncoderConfig};
pub use critic::Critic;
pub use encoder::Encoder;
pub use explorer::{
    EpsilonSchedule, ExplorationProcess, ExplorerConfig, GaussianNoise, OrnsteinUhlenbeck,
    UniformNoise,
};
