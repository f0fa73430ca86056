//! Configuration of DDPG agent.
use super::ExplorerConfig;
use crate::{cnn::PixelCnnConfig, mlp::MlpConfig, opt::OptimizerConfig, util::CriticLoss, Device};
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path)?;
    let rdr = BufReader::new(file);
    let b = serde_yaml::from_reader(rdr)?;
    Ok(b)
}

fn save_yaml<T: Serialize>(config: &T, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(serde_yaml::to_string(config)?.as_bytes())?;
    Ok(())
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Actor`](super::Actor).
pub struct ActorConfig<P> {
    pub pi_config: Option<P>,
    pub opt_config: OptimizerConfig,
}

impl<P> Default for ActorConfig<P> {
    fn default() -> Self {
        Self {
            pi_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-4 },
        }
    }
}

impl<P> ActorConfig<P>
where
    P: DeserializeOwned + Serialize,
{
    /// Sets configuration of the policy network.
    pub fn pi_config(mut self, v: P) -> Self {
        self.pi_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`ActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_yaml(path)
    }

    /// Saves [`ActorConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_yaml(self, path)
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Critic`](super::Critic).
pub struct CriticConfig<Q> {
    pub q_config: Option<Q>,
    pub opt_config: OptimizerConfig,
}

impl<Q> Default for CriticConfig<Q> {
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-3 },
        }
    }
}

impl<Q> CriticConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets configuration of the action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`CriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_yaml(path)
    }

    /// Saves [`CriticConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_yaml(self, path)
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Encoder`](super::Encoder).
pub struct EncoderConfig {
    pub cnn_config: PixelCnnConfig,
    pub opt_config: OptimizerConfig,
}

impl EncoderConfig {
    /// Encoder with the given network, optimized with Adam (`lr = 1e-3`).
    pub fn new(cnn_config: PixelCnnConfig) -> Self {
        Self {
            cnn_config,
            opt_config: OptimizerConfig::Adam { lr: 1e-3 },
        }
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }
}

/// The network computing actions in [`Ddpg::select_action`](super::Ddpg::select_action).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum ActingNetwork {
    /// The actor being optimized.
    Online,

    /// The soft-updated copy of the actor.
    Target,
}

/// Constructs [`Ddpg`](super::Ddpg).
///
/// `P` and `Q` are the configurations of the policy network and the
/// action-value function.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DdpgConfig<P, Q> {
    pub actor_config: ActorConfig<P>,
    pub critic_config: CriticConfig<Q>,

    /// Pixel encoder shared by the actor and the critic. Observations are
    /// images of shape `[height, width, channels]` if set.
    pub encoder_config: Option<EncoderConfig>,
    pub batch_size: usize,
    pub tau: f64,
    pub discount_factor: f64,
    pub epsilon_decay_steps: usize,
    pub replay_buffer_capacity: usize,
    pub discrete: bool,
    pub explorer: ExplorerConfig,

    /// Noise level used by [`Policy::sample`](ddpg_core::Policy::sample) in training mode.
    pub noise_level: f64,
    pub critic_loss: CriticLoss,

    /// If `None`, the online actor is used for vector observations and the
    /// target actor for pixel observations.
    pub acting_network: Option<ActingNetwork>,

    /// Seeds libtorch and the replay buffer if positive.
    pub seed: Option<i64>,
    pub device: Option<Device>,
}

impl<P, Q> Default for DdpgConfig<P, Q> {
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            encoder_config: None,
            batch_size: 64,
            tau: 0.001,
            discount_factor: 0.99,
            epsilon_decay_steps: 50_000,
            replay_buffer_capacity: 100_000,
            discrete: false,
            explorer: ExplorerConfig::default(),
            noise_level: 1.0,
            critic_loss: CriticLoss::Mse,
            acting_network: None,
            seed: None,
            device: None,
        }
    }
}

impl DdpgConfig<MlpConfig, MlpConfig> {
    /// Actor and critic with two hidden layers.
    ///
    /// The state fed to the networks stacks `window_length` observations of
    /// dimension `obs_dim`. The last layers are initialized uniformly in
    /// `[-3e-3, 3e-3]`.
    pub fn mlp(
        obs_dim: i64,
        window_length: i64,
        n_actions: i64,
        hidden1: i64,
        hidden2: i64,
        use_bn: bool,
    ) -> Self {
        let state_dim = obs_dim * window_length;
        let pi_config = MlpConfig::new(state_dim, vec![hidden1, hidden2], n_actions, false)
            .use_bn(use_bn)
            .init_w(3e-3);
        let q_config = MlpConfig::new(state_dim + n_actions, vec![hidden1, hidden2], 1, false)
            .use_bn(use_bn)
            .init_w(3e-3);

        Self::default()
            .actor_config(ActorConfig::default().pi_config(pi_config))
            .critic_config(CriticConfig::default().q_config(q_config))
    }
}

impl<P, Q> DdpgConfig<P, Q>
where
    P: DeserializeOwned + Serialize,
    Q: DeserializeOwned + Serialize,
{
    /// Configuration of actor.
    pub fn actor_config(mut self, v: ActorConfig<P>) -> Self {
        self.actor_config = v;
        self
    }

    /// Configuration of critic.
    pub fn critic_config(mut self, v: CriticConfig<Q>) -> Self {
        self.critic_config = v;
        self
    }

    /// Configuration of the pixel encoder.
    pub fn encoder_config(mut self, v: EncoderConfig) -> Self {
        self.encoder_config = Some(v);
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Number of decays after which epsilon reaches 0.
    pub fn epsilon_decay_steps(mut self, v: usize) -> Self {
        self.epsilon_decay_steps = v;
        self
    }

    /// Replay buffer capacity.
    pub fn replay_buffer_capacity(mut self, v: usize) -> Self {
        self.replay_buffer_capacity = v;
        self
    }

    /// Returns arg-max indices of actions instead of action vectors.
    pub fn discrete(mut self, v: bool) -> Self {
        self.discrete = v;
        self
    }

    /// Exploration process.
    pub fn explorer(mut self, v: ExplorerConfig) -> Self {
        self.explorer = v;
        self
    }

    /// Noise level in training mode.
    pub fn noise_level(mut self, v: f64) -> Self {
        self.noise_level = v;
        self
    }

    /// Critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Network computing actions.
    pub fn acting_network(mut self, v: ActingNetwork) -> Self {
        self.acting_network = Some(v);
        self
    }

    /// Random seed.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Constructs [`DdpgConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let b = load_yaml(path)?;
        info!("Load config of DDPG agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`DdpgConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        save_yaml(self, path)?;
        info!("Save config of DDPG agent into {:?}", path_);
        Ok(())
    }
}
