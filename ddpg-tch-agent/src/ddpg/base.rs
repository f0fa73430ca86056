use super::{
    ActingNetwork, Actor, Critic, DdpgConfig, Encoder, EpsilonSchedule, ExplorationProcess,
};
use crate::{
    model::{ModelBase, SubModel, SubModel2},
    opt::TrainableGroup,
    util::{track, CriticLoss, NamedTensors, OutDim},
    Device, TensorSubBatch,
};
use anyhow::Result;
use ddpg_core::{
    error::DdpgError,
    record::{Record, RecordValue},
    replay_buffer::{SimpleReplayBuffer, SimpleReplayBufferConfig, StdBatch},
    Agent, Configurable, ExperienceBufferBase, Policy, ReplayBufferBase, TransitionBatch,
};
use log::{debug, info, trace};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::Path};
use tch::{kind::FLOAT_CPU, no_grad, Kind, Tensor};

type ReplayBuffer = SimpleReplayBuffer<TensorSubBatch, TensorSubBatch>;

/// Action returned by [`Ddpg`].
#[derive(Debug)]
pub enum DdpgAct {
    /// Action vector in `[-1, 1]^A`.
    Continuous(Tensor),

    /// Arg-max index of the action vector.
    Discrete(i64),
}

/// One-step bootstrapped targets `r + γ (1 - terminal) q'`.
///
/// Terminal transitions take the reward as is, so a non-finite `next_q`
/// does not leak into their targets.
pub fn bootstrapped_target(
    reward: &Tensor,
    is_terminal: &Tensor,
    next_q: &Tensor,
    discount_factor: f64,
) -> Tensor {
    let terminal = is_terminal.to_kind(Kind::Bool);
    let bootstrapped = reward + next_q * discount_factor;
    reward.where_self(&terminal, &bootstrapped)
}

fn read_checkpoint(output: &Path, role: &str, num: usize) -> Result<NamedTensors> {
    let path = output.join(format!("{}{}.pt", role, num));
    match path.is_file() {
        true => NamedTensors::load(&path),
        false => Err(DdpgError::CheckpointNotFound(path).into()),
    }
}

/// Deep deterministic policy gradient (DDPG) agent.
///
/// Observations are vectors unless an encoder is configured, in which case
/// they are images of shape `[height, width, channels]`. Vector observations
/// of any shape are flattened, e.g., a window of stacked observations.
pub struct Ddpg<P, Q>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    actor: Actor<P>,
    actor_tgt: Actor<P>,
    critic: Critic<Q>,
    critic_tgt: Critic<Q>,
    encoder: Option<Encoder>,
    memory: ReplayBuffer,
    explorer: Box<dyn ExplorationProcess>,
    epsilon: EpsilonSchedule,
    acting_network: ActingNetwork,
    batch_size: usize,
    tau: f64,
    discount_factor: f64,
    discrete: bool,
    noise_level: f64,
    critic_loss: CriticLoss,
    s_t: Option<Tensor>,
    a_t: Option<Tensor>,
    train: bool,
    n_opts: usize,
    device: tch::Device,
}

impl<P, Q> Ddpg<P, Q>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    /// Adds the batch axis to a single observation.
    fn batch_of_one(&self, obs: &Tensor) -> Tensor {
        match self.encoder {
            Some(_) => obs.unsqueeze(0),
            None => obs.reshape([1, -1]),
        }
    }

    /// Maps observations to the input of the actor and the critic.
    fn state(&self, obs: &Tensor) -> Tensor {
        match &self.encoder {
            Some(encoder) => encoder.forward(obs),
            None => obs.shallow_clone(),
        }
    }

    fn actor_loss(&self, state: &Tensor, train: bool) -> Tensor {
        let act = self.actor.forward_t(state, train);
        -self.critic.forward_t(state, &act, train).mean(Kind::Float)
    }

    /// Records `act` as the last action and converts it to the output.
    fn record_action(&mut self, act: Tensor, return_fix: bool) -> DdpgAct {
        let out = match self.discrete && !return_fix {
            true => DdpgAct::Discrete(act.argmax(-1, false).int64_value(&[])),
            false => DdpgAct::Continuous(act.shallow_clone()),
        };
        self.a_t = Some(act);
        out
    }

    fn sample_tensor(batch: TensorSubBatch) -> Result<Tensor> {
        Ok(batch
            .into_tensor()
            .ok_or(DdpgError::EmptyReplayBuffer)?)
    }

    /// Performs one optimization step on a batch from the replay memory.
    ///
    /// The actor is stepped only if `train_actor` is `true`; the critic and
    /// the target networks are always updated.
    /// Returns the estimated policy value (the negated actor loss) and the critic loss.
    pub fn update_policy(&mut self, train_actor: bool) -> Result<(f32, f32)> {
        let batch = self.memory.batch(self.batch_size)?;
        let (obs, act, next_obs, reward, is_terminal) = batch.unpack();
        let obs = Self::sample_tensor(obs)?.to(self.device);
        let act = Self::sample_tensor(act)?.to(self.device);
        let next_obs = Self::sample_tensor(next_obs)?.to(self.device);
        let reward = Tensor::from_slice(&reward[..]).to(self.device);
        let is_terminal = Tensor::from_slice(&is_terminal[..]).to(self.device);

        let state = self.state(&obs);
        let tgt = no_grad(|| {
            let next_state = self.state(&next_obs);
            let next_act = self.actor_tgt.forward_t(&next_state, true);
            let next_q = self
                .critic_tgt
                .forward_t(&next_state, &next_act, true)
                .squeeze_dim(-1);
            bootstrapped_target(&reward, &is_terminal, &next_q, self.discount_factor)
        });
        debug_assert_eq!(tgt.size().as_slice(), [self.batch_size as i64]);

        // Critic, together with the encoder if any
        let loss_critic = {
            let pred = self.critic.forward_t(&state, &act, true).squeeze_dim(-1);
            self.critic_loss.loss(&pred, &tgt)
        };
        let mut group = TrainableGroup::new().add(self.critic.optimizer_mut());
        if let Some(encoder) = self.encoder.as_mut() {
            group = group.add(encoder.optimizer_mut());
        }
        group.backward_step(&loss_critic);

        // Actor, evaluated with the updated critic
        let state = state.detach();
        let loss_actor = match train_actor {
            true => {
                let loss = self.actor_loss(&state, true);
                self.actor.backward_step(&loss);
                loss
            }
            // Evaluation mode keeps batch-norm statistics of the actor as they are
            false => no_grad(|| self.actor_loss(&state, false)),
        };

        track(&mut self.actor_tgt, &self.actor, self.tau);
        track(&mut self.critic_tgt, &self.critic, self.tau);

        let policy_value = -loss_actor.double_value(&[]) as f32;
        let loss_critic = loss_critic.double_value(&[]) as f32;
        trace!(
            "policy_value = {}, loss_critic = {}",
            policy_value,
            loss_critic
        );

        Ok((policy_value, loss_critic))
    }

    /// Computes an action for the observation `s_t`.
    ///
    /// The deterministic action is mixed with exploration noise,
    /// `a (1 - nl) + noise nl` with `nl = noise_level * max(epsilon, 0)`,
    /// and clipped to `[-1, 1]`. The clipped vector is recorded as the last action.
    /// It is returned as is if `return_fix` is `true` or actions are continuous,
    /// and as its arg-max index otherwise.
    pub fn select_action(
        &mut self,
        s_t: &Tensor,
        decay_epsilon: bool,
        return_fix: bool,
        noise_level: f64,
    ) -> DdpgAct {
        let act = no_grad(|| {
            let state = self.state(&self.batch_of_one(s_t).to(self.device));
            match self.acting_network {
                ActingNetwork::Online => self.actor.forward_t(&state, false),
                ActingNetwork::Target => self.actor_tgt.forward_t(&state, false),
            }
        })
        .squeeze_dim(0)
        .to(tch::Device::Cpu);

        let nl = self.epsilon.noise_level(noise_level);
        let act = (act * (1.0 - nl) + self.explorer.sample() * nl).clamp(-1.0, 1.0);

        if decay_epsilon {
            self.epsilon.decay();
            debug!("epsilon = {}", self.epsilon.epsilon());
        }

        self.record_action(act, return_fix)
    }

    /// Returns an action drawn uniformly from `[-1, 1]^A`, ignoring the policy.
    pub fn random_action(&mut self) -> DdpgAct {
        let act = Tensor::rand([self.actor.out_dim()], FLOAT_CPU) * 2.0 - 1.0;
        self.record_action(act, false)
    }

    /// Writes `actor{num}.pt` and `critic{num}.pt` into `output`.
    ///
    /// With a pixel encoder, `encoder{num}.pt` is written as well.
    pub fn save_model(&self, output: &Path, num: usize) -> Result<()> {
        fs::create_dir_all(output)?;
        self.actor.save(output.join(format!("actor{}.pt", num)))?;
        self.critic.save(output.join(format!("critic{}.pt", num)))?;
        if let Some(encoder) = &self.encoder {
            encoder.save(output.join(format!("encoder{}.pt", num)))?;
        }
        Ok(())
    }

    /// Loads the parameters written by [`Ddpg::save_model`].
    ///
    /// The online and the target networks receive the same parameters.
    /// Nothing is done if `output` is `None`.
    pub fn load_weights(&mut self, output: Option<&Path>, num: usize) -> Result<()> {
        let output = match output {
            Some(output) => output,
            None => return Ok(()),
        };

        // Everything is read and checked before any network is overwritten
        let actor = read_checkpoint(output, "actor", num)?;
        let critic = read_checkpoint(output, "critic", num)?;
        let encoder = match self.encoder {
            Some(_) => Some(read_checkpoint(output, "encoder", num)?),
            None => None,
        };
        actor.check(self.actor.get_var_store())?;
        critic.check(self.critic.get_var_store())?;
        if let (Some(params), Some(encoder)) = (&encoder, &self.encoder) {
            params.check(encoder.get_var_store())?;
        }

        actor.copy_to(self.actor.get_var_store_mut())?;
        actor.copy_to(self.actor_tgt.get_var_store_mut())?;
        critic.copy_to(self.critic.get_var_store_mut())?;
        critic.copy_to(self.critic_tgt.get_var_store_mut())?;
        if let (Some(params), Some(encoder)) = (encoder, self.encoder.as_mut()) {
            params.copy_to(encoder.get_var_store_mut())?;
        }
        info!("Load weights {} from {:?}", num, output);
        Ok(())
    }

    /// Current exploration epsilon.
    pub fn epsilon(&self) -> f64 {
        self.epsilon.epsilon()
    }

    /// The last recorded action.
    pub fn last_action(&self) -> Option<&Tensor> {
        self.a_t.as_ref()
    }

    /// Number of transitions in the replay memory.
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Number of optimization steps done with [`Agent::opt`].
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// The online actor.
    pub fn actor(&self) -> &Actor<P> {
        &self.actor
    }

    /// The target actor.
    pub fn actor_tgt(&self) -> &Actor<P> {
        &self.actor_tgt
    }

    /// The online critic.
    pub fn critic(&self) -> &Critic<Q> {
        &self.critic
    }

    /// The target critic.
    pub fn critic_tgt(&self) -> &Critic<Q> {
        &self.critic_tgt
    }

    /// The pixel encoder, if any.
    pub fn encoder(&self) -> Option<&Encoder> {
        self.encoder.as_ref()
    }
}

impl<P, Q> Configurable for Ddpg<P, Q>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    type Config = DdpgConfig<P::Config, Q::Config>;

    /// Constructs [`Ddpg`] agent.
    ///
    /// The target networks start as copies of the online networks.
    fn build(config: Self::Config) -> Result<Self> {
        if config.replay_buffer_capacity == 0 {
            return Err(DdpgError::InvalidConfig(
                "replay_buffer_capacity must be positive".to_string(),
            )
            .into());
        }
        let device: tch::Device = config.device.unwrap_or(Device::Cpu).into();
        let seed = config.seed.filter(|seed| *seed > 0);
        if let Some(seed) = seed {
            tch::manual_seed(seed);
        }

        let encoder = match config.encoder_config {
            Some(encoder_config) => Some(Encoder::build(encoder_config, device)?),
            None => None,
        };
        let actor = Actor::build(config.actor_config, device)?;
        let actor_tgt = actor.try_clone()?;
        let critic = Critic::build(config.critic_config, device)?;
        let critic_tgt = critic.try_clone()?;

        let mut memory_config =
            SimpleReplayBufferConfig::default().capacity(config.replay_buffer_capacity);
        if let Some(seed) = seed {
            memory_config = memory_config.seed(seed as u64);
        }

        let acting_network = config.acting_network.unwrap_or(match encoder {
            Some(_) => ActingNetwork::Target,
            None => ActingNetwork::Online,
        });

        Ok(Self {
            explorer: config.explorer.build(actor.out_dim()),
            epsilon: EpsilonSchedule::new(config.epsilon_decay_steps),
            memory: ReplayBuffer::build(&memory_config),
            actor,
            actor_tgt,
            critic,
            critic_tgt,
            encoder,
            acting_network,
            batch_size: config.batch_size,
            tau: config.tau,
            discount_factor: config.discount_factor,
            discrete: config.discrete,
            noise_level: config.noise_level,
            critic_loss: config.critic_loss,
            s_t: None,
            a_t: None,
            train: true,
            n_opts: 0,
            device,
        })
    }
}

impl<P, Q> Policy for Ddpg<P, Q>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    type Obs = Tensor;
    type Act = DdpgAct;

    /// Noisy action with epsilon decay in training mode, deterministic action otherwise.
    fn sample(&mut self, obs: &Tensor) -> Result<DdpgAct> {
        Ok(match self.train {
            true => self.select_action(obs, true, false, self.noise_level),
            false => self.select_action(obs, false, false, 0.0),
        })
    }
}

impl<P, Q> Agent for Ddpg<P, Q>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn reset(&mut self, obs: Tensor) {
        self.s_t = Some(obs);
        self.explorer.reset_status();
    }

    /// Pushes `(s_t, a_t, reward, next_obs, is_terminal)` into the replay memory
    /// and moves on to `next_obs`.
    fn observe(&mut self, reward: f32, next_obs: Tensor, is_terminal: bool) -> Result<()> {
        let (obs, act) = match (&self.s_t, &self.a_t) {
            (Some(s_t), Some(a_t)) => (self.batch_of_one(s_t), a_t.unsqueeze(0)),
            _ => return Err(DdpgError::NoObservation.into()),
        };
        let transition = StdBatch::new(
            TensorSubBatch::from_tensor(obs),
            TensorSubBatch::from_tensor(act),
            TensorSubBatch::from_tensor(self.batch_of_one(&next_obs)),
            vec![reward],
            vec![is_terminal as i8],
        );
        self.memory.push(transition)?;
        self.s_t = Some(next_obs);
        Ok(())
    }

    fn opt(&mut self) -> Result<Record> {
        let (policy_value, loss_critic) = self.update_policy(true)?;
        self.n_opts += 1;

        Ok(Record::from_slice(&[
            ("policy_value", RecordValue::Scalar(policy_value)),
            ("loss_critic", RecordValue::Scalar(loss_critic)),
        ]))
    }

    fn save_params(&self, path: &Path, num: usize) -> Result<()> {
        self.save_model(path, num)
    }

    fn load_params(&mut self, path: &Path, num: usize) -> Result<()> {
        self.load_weights(Some(path), num)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_terminal_target_is_reward() {
        let reward = Tensor::from_slice(&[1f32, 2.0, -3.0]);
        let is_terminal = Tensor::from_slice(&[1i8, 0, 1]);
        let next_q = Tensor::from_slice(&[f32::INFINITY, 10.0, f32::NAN]);

        let tgt = bootstrapped_target(&reward, &is_terminal, &next_q, 0.5);
        assert_eq!(tgt.double_value(&[0]), 1.0);
        assert_eq!(tgt.double_value(&[1]), 7.0);
        assert_eq!(tgt.double_value(&[2]), -3.0);
    }

    #[test]
    fn test_zero_discount_target_is_reward() {
        let reward = Tensor::from_slice(&[0.5f32, -0.5]);
        let is_terminal = Tensor::from_slice(&[0i8, 0]);
        let next_q = Tensor::from_slice(&[3f32, 4.0]);

        let tgt = bootstrapped_target(&reward, &is_terminal, &next_q, 0.0);
        assert!(tgt.equal(&reward));
    }
}
