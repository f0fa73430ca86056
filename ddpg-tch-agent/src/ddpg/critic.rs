use super::CriticConfig;
use crate::{
    model::{ModelBase, SubModel2},
    opt::{Optimizer, OptimizerConfig},
    util::NamedTensors,
};
use anyhow::{Context, Result};
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tch::{nn, Device, Tensor};

/// Action value function of the DDPG agent.
pub struct Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    device: Device,
    var_store: nn::VarStore,

    // Action-value function
    q: Q,

    // Optimizer
    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<Q> Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs [`Critic`].
    pub fn build(config: CriticConfig<Q::Config>, device: Device) -> Result<Critic<Q>> {
        let q_config = config.q_config.context("q_config is not set.")?;
        let opt_config = config.opt_config;
        let var_store = nn::VarStore::new(device);
        let q = Q::build(&var_store, q_config);

        Critic::_build(device, opt_config, q, var_store, None)
    }

    fn _build(
        device: Device,
        opt_config: OptimizerConfig,
        q: Q,
        mut var_store: nn::VarStore,
        var_store_src: Option<&nn::VarStore>,
    ) -> Result<Self> {
        let opt = opt_config.build(&var_store)?;

        if let Some(var_store_src) = var_store_src {
            var_store.copy(var_store_src)?;
        }

        Ok(Self {
            device,
            opt_config,
            var_store,
            opt,
            q,
        })
    }

    /// Creates a copy with its own parameters and optimizer, e.g., a target network.
    pub fn try_clone(&self) -> Result<Self> {
        let var_store = nn::VarStore::new(self.device);
        let q = self.q.clone_with_var_store(&var_store);

        Self::_build(
            self.device,
            self.opt_config.clone(),
            q,
            var_store,
            Some(&self.var_store),
        )
    }

    /// Outputs the action value given observations and actions.
    pub fn forward_t(&self, obs: &Tensor, act: &Tensor, train: bool) -> Tensor {
        self.q.forward_t(obs, act, train)
    }
}

impl<Q> ModelBase for Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    fn backward_step(&mut self, loss: &Tensor) {
        self.opt.backward_step(loss);
    }

    fn optimizer_mut(&mut self) -> &mut Optimizer {
        &mut self.opt
    }

    fn get_var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }

    fn get_var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        NamedTensors::copy_from(&self.var_store).save(&path)?;
        info!("Save critic to {:?}", path.as_ref());
        Ok(())
    }
}
