use super::ActorConfig;
use crate::{
    model::{ModelBase, SubModel},
    opt::{Optimizer, OptimizerConfig},
    util::{NamedTensors, OutDim},
};
use anyhow::{Context, Result};
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tch::{nn, Device, Tensor};

/// Deterministic policy of the DDPG agent.
///
/// The output of the wrapped model is squashed with `tanh`, so actions lie in `[-1, 1]`.
pub struct Actor<P>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    device: Device,
    var_store: nn::VarStore,

    // Dimension of the action vector.
    out_dim: i64,

    // Policy network
    pi: P,

    // Optimizer
    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<P> Actor<P>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`Actor`].
    pub fn build(config: ActorConfig<P::Config>, device: Device) -> Result<Actor<P>> {
        let pi_config = config.pi_config.context("pi_config is not set.")?;
        let out_dim = pi_config.get_out_dim();
        let opt_config = config.opt_config;
        let var_store = nn::VarStore::new(device);
        let pi = P::build(&var_store, pi_config);

        Actor::_build(device, out_dim, opt_config, pi, var_store, None)
    }

    fn _build(
        device: Device,
        out_dim: i64,
        opt_config: OptimizerConfig,
        pi: P,
        mut var_store: nn::VarStore,
        var_store_src: Option<&nn::VarStore>,
    ) -> Result<Self> {
        // Optimizer
        let opt = opt_config.build(&var_store)?;

        // Copy var_store
        if let Some(var_store_src) = var_store_src {
            var_store.copy(var_store_src)?;
        }

        Ok(Self {
            device,
            out_dim,
            opt_config,
            var_store,
            opt,
            pi,
        })
    }

    /// Creates a copy with its own parameters and optimizer, e.g., a target network.
    pub fn try_clone(&self) -> Result<Self> {
        let var_store = nn::VarStore::new(self.device);
        let pi = self.pi.clone_with_var_store(&var_store);

        Self::_build(
            self.device,
            self.out_dim,
            self.opt_config.clone(),
            pi,
            var_store,
            Some(&self.var_store),
        )
    }

    /// Outputs the action given an observation.
    pub fn forward_t(&self, x: &Tensor, train: bool) -> Tensor {
        let a = self.pi.forward_t(x, train).tanh();
        debug_assert_eq!(a.size().as_slice()[1], self.out_dim);
        a
    }

    /// Returns the dimension of actions.
    pub fn out_dim(&self) -> i64 {
        self.out_dim
    }
}

impl<P> ModelBase for Actor<P>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
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
        info!("Save actor to {:?}", path.as_ref());
        Ok(())
    }
}
