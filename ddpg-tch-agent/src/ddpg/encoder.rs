use super::EncoderConfig;
use crate::{
    cnn::PixelCnn,
    model::{ModelBase, SubModel},
    opt::Optimizer,
    util::NamedTensors,
};
use anyhow::Result;
use log::info;
use std::path::Path;
use tch::{nn, Device, Tensor};

/// Trainable encoder of pixel observations.
///
/// The encoder has no target copy. It is optimized together with the critic.
pub struct Encoder {
    var_store: nn::VarStore,
    cnn: PixelCnn,
    opt: Optimizer,
}

impl Encoder {
    /// Constructs [`Encoder`].
    pub fn build(config: EncoderConfig, device: Device) -> Result<Self> {
        let var_store = nn::VarStore::new(device);
        let cnn = PixelCnn::build(&var_store, config.cnn_config);
        let opt = config.opt_config.build(&var_store)?;

        Ok(Self {
            var_store,
            cnn,
            opt,
        })
    }

    /// Maps a batch of pixel observations `[batch, height, width, channels]` to features.
    pub fn forward(&self, x: &Tensor) -> Tensor {
        self.cnn.forward_t(x, true)
    }
}

impl ModelBase for Encoder {
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
        info!("Save encoder to {:?}", path.as_ref());
        Ok(())
    }
}
