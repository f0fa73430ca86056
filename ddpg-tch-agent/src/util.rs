//! Utilities.
use crate::model::ModelBase;
use log::debug;
use serde::{Deserialize, Serialize};
mod named_tensors;
pub use named_tensors::NamedTensors;
use tch::Tensor;

/// Critic loss type.
///
/// Each agent owns its loss; nothing is shared between agent instances.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

impl CriticLoss {
    /// Returns the mean loss between predictions and targets.
    pub fn loss(&self, pred: &Tensor, tgt: &Tensor) -> Tensor {
        match self {
            Self::Mse => pred.mse_loss(tgt, tch::Reduction::Mean),
            Self::SmoothL1 => pred.smooth_l1_loss(tgt, tch::Reduction::Mean, 1.0),
        }
    }
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track<M: ModelBase>(dest: &mut M, src: &M, tau: f64) {
    let src = src.get_var_store().variables();
    let mut dest = dest.get_var_store_mut().variables();
    debug_assert_eq!(src.len(), dest.len());

    tch::no_grad(|| {
        for (name, src) in src.iter() {
            if let Some(dest) = dest.get_mut(name) {
                dest.copy_(&(tau * src + (1.0 - tau) * &*dest));
            }
        }
    });
    debug!("soft update with tau = {}", tau);
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ddpg::{Critic, CriticConfig},
        mlp::{Mlp, MlpConfig},
        opt::OptimizerConfig,
    };
    use anyhow::Result;
    use tch::Device;

    fn critic() -> Result<Critic<Mlp>> {
        let config = CriticConfig::default()
            .q_config(MlpConfig::new(5, vec![8], 1, false))
            .opt_config(OptimizerConfig::Adam { lr: 1e-3 });
        Critic::build(config, Device::Cpu)
    }

    fn all_equal<M: ModelBase>(m1: &M, m2: &M) -> bool {
        let vs1 = m1.get_var_store().variables();
        let vs2 = m2.get_var_store().variables();
        vs1.iter().all(|(k, v)| v.equal(&vs2[k]))
    }

    #[test]
    fn test_track_tau_one_copies_source() -> Result<()> {
        tch::manual_seed(1);
        let src = critic()?;
        let mut dest = critic()?;
        assert!(!all_equal(&src, &dest));

        track(&mut dest, &src, 1.0);
        assert!(all_equal(&src, &dest));

        Ok(())
    }

    #[test]
    fn test_track_tau_zero_keeps_destination() -> Result<()> {
        tch::manual_seed(2);
        let src = critic()?;
        let mut dest = critic()?;
        let before = NamedTensors::copy_from(dest.get_var_store());

        track(&mut dest, &src, 0.0);
        for (name, v) in dest.get_var_store().variables() {
            assert!(v.equal(&before.named_tensors[&name]));
        }

        Ok(())
    }

    #[test]
    fn test_track_interpolates() -> Result<()> {
        tch::manual_seed(3);
        let src = critic()?;
        let mut dest = critic()?;
        let before = NamedTensors::copy_from(dest.get_var_store());

        track(&mut dest, &src, 0.25);
        let src_vars = src.get_var_store().variables();
        for (name, v) in dest.get_var_store().variables() {
            let expected: Tensor = 0.25 * &src_vars[&name] + 0.75 * &before.named_tensors[&name];
            let diff = (v - expected).abs().max().double_value(&[]);
            assert!(diff < 1e-6);
        }

        Ok(())
    }

    #[test]
    fn test_critic_loss() {
        let pred = Tensor::from_slice(&[1f32, 2.0, 3.0]);
        let tgt = Tensor::from_slice(&[1f32, 0.0, 6.0]);
        let mse = CriticLoss::Mse.loss(&pred, &tgt).double_value(&[]);
        assert!((mse - 13.0 / 3.0).abs() < 1e-6);

        // |d| > 1: |d| - 0.5; |d| = 0: 0
        let smooth = CriticLoss::SmoothL1.loss(&pred, &tgt).double_value(&[]);
        assert!((smooth - (1.5 + 2.5) / 3.0).abs() < 1e-6);
    }
}
