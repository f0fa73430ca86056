//! Optimizers.
use anyhow::Result;
use log::trace;
use serde::{Deserialize, Serialize};
use tch::{
    nn::{Adam, AdamW, Optimizer as Optimizer_, OptimizerConfig as OptimizerConfig_, VarStore},
    Tensor,
};

/// Configures an optimizer for training neural networks in an RL agent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },

    /// Adam optimizer with decoupled weight decay.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Decay rate of the first moment.
        beta1: f64,
        /// Decay rate of the second moment.
        beta2: f64,
        /// Weight decay.
        wd: f64,
        /// Term added to the denominator.
        eps: f64,
        /// Use the AMSGrad variant.
        amsgrad: bool,
    },
}

impl OptimizerConfig {
    /// Constructs an optimizer.
    pub fn build(&self, vs: &VarStore) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::Adam { lr } => {
                let opt = Adam::default().build(vs, *lr)?;
                Ok(Optimizer::Adam(opt))
            }
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                wd,
                eps,
                amsgrad,
            } => {
                let opt = AdamW {
                    beta1: *beta1,
                    beta2: *beta2,
                    wd: *wd,
                    eps: *eps,
                    amsgrad: *amsgrad,
                }
                .build(vs, *lr)?;
                Ok(Optimizer::AdamW(opt))
            }
        }
    }

    /// Returns the learning rate.
    pub fn lr(&self) -> f64 {
        match self {
            Self::Adam { lr } => *lr,
            Self::AdamW { lr, .. } => *lr,
        }
    }
}

/// Optimizers.
///
/// This is a thin wrapper of [`tch::nn::Optimizer`].
pub enum Optimizer {
    /// Adam optimizer.
    Adam(Optimizer_),

    /// AdamW optimizer.
    AdamW(Optimizer_),
}

impl Optimizer {
    fn inner(&mut self) -> &mut Optimizer_ {
        match self {
            Self::Adam(opt) => opt,
            Self::AdamW(opt) => opt,
        }
    }

    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) {
        self.inner().backward_step(loss);
    }

    /// Zeroes the gradients of the parameters.
    pub fn zero_grad(&mut self) {
        self.inner().zero_grad();
    }

    /// Updates the parameters with the current gradients.
    pub fn step(&mut self) {
        self.inner().step();
    }
}

/// Optimizers updated together from a single loss.
///
/// A loss flowing through several networks, e.g., a critic on top of a
/// pixel encoder, has to zero and step all of their optimizers around one
/// backward pass.
#[derive(Default)]
pub struct TrainableGroup<'a> {
    opts: Vec<&'a mut Optimizer>,
}

impl<'a> TrainableGroup<'a> {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self { opts: vec![] }
    }

    /// Adds an optimizer to the group.
    pub fn add(mut self, opt: &'a mut Optimizer) -> Self {
        self.opts.push(opt);
        self
    }

    /// Returns the number of optimizers in the group.
    pub fn len(&self) -> usize {
        self.opts.len()
    }

    /// Returns `true` if the group has no optimizer.
    pub fn is_empty(&self) -> bool {
        self.opts.is_empty()
    }

    /// Zeroes gradients, backpropagates `loss` once and steps every optimizer.
    pub fn backward_step(self, loss: &Tensor) {
        let mut opts = self.opts;
        for opt in opts.iter_mut() {
            opt.zero_grad();
        }
        loss.backward();
        for opt in opts.iter_mut() {
            opt.step();
        }
        trace!("Stepped {} optimizer(s)", opts.len());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tch::{nn, Device, Kind};

    #[test]
    fn test_group_steps_all_members() -> Result<()> {
        let vs1 = nn::VarStore::new(Device::Cpu);
        let vs2 = nn::VarStore::new(Device::Cpu);
        let w1 = vs1.root().var("w", &[2], nn::Init::Const(1.0));
        let w2 = vs2.root().var("w", &[2], nn::Init::Const(1.0));
        let config = OptimizerConfig::Adam { lr: 0.1 };
        let mut opt1 = config.build(&vs1)?;
        let mut opt2 = config.build(&vs2)?;

        let loss = (&w1 * &w2).sum(Kind::Float);
        let group = TrainableGroup::new().add(&mut opt1).add(&mut opt2);
        assert_eq!(group.len(), 2);
        group.backward_step(&loss);

        // Both parameters moved against the positive gradient
        assert!(w1.double_value(&[0]) < 1.0);
        assert!(w2.double_value(&[0]) < 1.0);

        Ok(())
    }
}
