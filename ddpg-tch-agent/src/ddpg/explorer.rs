//! Exploration processes and the epsilon schedule of DDPG.
use log::debug;
use serde::{Deserialize, Serialize};
use tch::{kind::FLOAT_CPU, Tensor};

/// A stateful noise source mixed into actions during rollout.
///
/// Samples are `f32` tensors of shape `[dim]` in host memory.
pub trait ExplorationProcess {
    /// Draws a noise vector.
    fn sample(&mut self) -> Tensor;

    /// Clears the internal state, called at the start of an episode.
    fn reset_status(&mut self);
}

/// Configures the exploration process of [`Ddpg`](super::Ddpg).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum ExplorerConfig {
    /// Independent uniform noise on `[-1, 1]`.
    Uniform,

    /// Independent Gaussian noise.
    Gaussian {
        /// Standard deviation.
        sigma: f64,
    },

    /// Ornstein-Uhlenbeck process, temporally correlated noise.
    OrnsteinUhlenbeck {
        /// Mean to which the process reverts.
        mu: f64,
        /// Rate of mean reversion.
        theta: f64,
        /// Scale of the Wiener increments.
        sigma: f64,
    },
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self::Uniform
    }
}

impl ExplorerConfig {
    /// Ornstein-Uhlenbeck process with `mu = 0`, `theta = 0.15` and `sigma = 0.2`.
    pub fn ornstein_uhlenbeck() -> Self {
        Self::OrnsteinUhlenbeck {
            mu: 0.0,
            theta: 0.15,
            sigma: 0.2,
        }
    }

    /// Builds a process producing noise vectors of dimension `dim`.
    pub fn build(&self, dim: i64) -> Box<dyn ExplorationProcess> {
        match self {
            Self::Uniform => Box::new(UniformNoise { dim }),
            Self::Gaussian { sigma } => Box::new(GaussianNoise { dim, sigma: *sigma }),
            Self::OrnsteinUhlenbeck { mu, theta, sigma } => {
                Box::new(OrnsteinUhlenbeck::new(dim, *mu, *theta, *sigma))
            }
        }
    }
}

/// Uniform noise on `[-1, 1]`.
pub struct UniformNoise {
    dim: i64,
}

impl ExplorationProcess for UniformNoise {
    fn sample(&mut self) -> Tensor {
        Tensor::rand([self.dim], FLOAT_CPU) * 2.0 - 1.0
    }

    fn reset_status(&mut self) {}
}

/// Gaussian noise with zero mean.
pub struct GaussianNoise {
    dim: i64,
    sigma: f64,
}

impl ExplorationProcess for GaussianNoise {
    fn sample(&mut self) -> Tensor {
        Tensor::randn([self.dim], FLOAT_CPU) * self.sigma
    }

    fn reset_status(&mut self) {}
}

/// Ornstein-Uhlenbeck process discretized with unit time step.
///
/// x <- x + theta * (mu - x) + sigma * N(0, 1)
pub struct OrnsteinUhlenbeck {
    dim: i64,
    mu: f64,
    theta: f64,
    sigma: f64,
    x: Tensor,
}

impl OrnsteinUhlenbeck {
    /// Creates the process at its mean.
    pub fn new(dim: i64, mu: f64, theta: f64, sigma: f64) -> Self {
        Self {
            dim,
            mu,
            theta,
            sigma,
            x: Tensor::full([dim], mu, FLOAT_CPU),
        }
    }

    /// Returns the current state of the process.
    pub fn state(&self) -> &Tensor {
        &self.x
    }
}

impl ExplorationProcess for OrnsteinUhlenbeck {
    fn sample(&mut self) -> Tensor {
        let dx = (self.mu - &self.x) * self.theta
            + Tensor::randn([self.dim], FLOAT_CPU) * self.sigma;
        self.x = &self.x + dx;
        self.x.copy()
    }

    fn reset_status(&mut self) {
        self.x = Tensor::full([self.dim], self.mu, FLOAT_CPU);
    }
}

/// Linear decay of the exploration epsilon.
///
/// Epsilon starts at 1 and decreases by `1 / decay_steps` per decay. The value is
/// computed from the number of decays, so it is exactly 0 after `decay_steps`
/// decays and negative afterwards. The noise level derived from it is floored at 0.
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonSchedule {
    decay_steps: usize,
    n_decays: usize,
}

impl EpsilonSchedule {
    /// Creates a schedule reaching 0 after `decay_steps` decays.
    pub fn new(decay_steps: usize) -> Self {
        Self {
            decay_steps: decay_steps.max(1),
            n_decays: 0,
        }
    }

    /// Decrement per decay.
    pub fn depsilon(&self) -> f64 {
        1.0 / self.decay_steps as f64
    }

    /// Current epsilon.
    pub fn epsilon(&self) -> f64 {
        1.0 - self.n_decays as f64 / self.decay_steps as f64
    }

    /// Applies one decay.
    pub fn decay(&mut self) {
        self.n_decays += 1;
        if self.n_decays == self.decay_steps {
            debug!("Epsilon reached 0 after {} decays", self.n_decays);
        }
    }

    /// Scales `base` by the current epsilon, never below 0.
    pub fn noise_level(&self, base: f64) -> f64 {
        base * self.epsilon().max(0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_epsilon_reaches_zero() {
        let mut schedule = EpsilonSchedule::new(3);
        assert_eq!(schedule.epsilon(), 1.0);
        assert!((schedule.depsilon() - 1.0 / 3.0).abs() < 1e-12);

        for _ in 0..3 {
            assert!(schedule.noise_level(0.5) > 0.0);
            schedule.decay();
        }
        assert!(schedule.epsilon() <= 0.0);
        assert_eq!(schedule.noise_level(0.5), 0.0);

        // Floored at 0 after further decays
        schedule.decay();
        assert!(schedule.epsilon() < 0.0);
        assert_eq!(schedule.noise_level(0.5), 0.0);
    }

    #[test]
    fn test_noise_shapes_and_range() {
        tch::manual_seed(7);
        for config in [
            ExplorerConfig::Uniform,
            ExplorerConfig::Gaussian { sigma: 0.3 },
            ExplorerConfig::ornstein_uhlenbeck(),
        ] {
            let mut process = config.build(4);
            let noise = process.sample();
            assert_eq!(noise.size(), vec![4]);
            assert_eq!(noise.kind(), tch::Kind::Float);
        }

        let mut uniform = ExplorerConfig::Uniform.build(1000);
        let noise = uniform.sample();
        assert!(noise.max().double_value(&[]) <= 1.0);
        assert!(noise.min().double_value(&[]) >= -1.0);
    }

    #[test]
    fn test_ornstein_uhlenbeck_reset() {
        tch::manual_seed(8);
        let mut process = OrnsteinUhlenbeck::new(3, 0.5, 0.15, 0.2);
        for _ in 0..10 {
            process.sample();
        }
        assert!(process.state().ne(0.5).any().int64_value(&[]) == 1);

        process.reset_status();
        assert!(process.state().eq(0.5).all().int64_value(&[]) == 1);
    }
}
