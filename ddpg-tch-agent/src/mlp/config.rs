use crate::util::OutDim;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Mlp`](super::Mlp).
pub struct MlpConfig {
    pub(super) in_dim: i64,
    pub(super) units: Vec<i64>,
    pub(super) out_dim: i64,
    pub(super) activation_out: bool,
    #[serde(default)]
    pub(super) use_bn: bool,
    #[serde(default)]
    pub(super) init_w: Option<f64>,
}

impl MlpConfig {
    /// Creates configuration of MLP.
    ///
    /// * `activation_out` - If `true`, an activation function is added in the final layer.
    pub fn new(in_dim: i64, units: Vec<i64>, out_dim: i64, activation_out: bool) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
            activation_out,
            use_bn: false,
            init_w: None,
        }
    }

    /// Adds batch normalization after each hidden linear layer.
    pub fn use_bn(mut self, v: bool) -> Self {
        self.use_bn = v;
        self
    }

    /// Initializes the final layer uniformly in `[-v, v]`.
    pub fn init_w(mut self, v: f64) -> Self {
        self.init_w = Some(v);
        self
    }

    /// Returns the input dimension.
    pub fn get_in_dim(&self) -> i64 {
        self.in_dim
    }
}

impl OutDim for MlpConfig {
    fn get_out_dim(&self) -> i64 {
        self.out_dim
    }
}
