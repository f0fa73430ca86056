use super::MlpConfig;
use crate::model::{SubModel, SubModel2};
use tch::{nn, nn::ModuleT, Device, Kind, Tensor};

/// Multilayer perceptron with ReLU activation function.
///
/// As a [`SubModel2`] the two inputs are concatenated along the last axis,
/// so `in_dim` is the sum of their dimensions.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    seq: nn::SequentialT,
}

impl Mlp {
    fn create_net(var_store: &nn::VarStore, config: &MlpConfig) -> nn::SequentialT {
        let p = &(var_store.root() / "mlp");
        let mut seq = nn::seq_t();
        let mut in_dim = config.in_dim;

        for (i, &out_dim) in config.units.iter().enumerate() {
            seq = seq.add(nn::linear(
                p / format!("{}{}", "ln", i),
                in_dim,
                out_dim,
                Default::default(),
            ));
            if config.use_bn {
                seq = seq.add(nn::batch_norm1d(
                    p / format!("{}{}", "bn", i),
                    out_dim,
                    Default::default(),
                ));
            }
            seq = seq.add_fn(|x| x.relu());
            in_dim = out_dim;
        }

        let last = match config.init_w {
            Some(w) => nn::LinearConfig {
                ws_init: nn::Init::Uniform { lo: -w, up: w },
                bs_init: Some(nn::Init::Uniform { lo: -w, up: w }),
                bias: true,
            },
            None => Default::default(),
        };
        seq = seq.add(nn::linear(
            p / format!("{}{}", "ln", config.units.len()),
            in_dim,
            config.out_dim,
            last,
        ));

        if config.activation_out {
            seq = seq.add_fn(|x| x.relu());
        }

        seq
    }

    fn build_(var_store: &nn::VarStore, config: MlpConfig) -> Self {
        let device = var_store.device();
        let seq = Self::create_net(var_store, &config);

        Self {
            config,
            device,
            seq,
        }
    }
}

impl SubModel for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward_t(&self, x: &Self::Input, train: bool) -> Tensor {
        let x = x.to_device(self.device).to_kind(Kind::Float);
        self.seq.forward_t(&x, train)
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        Self::build_(var_store, config)
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        Self::build_(var_store, self.config.clone())
    }
}

impl SubModel2 for Mlp {
    type Config = MlpConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = Tensor;

    fn forward_t(&self, input1: &Self::Input1, input2: &Self::Input2, train: bool) -> Tensor {
        let input1 = input1.to_device(self.device).to_kind(Kind::Float);
        let input2 = input2.to_device(self.device).to_kind(Kind::Float);
        let input = Tensor::cat(&[input1, input2], -1);
        self.seq.forward_t(&input, train)
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        Self::build_(var_store, config)
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        Self::build_(var_store, self.config.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_output_shapes() {
        let vs = nn::VarStore::new(Device::Cpu);
        let config = MlpConfig::new(4, vec![16, 8], 2, false);
        let mlp = <Mlp as SubModel>::build(&vs, config);
        let y = SubModel::forward_t(&mlp, &Tensor::zeros(&[5, 4], tch::kind::FLOAT_CPU), false);
        assert_eq!(y.size(), vec![5, 2]);

        let vs = nn::VarStore::new(Device::Cpu);
        let config = MlpConfig::new(6, vec![16], 1, false).use_bn(true);
        let mlp = <Mlp as SubModel2>::build(&vs, config);
        let x1 = Tensor::randn(&[5, 4], tch::kind::FLOAT_CPU);
        let x2 = Tensor::randn(&[5, 2], tch::kind::FLOAT_CPU);
        assert_eq!(SubModel2::forward_t(&mlp, &x1, &x2, true).size(), vec![5, 1]);
        assert_eq!(SubModel2::forward_t(&mlp, &x1, &x2, false).size(), vec![5, 1]);
    }

    #[test]
    fn test_init_w_bounds_last_layer() {
        let vs = nn::VarStore::new(Device::Cpu);
        let config = MlpConfig::new(4, vec![32], 3, false).init_w(3e-3);
        let _mlp = <Mlp as SubModel>::build(&vs, config);

        let vars = vs.variables();
        let w = &vars["mlp.ln1.weight"];
        let b = &vars["mlp.ln1.bias"];
        assert!(w.abs().max().double_value(&[]) <= 3e-3);
        assert!(b.abs().max().double_value(&[]) <= 3e-3);
    }

    #[test]
    fn test_clone_with_var_store_has_same_variables() {
        let vs = nn::VarStore::new(Device::Cpu);
        let mlp = <Mlp as SubModel>::build(&vs, MlpConfig::new(3, vec![4], 2, false).use_bn(true));
        let vs2 = nn::VarStore::new(Device::Cpu);
        let _mlp2 = SubModel::clone_with_var_store(&mlp, &vs2);

        let mut k1 = vs.variables().into_keys().collect::<Vec<_>>();
        let mut k2 = vs2.variables().into_keys().collect::<Vec<_>>();
        k1.sort();
        k2.sort();
        assert_eq!(k1, k2);
    }
}
