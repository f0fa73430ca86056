use super::PixelCnnConfig;
use crate::model::SubModel;
use tch::{nn, nn::ModuleT, Device, Kind, Tensor};

/// Convolutional encoder mapping pixel observations to feature vectors.
pub struct PixelCnn {
    config: PixelCnnConfig,
    device: Device,
    seq: nn::SequentialT,
}

impl PixelCnn {
    fn conv(padding: i64) -> nn::ConvConfig {
        nn::ConvConfig {
            padding,
            ..Default::default()
        }
    }

    fn create_net(var_store: &nn::VarStore, config: &PixelCnnConfig) -> nn::SequentialT {
        let p = &(var_store.root() / "cnn");
        nn::seq_t()
            .add_fn(|xs| xs.permute([0, 3, 1, 2]).to_kind(Kind::Float))
            .add(nn::conv2d(p / "c1", config.in_channels, 32, 5, Self::conv(2)))
            .add_fn(|xs| xs.max_pool2d_default(2).relu())
            .add(nn::conv2d(p / "c2", 32, 32, 5, Self::conv(1)))
            .add_fn(|xs| xs.max_pool2d_default(2).relu())
            .add(nn::conv2d(p / "c3", 32, 32, 4, Self::conv(1)))
            .add_fn(|xs| xs.max_pool2d_default(2).relu())
            .add(nn::conv2d(p / "c4", 32, 32, 3, Self::conv(1)))
            .add_fn(|xs| xs.max_pool2d_default(2).relu().flat_view())
            .add(nn::linear(
                p / "out",
                config.flat_dim,
                config.out_dim,
                Default::default(),
            ))
    }

    fn build_(var_store: &nn::VarStore, config: PixelCnnConfig) -> Self {
        let device = var_store.device();
        let seq = Self::create_net(var_store, &config);

        Self {
            config,
            device,
            seq,
        }
    }
}

impl SubModel for PixelCnn {
    type Config = PixelCnnConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward_t(&self, x: &Self::Input, train: bool) -> Tensor {
        self.seq.forward_t(&x.to_device(self.device), train)
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
    fn test_flat_dim() {
        assert_eq!(PixelCnnConfig::new(1, 32, 32, 10).get_flat_dim(), 32);
        assert_eq!(PixelCnnConfig::new(3, 64, 96, 10).get_flat_dim(), 32 * 3 * 5);
    }

    #[test]
    fn test_forward_hwc_input() {
        let vs = nn::VarStore::new(Device::Cpu);
        let config = PixelCnnConfig::new(3, 64, 96, 10);
        let cnn = PixelCnn::build(&vs, config);

        let x = Tensor::zeros(&[2, 64, 96, 3], (Kind::Uint8, Device::Cpu));
        let y = cnn.forward_t(&x, false);
        assert_eq!(y.size(), vec![2, 10]);
        assert_eq!(y.kind(), Kind::Float);
    }
}
