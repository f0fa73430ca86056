//! DDPG agent implemented with [tch](https://crates.io/crates/tch).
pub mod cnn;
pub mod ddpg;
pub mod mlp;
pub mod model;
pub mod opt;
mod tensor_batch;
pub mod util;
use serde::{Deserialize, Serialize};
pub use tensor_batch::TensorSubBatch;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using tch.
///
/// This enum is added because [`tch::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Device {
    /// Returns the first GPU if CUDA is available, otherwise CPU.
    pub fn cuda_if_available() -> Self {
        match tch::Cuda::is_available() {
            true => Self::Cuda(0),
            false => Self::Cpu,
        }
    }
}

impl From<Device> for tch::Device {
    fn from(device: Device) -> Self {
        match device {
            Device::Cpu => tch::Device::Cpu,
            Device::Cuda(n) => tch::Device::Cuda(n),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_device_conversion() {
        assert_eq!(tch::Device::from(Device::Cpu), tch::Device::Cpu);
        assert_eq!(tch::Device::from(Device::Cuda(1)), tch::Device::Cuda(1));

        let device: tch::Device = Device::cuda_if_available().into();
        assert_eq!(device.is_cuda(), tch::Cuda::is_available());
    }
}
