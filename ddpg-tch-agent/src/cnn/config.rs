use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`PixelCnn`](super::PixelCnn).
pub struct PixelCnnConfig {
    pub(super) in_channels: i64,
    pub(super) flat_dim: i64,
    pub(super) out_dim: i64,
}

impl PixelCnnConfig {
    /// Configuration for images of the given size.
    ///
    /// The dimension of the flattened feature map is derived from the image size.
    pub fn new(in_channels: i64, height: i64, width: i64, out_dim: i64) -> Self {
        let flat_dim = 32 * Self::feature_map_len(height) * Self::feature_map_len(width);
        Self {
            in_channels,
            flat_dim,
            out_dim,
        }
    }

    /// Length of an image side after the four convolution/pooling blocks.
    fn feature_map_len(n: i64) -> i64 {
        let n = n / 2; // kernel 5, padding 2
        let n = (n - 2) / 2; // kernel 5, padding 1
        let n = (n - 1) / 2; // kernel 4, padding 1
        n / 2 // kernel 3, padding 1
    }

    /// Returns the dimension of the flattened feature map.
    pub fn get_flat_dim(&self) -> i64 {
        self.flat_dim
    }
}
