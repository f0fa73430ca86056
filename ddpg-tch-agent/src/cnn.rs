//! Convolutional encoder of pixel observations.
//!
//! Four blocks of convolution, max-pooling and ReLU followed by a linear
//! layer producing a fixed-size feature vector. Observations are given as
//! `[batch, height, width, channels]` and permuted to channel-first order
//! inside the network; any numeric kind is cast to `f32`.
mod base;
mod config;
pub use base::PixelCnn;
pub use config::PixelCnnConfig;
