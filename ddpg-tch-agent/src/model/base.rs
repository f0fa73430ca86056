//! Definition of interfaces of neural networks.
use crate::opt::Optimizer;
use anyhow::Result;
use std::path::Path;
use tch::{nn, nn::VarStore, Tensor};

/// A network owning its parameters and optimizer.
pub trait ModelBase {
    /// Trains the network given a loss.
    fn backward_step(&mut self, loss: &Tensor);

    /// Returns the optimizer, e.g., for putting it into a
    /// [`TrainableGroup`](crate::opt::TrainableGroup).
    fn optimizer_mut(&mut self) -> &mut Optimizer;

    /// Returns `var_store` as mutable reference.
    fn get_var_store_mut(&mut self) -> &mut nn::VarStore;

    /// Returns `var_store`.
    fn get_var_store(&self) -> &nn::VarStore;

    /// Save parameters of the neural network.
    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()>;
}

/// Neural network model that can be initialized with [`VarStore`] and configuration.
///
/// Modules consisting a neural network share a [`VarStore`], so structs
/// implementing this trait are initialized with a given [`VarStore`].
/// [`SubModel::clone_with_var_store`] is used when creating a target network.
///
/// The train flag of [`SubModel::forward_t`] switches layers like batch
/// normalization between training and evaluation behaviour.
pub trait SubModel {
    /// Configuration from which [`SubModel`] is constructed.
    type Config;

    /// Input of the [`SubModel`].
    type Input;

    /// Output of the [`SubModel`].
    type Output;

    /// Builds [`SubModel`] with [`VarStore`] and [`SubModel::Config`].
    fn build(var_store: &VarStore, config: Self::Config) -> Self;

    /// Clones [`SubModel`] with [`VarStore`].
    fn clone_with_var_store(&self, var_store: &VarStore) -> Self;

    /// A generalized forward function.
    fn forward_t(&self, input: &Self::Input, train: bool) -> Self::Output;
}

/// Neural network model that can be initialized with [`VarStore`] and configuration.
///
/// The difference from [`SubModel`] is that this trait takes two inputs.
pub trait SubModel2 {
    /// Configuration from which [`SubModel2`] is constructed.
    type Config;

    /// Input of the [`SubModel2`].
    type Input1;

    /// Input of the [`SubModel2`].
    type Input2;

    /// Output of the [`SubModel2`].
    type Output;

    /// Builds [`SubModel2`] with [`VarStore`] and [`SubModel2::Config`].
    fn build(var_store: &VarStore, config: Self::Config) -> Self;

    /// Clones [`SubModel2`] with [`VarStore`].
    fn clone_with_var_store(&self, var_store: &VarStore) -> Self;

    /// A generalized forward function.
    fn forward_t(&self, input1: &Self::Input1, input2: &Self::Input2, train: bool) -> Self::Output;
}
