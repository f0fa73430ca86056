//! Policy.
use anyhow::Result;
use log::info;
use serde::de::DeserializeOwned;
use std::path::Path;

/// A policy.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either of deterministic or stochastic.
pub trait Policy {
    /// Observation given to the policy.
    type Obs;

    /// Action returned by the policy.
    type Act;

    /// Sample an action given an observation.
    fn sample(&mut self, obs: &Self::Obs) -> Result<Self::Act>;
}

/// A configurable object.
pub trait Configurable {
    /// Configuration.
    type Config: Clone + DeserializeOwned;

    /// Builds the object.
    fn build(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Build the object with the configuration in the yaml file of the given path.
    fn build_from_path(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized,
    {
        info!("Build from the configuration in {:?}", path.as_ref());
        let file = std::fs::File::open(path)?;
        let rdr = std::io::BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Self::build(config)
    }
}
