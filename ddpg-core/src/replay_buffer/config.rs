//! Configuration of [`SimpleReplayBuffer`](super::SimpleReplayBuffer).
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Configuration of [`SimpleReplayBuffer`](super::SimpleReplayBuffer).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SimpleReplayBufferConfig {
    pub(super) capacity: usize,
    pub(super) seed: u64,
}

impl Default for SimpleReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            seed: 42,
        }
    }
}

impl SimpleReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the seed of the random number generator used for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;
    use std::{fs::File, io::Write};
    use tempdir::TempDir;

    #[test]
    fn test_yaml_round_trip() -> Result<()> {
        let dir = TempDir::new("replay_buffer")?;
        let path = dir.path().join("replay_buffer.yaml");
        let config = SimpleReplayBufferConfig::default().capacity(5).seed(7);

        let mut file = File::create(&path)?;
        file.write_all(serde_yaml::to_string(&config)?.as_bytes())?;
        let loaded: SimpleReplayBufferConfig = serde_yaml::from_reader(File::open(&path)?)?;
        assert_eq!(config, loaded);

        Ok(())
    }
}
