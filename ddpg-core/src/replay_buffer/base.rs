//! Simple generic replay buffer.
use super::{SimpleReplayBufferConfig, StdBatch, SubBatch};
use crate::{error::DdpgError, ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A circular replay buffer with uniform sampling.
///
/// Transitions are written into fixed-size arrays; once the buffer is full
/// the oldest transitions are overwritten.
pub struct SimpleReplayBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    capacity: usize,
    i: usize,
    size: usize,
    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminal: Vec<i8>,
    rng: StdRng,
}

impl<O, A> SimpleReplayBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    #[inline]
    fn push_reward(&mut self, i: usize, b: &[f32]) {
        let mut j = i;
        for r in b.iter() {
            self.reward[j] = *r;
            j += 1;
            if j == self.capacity {
                j = 0;
            }
        }
    }

    #[inline]
    fn push_is_terminal(&mut self, i: usize, b: &[i8]) {
        let mut j = i;
        for d in b.iter() {
            self.is_terminal[j] = *d;
            j += 1;
            if j == self.capacity {
                j = 0;
            }
        }
    }

    fn sample_reward(&self, ixs: &[usize]) -> Vec<f32> {
        ixs.iter().map(|ix| self.reward[*ix]).collect()
    }

    fn sample_is_terminal(&self, ixs: &[usize]) -> Vec<i8> {
        ixs.iter().map(|ix| self.is_terminal[*ix]).collect()
    }

    /// Returns the capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<O, A> ExperienceBufferBase for SimpleReplayBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    type Item = StdBatch<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        let len = tr.len();
        let (obs, act, next_obs, reward, is_terminal) = tr.unpack();
        self.obs.push(self.i, &obs);
        self.act.push(self.i, &act);
        self.next_obs.push(self.i, &next_obs);
        self.push_reward(self.i, &reward);
        self.push_is_terminal(self.i, &is_terminal);

        self.i = (self.i + len) % self.capacity;
        self.size = (self.size + len).min(self.capacity);
        trace!("Pushed {} transition(s), size = {}", len, self.size);

        Ok(())
    }
}

impl<O, A> ReplayBufferBase for SimpleReplayBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    type Config = SimpleReplayBufferConfig;
    type Batch = StdBatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;

        Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_terminal: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Samples `size` transitions uniformly with replacement.
    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if self.size == 0 {
            return Err(DdpgError::EmptyReplayBuffer.into());
        }

        let ixs = (0..size)
            .map(|_| self.rng.gen_range(0..self.size))
            .collect::<Vec<_>>();

        Ok(StdBatch {
            obs: self.obs.sample(&ixs),
            act: self.act.sample(&ixs),
            next_obs: self.next_obs.sample(&ixs),
            reward: self.sample_reward(&ixs),
            is_terminal: self.sample_is_terminal(&ixs),
            ix_sample: Some(ixs),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Scalar storage for testing.
    struct VecSubBatch(Vec<f32>);

    impl SubBatch for VecSubBatch {
        fn new(capacity: usize) -> Self {
            Self(vec![0.; capacity])
        }

        fn push(&mut self, i: usize, data: &Self) {
            let capacity = self.0.len();
            for (j, v) in data.0.iter().enumerate() {
                self.0[(i + j) % capacity] = *v;
            }
        }

        fn sample(&self, ixs: &[usize]) -> Self {
            Self(ixs.iter().map(|&ix| self.0[ix]).collect())
        }
    }

    type Buffer = SimpleReplayBuffer<VecSubBatch, VecSubBatch>;

    fn transition(v: f32, is_terminal: i8) -> StdBatch<VecSubBatch, VecSubBatch> {
        StdBatch::new(
            VecSubBatch(vec![v]),
            VecSubBatch(vec![-v]),
            VecSubBatch(vec![v + 1.0]),
            vec![v * 10.0],
            vec![is_terminal],
        )
    }

    #[test]
    fn test_overflow_evicts_oldest() -> Result<()> {
        let capacity = 5;
        let k = 3;
        let mut buffer = Buffer::build(&SimpleReplayBufferConfig::default().capacity(capacity));

        for i in 0..capacity + k {
            buffer.push(transition(i as f32, 0))?;
        }
        assert_eq!(buffer.len(), capacity);

        // Sample enough times to see every slot
        let batch = buffer.batch(1000)?;
        let mut seen = batch.obs.0.clone();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        seen.dedup();
        let expected = (k..capacity + k).map(|i| i as f32).collect::<Vec<_>>();
        assert_eq!(seen, expected);

        Ok(())
    }

    #[test]
    fn test_batch_fields_are_parallel() -> Result<()> {
        let mut buffer = Buffer::build(&SimpleReplayBufferConfig::default().capacity(10));
        for i in 0..7 {
            buffer.push(transition(i as f32, (i % 2) as i8))?;
        }

        let batch = buffer.batch(32)?;
        assert_eq!(batch.len(), 32);
        assert_eq!(batch.ix_sample.as_ref().unwrap().len(), 32);
        for j in 0..32 {
            let o = batch.obs.0[j];
            assert_eq!(batch.act.0[j], -o);
            assert_eq!(batch.next_obs.0[j], o + 1.0);
            assert_eq!(batch.reward[j], o * 10.0);
            assert_eq!(batch.is_terminal[j], (o as i32 % 2) as i8);
        }

        Ok(())
    }

    #[test]
    fn test_push_multiple_transitions_wraps() -> Result<()> {
        let mut buffer = Buffer::build(&SimpleReplayBufferConfig::default().capacity(4));
        buffer.push(StdBatch::new(
            VecSubBatch(vec![0., 1., 2.]),
            VecSubBatch(vec![0., 0., 0.]),
            VecSubBatch(vec![0., 0., 0.]),
            vec![0.; 3],
            vec![0; 3],
        ))?;
        buffer.push(StdBatch::new(
            VecSubBatch(vec![3., 4.]),
            VecSubBatch(vec![0., 0.]),
            VecSubBatch(vec![0., 0.]),
            vec![0.; 2],
            vec![0; 2],
        ))?;

        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.obs.0, vec![4., 1., 2., 3.]);

        Ok(())
    }

    #[test]
    fn test_same_seed_same_batches() -> Result<()> {
        let config = SimpleReplayBufferConfig::default().capacity(100).seed(7);
        let mut b1 = Buffer::build(&config);
        let mut b2 = Buffer::build(&config);
        for i in 0..50 {
            b1.push(transition(i as f32, 0))?;
            b2.push(transition(i as f32, 0))?;
        }

        assert_eq!(b1.batch(16)?.ix_sample, b2.batch(16)?.ix_sample);

        Ok(())
    }

    #[test]
    fn test_empty_buffer_is_an_error() {
        let mut buffer = Buffer::build(&SimpleReplayBufferConfig::default());
        assert!(buffer.is_empty());

        let err = buffer.batch(4).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<DdpgError>(),
            Some(DdpgError::EmptyReplayBuffer)
        ));
    }
}
