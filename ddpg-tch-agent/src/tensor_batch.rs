use ddpg_core::replay_buffer::SubBatch;
use tch::{Device, Tensor};

/// A buffer consisting of a [`Tensor`](tch::Tensor).
///
/// The internal buffer of this struct has the shape of `[capacity, shape[1..]]`,
/// where `shape` is obtained from the data pushed at the first time via
/// [`SubBatch::push`]. The first axis of pushed data is the batch axis.
/// The buffer is kept in host memory with the kind of the first pushed data.
pub struct TensorSubBatch {
    buf: Option<Tensor>,
    capacity: i64,
}

impl Clone for TensorSubBatch {
    fn clone(&self) -> Self {
        Self {
            buf: self.buf.as_ref().map(|t| t.copy()),
            capacity: self.capacity,
        }
    }
}

impl TensorSubBatch {
    /// Wraps a tensor whose first axis is the batch axis.
    pub fn from_tensor(t: Tensor) -> Self {
        let capacity = t.size()[0];
        Self {
            buf: Some(t),
            capacity,
        }
    }

    /// Returns the tensor, `None` if nothing has been pushed.
    pub fn tensor(&self) -> Option<&Tensor> {
        self.buf.as_ref()
    }

    /// Consumes `self` and returns the tensor.
    pub fn into_tensor(self) -> Option<Tensor> {
        self.buf
    }
}

impl SubBatch for TensorSubBatch {
    fn new(capacity: usize) -> Self {
        Self {
            buf: None,
            capacity: capacity as _,
        }
    }

    /// Pushes given data.
    ///
    /// If the internal buffer is empty, it will be initialized with the shape
    /// `[capacity, data.size()[1..]]`.
    fn push(&mut self, index: usize, data: &Self) {
        let src = match &data.buf {
            Some(src) => src,
            None => return,
        };

        let batch_size = src.size()[0];
        if batch_size == 0 {
            return;
        }

        let capacity = self.capacity;
        let buf = self.buf.get_or_insert_with(|| {
            let mut shape = src.size();
            shape[0] = capacity;
            Tensor::zeros(&shape, (src.kind(), Device::Cpu))
        });

        let index = index as i64;
        tch::no_grad(|| {
            for i_ in 0..batch_size {
                let i = (i_ + index) % capacity;
                buf.get(i).copy_(&src.get(i_));
            }
        });
    }

    fn sample(&self, ixs: &[usize]) -> Self {
        let ixs = ixs.iter().map(|&ix| ix as i64).collect::<Vec<_>>();
        let batch_indexes = Tensor::from_slice(&ixs);
        let buf = self
            .buf
            .as_ref()
            .map(|buf| buf.index_select(0, &batch_indexes));
        Self {
            buf,
            capacity: ixs.len() as i64,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tch::Kind;

    #[test]
    fn test_push_wraps_around() {
        let mut sb = TensorSubBatch::new(3);
        for v in 0..4 {
            let data = Tensor::from_slice(&[v as f32, -(v as f32)]).view([1, 2]);
            sb.push(v % 3, &TensorSubBatch::from_tensor(data));
        }

        let buf = sb.tensor().unwrap();
        assert_eq!(buf.size(), vec![3, 2]);
        assert_eq!(buf.kind(), Kind::Float);
        assert_eq!(buf.double_value(&[0, 0]), 3.0);
        assert_eq!(buf.double_value(&[1, 1]), -1.0);
        assert_eq!(buf.double_value(&[2, 0]), 2.0);
    }

    #[test]
    fn test_sample_selects_rows() {
        let data = Tensor::arange(12, (Kind::Float, Device::Cpu)).view([4, 3]);
        let mut sb = TensorSubBatch::new(4);
        sb.push(0, &TensorSubBatch::from_tensor(data));

        let sample = sb.sample(&[3, 0, 3]).into_tensor().unwrap();
        assert_eq!(sample.size(), vec![3, 3]);
        assert_eq!(sample.double_value(&[0, 0]), 9.0);
        assert_eq!(sample.double_value(&[1, 2]), 2.0);
        assert_eq!(sample.double_value(&[2, 1]), 10.0);
    }

    #[test]
    fn test_sample_before_push_is_empty() {
        let sb = TensorSubBatch::new(4);
        assert!(sb.sample(&[0]).tensor().is_none());
    }
}
