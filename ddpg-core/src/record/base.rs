//! Base implementation of records.
use crate::error::DdpgError;
use std::collections::{
    hash_map::{IntoIter, Iter},
    HashMap,
};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// A single floating-point value, typically a loss.
    Scalar(f32),
}

/// A container of key-value pairs.
#[derive(Debug)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns a consuming iterator over the key-value pairs.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Gets a scalar value.
    pub fn get_scalar(&self, k: &str) -> Result<f32, DdpgError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            None => Err(DdpgError::RecordKeyError(k.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_scalar() {
        let mut record = Record::from_slice(&[("loss_critic", RecordValue::Scalar(0.5))]);
        record.insert("policy_value", RecordValue::Scalar(-1.0));

        assert_eq!(record.get_scalar("loss_critic").unwrap(), 0.5);
        assert_eq!(record.get_scalar("policy_value").unwrap(), -1.0);
        assert!(matches!(
            record.get_scalar("loss_actor"),
            Err(DdpgError::RecordKeyError(_))
        ));
    }
}
