//! Storage of one field of transitions.

/// Fixed-capacity storage of one field (observations or actions) of transitions.
///
/// A value of this type is also used to carry the samples pushed into or
/// taken from the storage.
pub trait SubBatch {
    /// Builds storage with a capacity.
    fn new(capacity: usize) -> Self;

    /// Writes the samples in `data` starting at index `i`, wrapping around
    /// at the capacity.
    fn push(&mut self, i: usize, data: &Self);

    /// Takes the samples at the given indices.
    fn sample(&self, ixs: &[usize]) -> Self;
}
