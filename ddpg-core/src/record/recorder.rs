use super::Record;

/// Writes records to an output destination.
pub trait Recorder {
    /// Writes a record immediately.
    fn write(&mut self, record: Record);

    /// Stores a record to be aggregated on [`Recorder::flush`].
    fn store(&mut self, record: Record);

    /// Writes values aggregated from the stored records.
    fn flush(&mut self, step: i64);
}
