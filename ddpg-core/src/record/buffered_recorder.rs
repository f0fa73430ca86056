use super::{Record, Recorder};

/// Keeps records in memory.
///
/// Stored records are moved to the written ones on [`Recorder::flush`].
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    stored: Vec<Record>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the written records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Returns the number of written records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }

    fn store(&mut self, record: Record) {
        self.stored.push(record);
    }

    fn flush(&mut self, _step: i64) {
        self.buf.append(&mut self.stored);
    }
}
