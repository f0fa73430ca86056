use super::{Record, RecordValue, Recorder};
use log::info;
use std::collections::BTreeMap;

/// Writes records through the `log` crate.
///
/// Scalars stored with [`Recorder::store`] are averaged per key and written
/// in one line on [`Recorder::flush`].
#[derive(Default)]
pub struct LogRecorder {
    scalars: BTreeMap<String, Vec<f32>>,
}

impl LogRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn format(record: &Record) -> String {
        let mut items = record
            .iter()
            .map(|(k, v)| match v {
                RecordValue::Scalar(v) => format!("{}: {:.6}", k, v),
            })
            .collect::<Vec<_>>();
        items.sort();
        items.join(", ")
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        info!("{}", Self::format(&record));
    }

    fn store(&mut self, record: Record) {
        for (k, v) in record.into_iter_in_record() {
            match v {
                RecordValue::Scalar(v) => self.scalars.entry(k).or_default().push(v),
            }
        }
    }

    fn flush(&mut self, step: i64) {
        if self.scalars.is_empty() {
            return;
        }

        let mut record = Record::from_scalar("step", step as f32);
        for (k, vs) in std::mem::take(&mut self.scalars) {
            let mean = vs.iter().sum::<f32>() / vs.len() as f32;
            record.insert(k, RecordValue::Scalar(mean));
        }
        self.write(record);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_flush_clears_stored_scalars() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut recorder = LogRecorder::new();
        recorder.store(Record::from_scalar("loss_critic", 1.0));
        recorder.store(Record::from_scalar("loss_critic", 3.0));
        assert_eq!(recorder.scalars["loss_critic"], vec![1.0, 3.0]);

        recorder.flush(10);
        assert!(recorder.scalars.is_empty());
    }
}
