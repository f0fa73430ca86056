//! Types and traits for recording values reported during training.
//!
//! ```rust
//! use ddpg_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("loss_critic", 0.25);
//! record.insert("policy_value", RecordValue::Scalar(-1.5));
//! assert_eq!(record.get_scalar("loss_critic").unwrap(), 0.25);
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use recorder::Recorder;
