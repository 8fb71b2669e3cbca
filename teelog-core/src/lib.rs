//! # teelog-core
//! Core utilities for teelog - JSON records, tee destinations and rotating log files.

mod caller;
mod config;
mod encoder;
mod field;
mod log_rotation;
mod log_writer;
mod tee;

pub use caller::{Caller, absolute_source_path, short_function_name};
pub use config::{TEELOG_CONFIG, TeeLogConfig};
pub use encoder::{Record, TIME_FORMAT, encode};
pub use field::{Field, FieldValue, any, display};
pub use log_rotation::{Backup, RotatingFile, RotationPolicy, backups};
pub use log_writer::{BufferWriter, LogFile, LogStdout, LogWriter};
pub use tee::{Destination, Tee};
