pub mod buffer;
pub mod config;
pub mod doctor;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod writer;

pub use config::WriterConfig;
pub use error::{FormatError, LogError};
pub use lifecycle::FixLog;
pub use writer::WriterState;

pub use fixtrail_proto::fix::{Fix, FixStatus, ObservedFix, Position};
