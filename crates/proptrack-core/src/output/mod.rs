//! Output sinks.
//!
//! Every sink implements [`OutputModule`]. The tracker asks each sink which
//! [`PayloadFormat`] it wants, serializes each channel in that form, and hands
//! the text over exactly once per channel at shutdown (or once in total for
//! sinks that opt out of [`OutputModule::per_channel`]). Sinks never return
//! errors to the tracker: failures are logged and contained.

pub mod file;
pub mod system_info;
pub mod upload;

pub use file::{CsvFileWriter, FileTarget, LineProtocolFileWriter, SaveOutcome, save_file};
pub use system_info::{SYSTEM_INFO_SUFFIX, SystemInfoSnapshotWriter};
pub use upload::{HttpUploader, Precision, UploadConfig};

use crate::dataset::{DEFAULT_DELIMITER, DEFAULT_DELIMITER_REPLACEMENT};

/// Textual form a sink expects its payload in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadFormat {
    Csv { delimiter: char, replacement: char },
    LineProtocol,
}

impl PayloadFormat {
    pub fn csv() -> Self {
        Self::Csv {
            delimiter: DEFAULT_DELIMITER,
            replacement: DEFAULT_DELIMITER_REPLACEMENT,
        }
    }
}

impl std::fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv { .. } => write!(f, "csv"),
            Self::LineProtocol => write!(f, "line_protocol"),
        }
    }
}

/// Trait that every output sink must implement.
pub trait OutputModule: Send {
    /// Short identifier used in log lines.
    fn name(&self) -> &str;

    fn payload_format(&self) -> PayloadFormat;

    /// Whether the sink takes one call per channel. Sinks returning `false`
    /// are called once per activation with an empty payload and no channel.
    fn per_channel(&self) -> bool {
        true
    }

    /// Persist or transmit one channel's serialized payload.
    ///
    /// `channel` is `Some("Channel<N>")` when the tracker runs several
    /// channels, `None` otherwise.
    fn on_output_requested(&self, payload: &str, channel: Option<&str>);
}
