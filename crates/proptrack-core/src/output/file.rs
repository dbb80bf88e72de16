//! Flat-file sinks.
//!
//! Files are named `<prefix><timestamp><suffix>[_<channel>]<ext>` inside the
//! target directory. When the primary write fails the payload is written once
//! more into the fallback directory; if that also fails the payload is dropped
//! with an error log.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use super::{OutputModule, PayloadFormat};
use crate::clock::{Clock, SystemClock, format_file_timestamp};
use crate::dataset::{DEFAULT_DELIMITER, DEFAULT_DELIMITER_REPLACEMENT};
use crate::error::SinkError;

/// Default file name prefix.
pub const DEFAULT_PREFIX: &str = "Log_";
/// Directory name used under the system temp dir when no fallback is configured.
pub const FALLBACK_DIR_NAME: &str = "proptrack_fallback";
/// Header row written by [`CsvFileWriter::with_header`].
pub const CSV_HEADER: &str = "time,measurement,value";

/// Where a file sink writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTarget {
    pub directory: PathBuf,
    pub prefix: String,
    pub suffix: String,
    /// Used once when the primary write fails. Defaults to
    /// `<temp>/proptrack_fallback`.
    pub fallback_directory: Option<PathBuf>,
}

impl Default for FileTarget {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: String::new(),
            fallback_directory: None,
        }
    }
}

impl FileTarget {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    /// File name for a payload written at `timestamp`.
    pub fn file_name(&self, timestamp: &str, channel: Option<&str>, extension: &str) -> String {
        let mut name = format!("{}{}{}", self.prefix, timestamp, self.suffix);
        if let Some(channel) = channel {
            name.push('_');
            name.push_str(channel);
        }
        name.push_str(extension);
        name
    }

    pub fn path_for(&self, timestamp: &str, channel: Option<&str>, extension: &str) -> PathBuf {
        self.directory
            .join(self.file_name(timestamp, channel, extension))
    }

    pub fn fallback_dir(&self) -> PathBuf {
        self.fallback_directory
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(FALLBACK_DIR_NAME))
    }
}

/// Where a [`save_file`] call ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Primary(PathBuf),
    Fallback(PathBuf),
    Failed,
}

/// Create `path`'s parent directory and write `contents`.
pub fn write_file(path: &Path, contents: &str) -> Result<(), SinkError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SinkError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| SinkError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `contents` to `path`, retrying once under `fallback_dir`.
pub fn save_file(path: &Path, contents: &str, fallback_dir: &Path) -> SaveOutcome {
    let err = match write_file(path, contents) {
        Ok(()) => {
            info!("wrote {}", path.display());
            return SaveOutcome::Primary(path.to_path_buf());
        }
        Err(err) => err,
    };
    warn!("{err}; retrying in {}", fallback_dir.display());

    let Some(file_name) = path.file_name() else {
        error!("no file name in {}; payload dropped", path.display());
        return SaveOutcome::Failed;
    };
    let fallback = fallback_dir.join(file_name);
    match write_file(&fallback, contents) {
        Ok(()) => {
            info!("wrote {} (fallback)", fallback.display());
            SaveOutcome::Fallback(fallback)
        }
        Err(err) => {
            error!("{err}; payload dropped");
            SaveOutcome::Failed
        }
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Writes each channel's payload as `time<d>measurement<d>value` rows.
pub struct CsvFileWriter {
    target: FileTarget,
    delimiter: char,
    replacement: char,
    header: bool,
    clock: Arc<dyn Clock>,
}

impl CsvFileWriter {
    pub fn new(target: FileTarget) -> Self {
        Self {
            target,
            delimiter: DEFAULT_DELIMITER,
            replacement: DEFAULT_DELIMITER_REPLACEMENT,
            header: false,
            clock: Arc::new(SystemClock::new()),
        }
    }

    pub fn with_delimiter(mut self, delimiter: char, replacement: char) -> Self {
        self.delimiter = delimiter;
        self.replacement = replacement;
        self
    }

    /// Prefix every file with a `time,measurement,value` header row.
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Clock used for the file name timestamp.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn target(&self) -> &FileTarget {
        &self.target
    }

    fn header_row(&self) -> String {
        CSV_HEADER.replace(',', &self.delimiter.to_string())
    }
}

impl OutputModule for CsvFileWriter {
    fn name(&self) -> &str {
        "csv"
    }

    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::Csv {
            delimiter: self.delimiter,
            replacement: self.replacement,
        }
    }

    fn on_output_requested(&self, payload: &str, channel: Option<&str>) {
        let stamp = format_file_timestamp(self.clock.wall());
        let path = self.target.path_for(&stamp, channel, ".csv");
        if self.header {
            let contents = format!("{}\n{payload}", self.header_row());
            save_file(&path, &contents, &self.target.fallback_dir());
        } else {
            save_file(&path, payload, &self.target.fallback_dir());
        }
    }
}

// ---------------------------------------------------------------------------
// Line protocol
// ---------------------------------------------------------------------------

/// Writes each channel's payload as a line-protocol `.txt` file.
pub struct LineProtocolFileWriter {
    target: FileTarget,
    clock: Arc<dyn Clock>,
}

impl LineProtocolFileWriter {
    pub fn new(target: FileTarget) -> Self {
        Self {
            target,
            clock: Arc::new(SystemClock::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn target(&self) -> &FileTarget {
        &self.target
    }
}

impl OutputModule for LineProtocolFileWriter {
    fn name(&self) -> &str {
        "line_protocol"
    }

    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::LineProtocol
    }

    fn on_output_requested(&self, payload: &str, channel: Option<&str>) {
        let stamp = format_file_timestamp(self.clock.wall());
        let path = self.target.path_for(&stamp, channel, ".txt");
        save_file(&path, payload, &self.target.fallback_dir());
    }
}
