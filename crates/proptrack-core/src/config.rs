//! JSON tracker configuration.
//!
//! ```json
//! {
//!   "mode": "multi_channel",
//!   "channels": [
//!     { "interval": { "unit": "per_second", "value": 4 } },
//!     { "interval": { "unit": "seconds", "value": 0 }, "host_tags": true }
//!   ],
//!   "outputs": [
//!     { "type": "csv", "directory": "logs", "header": true },
//!     { "type": "line_protocol", "directory": "logs", "prefix": "Run_" },
//!     { "type": "http", "url": "http://localhost:8086", "org": "lab",
//!       "bucket": "perf", "token": "..." }
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelConfig;
use crate::clock::Clock;
use crate::dataset::{DEFAULT_DELIMITER, DEFAULT_DELIMITER_REPLACEMENT};
use crate::error::ConfigError;
use crate::output::{
    CsvFileWriter, FileTarget, HttpUploader, LineProtocolFileWriter, OutputModule, Precision,
    SystemInfoSnapshotWriter, UploadConfig,
};
use crate::point::TimeFormat;
use crate::tracker::{Tracker, TrackerMode};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub mode: TrackerMode,
    /// Channel `i` of the tracker is built from entry `i`. Empty means one
    /// default channel.
    pub channels: Vec<ChannelConfig>,
    pub outputs: Vec<OutputConfig>,
}

/// One output sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputConfig {
    Csv {
        #[serde(flatten)]
        target: FileTarget,
        #[serde(default = "default_delimiter")]
        delimiter: char,
        #[serde(default = "default_replacement")]
        replacement: char,
        #[serde(default)]
        header: bool,
    },
    LineProtocol {
        #[serde(flatten)]
        target: FileTarget,
    },
    Http(UploadConfig),
    SystemInfo {
        #[serde(flatten)]
        target: FileTarget,
    },
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

fn default_replacement() -> char {
    DEFAULT_DELIMITER_REPLACEMENT
}

impl TrackerConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == TrackerMode::SingleChannel && self.channels.len() > 1 {
            return Err(ConfigError::Invalid(format!(
                "single_channel mode allows one channel, {} configured",
                self.channels.len()
            )));
        }
        for (i, channel) in self.channels.iter().enumerate() {
            let value = channel.interval.value;
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "channel {i}: interval must be a non-negative number, got {value}"
                )));
            }
        }
        for output in &self.outputs {
            output.validate()?;
        }
        self.validate_upload_precision()
    }

    /// Uploaded timestamps must be epoch integers in the precision the write
    /// request declares.
    fn validate_upload_precision(&self) -> Result<(), ConfigError> {
        let default_channel = [ChannelConfig::default()];
        let channels = if self.channels.is_empty() {
            &default_channel[..]
        } else {
            &self.channels[..]
        };
        for output in &self.outputs {
            let OutputConfig::Http(upload) = output else {
                continue;
            };
            for (i, channel) in channels.iter().enumerate() {
                match upload_precision(channel.time_format) {
                    Some(precision) if precision == upload.precision => {}
                    Some(precision) => {
                        return Err(ConfigError::Invalid(format!(
                            "channel {i}: {:?} timestamps need http precision \"{precision}\", \
                             got \"{}\"",
                            channel.time_format, upload.precision
                        )));
                    }
                    None => {
                        return Err(ConfigError::Invalid(format!(
                            "channel {i}: elapsed timestamps cannot be uploaded over http"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// The write precision matching a point time format, `None` for elapsed time.
fn upload_precision(format: TimeFormat) -> Option<Precision> {
    match format {
        TimeFormat::Elapsed => None,
        TimeFormat::EpochSeconds => Some(Precision::S),
        TimeFormat::EpochMillis => Some(Precision::Ms),
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Csv {
                delimiter,
                replacement,
                ..
            } => {
                if delimiter == replacement {
                    return Err(ConfigError::Invalid(format!(
                        "csv delimiter and replacement are both '{delimiter}'"
                    )));
                }
                if matches!(replacement, '\n' | '\r') || matches!(delimiter, '\n' | '\r') {
                    return Err(ConfigError::Invalid(
                        "csv delimiter and replacement must not be line breaks".to_string(),
                    ));
                }
            }
            Self::Http(upload) => {
                if upload.url.trim().is_empty() {
                    return Err(ConfigError::Invalid("http output needs a url".to_string()));
                }
                if upload.bucket.is_empty() {
                    return Err(ConfigError::Invalid(
                        "http output needs a bucket".to_string(),
                    ));
                }
                if upload.timeout_secs == 0 {
                    return Err(ConfigError::Invalid(
                        "http timeout_secs must be at least 1".to_string(),
                    ));
                }
            }
            Self::LineProtocol { .. } | Self::SystemInfo { .. } => {}
        }
        Ok(())
    }

    /// Construct the sink. File sinks name their files from `clock`.
    pub fn build(&self, clock: Arc<dyn Clock>) -> Result<Box<dyn OutputModule>, ConfigError> {
        let sink: Box<dyn OutputModule> = match self {
            Self::Csv {
                target,
                delimiter,
                replacement,
                header,
            } => Box::new(
                CsvFileWriter::new(target.clone())
                    .with_delimiter(*delimiter, *replacement)
                    .with_header(*header)
                    .with_clock(clock),
            ),
            Self::LineProtocol { target } => {
                Box::new(LineProtocolFileWriter::new(target.clone()).with_clock(clock))
            }
            Self::Http(upload) => Box::new(HttpUploader::new(upload.clone())?),
            Self::SystemInfo { target } => {
                Box::new(SystemInfoSnapshotWriter::new(target.clone()).with_clock(clock))
            }
        };
        Ok(sink)
    }
}

impl Tracker {
    /// Build an uninitialized tracker with the configured channels and sinks.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, ConfigError> {
        let tracker = Self::new(config.mode);
        Self::populate(tracker, config)
    }

    pub fn from_config_with_clock(
        config: &TrackerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        Self::populate(Self::with_clock(config.mode, clock), config)
    }

    fn populate(mut tracker: Self, config: &TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        for channel in &config.channels {
            tracker.add_channel(channel.clone());
        }
        for output in &config.outputs {
            tracker.add_sink(output.build(tracker.clock().clone())?);
        }
        Ok(tracker)
    }
}
