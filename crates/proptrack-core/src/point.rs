//! Immutable observation records.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, TimeScale, format_elapsed, unix_offset};
use crate::encode::{format_field_value, sanitize, scrub_csv_field};

/// Field key used for values captured from property sources.
pub const VALUE_FIELD: &str = "value";

/// How a channel stamps the `time` of its points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// `HH:MM:SS.mmm` since the clock started, in the channel's time domain.
    Elapsed,
    /// Integer seconds since the Unix epoch.
    EpochSeconds,
    /// Integer milliseconds since the Unix epoch.
    #[default]
    EpochMillis,
}

impl TimeFormat {
    /// Read the clock and produce a point time in this format.
    pub fn stamp(self, clock: &dyn Clock, scale: TimeScale) -> PointTime {
        match self {
            Self::Elapsed => PointTime::Elapsed(clock.elapsed(scale)),
            Self::EpochSeconds => PointTime::EpochSeconds(unix_offset(clock.wall()).as_secs()),
            Self::EpochMillis => {
                PointTime::EpochMillis(unix_offset(clock.wall()).as_millis() as u64)
            }
        }
    }
}

impl std::fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Elapsed => write!(f, "elapsed"),
            Self::EpochSeconds => write!(f, "epoch_seconds"),
            Self::EpochMillis => write!(f, "epoch_millis"),
        }
    }
}

/// The time at which a point was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointTime {
    Elapsed(Duration),
    EpochSeconds(u64),
    EpochMillis(u64),
}

impl std::fmt::Display for PointTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Elapsed(d) => f.write_str(&format_elapsed(*d)),
            Self::EpochSeconds(s) => write!(f, "{s}"),
            Self::EpochMillis(ms) => write!(f, "{ms}"),
        }
    }
}

/// One captured observation. Fields are private: a point never changes after capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    measurement: String,
    time: PointTime,
    value_name: String,
    value: String,
    tags: BTreeMap<String, String>,
}

impl DataPoint {
    pub fn new(
        measurement: impl Into<String>,
        time: PointTime,
        value_name: impl Into<String>,
        value: impl Into<String>,
        tags: BTreeMap<String, String>,
    ) -> Self {
        Self {
            measurement: measurement.into(),
            time,
            value_name: value_name.into(),
            value: value.into(),
            tags,
        }
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn time(&self) -> PointTime {
        self.time
    }

    pub fn value_name(&self) -> &str {
        &self.value_name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// `measurement,tag=val,... field=value time` (no trailing newline).
    ///
    /// Tags are emitted in key order.
    pub fn to_line_protocol(&self) -> String {
        let mut line = sanitize(&self.measurement);
        for (key, value) in &self.tags {
            let (key, value) = (sanitize(key), sanitize(value));
            if key.is_empty() || value.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(&key);
            line.push('=');
            line.push_str(&value);
        }
        line.push(' ');
        line.push_str(&sanitize(&self.value_name));
        line.push('=');
        line.push_str(&format_field_value(&self.value));
        line.push(' ');
        line.push_str(&self.time.to_string());
        line
    }

    /// `time<d>measurement<d>value` with each column scrubbed of `delimiter`.
    pub fn to_csv_row(&self, delimiter: char, replacement: char) -> String {
        let columns = [
            scrub_csv_field(&self.time.to_string(), delimiter, replacement),
            scrub_csv_field(&self.measurement, delimiter, replacement),
            scrub_csv_field(&self.value, delimiter, replacement),
        ];
        columns.join(delimiter.encode_utf8(&mut [0u8; 4]))
    }
}
