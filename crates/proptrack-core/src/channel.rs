//! Sampling channels.
//!
//! A [`Channel`] owns a named set of [`PropertySource`]s and the [`DataSet`]
//! they feed. It captures on demand ([`Channel::log_all_tracked_properties`],
//! [`Channel::log`]) or when the tracker's scheduler ticks it. Registration
//! and capture are refused (with a warning) until the owning tracker has
//! initialized the channel.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::clock::{self, Clock, TimeScale};
use crate::dataset::DataSet;
use crate::encode::sanitize;
use crate::error::ChannelError;
use crate::output::PayloadFormat;
use crate::point::{DataPoint, TimeFormat, VALUE_FIELD};
use crate::source::{BoundProperty, LiveProperty, MemberLookup, PropertySource, SourceOrigin};

/// Tag key carrying the tracker's session id.
pub const SESSION_TAG: &str = "session_id";
/// Tag key carrying the wall-clock date of capture.
pub const CAPTURE_DATE_TAG: &str = "capture_date";

/// Unit of [`IntervalConfig::value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    /// `value` seconds between captures.
    #[default]
    Seconds,
    /// `value` captures per second.
    PerSecond,
}

/// Capture cadence. A value of `0` means manual capture only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalConfig {
    pub unit: IntervalUnit,
    pub value: f64,
}

impl IntervalConfig {
    pub fn seconds(value: f64) -> Self {
        Self {
            unit: IntervalUnit::Seconds,
            value,
        }
    }

    pub fn per_second(value: f64) -> Self {
        Self {
            unit: IntervalUnit::PerSecond,
            value,
        }
    }

    pub fn manual() -> Self {
        Self::seconds(0.0)
    }

    /// Delay between ticks, or `None` for manual-only channels.
    pub fn delay(&self) -> Option<Duration> {
        if !self.value.is_finite() || self.value <= 0.0 {
            return None;
        }
        let secs = match self.unit {
            IntervalUnit::Seconds => self.value,
            IntervalUnit::PerSecond => 1.0 / self.value,
        };
        Duration::try_from_secs_f64(secs).ok()
    }
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self::seconds(1.0)
    }
}

/// Per-channel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub interval: IntervalConfig,
    pub time_scale: TimeScale,
    pub time_format: TimeFormat,
    /// Begin paused; the scheduler ticks but nothing is captured until unpaused.
    pub start_paused: bool,
    /// Stamp host-capability tags (OS, CPU, RAM, GPU, VRAM) on every point.
    pub host_tags: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            interval: IntervalConfig::default(),
            time_scale: TimeScale::Scaled,
            time_format: TimeFormat::EpochMillis,
            start_paused: false,
            host_tags: false,
        }
    }
}

/// Outcome of one [`Channel::capture_values`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureReport {
    /// Points appended.
    pub captured: usize,
    /// Sources removed because their target or member vanished.
    pub pruned: Vec<String>,
    /// Sources that failed this pass but stay registered.
    pub failed: Vec<String>,
}

/// An independently scheduled sampling stream.
pub struct Channel {
    index: usize,
    config: ChannelConfig,
    sources: Vec<Box<dyn PropertySource>>,
    data: DataSet,
    paused: bool,
    initialized: bool,
    standard_tags: BTreeMap<String, String>,
    clock: Arc<dyn Clock>,
}

impl Channel {
    pub fn new(index: usize, config: ChannelConfig, clock: Arc<dyn Clock>) -> Self {
        let paused = config.start_paused;
        Self {
            index,
            config,
            sources: Vec::new(),
            data: DataSet::new(),
            paused,
            initialized: false,
            standard_tags: BTreeMap::new(),
            clock,
        }
    }

    /// Mark the channel ready for registrations and scheduling.
    ///
    /// `host_tags` is only applied when the channel's config asks for it.
    pub fn initialize(&mut self, session_id: &str, host_tags: &BTreeMap<String, String>) {
        self.standard_tags.clear();
        self.standard_tags
            .insert(SESSION_TAG.to_string(), session_id.to_string());
        if self.config.host_tags {
            self.standard_tags
                .extend(host_tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        self.paused = self.config.start_paused;
        self.initialized = true;
        debug!("channel {} initialized (session {session_id})", self.index);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Display name used in per-channel file names, e.g. `Channel2`.
    pub fn name(&self) -> String {
        format!("Channel{}", self.index)
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn session_id(&self) -> Option<&str> {
        self.standard_tags.get(SESSION_TAG).map(String::as_str)
    }

    /// Delay between scheduled ticks, `None` for manual-only channels.
    pub fn interval_delay(&self) -> Option<Duration> {
        self.config.interval.delay()
    }

    pub fn time_scale(&self) -> TimeScale {
        self.config.time_scale
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Track a code-bound property under `name`.
    pub fn start_tracking_property<F, T>(
        &mut self,
        name: impl Into<String>,
        accessor: F,
    ) -> Result<(), ChannelError>
    where
        F: Fn() -> T + Send + 'static,
        T: ToString,
    {
        self.add_source(Box::new(BoundProperty::new(name, accessor)))
    }

    /// Track `member` of a live object under `name`.
    pub fn track_live_property<T>(
        &mut self,
        name: impl Into<String>,
        target: &Arc<T>,
        member: impl Into<String>,
    ) -> Result<(), ChannelError>
    where
        T: MemberLookup + 'static,
    {
        self.add_source(Box::new(LiveProperty::new(name, target, member)))
    }

    /// Register any [`PropertySource`]. Names are the authoritative key.
    pub fn add_source(&mut self, source: Box<dyn PropertySource>) -> Result<(), ChannelError> {
        if !self.initialized {
            let err = ChannelError::NotInitialized {
                channel: self.index,
            };
            warn!("cannot track \"{}\": {err}", source.name());
            return Err(err);
        }
        self.check_name(source.name())?;
        if self.sources.iter().any(|s| s.name() == source.name()) {
            let err = ChannelError::DuplicateProperty {
                channel: self.index,
                name: source.name().to_string(),
            };
            warn!("{err}");
            return Err(err);
        }
        debug!(
            "channel {} tracking \"{}\" ({})",
            self.index,
            source.name(),
            source.origin()
        );
        self.sources.push(source);
        Ok(())
    }

    /// Stop tracking the property registered under `name`.
    pub fn stop_tracking_property(&mut self, name: &str) -> Result<(), ChannelError> {
        if !self.initialized {
            let err = ChannelError::NotInitialized {
                channel: self.index,
            };
            warn!("cannot stop tracking \"{name}\": {err}");
            return Err(err);
        }
        match self.sources.iter().position(|s| s.name() == name) {
            Some(pos) => {
                self.sources.remove(pos);
                Ok(())
            }
            None => {
                let err = ChannelError::UnknownProperty {
                    channel: self.index,
                    name: name.to_string(),
                };
                warn!("{err}");
                Err(err)
            }
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn source_origins(&self) -> Vec<(&str, SourceOrigin)> {
        self.sources.iter().map(|s| (s.name(), s.origin())).collect()
    }

    // -----------------------------------------------------------------------
    // Capture
    // -----------------------------------------------------------------------

    /// Capture every tracked property right now, outside the schedule.
    pub fn log_all_tracked_properties(&mut self) -> Result<CaptureReport, ChannelError> {
        if !self.initialized {
            let err = ChannelError::NotInitialized {
                channel: self.index,
            };
            warn!("cannot log: {err}");
            return Err(err);
        }
        Ok(self.capture_values())
    }

    /// Append one ad-hoc point. Caller tags override standard tags on collision.
    pub fn log<I, K, V>(
        &mut self,
        name: &str,
        value: impl ToString,
        tags: I,
    ) -> Result<(), ChannelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if !self.initialized {
            let err = ChannelError::NotInitialized {
                channel: self.index,
            };
            warn!("cannot log \"{name}\": {err}");
            return Err(err);
        }
        self.check_name(name)?;
        let mut merged = self.capture_tags();
        merged.extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        let time = self.stamp();
        self.data
            .add(DataPoint::new(name, time, VALUE_FIELD, value.to_string(), merged));
        Ok(())
    }

    /// A measurement name must survive line-protocol sanitizing.
    fn check_name(&self, name: &str) -> Result<(), ChannelError> {
        if !sanitize(name).is_empty() {
            return Ok(());
        }
        let err = ChannelError::InvalidName {
            channel: self.index,
            name: name.to_string(),
        };
        warn!("{err}");
        Err(err)
    }

    /// Poll every source once and append the results.
    ///
    /// A failing source never aborts the pass. Sources whose live target or
    /// member is gone are pruned; other failures are skipped for this pass.
    pub fn capture_values(&mut self) -> CaptureReport {
        let time = self.stamp();
        let tags = self.capture_tags();
        let index = self.index;
        let mut report = CaptureReport::default();
        let mut captured = Vec::with_capacity(self.sources.len());

        self.sources.retain(|source| match source.sample() {
            Ok(value) => {
                captured.push(DataPoint::new(
                    source.name(),
                    time,
                    VALUE_FIELD,
                    value,
                    tags.clone(),
                ));
                true
            }
            Err(err) if err.prunes_source() => {
                warn!("channel {index}: {err}; no longer tracking \"{}\"", source.name());
                report.pruned.push(source.name().to_string());
                false
            }
            Err(err) => {
                warn!("channel {index}: {err}");
                report.failed.push(source.name().to_string());
                true
            }
        });

        report.captured = captured.len();
        for point in captured {
            self.data.add(point);
        }
        report
    }

    /// One scheduler tick: capture unless paused.
    pub fn tick(&mut self) -> Option<CaptureReport> {
        if self.paused {
            debug!("channel {} paused, skipping tick", self.index);
            return None;
        }
        Some(self.capture_values())
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // -----------------------------------------------------------------------
    // Data
    // -----------------------------------------------------------------------

    pub fn data_set(&self) -> &DataSet {
        &self.data
    }

    pub fn reset_data(&mut self) {
        self.data.reset();
    }

    /// Render the buffered points in the form a sink asked for.
    pub fn serialize(&self, format: PayloadFormat) -> String {
        match format {
            PayloadFormat::Csv {
                delimiter,
                replacement,
            } => self.data.serialize_csv(delimiter, replacement),
            PayloadFormat::LineProtocol => self.data.serialize_line_protocol(),
        }
    }

    fn stamp(&self) -> crate::point::PointTime {
        self.config
            .time_format
            .stamp(self.clock.as_ref(), self.config.time_scale)
    }

    fn capture_tags(&self) -> BTreeMap<String, String> {
        let mut tags = self.standard_tags.clone();
        tags.insert(
            CAPTURE_DATE_TAG.to_string(),
            clock::format_date(self.clock.wall()),
        );
        tags
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("index", &self.index)
            .field("config", &self.config)
            .field("sources", &self.source_names())
            .field("points", &self.data.len())
            .field("paused", &self.paused)
            .field("initialized", &self.initialized)
            .finish()
    }
}
