//! # proptrack-core
//!
//! **Periodic property sampling with line-protocol and CSV output.**
//!
//! `proptrack-core` polls named properties of a running process on
//! independently scheduled channels, buffers the observations, and hands one
//! serialized snapshot per channel to every configured output sink when the
//! tracker shuts down.
//!
//! ## Quick Start
//!
//! ```no_run
//! use proptrack_core::{
//!     ChannelConfig, FileTarget, IntervalConfig, LineProtocolFileWriter, Tracker, TrackerMode,
//! };
//!
//! let mut tracker = Tracker::new(TrackerMode::SingleChannel);
//! tracker.add_channel(ChannelConfig {
//!     interval: IntervalConfig::per_second(2.0),
//!     ..Default::default()
//! });
//! tracker.add_sink(Box::new(LineProtocolFileWriter::new(FileTarget::new("logs"))));
//! tracker.initialize();
//!
//! let started = std::time::Instant::now();
//! tracker
//!     .get_channel_mut(0)
//!     .start_tracking_property("uptime_ms", move || started.elapsed().as_millis())
//!     .unwrap();
//!
//! tracker.start();
//! for _ in 0..10 {
//!     tracker.run_pending();
//!     std::thread::sleep(tracker.next_wakeup().unwrap_or_default());
//! }
//! tracker.shutdown();
//! ```
//!
//! ## Architecture
//!
//! Sources → Channel (DataSet) → Tracker → Sinks
//!
//! - A [`PropertySource`] yields a value as text: a code-bound closure
//!   ([`BoundProperty`]) or a member lookup on a weakly held live object
//!   ([`LiveProperty`]).
//! - A [`Channel`] polls its sources on its own interval, measured on the
//!   scaled or unscaled clock, and appends immutable [`DataPoint`]s to its
//!   [`DataSet`].
//! - The [`Tracker`] owns the channels, mints the session id stamped on every
//!   point, drives a single priority-queue [`Scheduler`], and fans out once at
//!   shutdown.
//! - Every sink implements [`OutputModule`] and picks its own payload form, so
//!   CSV and line-protocol sinks combine freely.
//!
//! [`TrackerRunner`] drives a shared tracker from a background thread.

pub mod channel;
pub mod clock;
pub mod config;
pub mod dataset;
pub mod encode;
pub mod error;
pub mod host;
pub mod output;
pub mod point;
pub mod runner;
pub mod schedule;
pub mod source;
pub mod tracker;

pub use channel::{
    CAPTURE_DATE_TAG, CaptureReport, Channel, ChannelConfig, IntervalConfig, IntervalUnit,
    SESSION_TAG,
};
pub use clock::{Clock, ManualClock, SystemClock, TimeScale};
pub use config::{OutputConfig, TrackerConfig};
pub use dataset::{DEFAULT_DELIMITER, DEFAULT_DELIMITER_REPLACEMENT, DataSet};
pub use error::{CaptureError, ChannelError, ConfigError, SinkError, TrackerError, UploadError};
pub use host::SystemInfo;
pub use output::{
    CsvFileWriter, FileTarget, HttpUploader, LineProtocolFileWriter, OutputModule, PayloadFormat,
    Precision, SYSTEM_INFO_SUFFIX, SaveOutcome, SystemInfoSnapshotWriter, UploadConfig,
};
pub use point::{DataPoint, PointTime, TimeFormat, VALUE_FIELD};
pub use runner::TrackerRunner;
pub use schedule::Scheduler;
pub use source::{
    BoundProperty, LiveObject, LiveProperty, MemberLookup, PropertySource, SourceOrigin,
};
pub use tracker::{Tracker, TrackerMode, TrackerState};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
