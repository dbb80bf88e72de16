//! The tracker: channel ownership, session identity, scheduling and the
//! single shutdown fan-out.
//!
//! Lifecycle is `Uninitialized -> Initialized -> Running -> OutputTriggered`.
//! `OutputTriggered` ends an activation; re-initializing starts the next one.
//! The final transition happens at most once per activation: repeated
//! [`Tracker::shutdown`] calls and the implicit flush on drop all pass through
//! the same guard.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::channel::{Channel, ChannelConfig};
use crate::clock::{Clock, SystemClock};
use crate::error::TrackerError;
use crate::host::SystemInfo;
use crate::output::OutputModule;
use crate::schedule::Scheduler;

/// Whether a tracker exposes one channel or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerMode {
    #[default]
    SingleChannel,
    MultiChannel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerState {
    Uninitialized,
    Initialized,
    Running,
    /// Output has been dispatched; no further capture or output happens in
    /// this activation. Unlike a strictly terminal state, calling
    /// [`Tracker::initialize`] (or [`Tracker::start`]) again leaves it and
    /// begins a new activation with a fresh session id and empty data sets.
    OutputTriggered,
}

impl std::fmt::Display for TrackerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::OutputTriggered => "output triggered",
        };
        f.write_str(s)
    }
}

pub struct Tracker {
    mode: TrackerMode,
    state: TrackerState,
    channels: Vec<Channel>,
    sinks: Vec<Box<dyn OutputModule>>,
    session_id: Option<String>,
    scheduler: Scheduler,
    clock: Arc<dyn Clock>,
    host_info: Option<SystemInfo>,
    output_triggered: bool,
}

impl Tracker {
    /// A tracker driven by the system clock.
    pub fn new(mode: TrackerMode) -> Self {
        Self::with_clock(mode, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(mode: TrackerMode, clock: Arc<dyn Clock>) -> Self {
        Self {
            mode,
            state: TrackerState::Uninitialized,
            channels: Vec::new(),
            sinks: Vec::new(),
            session_id: None,
            scheduler: Scheduler::new(),
            clock,
            host_info: None,
            output_triggered: false,
        }
    }

    /// Use `info` for host-capability tags instead of detecting the host.
    pub fn set_host_info(&mut self, info: SystemInfo) {
        self.host_info = Some(info);
    }

    pub fn mode(&self) -> TrackerMode {
        self.mode
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Add a channel and return its index.
    ///
    /// A single-channel tracker keeps its first channel; further calls warn and
    /// return index 0. Channels added after `initialize` join the current
    /// session, and after `start` they are scheduled immediately.
    pub fn add_channel(&mut self, config: ChannelConfig) -> usize {
        if self.mode == TrackerMode::SingleChannel && !self.channels.is_empty() {
            warn!("single-channel tracker already has a channel; ignoring new channel config");
            return 0;
        }
        let index = self.channels.len();
        let mut channel = Channel::new(index, config, self.clock.clone());
        if let Some(session) = self.session_id.clone() {
            if self.state != TrackerState::OutputTriggered {
                let host = self.host_tags(channel.config().host_tags);
                channel.initialize(&session, &host);
            }
        }
        self.channels.push(channel);
        if self.state == TrackerState::Running {
            self.schedule_now(index);
        }
        index
    }

    pub fn add_sink(&mut self, sink: Box<dyn OutputModule>) {
        debug!("added {} sink", sink.name());
        self.sinks.push(sink);
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Begin an activation: mint the session id and initialize every channel.
    ///
    /// Creates the default channel when none exist. Calling this on an
    /// initialized or running tracker only logs a warning. Calling it after
    /// output was triggered starts a fresh activation with empty data sets.
    pub fn initialize(&mut self) -> &str {
        match self.state {
            TrackerState::Initialized | TrackerState::Running => {
                warn!("tracker is already {}; keeping current session", self.state);
            }
            TrackerState::Uninitialized | TrackerState::OutputTriggered => {
                self.ensure_default_channel();
                if self.state == TrackerState::OutputTriggered {
                    for channel in &mut self.channels {
                        channel.reset_data();
                    }
                }
                let session = uuid::Uuid::new_v4().simple().to_string();
                let wants_host = self.channels.iter().any(|c| c.config().host_tags);
                let host = self.host_tags(wants_host);
                for channel in &mut self.channels {
                    channel.initialize(&session, &host);
                }
                info!(
                    "tracker initialized: session {session}, {} channel(s), {} sink(s)",
                    self.channels.len(),
                    self.sinks.len()
                );
                self.session_id = Some(session);
                self.output_triggered = false;
                self.state = TrackerState::Initialized;
            }
        }
        self.session_id.as_deref().unwrap_or_default()
    }

    /// Schedule every interval channel; each fires on the next `run_pending`.
    ///
    /// Initializes first if needed.
    pub fn start(&mut self) {
        match self.state {
            TrackerState::Running => {
                warn!("tracker is already running");
                return;
            }
            TrackerState::Uninitialized | TrackerState::OutputTriggered => {
                self.initialize();
            }
            TrackerState::Initialized => {}
        }
        self.scheduler.clear();
        for index in 0..self.channels.len() {
            self.schedule_now(index);
        }
        self.state = TrackerState::Running;
        debug!("tracker running with {} scheduled channel(s)", self.scheduler.len());
    }

    /// Tick every channel whose fire time has passed and reschedule it.
    /// Returns the number of ticks fired.
    pub fn run_pending(&mut self) -> usize {
        if self.state != TrackerState::Running {
            return 0;
        }
        let due = self.scheduler.pop_due(self.clock.as_ref());
        for tick in &due {
            let Some(channel) = self.channels.get_mut(tick.channel) else {
                continue;
            };
            if let Some(report) = channel.tick() {
                debug!(
                    "channel {} captured {} point(s)",
                    tick.channel, report.captured
                );
            }
            let Some(delay) = channel.interval_delay() else {
                continue;
            };
            match self.clock.elapsed(tick.scale).checked_add(delay) {
                Some(next) => self.scheduler.schedule(tick.channel, tick.scale, next),
                None => warn!(
                    "channel {}: next tick overflows the clock; capture is manual from now on",
                    tick.channel
                ),
            }
        }
        due.len()
    }

    /// Real time until the next scheduled tick, `None` when nothing can fire.
    pub fn next_wakeup(&self) -> Option<Duration> {
        if self.state != TrackerState::Running {
            return None;
        }
        self.scheduler.next_wakeup(self.clock.as_ref())
    }

    /// Serialize every channel and hand it to every sink, once per activation.
    ///
    /// Returns whether this call performed the dispatch.
    pub fn trigger_output(&mut self) -> bool {
        if self.output_triggered {
            debug!("output already triggered for this session");
            return false;
        }
        if self.state == TrackerState::Uninitialized {
            warn!("tracker was never initialized; nothing to output");
            return false;
        }
        self.output_triggered = true;
        self.state = TrackerState::OutputTriggered;
        self.scheduler.clear();
        self.dispatch();
        true
    }

    /// Stop scheduling and flush. Equivalent to [`Tracker::trigger_output`].
    pub fn shutdown(&mut self) -> bool {
        let dispatched = self.trigger_output();
        if dispatched {
            info!("tracker shut down");
        }
        dispatched
    }

    fn dispatch(&self) {
        let named = self.mode == TrackerMode::MultiChannel || self.channels.len() > 1;
        for sink in &self.sinks {
            if !sink.per_channel() {
                let delivered =
                    catch_unwind(AssertUnwindSafe(|| sink.on_output_requested("", None)));
                if delivered.is_err() {
                    error!("{} sink panicked during output", sink.name());
                }
                continue;
            }
            let format = sink.payload_format();
            for channel in &self.channels {
                let payload = channel.serialize(format);
                let name = named.then(|| channel.name());
                let delivered = catch_unwind(AssertUnwindSafe(|| {
                    sink.on_output_requested(&payload, name.as_deref())
                }));
                if delivered.is_err() {
                    error!(
                        "{} sink panicked while handling {}",
                        sink.name(),
                        channel.name()
                    );
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Channel access
    // -----------------------------------------------------------------------

    /// The channel at `index`, clamped into range with a warning.
    ///
    /// Single-channel trackers always resolve to channel 0. Returns `None` only
    /// while no channel exists; [`Tracker::get_channel_mut`] creates one.
    pub fn get_channel(&self, index: usize) -> Option<&Channel> {
        if self.channels.is_empty() {
            return None;
        }
        let resolved = self.resolve_index(index);
        self.channels.get(resolved)
    }

    /// Mutable channel access, clamped like [`Tracker::get_channel`]. Creates
    /// the default channel first if the tracker has none.
    pub fn get_channel_mut(&mut self, index: usize) -> &mut Channel {
        self.ensure_default_channel();
        let resolved = self.resolve_index(index);
        &mut self.channels[resolved]
    }

    /// Strict lookup: out-of-range indexes are an error.
    pub fn try_channel(&self, index: usize) -> Result<&Channel, TrackerError> {
        self.channels
            .get(index)
            .ok_or(TrackerError::ChannelOutOfRange {
                index,
                count: self.channels.len(),
            })
    }

    pub fn try_channel_mut(&mut self, index: usize) -> Result<&mut Channel, TrackerError> {
        let count = self.channels.len();
        self.channels
            .get_mut(index)
            .ok_or(TrackerError::ChannelOutOfRange { index, count })
    }

    fn resolve_index(&self, index: usize) -> usize {
        if self.mode == TrackerMode::SingleChannel && index > 0 {
            warn!("single-channel tracker: channel {index} requested, using channel 0");
            return 0;
        }
        let last = self.channels.len().saturating_sub(1);
        if index > last {
            warn!(
                "channel {index} out of range ({} channel(s)); using channel {last}",
                self.channels.len()
            );
            return last;
        }
        index
    }

    fn ensure_default_channel(&mut self) {
        if self.channels.is_empty() {
            debug!("no channels configured; creating default channel 0");
            self.add_channel(ChannelConfig::default());
        }
    }

    fn schedule_now(&mut self, index: usize) {
        let channel = &self.channels[index];
        if channel.interval_delay().is_none() {
            debug!("channel {index} is manual-only; not scheduled");
            return;
        }
        let scale = channel.time_scale();
        self.scheduler
            .schedule(index, scale, self.clock.elapsed(scale));
    }

    fn host_tags(&mut self, wanted: bool) -> BTreeMap<String, String> {
        if !wanted {
            return BTreeMap::new();
        }
        self.host_info
            .get_or_insert_with(SystemInfo::detect)
            .as_tags()
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if matches!(
            self.state,
            TrackerState::Initialized | TrackerState::Running
        ) {
            self.trigger_output();
        }
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("session_id", &self.session_id)
            .field("channels", &self.channels)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::IntervalConfig;
    use crate::clock::ManualClock;
    use crate::output::PayloadFormat;
    use std::sync::Mutex;

    type Calls = Arc<Mutex<Vec<(String, Option<String>)>>>;

    struct RecordingSink {
        format: PayloadFormat,
        calls: Calls,
    }

    impl OutputModule for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn payload_format(&self) -> PayloadFormat {
            self.format
        }

        fn on_output_requested(&self, payload: &str, channel: Option<&str>) {
            self.calls
                .lock()
                .unwrap()
                .push((payload.to_string(), channel.map(str::to_string)));
        }
    }

    fn recording(format: PayloadFormat) -> (Box<dyn OutputModule>, Calls) {
        let calls: Calls = Arc::default();
        let sink = RecordingSink {
            format,
            calls: calls.clone(),
        };
        (Box::new(sink), calls)
    }

    fn manual_tracker(mode: TrackerMode) -> (Tracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (Tracker::with_clock(mode, clock.clone()), clock)
    }

    #[test]
    fn test_default_channel_created_on_first_use() {
        let (mut tracker, _) = manual_tracker(TrackerMode::MultiChannel);
        assert_eq!(tracker.channel_count(), 0);
        assert!(tracker.get_channel(0).is_none());

        let channel = tracker.get_channel_mut(0);
        assert_eq!(channel.index(), 0);
        assert_eq!(tracker.channel_count(), 1);

        tracker.get_channel_mut(0);
        assert_eq!(tracker.channel_count(), 1);
    }

    #[test]
    fn test_initialize_creates_default_channel_and_session() {
        let (mut tracker, _) = manual_tracker(TrackerMode::SingleChannel);
        let session = tracker.initialize().to_string();
        assert_eq!(session.len(), 32);
        assert!(session.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(tracker.channel_count(), 1);
        assert_eq!(tracker.state(), TrackerState::Initialized);
        assert_eq!(tracker.channels()[0].session_id(), Some(session.as_str()));
    }

    #[test]
    fn test_shutdown_twice_dispatches_once() {
        let (mut tracker, _) = manual_tracker(TrackerMode::SingleChannel);
        let (csv, csv_calls) = recording(PayloadFormat::csv());
        let (lp, lp_calls) = recording(PayloadFormat::LineProtocol);
        tracker.add_sink(csv);
        tracker.add_sink(lp);
        tracker.initialize();

        assert!(tracker.shutdown());
        assert!(!tracker.shutdown());
        drop(tracker);

        assert_eq!(csv_calls.lock().unwrap().len(), 1);
        assert_eq!(lp_calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_drop_flushes_once() {
        let (sink, calls) = recording(PayloadFormat::LineProtocol);
        {
            let (mut tracker, _) = manual_tracker(TrackerMode::SingleChannel);
            tracker.add_sink(sink);
            tracker.start();
        }
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_uninitialized_tracker_does_not_dispatch() {
        let (sink, calls) = recording(PayloadFormat::LineProtocol);
        let (mut tracker, _) = manual_tracker(TrackerMode::SingleChannel);
        tracker.add_sink(sink);
        assert!(!tracker.shutdown());
        drop(tracker);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_run_pending_follows_interval() {
        let (mut tracker, clock) = manual_tracker(TrackerMode::SingleChannel);
        tracker.add_channel(ChannelConfig {
            interval: IntervalConfig::seconds(1.0),
            ..Default::default()
        });
        tracker.initialize();
        tracker
            .get_channel_mut(0)
            .start_tracking_property("x", || 5)
            .unwrap();
        tracker.start();

        // first fire is immediate
        assert_eq!(tracker.run_pending(), 1);
        assert_eq!(tracker.run_pending(), 0);
        assert_eq!(tracker.next_wakeup(), Some(Duration::from_secs(1)));

        clock.advance(Duration::from_millis(500));
        assert_eq!(tracker.run_pending(), 0);
        clock.advance(Duration::from_millis(500));
        assert_eq!(tracker.run_pending(), 1);
        clock.advance(Duration::from_secs(1));
        assert_eq!(tracker.run_pending(), 1);

        assert_eq!(tracker.channels()[0].data_set().len(), 3);
    }

    #[test]
    fn test_manual_channel_is_never_scheduled() {
        let (mut tracker, clock) = manual_tracker(TrackerMode::SingleChannel);
        tracker.add_channel(ChannelConfig {
            interval: IntervalConfig::manual(),
            ..Default::default()
        });
        tracker.start();
        clock.advance(Duration::from_secs(10));
        assert_eq!(tracker.run_pending(), 0);
        assert_eq!(tracker.next_wakeup(), None);
    }

    #[test]
    fn test_paused_channel_stays_scheduled() {
        let (mut tracker, clock) = manual_tracker(TrackerMode::SingleChannel);
        tracker.initialize();
        let channel = tracker.get_channel_mut(0);
        channel.start_tracking_property("x", || 1).unwrap();
        channel.pause();
        tracker.start();

        assert_eq!(tracker.run_pending(), 1);
        assert!(tracker.channels()[0].data_set().is_empty());

        tracker.get_channel_mut(0).unpause();
        clock.advance(Duration::from_secs(1));
        assert_eq!(tracker.run_pending(), 1);
        assert_eq!(tracker.channels()[0].data_set().len(), 1);
    }

    #[test]
    fn test_scaled_channel_freezes_with_time_scale() {
        let (mut tracker, clock) = manual_tracker(TrackerMode::MultiChannel);
        tracker.add_channel(ChannelConfig::default());
        tracker.add_channel(ChannelConfig {
            time_scale: crate::clock::TimeScale::Unscaled,
            ..Default::default()
        });
        tracker.start();
        assert_eq!(tracker.run_pending(), 2);

        clock.set_time_scale(0.0);
        clock.advance(Duration::from_secs(3));
        let fired = tracker.run_pending();
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_channel_index_clamping() {
        let (mut tracker, _) = manual_tracker(TrackerMode::MultiChannel);
        tracker.add_channel(ChannelConfig::default());
        tracker.add_channel(ChannelConfig::default());
        assert_eq!(tracker.get_channel(1).unwrap().index(), 1);
        assert_eq!(tracker.get_channel(7).unwrap().index(), 1);
        assert_eq!(
            tracker.try_channel(7).unwrap_err(),
            TrackerError::ChannelOutOfRange { index: 7, count: 2 }
        );
        assert!(tracker.try_channel_mut(0).is_ok());
    }

    #[test]
    fn test_single_channel_mode_resolves_to_zero() {
        let (mut tracker, _) = manual_tracker(TrackerMode::SingleChannel);
        assert_eq!(tracker.add_channel(ChannelConfig::default()), 0);
        assert_eq!(tracker.add_channel(ChannelConfig::default()), 0);
        assert_eq!(tracker.channel_count(), 1);
        assert_eq!(tracker.get_channel_mut(3).index(), 0);
    }

    #[test]
    fn test_channel_names_passed_in_multi_mode() {
        let (mut tracker, _) = manual_tracker(TrackerMode::MultiChannel);
        let (sink, calls) = recording(PayloadFormat::LineProtocol);
        tracker.add_sink(sink);
        tracker.add_channel(ChannelConfig::default());
        tracker.add_channel(ChannelConfig::default());
        tracker.initialize();
        tracker.shutdown();

        let names: Vec<_> = calls.lock().unwrap().iter().map(|c| c.1.clone()).collect();
        assert_eq!(
            names,
            vec![Some("Channel0".to_string()), Some("Channel1".to_string())]
        );
    }

    #[test]
    fn test_single_channel_dispatch_is_unnamed() {
        let (mut tracker, _) = manual_tracker(TrackerMode::SingleChannel);
        let (sink, calls) = recording(PayloadFormat::csv());
        tracker.add_sink(sink);
        tracker.initialize();
        tracker.get_channel_mut(0).log("m", 1, [("k", "v")]).unwrap();
        tracker.shutdown();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, None);
        assert_eq!(calls[0].0, "0,m,1\n");
    }

    #[test]
    fn test_snapshot_sink_called_once_per_activation() {
        struct Snapshot(Calls);
        impl OutputModule for Snapshot {
            fn name(&self) -> &str {
                "snapshot"
            }
            fn payload_format(&self) -> PayloadFormat {
                PayloadFormat::LineProtocol
            }
            fn per_channel(&self) -> bool {
                false
            }
            fn on_output_requested(&self, payload: &str, channel: Option<&str>) {
                self.0
                    .lock()
                    .unwrap()
                    .push((payload.to_string(), channel.map(str::to_string)));
            }
        }

        let (mut tracker, _) = manual_tracker(TrackerMode::MultiChannel);
        let calls: Calls = Arc::default();
        tracker.add_sink(Box::new(Snapshot(calls.clone())));
        for _ in 0..3 {
            tracker.add_channel(ChannelConfig::default());
        }
        tracker.initialize();
        tracker.get_channel_mut(1).log("m", 1, [("k", "v")]).unwrap();
        tracker.shutdown();

        assert_eq!(*calls.lock().unwrap(), vec![(String::new(), None)]);
    }

    #[test]
    fn test_overflowing_interval_becomes_manual() {
        let (mut tracker, clock) = manual_tracker(TrackerMode::SingleChannel);
        tracker.add_channel(ChannelConfig {
            interval: IntervalConfig::seconds(1.844_674_407_370_955e19),
            ..Default::default()
        });
        tracker.initialize();
        tracker
            .get_channel_mut(0)
            .start_tracking_property("x", || 1)
            .unwrap();
        clock.advance(Duration::from_secs(3600));
        tracker.start();

        assert_eq!(tracker.run_pending(), 1);
        assert_eq!(tracker.next_wakeup(), None);
        clock.advance(Duration::from_secs(60));
        assert_eq!(tracker.run_pending(), 0);
        assert_eq!(tracker.channels()[0].data_set().len(), 1);
    }

    #[test]
    fn test_panicking_sink_does_not_block_others() {
        struct Exploding;
        impl OutputModule for Exploding {
            fn name(&self) -> &str {
                "exploding"
            }
            fn payload_format(&self) -> PayloadFormat {
                PayloadFormat::LineProtocol
            }
            fn on_output_requested(&self, _: &str, _: Option<&str>) {
                panic!("sink failure");
            }
        }

        let (mut tracker, _) = manual_tracker(TrackerMode::SingleChannel);
        let (sink, calls) = recording(PayloadFormat::LineProtocol);
        tracker.add_sink(Box::new(Exploding));
        tracker.add_sink(sink);
        tracker.initialize();
        assert!(tracker.shutdown());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_reinitialize_starts_new_activation() {
        let (mut tracker, _) = manual_tracker(TrackerMode::SingleChannel);
        let (sink, calls) = recording(PayloadFormat::LineProtocol);
        tracker.add_sink(sink);
        let first = tracker.initialize().to_string();
        tracker.get_channel_mut(0).log("m", 1, [("k", "v")]).unwrap();
        tracker.shutdown();

        let second = tracker.initialize().to_string();
        assert_ne!(first, second);
        assert!(tracker.channels()[0].data_set().is_empty());
        assert!(tracker.shutdown());
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_host_tags_use_supplied_info() {
        let (mut tracker, _) = manual_tracker(TrackerMode::SingleChannel);
        tracker.set_host_info(SystemInfo {
            os: "testos".into(),
            arch: "x".into(),
            cpu: "cpu".into(),
            cores: 2,
            ram_mb: None,
            gpu: None,
            vram_mb: None,
        });
        tracker.add_channel(ChannelConfig {
            host_tags: true,
            ..Default::default()
        });
        tracker.initialize();
        tracker.get_channel_mut(0).log("m", 1, [("k", "v")]).unwrap();
        let point = &tracker.channels()[0].data_set().points()[0];
        assert_eq!(point.tags().get("os").unwrap(), "testos");
        assert_eq!(point.tags().get("cpu").unwrap(), "cpu (2 cores)");
        assert!(point.to_line_protocol().contains(",cpu=cpu(2cores),"));
    }
}
