//! Time sources for sampling.
//!
//! Channels stamp points and schedule ticks against a [`Clock`]. The clock
//! exposes two elapsed-time domains, mirroring a host that can slow down or
//! pause its own notion of time:
//!
//! - **Scaled** elapsed time advances at `time_scale()` × real time.
//! - **Unscaled** elapsed time always advances at real time.
//!
//! [`SystemClock`] is backed by [`Instant`]; [`ManualClock`] only moves when
//! told to and is what deterministic hosts and tests drive.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Which elapsed-time domain a channel schedules against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScale {
    /// Follows the host's time scale (slows down, speeds up, pauses).
    #[default]
    Scaled,
    /// Real time, regardless of the host's time scale.
    Unscaled,
}

impl std::fmt::Display for TimeScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scaled => write!(f, "scaled"),
            Self::Unscaled => write!(f, "unscaled"),
        }
    }
}

/// Host clock capability consumed by channels and the scheduler.
pub trait Clock: Send + Sync {
    /// Elapsed time since the clock started, in the requested domain.
    fn elapsed(&self, scale: TimeScale) -> Duration;

    /// Current wall-clock time.
    fn wall(&self) -> SystemTime;

    /// Current ratio of scaled to unscaled time. `0.0` means scaled time is frozen.
    fn time_scale(&self) -> f64;
}

#[derive(Debug)]
struct ScaleState {
    factor: f64,
    scaled_base: Duration,
    base_instant: Instant,
}

impl ScaleState {
    fn scaled_at(&self, now: Instant) -> Duration {
        let real = now.saturating_duration_since(self.base_instant);
        self.scaled_base + real.mul_f64(self.factor)
    }
}

/// Real-time clock with an adjustable scale factor for the scaled domain.
#[derive(Debug)]
pub struct SystemClock {
    started: Instant,
    scale: Mutex<ScaleState>,
}

impl SystemClock {
    pub fn new() -> Self {
        let started = Instant::now();
        Self {
            started,
            scale: Mutex::new(ScaleState {
                factor: 1.0,
                scaled_base: Duration::ZERO,
                base_instant: started,
            }),
        }
    }

    /// Change how fast scaled time advances from now on.
    ///
    /// Negative and non-finite factors are treated as `0.0` (frozen).
    pub fn set_time_scale(&self, factor: f64) {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        let now = Instant::now();
        let mut state = self.scale.lock().unwrap_or_else(PoisonError::into_inner);
        state.scaled_base = state.scaled_at(now);
        state.base_instant = now;
        state.factor = factor;
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self, scale: TimeScale) -> Duration {
        let now = Instant::now();
        match scale {
            TimeScale::Unscaled => now.saturating_duration_since(self.started),
            TimeScale::Scaled => self
                .scale
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .scaled_at(now),
        }
    }

    fn wall(&self) -> SystemTime {
        SystemTime::now()
    }

    fn time_scale(&self) -> f64 {
        self.scale
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .factor
    }
}

#[derive(Debug)]
struct ManualState {
    scaled: Duration,
    unscaled: Duration,
    wall: SystemTime,
    factor: f64,
}

/// Clock that only moves when [`ManualClock::advance`] is called.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl ManualClock {
    /// A clock whose wall time starts at the Unix epoch.
    pub fn new() -> Self {
        Self::with_wall(UNIX_EPOCH)
    }

    pub fn with_wall(wall: SystemTime) -> Self {
        Self {
            state: Mutex::new(ManualState {
                scaled: Duration::ZERO,
                unscaled: Duration::ZERO,
                wall,
                factor: 1.0,
            }),
        }
    }

    /// Advance real time by `by`; scaled time advances by `by × time_scale`.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let factor = state.factor;
        state.unscaled += by;
        state.scaled += by.mul_f64(factor);
        state.wall += by;
    }

    pub fn set_time_scale(&self, factor: f64) {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .factor = factor;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn elapsed(&self, scale: TimeScale) -> Duration {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match scale {
            TimeScale::Scaled => state.scaled,
            TimeScale::Unscaled => state.unscaled,
        }
    }

    fn wall(&self) -> SystemTime {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .wall
    }

    fn time_scale(&self) -> f64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .factor
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Format an elapsed duration as `HH:MM:SS.mmm`. Hours do not wrap at 24.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        elapsed.subsec_millis()
    )
}

/// Timestamp used in output file names, e.g. `2026-02-15_01-30-00` (UTC).
pub fn format_file_timestamp(at: SystemTime) -> String {
    let (date, (hour, min, sec)) = utc_parts(at);
    format!(
        "{:04}-{:02}-{:02}_{:02}-{:02}-{:02}",
        date.0, date.1, date.2, hour, min, sec
    )
}

/// Calendar date, e.g. `2026-02-15` (UTC).
pub fn format_date(at: SystemTime) -> String {
    let ((year, month, day), _) = utc_parts(at);
    format!("{year:04}-{month:02}-{day:02}")
}

/// Whole seconds and milliseconds since the Unix epoch; pre-epoch clamps to zero.
pub fn unix_offset(at: SystemTime) -> Duration {
    at.duration_since(UNIX_EPOCH).unwrap_or_default()
}

type Date = (i64, u32, u32);
type TimeOfDay = (u64, u64, u64);

fn utc_parts(at: SystemTime) -> (Date, TimeOfDay) {
    let secs = unix_offset(at).as_secs();
    let time = ((secs / 3600) % 24, (secs / 60) % 60, secs % 60);
    (civil_from_days((secs / 86_400) as i64), time)
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> Date {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
