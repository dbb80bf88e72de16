//! Background driver for a shared [`Tracker`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, error};

use crate::tracker::Tracker;

/// Longest single sleep, so a stop request is noticed promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Drives `run_pending` on a background thread until stopped.
///
/// The tracker stays shared behind a mutex, so callers can keep registering
/// properties or logging points while it runs.
pub struct TrackerRunner {
    tracker: Arc<Mutex<Tracker>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TrackerRunner {
    /// Start the tracker (if it is not running yet) and spawn the driver.
    pub fn spawn(tracker: Arc<Mutex<Tracker>>) -> std::io::Result<Self> {
        tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .start();

        let running = Arc::new(AtomicBool::new(true));
        let handle = std::thread::Builder::new()
            .name("proptrack-runner".to_string())
            .spawn({
                let tracker = tracker.clone();
                let running = running.clone();
                move || drive(&tracker, &running)
            })?;

        Ok(Self {
            tracker,
            running,
            handle: Some(handle),
        })
    }

    pub fn tracker(&self) -> &Arc<Mutex<Tracker>> {
        &self.tracker
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the driver thread and wait for it. Does not flush the tracker.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("tracker runner thread panicked");
            }
        }
    }

    /// Stop the driver, then shut the tracker down. Returns whether the
    /// shutdown performed the output dispatch.
    pub fn shutdown(mut self) -> bool {
        self.stop();
        self.tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shutdown()
    }
}

impl Drop for TrackerRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn drive(tracker: &Mutex<Tracker>, running: &AtomicBool) {
    debug!("tracker runner started");
    while running.load(Ordering::SeqCst) {
        let wakeup = {
            let mut tracker = tracker.lock().unwrap_or_else(PoisonError::into_inner);
            tracker.run_pending();
            tracker.next_wakeup()
        };

        // Nothing scheduled (or a frozen clock): poll again after one slice.
        let deadline = Instant::now() + wakeup.unwrap_or(SLEEP_SLICE);
        while running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
    debug!("tracker runner stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelConfig, IntervalConfig};
    use crate::tracker::{TrackerMode, TrackerState};

    #[test]
    fn test_runner_captures_in_background() {
        let mut tracker = Tracker::new(TrackerMode::SingleChannel);
        tracker.add_channel(ChannelConfig {
            interval: IntervalConfig::per_second(100.0),
            ..Default::default()
        });
        tracker.initialize();
        tracker
            .get_channel_mut(0)
            .start_tracking_property("x", || 1)
            .unwrap();

        let shared = Arc::new(Mutex::new(tracker));
        let runner = TrackerRunner::spawn(shared.clone()).unwrap();
        assert!(runner.is_running());
        std::thread::sleep(Duration::from_millis(150));
        assert!(runner.shutdown());

        let tracker = shared.lock().unwrap();
        assert_eq!(tracker.state(), TrackerState::OutputTriggered);
        assert!(tracker.channels()[0].data_set().len() >= 2);
    }

    #[test]
    fn test_stop_leaves_tracker_running_state() {
        let shared = Arc::new(Mutex::new(Tracker::new(TrackerMode::SingleChannel)));
        let mut runner = TrackerRunner::spawn(shared.clone()).unwrap();
        runner.stop();
        assert!(!runner.is_running());
        assert_eq!(shared.lock().unwrap().state(), TrackerState::Running);
    }
}
