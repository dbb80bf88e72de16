//! Single-queue scheduler for channel ticks.
//!
//! Channels are kept in min-heaps keyed by their next fire time, one heap per
//! [`TimeScale`] because scaled and unscaled deadlines are not comparable.
//! The driver pops whatever is due, ticks it, and reschedules it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::clock::{Clock, TimeScale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due: Duration,
    channel: usize,
}

/// A channel whose fire time has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTick {
    pub channel: usize,
    pub scale: TimeScale,
    pub due: Duration,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    scaled: BinaryHeap<Reverse<Entry>>,
    unscaled: BinaryHeap<Reverse<Entry>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `channel` to fire once `scale`-domain elapsed time reaches `due`.
    pub fn schedule(&mut self, channel: usize, scale: TimeScale, due: Duration) {
        self.heap_mut(scale).push(Reverse(Entry { due, channel }));
    }

    /// Remove and return every entry that is due, earliest first per domain.
    pub fn pop_due(&mut self, clock: &dyn Clock) -> Vec<DueTick> {
        let mut due = Vec::new();
        for scale in [TimeScale::Unscaled, TimeScale::Scaled] {
            let now = clock.elapsed(scale);
            let heap = self.heap_mut(scale);
            while heap.peek().is_some_and(|Reverse(e)| e.due <= now) {
                if let Some(Reverse(entry)) = heap.pop() {
                    due.push(DueTick {
                        channel: entry.channel,
                        scale,
                        due: entry.due,
                    });
                }
            }
        }
        due
    }

    /// Real time until the earliest entry is due.
    ///
    /// Scaled deadlines are converted with the clock's current time scale; a
    /// frozen scaled clock contributes nothing. `None` means nothing can fire.
    pub fn next_wakeup(&self, clock: &dyn Clock) -> Option<Duration> {
        let unscaled = self
            .unscaled
            .peek()
            .map(|Reverse(e)| e.due.saturating_sub(clock.elapsed(TimeScale::Unscaled)));

        let factor = clock.time_scale();
        let scaled = self.scaled.peek().and_then(|Reverse(e)| {
            let remaining = e.due.saturating_sub(clock.elapsed(TimeScale::Scaled));
            if remaining.is_zero() {
                Some(Duration::ZERO)
            } else if factor > 0.0 {
                Duration::try_from_secs_f64(remaining.as_secs_f64() / factor).ok()
            } else {
                None
            }
        });

        match (unscaled, scaled) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn len(&self) -> usize {
        self.scaled.len() + self.unscaled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.scaled.clear();
        self.unscaled.clear();
    }

    fn heap_mut(&mut self, scale: TimeScale) -> &mut BinaryHeap<Reverse<Entry>> {
        match scale {
            TimeScale::Scaled => &mut self.scaled,
            TimeScale::Unscaled => &mut self.unscaled,
        }
    }
}
