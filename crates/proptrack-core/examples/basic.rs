//! Track two properties at 4 Hz for two seconds and print the line protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use proptrack_core::{
    ChannelConfig, IntervalConfig, PayloadFormat, TimeFormat, Tracker, TrackerMode,
};

fn main() {
    let mut tracker = Tracker::new(TrackerMode::SingleChannel);
    tracker.add_channel(ChannelConfig {
        interval: IntervalConfig::per_second(4.0),
        time_format: TimeFormat::Elapsed,
        ..Default::default()
    });
    let session = tracker.initialize().to_string();
    println!("session {session}");

    let frames = Arc::new(AtomicU64::new(0));
    let started = Instant::now();
    {
        let channel = tracker.get_channel_mut(0);
        let f = frames.clone();
        channel
            .start_tracking_property("frames", move || f.load(Ordering::Relaxed))
            .unwrap();
        channel
            .start_tracking_property("uptime_s", move || started.elapsed().as_secs_f64())
            .unwrap();
    }

    tracker.start();
    while started.elapsed() < Duration::from_secs(2) {
        frames.fetch_add(1, Ordering::Relaxed);
        tracker.run_pending();
        std::thread::sleep(Duration::from_millis(16));
    }

    let channel = tracker.get_channel(0).unwrap();
    print!("{}", channel.serialize(PayloadFormat::LineProtocol));
    println!("{} points", channel.data_set().len());
}
