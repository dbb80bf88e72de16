//! Two channels driven by a background runner, flushed to CSV and line-protocol
//! files under `./proptrack-demo`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptrack_core::{
    ChannelConfig, CsvFileWriter, FileTarget, IntervalConfig, LineProtocolFileWriter, LiveObject,
    Tracker, TrackerMode, TrackerRunner, host,
};

fn main() {
    let mut tracker = Tracker::new(TrackerMode::MultiChannel);
    let fast = tracker.add_channel(ChannelConfig {
        interval: IntervalConfig::per_second(10.0),
        ..Default::default()
    });
    let slow = tracker.add_channel(ChannelConfig {
        interval: IntervalConfig::seconds(0.5),
        host_tags: true,
        ..Default::default()
    });
    tracker.add_sink(Box::new(
        CsvFileWriter::new(FileTarget::new("proptrack-demo")).with_header(true),
    ));
    tracker.add_sink(Box::new(LineProtocolFileWriter::new(FileTarget::new(
        "proptrack-demo",
    ))));
    tracker.initialize();

    let player = Arc::new(LiveObject::new());
    player.set("hp", 100);
    tracker
        .get_channel_mut(fast)
        .track_live_property("player.hp", &player, "hp")
        .unwrap();
    tracker
        .get_channel_mut(slow)
        .start_tracking_property("load_1m", || {
            host::load_average().map_or(0.0, |l| l[0])
        })
        .unwrap();

    let shared = Arc::new(Mutex::new(tracker));
    let runner = TrackerRunner::spawn(shared.clone()).unwrap();
    for hp in (0..100).step_by(10).rev() {
        std::thread::sleep(Duration::from_millis(100));
        player.set("hp", hp);
    }
    runner.shutdown();

    let tracker = shared.lock().unwrap();
    for channel in tracker.channels() {
        println!("{}: {} points", channel.name(), channel.data_set().len());
    }
}
