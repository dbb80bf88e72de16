//! Integration tests for proptrack-core.
//!
//! These tests drive the full pipeline with a manual clock:
//! registration → scheduled capture → shutdown → sink files on disk.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use proptrack_core::{
    ChannelConfig, CsvFileWriter, FileTarget, IntervalConfig, LineProtocolFileWriter, LiveObject,
    ManualClock, SESSION_TAG, TimeFormat, Tracker, TrackerConfig, TrackerMode,
};

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn three_ticks_capture_six_points_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new());
    let mut tracker = Tracker::with_clock(TrackerMode::SingleChannel, clock.clone());
    tracker.add_channel(ChannelConfig {
        interval: IntervalConfig::seconds(1.0),
        ..Default::default()
    });
    tracker.add_sink(Box::new(
        CsvFileWriter::new(FileTarget::new(tmp.path())).with_clock(clock.clone()),
    ));
    tracker.initialize();

    let channel = tracker.get_channel_mut(0);
    channel.start_tracking_property("x", || "5").unwrap();
    channel.start_tracking_property("y", || "hello,world").unwrap();

    tracker.start();
    for _ in 0..3 {
        assert_eq!(tracker.run_pending(), 1);
        clock.advance(Duration::from_secs(1));
    }

    let data = tracker.channels()[0].data_set();
    assert_eq!(data.len(), 6);
    let order: Vec<&str> = data.points().iter().map(|p| p.measurement()).collect();
    assert_eq!(order, vec!["x", "y", "x", "y", "x", "y"]);

    assert!(tracker.shutdown());
    let files = files_in(tmp.path());
    assert_eq!(files, vec!["Log_1970-01-01_00-00-03.csv".to_string()]);

    let csv = std::fs::read_to_string(tmp.path().join(&files[0])).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0], "0,x,5");
    assert_eq!(rows[1], "0,y,hello.world");
    assert_eq!(rows[5], "2000,y,hello.world");
}

#[test]
fn destroyed_live_target_is_pruned_and_survivor_continues() {
    let clock = Arc::new(ManualClock::new());
    let mut tracker = Tracker::with_clock(TrackerMode::SingleChannel, clock.clone());
    tracker.initialize();

    let player = Arc::new(LiveObject::new());
    player.set("hp", 100);
    let enemy = Arc::new(LiveObject::new());
    enemy.set("hp", 40);

    let channel = tracker.get_channel_mut(0);
    channel.track_live_property("player.hp", &player, "hp").unwrap();
    channel.track_live_property("enemy.hp", &enemy, "hp").unwrap();

    tracker.start();
    tracker.run_pending();
    assert_eq!(tracker.channels()[0].data_set().len(), 2);

    drop(enemy);
    player.set("hp", 90);
    clock.advance(Duration::from_secs(1));
    tracker.run_pending();
    clock.advance(Duration::from_secs(1));
    tracker.run_pending();

    let channel = &tracker.channels()[0];
    assert_eq!(channel.source_names(), vec!["player.hp"]);
    let enemy_points = channel
        .data_set()
        .points()
        .iter()
        .filter(|p| p.measurement() == "enemy.hp")
        .count();
    assert_eq!(enemy_points, 1);
    let player_values: Vec<&str> = channel
        .data_set()
        .points()
        .iter()
        .filter(|p| p.measurement() == "player.hp")
        .map(|p| p.value())
        .collect();
    assert_eq!(player_values, vec!["100", "90", "90"]);
}

#[test]
fn tracker_without_channels_creates_exactly_one() {
    let mut tracker = Tracker::new(TrackerMode::MultiChannel);
    assert_eq!(tracker.channel_count(), 0);
    tracker.initialize();
    assert_eq!(tracker.channel_count(), 1);
    assert_eq!(tracker.get_channel(0).unwrap().index(), 0);
    tracker.get_channel_mut(5);
    assert_eq!(tracker.channel_count(), 1);
}

#[test]
fn double_shutdown_writes_each_sink_once() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new());
    let mut tracker = Tracker::with_clock(TrackerMode::SingleChannel, clock.clone());
    tracker.add_sink(Box::new(
        CsvFileWriter::new(FileTarget::new(tmp.path().join("csv"))).with_clock(clock.clone()),
    ));
    tracker.add_sink(Box::new(
        LineProtocolFileWriter::new(FileTarget::new(tmp.path().join("lp")))
            .with_clock(clock.clone()),
    ));
    tracker.initialize();
    tracker.get_channel_mut(0).log("jump", 1, [("level", "2")]).unwrap();

    assert!(tracker.shutdown());
    clock.advance(Duration::from_secs(5));
    assert!(!tracker.shutdown());
    drop(tracker);

    assert_eq!(files_in(&tmp.path().join("csv")).len(), 1);
    assert_eq!(files_in(&tmp.path().join("lp")).len(), 1);
}

#[test]
fn multi_channel_config_writes_one_file_per_channel() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().display().to_string().replace('\\', "/");
    let raw = format!(
        r#"{{
            "mode": "multi_channel",
            "channels": [
                {{ "interval": {{ "unit": "per_second", "value": 2 }} }},
                {{ "interval": {{ "unit": "seconds", "value": 0 }}, "time_format": "elapsed" }}
            ],
            "outputs": [
                {{ "type": "line_protocol", "directory": "{dir}", "prefix": "Run_" }},
                {{ "type": "csv", "directory": "{dir}", "prefix": "Run_", "header": true }}
            ]
        }}"#
    );
    let config = TrackerConfig::parse(&raw).unwrap();
    let clock = Arc::new(ManualClock::new());
    let mut tracker = Tracker::from_config_with_clock(&config, clock.clone()).unwrap();
    let session = tracker.initialize().to_string();

    tracker
        .get_channel_mut(0)
        .start_tracking_property("fps", || 59.5)
        .unwrap();
    tracker
        .get_channel_mut(1)
        .start_tracking_property("scene", || "main menu")
        .unwrap();

    tracker.start();
    tracker.run_pending();
    clock.advance(Duration::from_millis(500));
    tracker.run_pending();
    tracker.get_channel_mut(1).log_all_tracked_properties().unwrap();

    assert_eq!(tracker.channels()[0].data_set().len(), 2);
    assert_eq!(tracker.channels()[1].data_set().len(), 1);
    for channel in tracker.channels() {
        for point in channel.data_set().points() {
            assert_eq!(point.tags().get(SESSION_TAG), Some(&session));
        }
    }
    assert_eq!(tracker.channels()[1].config().time_format, TimeFormat::Elapsed);

    tracker.shutdown();
    assert_eq!(
        files_in(tmp.path()),
        vec![
            "Run_1970-01-01_00-00-00_Channel0.csv".to_string(),
            "Run_1970-01-01_00-00-00_Channel0.txt".to_string(),
            "Run_1970-01-01_00-00-00_Channel1.csv".to_string(),
            "Run_1970-01-01_00-00-00_Channel1.txt".to_string(),
        ]
    );

    let lp = std::fs::read_to_string(tmp.path().join("Run_1970-01-01_00-00-00_Channel1.txt"))
        .unwrap();
    assert_eq!(
        lp,
        format!(
            "scene,capture_date=1970-01-01,session_id={session} value=\"mainmenu\" 00:00:00.500\n"
        )
    );

    let csv = std::fs::read_to_string(tmp.path().join("Run_1970-01-01_00-00-00_Channel0.csv"))
        .unwrap();
    assert_eq!(csv, "time,measurement,value\n0,fps,59.5\n500,fps,59.5\n");
}

#[test]
fn system_info_snapshot_does_not_overwrite_line_protocol_file() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().display().to_string().replace('\\', "/");
    let raw = format!(
        r#"{{
            "mode": "multi_channel",
            "channels": [{{}}, {{}}],
            "outputs": [
                {{ "type": "line_protocol", "directory": "{dir}" }},
                {{ "type": "system_info", "directory": "{dir}" }}
            ]
        }}"#
    );
    let config = TrackerConfig::parse(&raw).unwrap();
    let clock = Arc::new(ManualClock::new());
    let mut tracker = Tracker::from_config_with_clock(&config, clock).unwrap();
    tracker.initialize();
    tracker
        .get_channel_mut(0)
        .log("fps", 60, [("scene", "menu")])
        .unwrap();
    tracker
        .get_channel_mut(1)
        .log("draw_calls", 1200, [("scene", "menu")])
        .unwrap();
    assert!(tracker.shutdown());

    assert_eq!(
        files_in(tmp.path()),
        vec![
            "Log_1970-01-01_00-00-00_Channel0.txt".to_string(),
            "Log_1970-01-01_00-00-00_Channel1.txt".to_string(),
            "Log_1970-01-01_00-00-00_SystemInfo.txt".to_string(),
        ]
    );
    let body = std::fs::read_to_string(tmp.path().join("Log_1970-01-01_00-00-00_Channel0.txt"))
        .unwrap();
    assert!(body.starts_with("fps,"), "{body}");
    let snapshot =
        std::fs::read_to_string(tmp.path().join("Log_1970-01-01_00-00-00_SystemInfo.txt"))
            .unwrap();
    assert!(snapshot.starts_with("Operating System: "), "{snapshot}");
}

#[test]
fn serialization_does_not_consume_buffer() {
    let mut tracker = Tracker::with_clock(TrackerMode::SingleChannel, Arc::new(ManualClock::new()));
    tracker.initialize();
    let channel = tracker.get_channel_mut(0);
    channel.start_tracking_property("v", || 1).unwrap();
    channel.log_all_tracked_properties().unwrap();

    let format = proptrack_core::PayloadFormat::LineProtocol;
    let first = channel.serialize(format);
    let second = channel.serialize(format);
    assert_eq!(first, second);
    assert_eq!(channel.data_set().len(), 1);

    channel.reset_data();
    assert!(channel.data_set().is_empty());
}
