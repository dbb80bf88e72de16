//! `proptrack record`: sample built-in host gauges until stopped.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use proptrack_core::{
    ChannelConfig, FileTarget, IntervalConfig, OutputConfig, Tracker, TrackerConfig, TrackerMode,
    host,
};

use super::parse_duration;

/// Longest single sleep between scheduler polls.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

pub struct RecordCommandConfig<'a> {
    pub config_path: Option<&'a str>,
    pub interval: &'a str,
    pub duration: Option<&'a str>,
    pub output_dir: &'a str,
    pub format: &'a str,
    pub prefix: &'a str,
    pub host_tags: bool,
    pub system_info: bool,
}

/// Run the record command.
pub fn run(cmd: RecordCommandConfig<'_>) {
    let max_duration = cmd.duration.map(|d| {
        parse_duration(d).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        })
    });

    let config = match cmd.config_path {
        Some(path) => TrackerConfig::load(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Error loading {path}: {e}");
            std::process::exit(1);
        }),
        None => config_from_flags(&cmd).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }),
    };

    let mut tracker = Tracker::from_config(&config).unwrap_or_else(|e| {
        eprintln!("Error building tracker: {e}");
        std::process::exit(1);
    });
    let session = tracker.initialize().to_string();
    register_gauges(&mut tracker);

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: could not install Ctrl+C handler: {e}");
    }

    println!("Recording session {session}");
    println!("  Channels:  {}", tracker.channel_count());
    for channel in tracker.channels() {
        let interval = channel
            .interval_delay()
            .map_or_else(|| "manual".to_string(), |d| format!("{}ms", d.as_millis()));
        println!(
            "    {}  every {interval}  [{}]",
            channel.name(),
            channel.source_names().join(", ")
        );
    }
    println!("  Outputs:   {}", describe_outputs(&config.outputs));
    match max_duration {
        Some(d) => println!("  Duration:  {:.1}s", d.as_secs_f64()),
        None => println!("  Duration:  until Ctrl+C"),
    }
    println!();

    tracker.start();
    let start = Instant::now();
    while running.load(Ordering::SeqCst) {
        if max_duration.is_some_and(|max| start.elapsed() >= max) {
            break;
        }

        tracker.run_pending();

        let points: usize = tracker.channels().iter().map(|c| c.data_set().len()).sum();
        print!(
            "\r  Points: {points:<8} Elapsed: {:.1}s",
            start.elapsed().as_secs_f64()
        );
        let _ = std::io::Write::flush(&mut std::io::stdout());

        let mut wait = tracker.next_wakeup().unwrap_or(SLEEP_SLICE);
        if let Some(max) = max_duration {
            wait = wait.min(max.saturating_sub(start.elapsed()));
        }
        let deadline = Instant::now() + wait;
        while Instant::now() < deadline && running.load(Ordering::SeqCst) {
            std::thread::sleep(SLEEP_SLICE.min(deadline.saturating_duration_since(Instant::now())));
        }
    }

    println!();
    println!();
    tracker.shutdown();
    println!("Session {session} written.");
}

fn config_from_flags(cmd: &RecordCommandConfig<'_>) -> Result<TrackerConfig, String> {
    let interval = parse_duration(cmd.interval)?;
    let target = FileTarget {
        prefix: cmd.prefix.to_string(),
        ..FileTarget::new(cmd.output_dir)
    };

    let mut outputs = Vec::new();
    if matches!(cmd.format, "csv" | "both") {
        outputs.push(OutputConfig::Csv {
            target: target.clone(),
            delimiter: proptrack_core::DEFAULT_DELIMITER,
            replacement: proptrack_core::DEFAULT_DELIMITER_REPLACEMENT,
            header: true,
        });
    }
    if matches!(cmd.format, "line-protocol" | "both") {
        outputs.push(OutputConfig::LineProtocol {
            target: target.clone(),
        });
    }
    if cmd.system_info {
        outputs.push(OutputConfig::SystemInfo { target });
    }

    let config = TrackerConfig {
        mode: TrackerMode::SingleChannel,
        channels: vec![ChannelConfig {
            interval: IntervalConfig::seconds(interval.as_secs_f64()),
            host_tags: cmd.host_tags,
            ..Default::default()
        }],
        outputs,
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Track the host gauges. With several channels, memory gauges go on channel 1.
fn register_gauges(tracker: &mut Tracker) {
    let memory_channel = usize::from(tracker.channel_count() > 1);

    let load = tracker.get_channel_mut(0);
    for (name, slot) in [("load_1m", 0usize), ("load_5m", 1), ("load_15m", 2)] {
        if let Err(e) = load.start_tracking_property(name, move || {
            host::load_average().map_or(0.0, |l| l[slot])
        }) {
            log::warn!("gauge {name} not registered: {e}");
        }
    }
    if let Err(e) = load.start_tracking_property("uptime_s", || {
        host::uptime_seconds().unwrap_or_default()
    }) {
        log::warn!("gauge uptime_s not registered: {e}");
    }

    let memory = tracker.get_channel_mut(memory_channel);
    if let Err(e) = memory.start_tracking_property("mem_available_mb", || {
        host::available_memory_bytes().unwrap_or_default() / (1024 * 1024)
    }) {
        log::warn!("gauge mem_available_mb not registered: {e}");
    }
    if let Err(e) = memory.start_tracking_property("rss_kb", || {
        host::process_rss_bytes().unwrap_or_default() / 1024
    }) {
        log::warn!("gauge rss_kb not registered: {e}");
    }
}

fn describe_outputs(outputs: &[OutputConfig]) -> String {
    if outputs.is_empty() {
        return "none".to_string();
    }
    outputs
        .iter()
        .map(|o| match o {
            OutputConfig::Csv { target, .. } => format!("csv → {}", target.directory.display()),
            OutputConfig::LineProtocol { target } => {
                format!("line protocol → {}", target.directory.display())
            }
            OutputConfig::Http(upload) => format!("http → {} ({})", upload.url, upload.bucket),
            OutputConfig::SystemInfo { target } => {
                format!("system info → {}", target.directory.display())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(format: &'static str) -> RecordCommandConfig<'static> {
        RecordCommandConfig {
            config_path: None,
            interval: "250ms",
            duration: None,
            output_dir: "out",
            format,
            prefix: "Run_",
            host_tags: false,
            system_info: true,
        }
    }

    #[test]
    fn test_config_from_flags() {
        let config = config_from_flags(&flags("both")).unwrap();
        assert_eq!(config.channels.len(), 1);
        assert_eq!(
            config.channels[0].interval.delay(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(config.outputs.len(), 3);
        assert!(matches!(config.outputs[0], OutputConfig::Csv { header: true, .. }));
        assert!(matches!(config.outputs[1], OutputConfig::LineProtocol { .. }));
        match &config.outputs[2] {
            OutputConfig::SystemInfo { target } => assert_eq!(target.prefix, "Run_"),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn test_config_from_flags_single_format() {
        let config = config_from_flags(&flags("csv")).unwrap();
        assert_eq!(config.outputs.len(), 2);
        let config = config_from_flags(&RecordCommandConfig {
            interval: "later",
            ..flags("csv")
        });
        assert!(config.is_err());
    }

    #[test]
    fn test_gauges_split_across_channels() {
        let mut tracker = Tracker::new(TrackerMode::MultiChannel);
        tracker.add_channel(ChannelConfig::default());
        tracker.add_channel(ChannelConfig::default());
        tracker.initialize();
        register_gauges(&mut tracker);
        assert_eq!(
            tracker.channels()[0].source_names(),
            vec!["load_1m", "load_5m", "load_15m", "uptime_s"]
        );
        assert_eq!(
            tracker.channels()[1].source_names(),
            vec!["mem_available_mb", "rss_kb"]
        );
    }

    #[test]
    fn test_describe_outputs() {
        assert_eq!(describe_outputs(&[]), "none");
        let config = config_from_flags(&flags("line-protocol")).unwrap();
        assert_eq!(
            describe_outputs(&config.outputs),
            "line protocol → out, system info → out"
        );
    }
}
