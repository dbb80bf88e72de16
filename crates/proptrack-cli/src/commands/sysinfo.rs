//! `proptrack sysinfo`: print detected host capabilities and live gauges.

use proptrack_core::{SystemInfo, host};

use super::format_bytes;

pub fn run(json: bool) {
    let info = SystemInfo::detect();

    if json {
        match serde_json::to_string_pretty(&info) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error serializing system info: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    print!("{}", info.to_text());
    println!();
    if let Some([one, five, fifteen]) = host::load_average() {
        println!("Load average: {one:.2} {five:.2} {fifteen:.2}");
    }
    if let Some(uptime) = host::uptime_seconds() {
        println!("Uptime: {:.1}h", uptime / 3600.0);
    }
    if let Some(available) = host::available_memory_bytes() {
        println!("Available memory: {}", format_bytes(available));
    }
    println!();
    println!("Host tags:");
    for (key, value) in info.as_tags() {
        println!("  {key}={value}");
    }
}
