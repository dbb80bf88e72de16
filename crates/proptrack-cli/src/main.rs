//! CLI for proptrack: sample host gauges and ship them as CSV or line protocol.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "proptrack")]
#[command(about = "proptrack: sample named properties on independent channels")]
#[command(version = proptrack_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record built-in host gauges (load, memory, uptime) until the duration
    /// elapses or Ctrl+C, then write every configured output once.
    Record {
        /// Tracker config JSON (channels and outputs). Flags below are ignored
        /// for anything the file configures.
        #[arg(long)]
        config: Option<String>,

        /// Sampling interval, e.g. "250ms", "1s", "2m"
        #[arg(long, default_value = "1s")]
        interval: String,

        /// Stop after this long (e.g. "30s", "5m"); default: until Ctrl+C
        #[arg(long)]
        duration: Option<String>,

        /// Output directory for file outputs
        #[arg(long, default_value = "logs")]
        output: String,

        /// File output format when no config file is given
        #[arg(long, default_value = "both", value_parser = ["csv", "line-protocol", "both"])]
        format: String,

        /// File name prefix
        #[arg(long, default_value = "Log_")]
        prefix: String,

        /// Stamp host-capability tags (os, cpu, ram, gpu, vram) on every point
        #[arg(long)]
        host_tags: bool,

        /// Also write a host capability snapshot
        #[arg(long)]
        system_info: bool,
    },

    /// Print the detected host capabilities
    Sysinfo {
        /// Print as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Check that an upload target is reachable and the bucket exists
    CheckUpload {
        /// Server base URL
        #[arg(long, default_value = "http://localhost:8086")]
        url: String,

        #[arg(long)]
        org: String,

        #[arg(long)]
        bucket: String,

        /// API token (falls back to $PROPTRACK_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Request timeout in seconds
        #[arg(long, default_value = "10")]
        timeout: u64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Record {
            config,
            interval,
            duration,
            output,
            format,
            prefix,
            host_tags,
            system_info,
        } => commands::record::run(commands::record::RecordCommandConfig {
            config_path: config.as_deref(),
            interval: &interval,
            duration: duration.as_deref(),
            output_dir: &output,
            format: &format,
            prefix: &prefix,
            host_tags,
            system_info,
        }),
        Commands::Sysinfo { json } => commands::sysinfo::run(json),
        Commands::CheckUpload {
            url,
            org,
            bucket,
            token,
            timeout,
        } => commands::check_upload::run(&url, &org, &bucket, token.as_deref(), timeout),
    }
}
