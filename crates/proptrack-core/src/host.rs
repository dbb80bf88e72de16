//! Best-effort host capability detection and live host gauges.
//!
//! Everything here is read from user space without elevated privileges.
//! Values that cannot be observed are left as `None` and rendered as
//! `unknown` rather than guessed.

use std::collections::BTreeMap;
#[cfg(target_os = "linux")]
use std::path::Path;

use serde::{Deserialize, Serialize};


/// Static snapshot of host capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu: String,
    pub cores: usize,
    pub ram_mb: Option<u64>,
    pub gpu: Option<String>,
    pub vram_mb: Option<u64>,
}

impl SystemInfo {
    /// Detect the current host.
    pub fn detect() -> Self {
        let os = match os_version() {
            Some(v) => format!("{} {}", std::env::consts::OS, v),
            None => std::env::consts::OS.to_string(),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let (gpu, vram_mb) = detect_gpu();

        Self {
            os,
            arch: std::env::consts::ARCH.to_string(),
            cpu: detect_cpu().unwrap_or_else(|| "unknown".to_string()),
            cores,
            ram_mb: total_memory_bytes().map(|b| b / (1024 * 1024)),
            gpu,
            vram_mb,
        }
    }

    /// Human-readable snapshot, one capability per line.
    pub fn to_text(&self) -> String {
        format!(
            "Operating System: {}\nArchitecture: {}\nCPU: {} ({} cores)\nRAM: {}\nGPU: {}\nVRAM: {}\n",
            self.os,
            self.arch,
            self.cpu,
            self.cores,
            fmt_mb(self.ram_mb),
            self.gpu.as_deref().unwrap_or("unknown"),
            fmt_mb(self.vram_mb),
        )
    }

    /// Capabilities as tags. Values are raw; the line-protocol serializer
    /// sanitizes them.
    pub fn as_tags(&self) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert("os".to_string(), self.os.clone());
        tags.insert(
            "cpu".to_string(),
            format!("{} ({} cores)", self.cpu, self.cores),
        );
        tags.insert("ram".to_string(), fmt_mb(self.ram_mb));
        tags.insert(
            "gpu".to_string(),
            self.gpu.as_deref().unwrap_or("unknown").to_string(),
        );
        tags.insert("vram".to_string(), fmt_mb(self.vram_mb));
        tags
    }
}

fn fmt_mb(mb: Option<u64>) -> String {
    mb.map_or_else(|| "unknown".to_string(), |v| format!("{v}MB"))
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

#[cfg(target_os = "macos")]
fn sysctl(key: &str) -> Option<String> {
    let output = std::process::Command::new("sysctl")
        .arg("-n")
        .arg(key)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let s = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if s.is_empty() { None } else { Some(s) }
}

fn os_version() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()?;
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
    #[cfg(target_os = "linux")]
    {
        let release = std::fs::read_to_string("/etc/os-release").ok()?;
        release
            .lines()
            .find_map(|l| l.strip_prefix("PRETTY_NAME="))
            .map(|v| v.trim_matches('"').to_string())
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn detect_cpu() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        sysctl("machdep.cpu.brand_string")
    }
    #[cfg(target_os = "linux")]
    {
        let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        cpuinfo
            .lines()
            .find(|l| l.starts_with("model name"))
            .and_then(|l| l.split_once(':'))
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn total_memory_bytes() -> Option<u64> {
    #[cfg(target_os = "macos")]
    {
        sysctl("hw.memsize").and_then(|s| s.parse().ok())
    }
    #[cfg(target_os = "linux")]
    {
        meminfo_kib("MemTotal").map(|kib| kib * 1024)
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

#[cfg(target_os = "linux")]
fn meminfo_kib(key: &str) -> Option<u64> {
    let raw = std::fs::read_to_string("/proc/meminfo").ok()?;
    raw.lines().find_map(|line| {
        let (k, rest) = line.split_once(':')?;
        if k != key {
            return None;
        }
        rest.split_whitespace().next()?.parse().ok()
    })
}

#[cfg(target_os = "linux")]
fn read_trimmed(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let v = raw.trim();
    if v.is_empty() { None } else { Some(v.to_string()) }
}

/// GPU name and dedicated memory, from the NVIDIA proc interface or DRM sysfs.
fn detect_gpu() -> (Option<String>, Option<u64>) {
    #[cfg(target_os = "linux")]
    {
        if let Ok(entries) = std::fs::read_dir("/proc/driver/nvidia/gpus") {
            for entry in entries.flatten() {
                let info = read_trimmed(&entry.path().join("information")).unwrap_or_default();
                let model = info.lines().find_map(|l| {
                    l.strip_prefix("Model:").map(|m| m.trim().to_string())
                });
                if model.is_some() {
                    return (model, None);
                }
            }
        }

        let Ok(cards) = std::fs::read_dir("/sys/class/drm") else {
            return (None, None);
        };
        let mut names: Vec<_> = cards
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("card") && !n.contains('-'))
            .collect();
        names.sort();
        for name in names {
            let device = Path::new("/sys/class/drm").join(&name).join("device");
            let Some(vendor) = read_trimmed(&device.join("vendor")) else {
                continue;
            };
            let vendor_name = match vendor.as_str() {
                "0x10de" => "NVIDIA",
                "0x1002" => "AMD",
                "0x8086" => "Intel",
                other => other,
            };
            let model = read_trimmed(&device.join("device"))
                .map_or_else(|| vendor_name.to_string(), |d| format!("{vendor_name} {d}"));
            let vram = read_trimmed(&device.join("mem_info_vram_total"))
                .and_then(|v| v.parse::<u64>().ok())
                .map(|b| b / (1024 * 1024));
            return (Some(model), vram);
        }
        (None, None)
    }
    #[cfg(target_os = "macos")]
    {
        (sysctl("machdep.cpu.brand_string").filter(|c| c.contains("Apple")), None)
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        (None, None)
    }
}

// ---------------------------------------------------------------------------
// Live gauges
// ---------------------------------------------------------------------------

/// 1, 5 and 15 minute load averages.
pub fn load_average() -> Option<[f64; 3]> {
    #[cfg(unix)]
    {
        let mut values = [0.0_f64; 3];
        // SAFETY: `getloadavg` writes at most 3 doubles into a buffer of 3.
        let n = unsafe { libc::getloadavg(values.as_mut_ptr(), 3) };
        if n < 3 { None } else { Some(values) }
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Seconds since boot.
pub fn uptime_seconds() -> Option<f64> {
    #[cfg(target_os = "linux")]
    {
        read_trimmed(Path::new("/proc/uptime"))?
            .split_whitespace()
            .next()?
            .parse()
            .ok()
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Memory available to new processes, in bytes.
pub fn available_memory_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        meminfo_kib("MemAvailable").map(|kib| kib * 1024)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Resident set size of this process, in bytes.
pub fn process_rss_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        status
            .lines()
            .find_map(|l| l.strip_prefix("VmRSS:"))
            .and_then(|v| v.split_whitespace().next())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|kib| kib * 1024)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
