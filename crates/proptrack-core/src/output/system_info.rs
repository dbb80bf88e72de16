//! Host capability snapshot sink.

use std::sync::Arc;

use super::file::{FileTarget, save_file};
use super::{OutputModule, PayloadFormat};
use crate::clock::{Clock, SystemClock, format_file_timestamp};
use crate::host::SystemInfo;

/// Suffix given to snapshot files whose target leaves `suffix` empty, so they
/// never share a name with line-protocol files in the same directory.
pub const SYSTEM_INFO_SUFFIX: &str = "_SystemInfo";

/// Writes one text snapshot of the host's capabilities per activation.
/// The tracked payload itself is ignored.
pub struct SystemInfoSnapshotWriter {
    target: FileTarget,
    info: SystemInfo,
    clock: Arc<dyn Clock>,
}

impl SystemInfoSnapshotWriter {
    /// Detects the host once, at construction.
    pub fn new(target: FileTarget) -> Self {
        Self::with_info(target, SystemInfo::detect())
    }

    pub fn with_info(mut target: FileTarget, info: SystemInfo) -> Self {
        if target.suffix.is_empty() {
            target.suffix = SYSTEM_INFO_SUFFIX.to_string();
        }
        Self {
            target,
            info,
            clock: Arc::new(SystemClock::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn info(&self) -> &SystemInfo {
        &self.info
    }

    pub fn target(&self) -> &FileTarget {
        &self.target
    }
}

impl OutputModule for SystemInfoSnapshotWriter {
    fn name(&self) -> &str {
        "system_info"
    }

    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::LineProtocol
    }

    fn per_channel(&self) -> bool {
        false
    }

    fn on_output_requested(&self, _payload: &str, _channel: Option<&str>) {
        let stamp = format_file_timestamp(self.clock.wall());
        let path = self.target.path_for(&stamp, None, ".txt");
        save_file(&path, &self.info.to_text(), &self.target.fallback_dir());
    }
}
