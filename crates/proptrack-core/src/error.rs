//! Error types.
//!
//! Every failure here is local and recoverable: callers get a typed error (and
//! a log line), the channel or sink that raised it keeps working.

use std::path::PathBuf;

use thiserror::Error;

/// Rejected channel operations. The channel is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel {channel} is not initialized")]
    NotInitialized { channel: usize },

    #[error("property \"{name}\" is already tracked on channel {channel}")]
    DuplicateProperty { channel: usize, name: String },

    #[error("property \"{name}\" is not tracked on channel {channel}")]
    UnknownProperty { channel: usize, name: String },

    #[error("property name \"{name}\" is empty once spaces are stripped (channel {channel})")]
    InvalidName { channel: usize, name: String },
}

/// A single property source failed to produce a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The live object behind a lookup has been dropped.
    #[error("target of \"{name}\" no longer exists")]
    TargetDropped { name: String },

    /// The live object no longer exposes the bound member.
    #[error("member \"{member}\" of \"{name}\" could not be resolved")]
    MemberMissing { name: String, member: String },

    /// The accessor closure panicked.
    #[error("accessor for \"{name}\" panicked")]
    Panicked { name: String },
}

impl CaptureError {
    /// Whether the failing source should be removed from its channel.
    pub fn prunes_source(&self) -> bool {
        matches!(self, Self::TargetDropped { .. } | Self::MemberMissing { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("channel index {index} out of range ({count} channel(s))")]
    ChannelOutOfRange { index: usize, count: usize },

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// File sink write failures.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// HTTP upload and diagnostic failures.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Configuration loading and validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("upload client: {0}")]
    Upload(#[from] UploadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_error_pruning() {
        let dropped = CaptureError::TargetDropped { name: "a".into() };
        let missing = CaptureError::MemberMissing {
            name: "a".into(),
            member: "hp".into(),
        };
        let panicked = CaptureError::Panicked { name: "a".into() };
        assert!(dropped.prunes_source());
        assert!(missing.prunes_source());
        assert!(!panicked.prunes_source());
    }

    #[test]
    fn test_channel_error_messages() {
        let err = ChannelError::DuplicateProperty {
            channel: 2,
            name: "fps".into(),
        };
        assert_eq!(err.to_string(), "property \"fps\" is already tracked on channel 2");
    }
}
