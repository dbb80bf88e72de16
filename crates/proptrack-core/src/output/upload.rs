//! HTTP line-protocol uploader.
//!
//! Payloads are POSTed to an Influx v2 style `/api/v2/write` endpoint with a
//! bounded timeout. Delivery is best effort: failures are logged, never
//! retried.

use std::time::Duration;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use super::{OutputModule, PayloadFormat};
use crate::error::UploadError;

/// Timestamp precision declared on the write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    S,
    #[default]
    Ms,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::S => "s",
            Self::Ms => "ms",
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Server base URL, e.g. `http://localhost:8086`.
    pub url: String,
    pub org: String,
    pub bucket: String,
    pub token: String,
    pub precision: Precision,
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            org: String::new(),
            bucket: String::new(),
            token: String::new(),
            precision: Precision::Ms,
            timeout_secs: 10,
        }
    }
}

impl UploadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }
}

#[derive(Deserialize)]
struct BucketList {
    #[serde(default)]
    buckets: Vec<BucketEntry>,
}

#[derive(Deserialize)]
struct BucketEntry {
    name: String,
}

/// Sends line-protocol payloads to a time-series server.
pub struct HttpUploader {
    config: UploadConfig,
    client: reqwest::blocking::Client,
}

impl HttpUploader {
    pub fn new(config: UploadConfig) -> Result<Self, UploadError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// POST one payload. Empty payloads are not sent.
    pub fn write(&self, payload: &str) -> Result<(), UploadError> {
        if payload.trim().is_empty() {
            return Ok(());
        }
        let response = self
            .client
            .post(self.config.endpoint("/api/v2/write"))
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
                ("precision", self.config.precision.as_str()),
            ])
            .header("Authorization", format!("Token {}", self.config.token))
            .header("Content-Type", "text/plain")
            .body(payload.to_string())
            .send()
            .map_err(|e| self.classify(e))?;
        check_status(response).map(|_| ())
    }

    /// Whether the server is reachable and accepts the token.
    pub fn test_connection(&self) -> Result<(), UploadError> {
        self.list_buckets().map(|_| ())
    }

    /// Whether the configured bucket exists in the configured org.
    pub fn bucket_exists(&self) -> Result<bool, UploadError> {
        let buckets = self.list_buckets()?;
        Ok(buckets.iter().any(|b| b == &self.config.bucket))
    }

    fn list_buckets(&self) -> Result<Vec<String>, UploadError> {
        let response = self
            .client
            .get(self.config.endpoint("/api/v2/buckets"))
            .query(&[("org", self.config.org.as_str())])
            .header("Authorization", format!("Token {}", self.config.token))
            .send()
            .map_err(|e| self.classify(e))?;
        let list: BucketList = check_status(response)?.json()?;
        Ok(list.buckets.into_iter().map(|b| b.name).collect())
    }

    fn classify(&self, err: reqwest::Error) -> UploadError {
        if err.is_timeout() {
            UploadError::Timeout(self.config.timeout())
        } else {
            UploadError::Transport(err)
        }
    }
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, UploadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(UploadError::Status {
        status: status.as_u16(),
        body,
    })
}

impl OutputModule for HttpUploader {
    fn name(&self) -> &str {
        "http"
    }

    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::LineProtocol
    }

    fn on_output_requested(&self, payload: &str, channel: Option<&str>) {
        let label = channel.unwrap_or("default channel");
        match self.write(payload) {
            Ok(()) => info!(
                "uploaded {label} to bucket \"{}\" at {}",
                self.config.bucket, self.config.url
            ),
            Err(UploadError::Timeout(after)) => {
                warn!("upload of {label} timed out after {after:?}; data not sent")
            }
            Err(err) => error!("upload of {label} failed: {err}"),
        }
    }
}
