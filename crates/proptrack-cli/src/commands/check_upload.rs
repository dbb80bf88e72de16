//! `proptrack check-upload`: connection and bucket diagnostics for an upload target.

use proptrack_core::{HttpUploader, UploadConfig, UploadError};

pub fn run(url: &str, org: &str, bucket: &str, token: Option<&str>, timeout_secs: u64) {
    let token = token
        .map(str::to_string)
        .or_else(|| std::env::var("PROPTRACK_TOKEN").ok())
        .unwrap_or_default();
    if token.is_empty() {
        eprintln!("Warning: no token given (--token or $PROPTRACK_TOKEN)");
    }

    let config = UploadConfig {
        url: url.to_string(),
        org: org.to_string(),
        bucket: bucket.to_string(),
        token,
        timeout_secs: timeout_secs.max(1),
        ..Default::default()
    };
    let uploader = match HttpUploader::new(config) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("Error creating HTTP client: {e}");
            std::process::exit(1);
        }
    };

    println!("Checking {url} (org \"{org}\")");
    if let Err(e) = uploader.test_connection() {
        println!("  Connection:  FAILED ({})", explain(&e));
        std::process::exit(1);
    }
    println!("  Connection:  ok");

    match uploader.bucket_exists() {
        Ok(true) => println!("  Bucket:      \"{bucket}\" exists"),
        Ok(false) => {
            println!("  Bucket:      \"{bucket}\" NOT FOUND");
            std::process::exit(1);
        }
        Err(e) => {
            println!("  Bucket:      FAILED ({})", explain(&e));
            std::process::exit(1);
        }
    }
}

fn explain(err: &UploadError) -> String {
    match err {
        UploadError::Status { status: 401, .. } => "token rejected".to_string(),
        UploadError::Status { status: 404, .. } => "endpoint not found".to_string(),
        other => other.to_string(),
    }
}
