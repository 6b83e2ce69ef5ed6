use std::{path::PathBuf, process::ExitStatus, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store endpoint rejected event with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to spawn uploader (binary={binary:?}): {source}")]
    Spawn {
        binary: PathBuf,
        source: std::io::Error,
    },
    #[error("upload timed out after {timeout:?}")]
    Timeout { timeout: Duration },
    #[error("failed waiting for uploader: {0}")]
    Wait(std::io::Error),
    #[error("failed writing event to uploader stdin: {0}")]
    StdinWrite(std::io::Error),
    #[error("uploader exited with {status}: {stderr}")]
    NonZeroExit { status: ExitStatus, stderr: String },
    #[error("event id {0:?} is not 32 hex characters")]
    InvalidEventId(String),
    #[error("failed to write spool file {path:?}: {source}")]
    Spool {
        path: PathBuf,
        source: std::io::Error,
    },
}
