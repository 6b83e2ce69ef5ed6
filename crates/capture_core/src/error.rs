use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The frontend only installs a backend when a DSN is configured; anything else is a bug.
    #[error("invariant violated: install() must not be called without a configured DSN")]
    InstallWithoutDsn,
    #[error("backend is already installed")]
    AlreadyInstalled,
    #[error("backend is not installed")]
    NotInstalled,
    #[error("failed to set up capture client: {0}")]
    ClientSetup(String),
    #[error("install requires a running tokio runtime: {0}")]
    Runtime(String),
    #[error("frontend failed to process {what}: {message}")]
    Frontend { what: &'static str, message: String },
}
