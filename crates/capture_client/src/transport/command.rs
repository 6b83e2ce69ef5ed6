use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use capture_core::BoxFuture;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::{Child, Command},
    time,
};
use tracing::debug;

use crate::{transport::Envelope, Transport, TransportError};

const BINARY_ENV: &str = "CAPTURE_TRANSPORT_BINARY";
const DEFAULT_BINARY: &str = "curl";
// ETXTBSY: the uploader is still open for writing, typically right after it was installed.
const TEXT_FILE_BUSY: i32 = 26;
const SPAWN_ATTEMPTS: u32 = 5;
const MAX_SPAWN_DELAY: Duration = Duration::from_millis(50);

/// Uploads each envelope by piping its body to an external HTTP client process.
///
/// The process is invoked with curl-compatible arguments
/// (`-sS --fail -X POST -H ... --data-binary @- <store_url>`) and additionally receives
/// `CAPTURE_STORE_URL`, `CAPTURE_AUTH_HEADER` and `CAPTURE_EVENT_ID` in its environment, so a
/// wrapper script can ignore the arguments entirely. The body is written to stdin.
///
/// The timeout bounds the whole upload: spawning, writing the body, and waiting for exit.
#[derive(Debug, Clone)]
pub struct CommandTransport {
    binary: PathBuf,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl Default for CommandTransport {
    /// Uses `CAPTURE_TRANSPORT_BINARY` when set and non-blank, `curl` otherwise.
    fn default() -> Self {
        let binary = std::env::var(BINARY_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY));
        Self {
            binary,
            env: BTreeMap::new(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl CommandTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary
    }

    fn argv(envelope: &Envelope) -> Vec<String> {
        vec![
            "-sS".to_string(),
            "--fail".to_string(),
            "-X".to_string(),
            "POST".to_string(),
            "-H".to_string(),
            "Content-Type: application/json".to_string(),
            "-H".to_string(),
            format!("X-Sentry-Auth: {}", envelope.auth_header),
            "--data-binary".to_string(),
            "@-".to_string(),
            envelope.store_url.clone(),
        ]
    }

    async fn upload(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(Self::argv(envelope))
            .env("CAPTURE_STORE_URL", &envelope.store_url)
            .env("CAPTURE_AUTH_HEADER", &envelope.auth_header)
            .env("CAPTURE_EVENT_ID", &envelope.event_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        // Dropping the exchange on timeout drops the child, and kill_on_drop reaps it.
        let exchange = run_with_stdin(cmd, &self.binary, &envelope.body);
        match self.timeout {
            Some(timeout) => time::timeout(timeout, exchange)
                .await
                .map_err(|_| TransportError::Timeout { timeout })??,
            None => exchange.await?,
        }
        debug!(event_id = %envelope.event_id, binary = ?self.binary, "event uploaded");
        Ok(())
    }
}

impl Transport for CommandTransport {
    fn send<'a>(&'a self, envelope: &'a Envelope) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(self.upload(envelope))
    }
}

async fn spawn_uploader(command: &mut Command, binary: &Path) -> Result<Child, TransportError> {
    let mut delay = Duration::from_millis(2);
    let mut attempt = 1;
    loop {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(source) if attempt < SPAWN_ATTEMPTS && is_text_file_busy(&source) => {
                debug!(binary = ?binary, attempt, "uploader busy, retrying spawn");
                time::sleep(delay).await;
                delay = (delay * 2).min(MAX_SPAWN_DELAY);
                attempt += 1;
            }
            Err(source) => {
                return Err(TransportError::Spawn {
                    binary: binary.to_path_buf(),
                    source,
                });
            }
        }
    }
}

fn is_text_file_busy(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(TEXT_FILE_BUSY)
}

/// Feeds `body` to the child while draining its stderr and waiting for it to exit.
///
/// An uploader may exit without consuming its input, so a failed write only matters when the
/// process itself reported success.
async fn run_with_stdin(
    mut command: Command,
    binary: &Path,
    body: &[u8],
) -> Result<(), TransportError> {
    let mut child = spawn_uploader(&mut command, binary).await?;
    let stdin = child.stdin.take();
    let stderr = child.stderr.take();

    let write = async move {
        match stdin {
            // Dropping stdin afterwards closes the pipe so the uploader sees EOF.
            Some(mut stdin) => stdin.write_all(body).await,
            None => Ok(()),
        }
    };
    let read = async move {
        match stderr {
            Some(stderr) => drain(stderr).await,
            None => Ok(Vec::new()),
        }
    };
    let (written, stderr, status) = tokio::join!(write, read, child.wait());

    let status = status.map_err(TransportError::Wait)?;
    if !status.success() {
        // stderr only feeds the error message, so a failed read just loses detail.
        let stderr = stderr.unwrap_or_default();
        return Err(TransportError::NonZeroExit {
            status,
            stderr: String::from_utf8_lossy(&stderr).trim_end().to_string(),
        });
    }
    written.map_err(TransportError::StdinWrite)
}

async fn drain<R>(mut reader: R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).await?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_posts_body_from_stdin_to_store_url() {
        let envelope = Envelope {
            event_id: "abc".to_string(),
            store_url: "https://example.com/api/1/store/".to_string(),
            auth_header: "Sentry sentry_key=pk".to_string(),
            body: b"{}".to_vec(),
        };
        let argv = CommandTransport::argv(&envelope);
        assert_eq!(argv.last().map(String::as_str), Some("https://example.com/api/1/store/"));
        assert!(argv.contains(&"X-Sentry-Auth: Sentry sentry_key=pk".to_string()));
        assert!(argv.windows(2).any(|w| w[0] == "--data-binary" && w[1] == "@-"));
    }

    #[test]
    fn only_etxtbsy_counts_as_busy() {
        assert!(is_text_file_busy(&std::io::Error::from_raw_os_error(TEXT_FILE_BUSY)));
        assert!(!is_text_file_busy(&std::io::Error::from(
            std::io::ErrorKind::NotFound
        )));
    }

    #[tokio::test]
    async fn spawn_failure_is_not_retried() {
        let mut command = Command::new("/nonexistent/capture-uploader");
        let err = spawn_uploader(&mut command, Path::new("/nonexistent/capture-uploader"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Spawn { .. }), "{err:?}");
    }
}
