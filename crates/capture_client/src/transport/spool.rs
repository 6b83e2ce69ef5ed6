use std::path::{Path, PathBuf};

use capture_core::BoxFuture;
use tracing::debug;

use crate::{transport::Envelope, Transport, TransportError};

/// Writes each event body to `<dir>/<event_id>.json` instead of uploading it.
///
/// Useful for offline hosts and tests; the directory is created on first write.
#[derive(Debug, Clone)]
pub struct SpoolTransport {
    dir: PathBuf,
}

impl SpoolTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn write(&self, envelope: &Envelope) -> Result<(), TransportError> {
        // The id becomes a file name, so it must not carry separators or `..`.
        if !is_event_id(&envelope.event_id) {
            return Err(TransportError::InvalidEventId(envelope.event_id.clone()));
        }
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| TransportError::Spool {
                path: self.dir.clone(),
                source,
            })?;
        let path = self.dir.join(format!("{}.json", envelope.event_id));
        tokio::fs::write(&path, &envelope.body)
            .await
            .map_err(|source| TransportError::Spool {
                path: path.clone(),
                source,
            })?;
        debug!(event_id = %envelope.event_id, path = ?path, "event spooled");
        Ok(())
    }
}

fn is_event_id(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

impl Transport for SpoolTransport {
    fn send<'a>(&'a self, envelope: &'a Envelope) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(self.write(envelope))
    }
}
