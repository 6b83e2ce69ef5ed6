use std::sync::Arc;

use capture_core::{Dsn, Options};
use tracing::debug;

use crate::{client::CaptureClient, transport::HttpTransport, Transport, TransportError};

#[derive(Debug, Clone)]
pub struct CaptureClientBuilder {
    pub(crate) dsn: Dsn,
    pub(crate) options: Options,
    pub(crate) transport: Option<Arc<dyn Transport>>,
    pub(crate) max_breadcrumbs: usize,
}

impl CaptureClientBuilder {
    pub(crate) fn new(dsn: Dsn, options: Options) -> Self {
        let max_breadcrumbs = options.max_breadcrumbs;
        Self {
            dsn,
            options,
            transport: None,
            max_breadcrumbs,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn max_breadcrumbs(mut self, max: usize) -> Self {
        self.max_breadcrumbs = max;
        self
    }

    /// Builds the client. Without an explicit transport an [`HttpTransport`] bounded by
    /// `Options::send_timeout` is created, which is the only fallible step.
    pub fn install(self) -> Result<Arc<CaptureClient>, TransportError> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.options.send_timeout)?),
        };
        debug!(
            host = self.dsn.host(),
            project_id = self.dsn.project_id(),
            max_breadcrumbs = self.max_breadcrumbs,
            "capture client installed"
        );
        Ok(Arc::new(CaptureClient::new(
            self.dsn,
            self.options,
            transport,
            self.max_breadcrumbs,
        )))
    }
}
