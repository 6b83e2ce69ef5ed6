use std::time::Duration;

use capture_core::{BoxFuture, SDK_NAME};
use reqwest::{header::CONTENT_TYPE, Client};
use tracing::debug;

use crate::{transport::Envelope, Transport, TransportError};

const AUTH_HEADER: &str = "X-Sentry-Auth";

/// POSTs each envelope body to its store URL with an in-process HTTP client.
///
/// The request timeout covers the whole exchange, connect through response body. Any non-2xx
/// response is reported as [`TransportError::Status`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// `None` disables the request timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder().user_agent(SDK_NAME);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::ClientBuild)?;
        Ok(Self { client, timeout })
    }

    /// Wraps a preconfigured client. `timeout` should match the one the client enforces; it is
    /// only used to report [`TransportError::Timeout`].
    pub fn with_client(client: Client, timeout: Option<Duration>) -> Self {
        Self { client, timeout }
    }

    async fn post(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&envelope.store_url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTH_HEADER, envelope.auth_header.as_str())
            .body(envelope.body.clone())
            .send()
            .await
            .map_err(|err| self.map_error(err))?;

        let status = response.status();
        if !status.is_success() {
            // The body only feeds the error message.
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body.trim_end().to_string(),
            });
        }
        debug!(event_id = %envelope.event_id, status = status.as_u16(), "event uploaded");
        Ok(())
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        match self.timeout {
            Some(timeout) if err.is_timeout() => TransportError::Timeout { timeout },
            _ => TransportError::Http(err),
        }
    }
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, envelope: &'a Envelope) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(self.post(envelope))
    }
}
