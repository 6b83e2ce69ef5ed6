use std::{
    collections::VecDeque,
    error::Error as StdError,
    fmt,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use capture_core::{Breadcrumb, Dsn, Event, Exception, Level, Options, SDK_NAME};
use time::OffsetDateTime;
use tracing::debug;

use crate::{
    builder::CaptureClientBuilder,
    hooks::{BreadcrumbHook, CaptureHooks, SendHook},
    transport::{Envelope, Transport},
    TransportError,
};

const PLATFORM: &str = "rust";

type SharedBreadcrumbHook = Arc<dyn Fn(Breadcrumb) + Send + Sync>;
type SharedSendHook = Arc<dyn Fn(Event) + Send + Sync>;

pub struct CaptureClient {
    dsn: Dsn,
    options: Options,
    transport: Arc<dyn Transport>,
    max_breadcrumbs: usize,
    breadcrumbs: Mutex<VecDeque<Breadcrumb>>,
    breadcrumb_hook: RwLock<Option<SharedBreadcrumbHook>>,
    send_hook: RwLock<Option<SharedSendHook>>,
}

impl CaptureClient {
    /// Starts configuring a client for `dsn`; finish with [`CaptureClientBuilder::install`].
    pub fn config(dsn: Dsn, options: Options) -> CaptureClientBuilder {
        CaptureClientBuilder::new(dsn, options)
    }

    pub(crate) fn new(
        dsn: Dsn,
        options: Options,
        transport: Arc<dyn Transport>,
        max_breadcrumbs: usize,
    ) -> Self {
        Self {
            dsn,
            options,
            transport,
            max_breadcrumbs,
            breadcrumbs: Mutex::new(VecDeque::new()),
            breadcrumb_hook: RwLock::new(None),
            send_hook: RwLock::new(None),
        }
    }

    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Records a breadcrumb: handed to the breadcrumb hook when one is registered, otherwise
    /// kept in the client's bounded buffer (oldest entries dropped first).
    pub fn record_breadcrumb(&self, breadcrumb: Breadcrumb) {
        let hook = self
            .breadcrumb_hook
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook(breadcrumb);
            return;
        }

        if self.max_breadcrumbs == 0 {
            return;
        }
        let mut buffer = self
            .breadcrumbs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while buffer.len() >= self.max_breadcrumbs {
            buffer.pop_front();
        }
        buffer.push_back(breadcrumb);
    }

    /// Breadcrumbs buffered by the client itself, oldest first.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.breadcrumbs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub async fn capture_message(
        &self,
        message: impl Into<String>,
        level: Level,
    ) -> Result<String, TransportError> {
        self.capture_event(Event::message(message, level)).await
    }

    /// Captures `error` together with its `source()` chain, innermost cause first.
    pub async fn capture_error<E>(&self, error: &E) -> Result<String, TransportError>
    where
        E: StdError + 'static,
    {
        self.capture_event(error_event(error)).await
    }

    /// Fills client defaults into `event`, then dispatches it.
    ///
    /// With a send hook registered the event goes to the hook and nothing is transmitted;
    /// otherwise it is transmitted through [`CaptureClient::send`]. Returns the event id.
    pub async fn capture_event(&self, event: Event) -> Result<String, TransportError> {
        let event = self.prepare(event);
        let event_id = event.event_id.clone();
        if let Some(hook) = self.send_hook() {
            debug!(event_id = %event_id, "event handed to send hook");
            hook(event);
            return Ok(event_id);
        }
        self.send(&event).await?;
        Ok(event_id)
    }

    /// Synchronous variant of [`CaptureClient::capture_event`] for contexts that cannot await,
    /// such as panic hooks. Returns `None` when no send hook is registered and nothing happened.
    pub fn capture_event_via_hook(&self, event: Event) -> Option<String> {
        let hook = self.send_hook()?;
        let event = self.prepare(event);
        let event_id = event.event_id.clone();
        hook(event);
        Some(event_id)
    }

    /// Low-level send primitive: serializes `event` and hands it to the transport.
    ///
    /// Bypasses the send hook.
    pub async fn send(&self, event: &Event) -> Result<(), TransportError> {
        let body = serde_json::to_vec(event)?;
        let envelope = Envelope {
            event_id: event.event_id.clone(),
            store_url: self.dsn.store_url(),
            auth_header: self
                .dsn
                .auth_header(SDK_NAME, OffsetDateTime::now_utc().unix_timestamp()),
            body,
        };
        debug!(event_id = %envelope.event_id, bytes = envelope.body.len(), "sending event");
        self.transport.send(&envelope).await
    }

    fn send_hook(&self) -> Option<SharedSendHook> {
        self.send_hook
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn prepare(&self, mut event: Event) -> Event {
        if event.platform.is_none() {
            event.platform = Some(PLATFORM.to_string());
        }
        if event.release.is_none() {
            event.release = self.options.release.clone();
        }
        if event.environment.is_none() {
            event.environment = self.options.environment.clone();
        }
        if event.server_name.is_none() {
            event.server_name = self.options.server_name.clone();
        }
        if event.breadcrumbs.is_empty() {
            event.breadcrumbs = self.breadcrumbs();
        }
        event
    }
}

impl CaptureHooks for CaptureClient {
    fn on_breadcrumb(&self, hook: BreadcrumbHook) {
        *self
            .breadcrumb_hook
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::from(hook));
    }

    fn on_send(&self, hook: SendHook) {
        *self
            .send_hook
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::from(hook));
    }
}

impl fmt::Debug for CaptureClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureClient")
            .field("host", &self.dsn.host())
            .field("project_id", &self.dsn.project_id())
            .field("transport", &self.transport)
            .field("max_breadcrumbs", &self.max_breadcrumbs)
            .finish_non_exhaustive()
    }
}

fn error_event<E>(error: &E) -> Event
where
    E: StdError + 'static,
{
    let mut exception = vec![Exception {
        ty: short_type_name::<E>().to_string(),
        value: Some(error.to_string()),
    }];
    let mut source = error.source();
    while let Some(cause) = source {
        exception.push(Exception {
            ty: "source".to_string(),
            value: Some(cause.to_string()),
        });
        source = cause.source();
    }
    exception.reverse();

    Event {
        message: Some(error.to_string()),
        level: Level::Error,
        exception,
        ..Event::default()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: std::io::Error,
    }

    #[test]
    fn error_chain_is_innermost_first() {
        let err = Outer {
            inner: std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
        };
        let event = error_event(&err);
        assert_eq!(event.exception.len(), 2);
        assert_eq!(event.exception[0].value.as_deref(), Some("disk gone"));
        assert_eq!(event.exception[1].ty, "Outer");
        assert_eq!(event.message.as_deref(), Some("outer failure"));
    }

    #[test]
    fn short_type_name_strips_paths_and_generics() {
        assert_eq!(short_type_name::<std::io::Error>(), "Error");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
    }
}
