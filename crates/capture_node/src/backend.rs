use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use capture_client::{CaptureClient, CaptureHooks, Transport};
use capture_core::{
    Backend, BoxFuture, Breadcrumb, CaptureError, Context, Event, Frontend, SendStatus,
};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::{forward::forget, panic, NodeOptions};

/// Backend adapter over [`CaptureClient`].
///
/// Holds the most recently stored context and breadcrumb snapshots. Stores and loads copy, so
/// callers never share state with the backend. Concurrent stores are last-writer-wins.
pub struct NodeBackend {
    frontend: Arc<dyn Frontend<NodeOptions>>,
    transport: Option<Arc<dyn Transport>>,
    client: OnceLock<Arc<CaptureClient>>,
    context: Mutex<Context>,
    breadcrumbs: Mutex<Vec<Breadcrumb>>,
}

impl NodeBackend {
    pub fn new(frontend: Arc<dyn Frontend<NodeOptions>>) -> Self {
        Self {
            frontend,
            transport: None,
            client: OnceLock::new(),
            context: Mutex::new(Context::default()),
            breadcrumbs: Mutex::new(Vec::new()),
        }
    }

    /// Like [`NodeBackend::new`], but the client transmits through `transport` instead of the
    /// default HTTP transport.
    pub fn with_transport(
        frontend: Arc<dyn Frontend<NodeOptions>>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            transport: Some(transport),
            ..Self::new(frontend)
        }
    }

    /// The capture client configured by [`Backend::install`], if installed.
    pub fn client(&self) -> Option<Arc<CaptureClient>> {
        self.client.get().cloned()
    }

    async fn install_client(&self) -> Result<bool, CaptureError> {
        // The frontend installs only when enabled with a DSN; reaching here without one is a bug.
        let dsn = self.frontend.dsn().ok_or(CaptureError::InstallWithoutDsn)?;
        if self.client.get().is_some() {
            return Err(CaptureError::AlreadyInstalled);
        }
        let runtime = Handle::try_current().map_err(|err| CaptureError::Runtime(err.to_string()))?;

        let options = self.frontend.options();
        let mut builder = CaptureClient::config(dsn, options.base.clone());
        if let Some(transport) = self.transport.as_ref() {
            builder = builder.transport(Arc::clone(transport));
        }
        let client = builder
            .install()
            .map_err(|err| CaptureError::ClientSetup(err.to_string()))?;

        let frontend = Arc::clone(&self.frontend);
        let handle = runtime.clone();
        client.on_breadcrumb(Box::new(move |breadcrumb| {
            let frontend = Arc::clone(&frontend);
            forget(&handle, "breadcrumb", async move {
                frontend.add_breadcrumb(breadcrumb).await
            });
        }));

        let frontend = Arc::clone(&self.frontend);
        let handle = runtime;
        client.on_send(Box::new(move |event| {
            let frontend = Arc::clone(&frontend);
            forget(&handle, "event", async move { frontend.capture_event(event).await });
        }));

        self.client
            .set(Arc::clone(&client))
            .map_err(|_| CaptureError::AlreadyInstalled)?;

        if options.capture_panics {
            panic::install_hook(Arc::downgrade(&client));
        }
        debug!(capture_panics = options.capture_panics, "backend installed");
        Ok(true)
    }

    async fn transmit(&self, event: Event) -> Result<SendStatus, CaptureError> {
        let client = self.client.get().ok_or(CaptureError::NotInstalled)?;
        let result = client.send(&event).await;
        if let Err(err) = &result {
            warn!(event_id = %event.event_id, error = %err, "event transmission failed");
        }
        // Rejected uploads (`TransportError::Status`) collapse into ServerError as well.
        Ok(SendStatus::from_result(&result))
    }
}

impl Backend for NodeBackend {
    fn install(&self) -> BoxFuture<'_, Result<bool, CaptureError>> {
        Box::pin(self.install_client())
    }

    fn store_context<'a>(
        &'a self,
        context: &'a Context,
    ) -> BoxFuture<'a, Result<(), CaptureError>> {
        Box::pin(async move {
            *self.context.lock().unwrap_or_else(PoisonError::into_inner) = context.clone();
            Ok(())
        })
    }

    fn load_context(&self) -> BoxFuture<'_, Result<Context, CaptureError>> {
        Box::pin(async move {
            Ok(self
                .context
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone())
        })
    }

    fn store_breadcrumbs<'a>(
        &'a self,
        breadcrumbs: &'a [Breadcrumb],
    ) -> BoxFuture<'a, Result<(), CaptureError>> {
        Box::pin(async move {
            *self
                .breadcrumbs
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = breadcrumbs.to_vec();
            Ok(())
        })
    }

    fn load_breadcrumbs(&self) -> BoxFuture<'_, Result<Vec<Breadcrumb>, CaptureError>> {
        Box::pin(async move {
            Ok(self
                .breadcrumbs
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone())
        })
    }

    fn send_event(&self, event: Event) -> BoxFuture<'_, Result<SendStatus, CaptureError>> {
        Box::pin(self.transmit(event))
    }
}
