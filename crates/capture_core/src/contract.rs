use std::{future::Future, pin::Pin};

use crate::{Breadcrumb, CaptureError, Context, Dsn, Event};

/// Type-erased future returned by the contract traits so they stay object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of handing an event to the transport.
///
/// Deliberately coarse: any transport error is a `ServerError`, whatever its cause.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SendStatus {
    Success,
    ServerError,
}

impl SendStatus {
    pub fn code(self) -> u16 {
        match self {
            SendStatus::Success => 200,
            SendStatus::ServerError => 500,
        }
    }

    pub fn from_result<E>(result: &Result<(), E>) -> Self {
        match result {
            Ok(()) => SendStatus::Success,
            Err(_) => SendStatus::ServerError,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, SendStatus::Success)
    }
}

/// The component owning SDK-wide policy that a backend reports into.
///
/// `O` is the options type; backends with extra settings extend [`crate::Options`].
pub trait Frontend<O>: Send + Sync {
    fn dsn(&self) -> Option<Dsn>;

    fn options(&self) -> O;

    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) -> BoxFuture<'_, Result<(), CaptureError>>;

    fn capture_event(&self, event: Event) -> BoxFuture<'_, Result<(), CaptureError>>;
}

/// Adapter between a [`Frontend`] and a concrete capture client.
pub trait Backend: Send + Sync {
    /// Wires the capture client to the frontend. Returns whether installation succeeded.
    fn install(&self) -> BoxFuture<'_, Result<bool, CaptureError>>;

    fn store_context<'a>(&'a self, context: &'a Context)
        -> BoxFuture<'a, Result<(), CaptureError>>;

    fn load_context(&self) -> BoxFuture<'_, Result<Context, CaptureError>>;

    fn store_breadcrumbs<'a>(
        &'a self,
        breadcrumbs: &'a [Breadcrumb],
    ) -> BoxFuture<'a, Result<(), CaptureError>>;

    fn load_breadcrumbs(&self) -> BoxFuture<'_, Result<Vec<Breadcrumb>, CaptureError>>;

    fn send_event(&self, event: Event) -> BoxFuture<'_, Result<SendStatus, CaptureError>>;
}
