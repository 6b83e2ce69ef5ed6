#![forbid(unsafe_code)]
//! Backend adapter that wires a [`CaptureClient`] to a [`Frontend`].
//!
//! After [`NodeBackend`] is installed, every breadcrumb the client records and every event it
//! would transmit is forwarded to the frontend instead. The frontend processes them and hands
//! finished events back through [`Backend::send_event`], which performs the actual transmission.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use capture_node::{Backend, Frontend, NodeBackend, NodeOptions};
//! # async fn run(frontend: Arc<dyn Frontend<NodeOptions>>) -> Result<(), capture_node::CaptureError> {
//! let backend = NodeBackend::new(frontend);
//! backend.install().await?;
//! if let Some(client) = backend.client() {
//!     client.record_breadcrumb(capture_node::Breadcrumb::new("startup", "ready"));
//! }
//! # Ok(()) }
//! ```

mod backend;
mod forward;
mod options;
mod panic;

pub use backend::NodeBackend;
pub use options::NodeOptions;

pub use capture_client::{
    CaptureClient, CaptureHooks, CommandTransport, Envelope, HttpTransport, SpoolTransport,
    Transport, TransportError,
};
pub use capture_core::{
    Backend, BoxFuture, Breadcrumb, CaptureError, Context, Dsn, Event, Frontend, Level, Options,
    SendStatus, User,
};
