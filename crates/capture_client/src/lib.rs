#![forbid(unsafe_code)]
//! Capture client: builds events and breadcrumbs and transmits events through a [`Transport`].
//!
//! The client exposes two extension points through [`CaptureHooks`]. A registered breadcrumb hook
//! receives every breadcrumb the client records instead of the client's own buffer; a registered
//! send hook receives every event the client would have transmitted. Direct transmission stays
//! available through [`CaptureClient::send`].

mod builder;
mod client;
mod error;
mod hooks;
mod layer;
mod transport;

pub use builder::CaptureClientBuilder;
pub use client::CaptureClient;
pub use error::TransportError;
pub use hooks::{BreadcrumbHook, CaptureHooks, SendHook};
pub use layer::BreadcrumbLayer;
pub use transport::{CommandTransport, Envelope, HttpTransport, SpoolTransport, Transport};
