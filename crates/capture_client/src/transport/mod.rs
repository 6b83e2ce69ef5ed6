use std::fmt;

use capture_core::BoxFuture;

use crate::TransportError;

mod command;
mod http;
mod spool;

pub use command::CommandTransport;
pub use http::HttpTransport;
pub use spool::SpoolTransport;

/// A serialized event plus everything needed to deliver it to the store endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub event_id: String,
    pub store_url: String,
    pub auth_header: String,
    /// JSON-encoded event.
    pub body: Vec<u8>,
}

/// Delivers envelopes. Implementations own timeouts; callers never retry.
pub trait Transport: Send + Sync + fmt::Debug {
    fn send<'a>(&'a self, envelope: &'a Envelope) -> BoxFuture<'a, Result<(), TransportError>>;
}
