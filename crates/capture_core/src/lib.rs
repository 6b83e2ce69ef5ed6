#![forbid(unsafe_code)]
//! Data model and contracts shared by the capture SDK crates.
//!
//! A [`Frontend`] owns SDK-wide policy (options, enrichment, enable/disable). A [`Backend`]
//! adapts that frontend to a concrete capture client and keeps the most recent context and
//! breadcrumb snapshots. Nothing in this crate performs I/O.

mod contract;
mod dsn;
mod error;
mod model;
mod options;

pub use contract::{Backend, BoxFuture, Frontend, SendStatus};
pub use dsn::{Dsn, DsnParseError, Scheme};
pub use error::CaptureError;
pub use model::{Breadcrumb, Context, Event, Exception, Level, User};
pub use options::Options;

/// Identifier reported as `sentry_client` in auth headers and as the event SDK name.
pub const SDK_NAME: &str = concat!("capture.rust/", env!("CARGO_PKG_VERSION"));
