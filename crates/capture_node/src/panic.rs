use std::{any::Any, sync::Weak};

use capture_client::CaptureClient;
use capture_core::{Event, Exception, Level};
use serde_json::Value;
use tracing::debug;

/// Chains a panic hook that reports each panic through `client`'s send hook.
///
/// The client is held weakly so the process-wide hook never keeps it alive.
pub(crate) fn install_hook(client: Weak<CaptureClient>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(client) = client.upgrade() {
            let message = payload_message(info.payload());
            let location = info
                .location()
                .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));
            if let Some(event_id) = client.capture_event_via_hook(panic_event(message, location)) {
                debug!(event_id = %event_id, "panic captured");
            }
        }
        previous(info);
    }));
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

fn panic_event(message: String, location: Option<String>) -> Event {
    let mut event = Event {
        level: Level::Fatal,
        logger: Some("panic".to_string()),
        message: Some(message.clone()),
        exception: vec![Exception {
            ty: "panic".to_string(),
            value: Some(message),
        }],
        ..Event::default()
    };
    if let Some(location) = location {
        event
            .extra
            .insert("location".to_string(), Value::from(location));
    }
    event
}
