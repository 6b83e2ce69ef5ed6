use std::future::Future;

use capture_core::CaptureError;
use tokio::runtime::Handle;
use tracing::warn;

/// Runs `fut` detached on `runtime`. Nothing waits for it; an error or a panic inside it is
/// logged and goes no further.
pub(crate) fn forget<F>(runtime: &Handle, what: &'static str, fut: F)
where
    F: Future<Output = Result<(), CaptureError>> + Send + 'static,
{
    let task = runtime.spawn(fut);
    runtime.spawn(async move {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(what, error = %err, "frontend rejected forwarded item"),
            Err(err) => warn!(what, error = %err, "forwarding task aborted"),
        }
    });
}
