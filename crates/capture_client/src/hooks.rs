use capture_core::{Breadcrumb, Event};

pub type BreadcrumbHook = Box<dyn Fn(Breadcrumb) + Send + Sync>;
pub type SendHook = Box<dyn Fn(Event) + Send + Sync>;

/// Registration surface for the client's extension points.
///
/// Hooks are invoked synchronously on the thread that produced the breadcrumb or event, so they
/// must not block. Registering a hook replaces the previous one.
pub trait CaptureHooks {
    fn on_breadcrumb(&self, hook: BreadcrumbHook);

    fn on_send(&self, hook: SendHook);
}
