use std::ops::{Deref, DerefMut};

use capture_core::Options;

/// Options for [`crate::NodeBackend`]: the shared [`Options`] plus backend-specific switches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOptions {
    pub base: Options,
    /// Report panics as fatal events. The previously installed panic hook still runs afterwards.
    pub capture_panics: bool,
}

impl NodeOptions {
    pub fn capture_panics(mut self, enabled: bool) -> Self {
        self.capture_panics = enabled;
        self
    }
}

impl From<Options> for NodeOptions {
    fn from(base: Options) -> Self {
        Self {
            base,
            capture_panics: false,
        }
    }
}

impl Deref for NodeOptions {
    type Target = Options;

    fn deref(&self) -> &Options {
        &self.base
    }
}

impl DerefMut for NodeOptions {
    fn deref_mut(&mut self) -> &mut Options {
        &mut self.base
    }
}

impl AsRef<Options> for NodeOptions {
    fn as_ref(&self) -> &Options {
        &self.base
    }
}
