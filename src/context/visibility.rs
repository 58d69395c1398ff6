//! Live output echo toggle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag deciding whether captured lines are echoed as they arrive.
///
/// Clones share the same flag, so the front end can flip it while the session
/// holds another handle.
#[derive(Debug, Clone, Default)]
pub struct OutputVisibility {
    enabled: Arc<AtomicBool>,
}

impl OutputVisibility {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    /// Flip the flag and return the new state.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// User-facing notice after a toggle.
    pub fn describe(&self) -> &'static str {
        if self.is_enabled() {
            "Output is now ON."
        } else {
            "Output is now OFF."
        }
    }
}
