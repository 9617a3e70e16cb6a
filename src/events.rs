//! Cross-context events and shutdown coordination.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A discrete navigation event from the remote control.
///
/// The set is closed: unrecognized key codes are dropped by the CEC parser
/// and never reach the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteEvent {
    Left,
    Right,
    Select,
}

/// Shared shutdown flag, set by the viewer on exit request and observed by
/// background threads.
#[derive(Debug, Clone)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// Create a new, unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Set the flag.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if the flag is set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}
