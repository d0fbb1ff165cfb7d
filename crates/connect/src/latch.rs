use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-way "connected" flag shared by every task of a connect controller.
#[derive(Debug, Clone, Default)]
pub struct ConnectionLatch {
    connected: Arc<AtomicBool>,
}

impl ConnectionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Sets the flag. Returns `true` only for the call that performed the
    /// transition.
    pub fn mark_connected(&self) -> bool {
        self.connected
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
