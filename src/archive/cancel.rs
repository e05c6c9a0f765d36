use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Marks a view as torn down. Remote results that arrive after `cancel` are
/// dropped by their owner instead of being applied.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
