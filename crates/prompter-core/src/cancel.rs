//! Cooperative cancellation for script loads.

use crate::loader::LoadError;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared flag a loader polls between stages. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail with [`LoadError::Cancelled`] once the flag is set.
    pub fn checkpoint(&self, stage: &'static str) -> Result<(), LoadError> {
        if self.is_cancelled() {
            return Err(LoadError::Cancelled { stage });
        }
        Ok(())
    }
}
