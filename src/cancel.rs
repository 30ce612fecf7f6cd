use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{RequestError, Result};

/// Shared flag a superseded request observes at its checkpoints.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(RequestError::Cancelled)
        } else {
            Ok(())
        }
    }
}
