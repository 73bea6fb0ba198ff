//! Cooperative cancellation for preprocessing calls.
//!
//! The pipeline checks the token between stages and between quality-search
//! iterations. A child token is cancelled when it or any of its ancestors is,
//! which is how a batch stops its remaining images after the first failure
//! without cancelling the caller's token.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{PrepError, PrepResult};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<CancelToken>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also observes this token's cancellation, and that of
    /// every token this one descends from.
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(self.is_cancelled())),
            parent: Some(Arc::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        let mut token = self;
        loop {
            if token.flag.load(Ordering::Acquire) {
                return true;
            }
            match &token.parent {
                Some(parent) => token = &**parent,
                None => return false,
            }
        }
    }

    /// `Err(PrepError::Cancelled)` once cancelled.
    pub fn check(&self, operation: &str) -> PrepResult<()> {
        if self.is_cancelled() {
            return Err(PrepError::cancelled(operation));
        }
        Ok(())
    }
}
