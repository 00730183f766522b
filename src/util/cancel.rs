//! Cooperative cancellation with an optional deadline.
//!
//! A `CancelToken` is checked before every filesystem, parse or indexer step.
//! An expired deadline is observed exactly like an explicit cancel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::error::{CancelReason, FinderError};

/// Shared cancellation signal. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Create a token that is never cancelled until `cancel` is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        CancelToken::new().timeout(timeout)
    }

    /// Install (or tighten) a deadline `timeout` from now.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Signal cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The reason this token is cancelled, if it is.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.flag.load(Ordering::SeqCst) {
            Some(CancelReason::Requested)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(CancelReason::TimedOut)
        } else {
            None
        }
    }

    /// Whether cancellation has been requested or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Return `Err(Cancelled)` if the token is cancelled.
    pub fn check(&self) -> Result<(), FinderError> {
        match self.reason() {
            Some(reason) => Err(FinderError::Cancelled { reason }),
            None => Ok(()),
        }
    }
}
