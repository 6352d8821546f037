//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use linkpack_common::error::{LinkpackError, Result};

/// A cloneable flag checked between node resolutions.
///
/// Cancelling never interrupts a node mid-substitution; the build stops at
/// the next check and reports `LinkpackError::Canceled`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not canceled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once cancellation was requested.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Fails with `LinkpackError::Canceled` if cancellation was requested.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::Canceled` after [`cancel`](Self::cancel).
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            return Err(LinkpackError::Canceled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_canceled());
        assert!(matches!(token.check(), Err(LinkpackError::Canceled)));
    }
}
