use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, SplitError};

/// A cheap, cloneable cancellation signal checked between block fetches.
///
/// The walker and the block store both honor this; on cancellation the
/// traversal aborts with [`crate::error::SplitError::Cancelled`] and any
/// boxes built so far are discarded, since partial output does not satisfy
/// the coverage invariant.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `Err(SplitError::Cancelled)` once cancellation has been
    /// requested; callers check this between block fetches.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SplitError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled_and_latches_once_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn check_turns_cancellation_into_an_error() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());
        token.cancel();
        assert!(matches!(token.check(), Err(SplitError::Cancelled)));
    }
}
