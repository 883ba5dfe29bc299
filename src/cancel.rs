//! Cooperative cancellation signal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::Error;

/// Shared flag observed at every suspension point of an asynchronous call.
///
/// Clones share the same flag, so a token handed to an adapter call can be
/// cancelled from another task. Cancellation never interrupts a statement
/// already dispatched: it is noticed before the connection is opened and
/// before the next statement is sent.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fails with [`Error::Cancelled`] once cancellation was requested.
    ///
    /// # Errors
    ///
    /// * `Cancelled` - If [`cancel`](Self::cancel) was called on any clone.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
