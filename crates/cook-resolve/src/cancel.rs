use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ResolveError;

/// Stop signal for a running [`crate::ResolverTree`].
///
/// Clones share one flag, so a caller keeps a clone and hands the other to
/// [`crate::ResolverTree::with_cancellation`]. The search calls [`CancellationToken::checkpoint`]
/// before visiting each child, so a cancelled resolution returns after the node it is expanding.
#[derive(Debug, Default, Clone)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that every search holding a clone of this token stops.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// `Err(ResolveError::Cancelled)` once [`CancellationToken::cancel`] has been called.
    pub fn checkpoint(&self) -> Result<(), ResolveError> {
        if self.is_cancelled() {
            Err(ResolveError::Cancelled)
        } else {
            Ok(())
        }
    }
}
